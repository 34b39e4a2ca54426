use crate::utils::error::{ReportError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Column order of the trip table, shared by CSV ingestion and export.
pub const TRIP_COLUMNS: [&str; 5] = ["id", "destination", "price", "num_of_people", "agency_id"];

/// Display name for trips whose agency is not in the directory.
pub const UNKNOWN_AGENCY: &str = "Unknown agency";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Agency {
    id: i64,
    name: String,
    location: String,
}

impl Agency {
    pub fn new(id: i64, name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            location: location.into(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

/// VAT and margin applied when deriving a trip's income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeRates {
    pub vat_rate: Decimal,
    pub margin: Decimal,
}

impl Default for IncomeRates {
    fn default() -> Self {
        Self {
            vat_rate: Decimal::new(19, 2),
            margin: Decimal::new(1, 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Trip {
    id: Option<i64>,
    destination: String,
    price: Option<Decimal>,
    num_of_people: Option<i64>,
    agency_id: Option<i64>,
}

impl Trip {
    pub fn new(
        id: Option<i64>,
        destination: impl Into<String>,
        price: Option<Decimal>,
        num_of_people: Option<i64>,
        agency_id: Option<i64>,
    ) -> Self {
        Self {
            id,
            destination: destination.into(),
            price,
            num_of_people,
            agency_id,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn price(&self) -> Option<Decimal> {
        self.price
    }

    pub fn num_of_people(&self) -> Option<i64> {
        self.num_of_people
    }

    pub fn agency_id(&self) -> Option<i64> {
        self.agency_id
    }

    /// Copy of this trip carrying a storage id.
    pub fn with_id(&self, id: i64) -> Self {
        Self {
            id: Some(id),
            ..self.clone()
        }
    }

    /// Agency income from this trip: `price * vat_rate * margin`.
    pub fn income(&self, rates: &IncomeRates) -> Result<Decimal> {
        let price = self
            .price
            .ok_or(ReportError::MissingPrice { trip_id: self.id })?;
        price
            .checked_mul(rates.vat_rate)
            .and_then(|taxed| taxed.checked_mul(rates.margin))
            .ok_or_else(|| ReportError::ArithmeticOverflow {
                context: format!("income of trip {:?}", self.id),
            })
    }

    pub fn income_with_defaults(&self) -> Result<Decimal> {
        self.income(&IncomeRates::default())
    }
}

impl fmt::Display for Trip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let price = self
            .price
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let people = self
            .num_of_people
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        match self.id {
            Some(id) => write!(f, "#{} {} ({} x{})", id, self.destination, price, people),
            None => write!(f, "{} ({} x{})", self.destination, price, people),
        }
    }
}

/// Grouping key of the offer. Trips without a known agency land in `Unknown`.
///
/// Ordering puts known agencies first by id, then the unknown bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "agency", rename_all = "snake_case")]
pub enum AgencyKey {
    Known(Agency),
    Unknown,
}

impl AgencyKey {
    pub fn agency(&self) -> Option<&Agency> {
        match self {
            AgencyKey::Known(agency) => Some(agency),
            AgencyKey::Unknown => None,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            AgencyKey::Known(agency) => agency.name(),
            AgencyKey::Unknown => UNKNOWN_AGENCY,
        }
    }
}

impl From<Option<Agency>> for AgencyKey {
    fn from(agency: Option<Agency>) -> Self {
        agency.map(AgencyKey::Known).unwrap_or(AgencyKey::Unknown)
    }
}

/// Snapshot of agencies and their valid trips.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Offer {
    groups: BTreeMap<AgencyKey, Vec<Trip>>,
}

impl Offer {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, key: AgencyKey, trip: Trip) {
        self.groups.entry(key).or_default().push(trip);
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of agency groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn trip_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn get(&self, key: &AgencyKey) -> Option<&[Trip]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AgencyKey, &[Trip])> {
        self.groups.iter().map(|(k, v)| (k, v.as_slice()))
    }
}
