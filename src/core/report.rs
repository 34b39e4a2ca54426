use crate::core::aggregator::{
    AgencyIncome, AgencyTripCount, DestinationCount, MeanPriceEntry, PeopleCountGroup,
};
use crate::domain::model::Trip;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The closed set of reports the service can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    MaxTrips,
    MaxIncome,
    CountryMaxTrips,
    MeanPrice,
    MaxTripsPerCountry,
    AllowedDestinations,
    PeopleCount,
    MaxPricePerPeopleCount,
}

impl ReportKind {
    pub const ALL: [ReportKind; 8] = [
        ReportKind::MaxTrips,
        ReportKind::MaxIncome,
        ReportKind::CountryMaxTrips,
        ReportKind::MeanPrice,
        ReportKind::MaxTripsPerCountry,
        ReportKind::AllowedDestinations,
        ReportKind::PeopleCount,
        ReportKind::MaxPricePerPeopleCount,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::MaxTrips => "Agencies with max trips",
            ReportKind::MaxIncome => "Agencies with max income",
            ReportKind::CountryMaxTrips => "Countries with max trips",
            ReportKind::MeanPrice => "Mean price per agency",
            ReportKind::MaxTripsPerCountry => "Agencies with max trips for each country",
            ReportKind::AllowedDestinations => "Trips to allowed destinations",
            ReportKind::PeopleCount => "Trips by number of people",
            ReportKind::MaxPricePerPeopleCount => "Max price for each number of people",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "report", content = "data", rename_all = "kebab-case")]
pub enum Report {
    MaxTrips(Vec<AgencyTripCount>),
    MaxIncome(Vec<AgencyIncome>),
    CountryMaxTrips(Vec<DestinationCount>),
    MeanPrice(Vec<MeanPriceEntry>),
    MaxTripsPerCountry(BTreeMap<String, Vec<String>>),
    AllowedDestinations(Vec<Trip>),
    PeopleCount(BTreeMap<i64, Vec<Trip>>),
    MaxPricePerPeopleCount(Vec<PeopleCountGroup>),
}

impl Report {
    pub fn kind(&self) -> ReportKind {
        match self {
            Report::MaxTrips(_) => ReportKind::MaxTrips,
            Report::MaxIncome(_) => ReportKind::MaxIncome,
            Report::CountryMaxTrips(_) => ReportKind::CountryMaxTrips,
            Report::MeanPrice(_) => ReportKind::MeanPrice,
            Report::MaxTripsPerCountry(_) => ReportKind::MaxTripsPerCountry,
            Report::AllowedDestinations(_) => ReportKind::AllowedDestinations,
            Report::PeopleCount(_) => ReportKind::PeopleCount,
            Report::MaxPricePerPeopleCount(_) => ReportKind::MaxPricePerPeopleCount,
        }
    }
}
