use crate::domain::model::Trip;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

static DESTINATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s]+$").expect("destination pattern compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    EmptyDestination,
    InvalidDestination,
    MissingPrice,
    NegativePrice,
    MissingPeopleCount,
    NegativePeopleCount,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RejectReason::EmptyDestination => "destination is empty",
            RejectReason::InvalidDestination => "destination must contain only letters and spaces",
            RejectReason::MissingPrice => "price is missing",
            RejectReason::NegativePrice => "price is negative",
            RejectReason::MissingPeopleCount => "number of people is missing",
            RejectReason::NegativePeopleCount => "number of people is negative",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedTrip {
    pub trip: Trip,
    pub reasons: Vec<RejectReason>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub accepted: Vec<Trip>,
    pub rejected: Vec<RejectedTrip>,
}

/// Every rule the trip breaks, empty when the trip is valid.
pub fn check_trip(trip: &Trip) -> Vec<RejectReason> {
    let mut reasons = Vec::new();

    let destination = trip.destination();
    if destination.is_empty() {
        reasons.push(RejectReason::EmptyDestination);
    } else if !DESTINATION_PATTERN.is_match(destination) {
        reasons.push(RejectReason::InvalidDestination);
    }

    match trip.price() {
        None => reasons.push(RejectReason::MissingPrice),
        Some(price) if price < Decimal::ZERO => reasons.push(RejectReason::NegativePrice),
        Some(_) => {}
    }

    match trip.num_of_people() {
        None => reasons.push(RejectReason::MissingPeopleCount),
        Some(people) if people < 0 => reasons.push(RejectReason::NegativePeopleCount),
        Some(_) => {}
    }

    reasons
}

pub fn is_valid(trip: &Trip) -> bool {
    check_trip(trip).is_empty()
}

/// Splits a batch into accepted and rejected trips. Never fails; rejects are logged.
pub fn validate_trips<I>(trips: I) -> ValidationOutcome
where
    I: IntoIterator<Item = Trip>,
{
    let mut outcome = ValidationOutcome::default();

    for trip in trips {
        let reasons = check_trip(&trip);
        if reasons.is_empty() {
            outcome.accepted.push(trip);
        } else {
            let reason_text = reasons
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!("Invalid record: {} ({})", trip, reason_text);
            outcome.rejected.push(RejectedTrip { trip, reasons });
        }
    }

    tracing::debug!(
        "Validated trips: {} accepted, {} rejected",
        outcome.accepted.len(),
        outcome.rejected.len()
    );

    outcome
}
