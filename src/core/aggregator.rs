//! Report computations over an [`Offer`] snapshot.
//!
//! Every function here is pure: the same input always yields the same output
//! and nothing is mutated. Functions that need a maximum over possibly empty
//! input document their empty-input policy individually.

use crate::domain::model::{AgencyKey, IncomeRates, Offer, Trip};
use crate::domain::ports::AgencyDirectory;
use crate::utils::error::{ReportError, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgencyTripCount {
    pub agency: AgencyKey,
    pub trips: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgencyIncome {
    pub agency: AgencyKey,
    pub income: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationCount {
    pub destination: String,
    pub trips: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeanPriceEntry {
    pub agency: AgencyKey,
    pub mean_price: Decimal,
    pub closest_trip: Trip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeopleCountGroup {
    pub people: i64,
    pub max_price: Decimal,
    pub price_per_person: Decimal,
    pub trips: Vec<Trip>,
}

/// Agencies tied for the highest number of trips. Empty offer gives `[]`.
pub fn agencies_with_max_trips(offer: &Offer) -> Vec<AgencyTripCount> {
    let Some(max_trips) = offer.iter().map(|(_, trips)| trips.len()).max() else {
        return Vec::new();
    };

    offer
        .iter()
        .filter(|(_, trips)| trips.len() == max_trips)
        .map(|(agency, trips)| AgencyTripCount {
            agency: agency.clone(),
            trips: trips.len(),
        })
        .collect()
}

fn checked_sum(sum: Decimal, value: Decimal, context: &str) -> Result<Decimal> {
    sum.checked_add(value)
        .ok_or_else(|| ReportError::ArithmeticOverflow {
            context: context.to_string(),
        })
}

fn total_income(trips: &[Trip], rates: &IncomeRates) -> Result<Decimal> {
    trips.iter().try_fold(Decimal::ZERO, |sum, trip| {
        checked_sum(sum, trip.income(rates)?, "agency income")
    })
}

/// Agencies tied for the highest summed income. Empty offer gives `[]`.
///
/// Fails with [`ReportError::MissingPrice`] if any trip has no price.
pub fn agencies_with_max_income(offer: &Offer, rates: &IncomeRates) -> Result<Vec<AgencyIncome>> {
    let incomes = offer
        .iter()
        .map(|(agency, trips)| {
            Ok(AgencyIncome {
                agency: agency.clone(),
                income: total_income(trips, rates)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let Some(max_income) = incomes.iter().map(|entry| entry.income).max() else {
        return Ok(Vec::new());
    };

    Ok(incomes
        .into_iter()
        .filter(|entry| entry.income == max_income)
        .collect())
}

/// Destinations tied for the highest count. The maximum of nothing is undefined,
/// so empty input is an error.
pub fn countries_with_max_trips(counts: &[(String, u64)]) -> Result<Vec<DestinationCount>> {
    let max_count = counts
        .iter()
        .map(|(_, count)| *count)
        .max()
        .ok_or_else(|| ReportError::EmptyInput {
            operation: "countries_with_max_trips".to_string(),
        })?;

    Ok(counts
        .iter()
        .filter(|(_, count)| *count == max_count)
        .map(|(destination, count)| DestinationCount {
            destination: destination.clone(),
            trips: *count,
        })
        .collect())
}

fn price_of(trip: &Trip) -> Result<Decimal> {
    trip.price()
        .ok_or(ReportError::MissingPrice { trip_id: trip.id() })
}

/// Mean price of the trips; zero for an empty slice.
pub fn mean_price(trips: &[Trip]) -> Result<Decimal> {
    if trips.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let total = trips.iter().try_fold(Decimal::ZERO, |sum, trip| {
        checked_sum(sum, price_of(trip)?, "mean price")
    })?;

    total
        .checked_div(Decimal::from(trips.len()))
        .ok_or_else(|| ReportError::DivisionByZero {
            context: "mean price".to_string(),
        })
}

/// Trip whose price is nearest to `target`; the first one wins on equal distance.
fn closest_to(trips: &[Trip], target: Decimal) -> Result<Option<&Trip>> {
    let mut best: Option<(&Trip, Decimal)> = None;
    for trip in trips {
        let distance = price_of(trip)?
            .checked_sub(target)
            .ok_or_else(|| ReportError::ArithmeticOverflow {
                context: "distance to mean price".to_string(),
            })?
            .abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((trip, distance)),
        }
    }
    Ok(best.map(|(trip, _)| trip))
}

/// Per agency: mean trip price and the trip closest to it.
pub fn mean_price_report(offer: &Offer) -> Result<Vec<MeanPriceEntry>> {
    let mut report = Vec::with_capacity(offer.len());

    for (agency, trips) in offer.iter() {
        let mean = mean_price(trips)?;
        if let Some(closest) = closest_to(trips, mean)? {
            report.push(MeanPriceEntry {
                agency: agency.clone(),
                mean_price: mean,
                closest_trip: closest.clone(),
            });
        }
    }

    Ok(report)
}

/// Destination to the names of agencies with the most trips there.
///
/// `triples` are `(destination, agency_id, count)` rows already reduced to the
/// per-destination maximum. Names within a destination follow agency id order.
pub fn max_trips_per_country_by_agency(
    triples: &[(String, i64, u64)],
    directory: &dyn AgencyDirectory,
) -> BTreeMap<String, Vec<String>> {
    let mut by_destination: BTreeMap<String, Vec<i64>> = BTreeMap::new();
    for (destination, agency_id, _) in triples {
        by_destination
            .entry(destination.clone())
            .or_default()
            .push(*agency_id);
    }

    by_destination
        .into_iter()
        .map(|(destination, mut agency_ids)| {
            agency_ids.sort_unstable();
            let names = agency_ids
                .into_iter()
                .map(|id| directory.display_name_for(id))
                .collect();
            (destination, names)
        })
        .collect()
}

pub fn filter_by_allowed_destinations(trips: &[Trip], allowed: &HashSet<String>) -> Vec<Trip> {
    trips
        .iter()
        .filter(|trip| allowed.contains(trip.destination()))
        .cloned()
        .collect()
}

/// People count to the distinct trips of that size. Trips without a count are left out.
pub fn group_by_people_count(trips: &[Trip]) -> BTreeMap<i64, BTreeSet<Trip>> {
    let mut grouped: BTreeMap<i64, BTreeSet<Trip>> = BTreeMap::new();
    for trip in trips {
        match trip.num_of_people() {
            Some(people) => {
                grouped.entry(people).or_default().insert(trip.clone());
            }
            None => tracing::debug!("Skipping trip without people count: {}", trip),
        }
    }
    grouped
}

/// Most expensive trips of each people-count group, ranked by price per person.
///
/// Groups keyed by zero or fewer people have no per-person price and are
/// skipped, as are groups with no priced trip.
pub fn max_price_per_people_count_group(
    grouped: &BTreeMap<i64, BTreeSet<Trip>>,
) -> Result<Vec<PeopleCountGroup>> {
    let mut groups = Vec::with_capacity(grouped.len());

    for (&people, trips) in grouped {
        if people <= 0 {
            tracing::warn!(
                "Skipping group of {} people: no per-person price ({} trips)",
                people,
                trips.len()
            );
            continue;
        }

        let Some(max_price) = trips.iter().filter_map(Trip::price).max() else {
            tracing::warn!("Skipping group of {} people: no priced trips", people);
            continue;
        };

        let price_per_person =
            max_price
                .checked_div(Decimal::from(people))
                .ok_or_else(|| ReportError::DivisionByZero {
                    context: format!("price per person for group of {}", people),
                })?;

        groups.push(PeopleCountGroup {
            people,
            max_price,
            price_per_person,
            trips: trips
                .iter()
                .filter(|trip| trip.price() == Some(max_price))
                .cloned()
                .collect(),
        });
    }

    groups.sort_by(|a, b| {
        b.price_per_person
            .cmp(&a.price_per_person)
            .then(a.people.cmp(&b.people))
    });

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grouper::group_trips;
    use crate::domain::model::Agency;
    use std::collections::HashMap;

    struct MapDirectory(HashMap<i64, Agency>);

    impl AgencyDirectory for MapDirectory {
        fn lookup_by_id(&self, id: i64) -> Option<Agency> {
            self.0.get(&id).cloned()
        }
    }

    fn directory() -> MapDirectory {
        MapDirectory(HashMap::from([
            (1, Agency::new(1, "TravelPlus", "Warsaw")),
            (2, Agency::new(2, "GoHoliday", "Krakow")),
        ]))
    }

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    fn trip(id: i64, destination: &str, price: i64, people: i64, agency_id: i64) -> Trip {
        Trip::new(Some(id), destination, Some(dec(price)), Some(people), Some(agency_id))
    }

    fn sample_trips() -> Vec<Trip> {
        vec![
            trip(1, "Spain", 1000, 2, 1),
            trip(2, "Italy", 1500, 4, 1),
            trip(3, "Spain", 900, 1, 2),
        ]
    }

    fn travel_plus() -> AgencyKey {
        AgencyKey::Known(Agency::new(1, "TravelPlus", "Warsaw"))
    }

    fn go_holiday() -> AgencyKey {
        AgencyKey::Known(Agency::new(2, "GoHoliday", "Krakow"))
    }

    #[test]
    fn test_max_trips_single_winner() {
        let offer = group_trips(sample_trips(), &directory());
        let result = agencies_with_max_trips(&offer);
        assert_eq!(
            result,
            vec![AgencyTripCount {
                agency: travel_plus(),
                trips: 2
            }]
        );
    }

    #[test]
    fn test_max_trips_includes_ties() {
        let mut trips = sample_trips();
        trips.push(trip(4, "Greece", 700, 3, 2));
        let offer = group_trips(trips, &directory());

        let agencies: Vec<_> = agencies_with_max_trips(&offer)
            .into_iter()
            .map(|entry| entry.agency)
            .collect();
        assert_eq!(agencies, vec![travel_plus(), go_holiday()]);
    }

    #[test]
    fn test_max_trips_empty_offer() {
        assert!(agencies_with_max_trips(&Offer::new()).is_empty());
    }

    #[test]
    fn test_max_income() {
        let offer = group_trips(sample_trips(), &directory());
        let result = agencies_with_max_income(&offer, &IncomeRates::default()).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].agency, travel_plus());
        // (1000 + 1500) * 0.19 * 0.1
        assert_eq!(result[0].income, "47.5".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_max_income_empty_offer() {
        let result = agencies_with_max_income(&Offer::new(), &IncomeRates::default()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_max_income_missing_price_is_an_error() {
        let trips = vec![Trip::new(Some(9), "Spain", None, Some(2), Some(1))];
        let offer = group_trips(trips, &directory());
        assert!(matches!(
            agencies_with_max_income(&offer, &IncomeRates::default()),
            Err(ReportError::MissingPrice { trip_id: Some(9) })
        ));
    }

    #[test]
    fn test_countries_with_max_trips() {
        let counts = vec![
            ("Spain".to_string(), 2),
            ("Italy".to_string(), 1),
            ("Greece".to_string(), 2),
        ];
        let result = countries_with_max_trips(&counts).unwrap();
        let names: Vec<_> = result.iter().map(|c| c.destination.as_str()).collect();
        assert_eq!(names, vec!["Spain", "Greece"]);
        assert!(result.iter().all(|c| c.trips == 2));
    }

    #[test]
    fn test_countries_with_max_trips_empty_input() {
        assert!(matches!(
            countries_with_max_trips(&[]),
            Err(ReportError::EmptyInput { .. })
        ));
    }

    #[test]
    fn test_mean_price_first_encountered_wins_tie() {
        let trips = vec![trip(1, "Spain", 100, 2, 1), trip(2, "Italy", 200, 2, 1)];
        let offer = group_trips(trips, &directory());
        let report = mean_price_report(&offer).unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(report[0].mean_price, dec(150));
        assert_eq!(report[0].closest_trip.id(), Some(1));
    }

    #[test]
    fn test_mean_price_is_exact_decimal() {
        let trips = vec![
            trip(1, "Spain", 10, 1, 1),
            trip(2, "Spain", 10, 1, 1),
            trip(3, "Spain", 11, 1, 1),
        ];
        let mean = mean_price(&trips).unwrap();
        assert_eq!(mean.round_dp(2), "10.33".parse::<Decimal>().unwrap());
        assert_eq!(mean_price(&[]).unwrap(), Decimal::ZERO);
    }

    fn huge_trip(id: i64) -> Trip {
        let price = "50000000000000000000000000000".parse::<Decimal>().unwrap();
        Trip::new(Some(id), "Spain", Some(price), Some(1), Some(1))
    }

    #[test]
    fn test_mean_price_overflow_is_an_error() {
        let offer = group_trips(vec![huge_trip(1), huge_trip(2)], &directory());
        assert!(matches!(
            mean_price_report(&offer),
            Err(ReportError::ArithmeticOverflow { .. })
        ));
    }

    #[test]
    fn test_income_overflow_is_an_error() {
        let offer = group_trips(vec![huge_trip(1), huge_trip(2)], &directory());
        let rates = IncomeRates {
            vat_rate: Decimal::ONE,
            margin: Decimal::ONE,
        };
        assert!(matches!(
            agencies_with_max_income(&offer, &rates),
            Err(ReportError::ArithmeticOverflow { .. })
        ));
    }

    #[test]
    fn test_max_trips_per_country_orders_by_agency_id() {
        let triples = vec![
            ("Spain".to_string(), 2, 3),
            ("Spain".to_string(), 1, 3),
            ("Italy".to_string(), 7, 1),
        ];
        let report = max_trips_per_country_by_agency(&triples, &directory());

        assert_eq!(report["Spain"], vec!["TravelPlus", "GoHoliday"]);
        assert_eq!(report["Italy"], vec!["Unknown agency"]);
    }

    #[test]
    fn test_filter_by_allowed_destinations() {
        let mut trips = sample_trips();
        trips.push(trip(1, "Spain", 1000, 2, 1));
        let allowed = HashSet::from(["Spain".to_string()]);

        let filtered = filter_by_allowed_destinations(&trips, &allowed);
        assert_eq!(filtered.len(), 3);
        assert!(filtered.iter().all(|t| t.destination() == "Spain"));
        assert_eq!(filtered[0].id(), Some(1));
        assert_eq!(filtered[1].id(), Some(3));
    }

    #[test]
    fn test_group_by_people_count_dedups() {
        let mut trips = sample_trips();
        trips.push(trip(1, "Spain", 1000, 2, 1));
        trips.push(Trip::new(Some(8), "Peru", Some(dec(5)), None, Some(1)));

        let grouped = group_by_people_count(&trips);
        assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), vec![1, 2, 4]);
        assert_eq!(grouped[&2].len(), 1);
    }

    #[test]
    fn test_max_price_ranking_per_person() {
        let trips = vec![
            trip(1, "Paris", 1000, 2, 1),
            trip(2, "Rome", 800, 4, 1),
            trip(3, "London", 1200, 1, 2),
            trip(4, "Berlin", 900, 4, 2),
            trip(5, "Madrid", 900, 4, 2),
        ];
        let report = max_price_per_people_count_group(&group_by_people_count(&trips)).unwrap();

        let order: Vec<_> = report.iter().map(|g| g.people).collect();
        assert_eq!(order, vec![1, 2, 4]);
        assert_eq!(report[0].price_per_person, dec(1200));
        assert_eq!(report[2].max_price, dec(900));
        let tied: Vec<_> = report[2].trips.iter().map(|t| t.id()).collect();
        assert_eq!(tied, vec![Some(4), Some(5)]);
    }

    #[test]
    fn test_max_price_skips_zero_person_group() {
        let trips = vec![trip(1, "Paris", 1000, 0, 1), trip(2, "Rome", 300, 3, 1)];
        let report = max_price_per_people_count_group(&group_by_people_count(&trips)).unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(report[0].people, 3);
        assert_eq!(report[0].price_per_person, dec(100));
    }

    #[test]
    fn test_reports_are_repeatable() {
        let offer = group_trips(sample_trips(), &directory());
        assert_eq!(agencies_with_max_trips(&offer), agencies_with_max_trips(&offer));
        assert_eq!(
            mean_price_report(&offer).unwrap(),
            mean_price_report(&offer).unwrap()
        );
        assert_eq!(
            agencies_with_max_income(&offer, &IncomeRates::default()).unwrap(),
            agencies_with_max_income(&offer, &IncomeRates::default()).unwrap()
        );
    }
}
