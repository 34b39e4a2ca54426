use crate::core::aggregator::{self, AgencyIncome, AgencyTripCount, DestinationCount, MeanPriceEntry, PeopleCountGroup};
use crate::core::grouper::group_trips;
use crate::core::report::{Report, ReportKind};
use crate::domain::model::{IncomeRates, Offer, Trip};
use crate::domain::ports::{AgencyDirectory, CountryAllowList, TripRepository};
use crate::utils::error::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Reporting facade over injected collaborators and an immutable offer snapshot.
///
/// Readers clone the `Arc<Offer>` and never hold the lock while computing.
/// [`OfferService::refresh`] fetches a complete new snapshot before swapping it
/// in, so dropping the refresh future midway leaves the old one in place.
/// Refreshes run one at a time, so the last one to start is the one kept.
pub struct OfferService {
    agencies: Arc<dyn AgencyDirectory>,
    trips: Arc<dyn TripRepository>,
    countries: Arc<dyn CountryAllowList>,
    rates: IncomeRates,
    offer: RwLock<Arc<Offer>>,
    refresh_guard: Mutex<()>,
}

impl OfferService {
    pub async fn new(
        agencies: Arc<dyn AgencyDirectory>,
        trips: Arc<dyn TripRepository>,
        countries: Arc<dyn CountryAllowList>,
        rates: IncomeRates,
    ) -> Result<Self> {
        let offer = Self::build_offer(trips.as_ref(), agencies.as_ref()).await?;
        Ok(Self {
            agencies,
            trips,
            countries,
            rates,
            offer: RwLock::new(Arc::new(offer)),
            refresh_guard: Mutex::new(()),
        })
    }

    async fn build_offer(
        trips: &dyn TripRepository,
        agencies: &dyn AgencyDirectory,
    ) -> Result<Offer> {
        let valid = trips.fetch_all_valid_trips().await?;
        Ok(group_trips(valid, agencies))
    }

    pub async fn snapshot(&self) -> Arc<Offer> {
        self.offer.read().await.clone()
    }

    /// Rebuilds the offer from the repository and swaps it in.
    pub async fn refresh(&self) -> Result<Arc<Offer>> {
        let _guard = self.refresh_guard.lock().await;
        let offer = Arc::new(Self::build_offer(self.trips.as_ref(), self.agencies.as_ref()).await?);
        *self.offer.write().await = offer.clone();
        tracing::info!(
            "Offer refreshed: {} agencies, {} trips",
            offer.len(),
            offer.trip_count()
        );
        Ok(offer)
    }

    pub fn rates(&self) -> &IncomeRates {
        &self.rates
    }

    pub async fn agencies_with_max_trips(&self) -> Vec<AgencyTripCount> {
        let offer = self.snapshot().await;
        aggregator::agencies_with_max_trips(&offer)
    }

    pub async fn agencies_with_max_income(&self) -> Result<Vec<AgencyIncome>> {
        let offer = self.snapshot().await;
        aggregator::agencies_with_max_income(&offer, &self.rates)
    }

    pub async fn countries_with_max_trips(&self) -> Result<Vec<DestinationCount>> {
        let counts = self.trips.count_trips_per_destination().await?;
        aggregator::countries_with_max_trips(&counts)
    }

    pub async fn mean_price_report(&self) -> Result<Vec<MeanPriceEntry>> {
        let offer = self.snapshot().await;
        aggregator::mean_price_report(&offer)
    }

    pub async fn max_trips_per_country_by_agency(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let triples = self.trips.max_trips_per_destination_by_agency().await?;
        Ok(aggregator::max_trips_per_country_by_agency(
            &triples,
            self.agencies.as_ref(),
        ))
    }

    pub async fn trips_to_allowed_destinations(&self) -> Result<Vec<Trip>> {
        let trips = self.trips.fetch_all_valid_trips().await?;
        let allowed = self.countries.allowed_destinations();
        Ok(aggregator::filter_by_allowed_destinations(&trips, &allowed))
    }

    /// Groups every stored trip, valid or not, by people count.
    pub async fn trips_by_people_count(&self) -> Result<BTreeMap<i64, BTreeSet<Trip>>> {
        let trips = self.trips.fetch_all_trips().await?;
        Ok(aggregator::group_by_people_count(&trips))
    }

    pub async fn max_price_per_people_count(&self) -> Result<Vec<PeopleCountGroup>> {
        let grouped = self.trips_by_people_count().await?;
        aggregator::max_price_per_people_count_group(&grouped)
    }

    pub async fn run(&self, kind: ReportKind) -> Result<Report> {
        tracing::debug!("Running report: {}", kind);
        let report = match kind {
            ReportKind::MaxTrips => Report::MaxTrips(self.agencies_with_max_trips().await),
            ReportKind::MaxIncome => Report::MaxIncome(self.agencies_with_max_income().await?),
            ReportKind::CountryMaxTrips => {
                Report::CountryMaxTrips(self.countries_with_max_trips().await?)
            }
            ReportKind::MeanPrice => Report::MeanPrice(self.mean_price_report().await?),
            ReportKind::MaxTripsPerCountry => {
                Report::MaxTripsPerCountry(self.max_trips_per_country_by_agency().await?)
            }
            ReportKind::AllowedDestinations => {
                Report::AllowedDestinations(self.trips_to_allowed_destinations().await?)
            }
            ReportKind::PeopleCount => Report::PeopleCount(
                self.trips_by_people_count()
                    .await?
                    .into_iter()
                    .map(|(people, trips)| (people, trips.into_iter().collect()))
                    .collect(),
            ),
            ReportKind::MaxPricePerPeopleCount => {
                Report::MaxPricePerPeopleCount(self.max_price_per_people_count().await?)
            }
        };
        Ok(report)
    }
}
