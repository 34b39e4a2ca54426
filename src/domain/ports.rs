use crate::domain::model::{Agency, Trip, UNKNOWN_AGENCY};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn delete_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Data-access side of the reports. One call is one round trip.
#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn fetch_all_valid_trips(&self) -> Result<Vec<Trip>>;
    async fn fetch_all_trips(&self) -> Result<Vec<Trip>>;
    async fn count_trips_per_destination(&self) -> Result<Vec<(String, u64)>>;
    async fn max_trips_per_destination_by_agency(&self) -> Result<Vec<(String, i64, u64)>>;
}

pub trait AgencyDirectory: Send + Sync {
    fn lookup_by_id(&self, id: i64) -> Option<Agency>;

    fn display_name_for(&self, id: i64) -> String {
        self.lookup_by_id(id)
            .map(|agency| agency.name().to_string())
            .unwrap_or_else(|| UNKNOWN_AGENCY.to_string())
    }
}

pub trait CountryAllowList: Send + Sync {
    fn allowed_destinations(&self) -> HashSet<String>;
}
