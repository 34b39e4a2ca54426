use crate::adapters::storage::FileManager;
use crate::core::validator::validate_trips;
use crate::domain::model::{Trip, TRIP_COLUMNS};
use crate::domain::ports::{Storage, TripRepository};
use crate::utils::error::{ReportError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use tokio::sync::RwLock;

fn optional_field<T: FromStr>(raw: &str, column: &str, line: usize) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<T>()
        .map(Some)
        .map_err(|e| ReportError::InvalidRecord {
            line,
            reason: format!("{} '{}': {}", column, raw, e),
        })
}

fn parse_row(record: &csv::StringRecord, line: usize) -> Result<Trip> {
    if record.len() != TRIP_COLUMNS.len() {
        return Err(ReportError::InvalidRecord {
            line,
            reason: format!(
                "expected {} columns, found {}",
                TRIP_COLUMNS.len(),
                record.len()
            ),
        });
    }

    Ok(Trip::new(
        optional_field::<i64>(&record[0], TRIP_COLUMNS[0], line)?,
        record[1].trim(),
        optional_field::<Decimal>(&record[2], TRIP_COLUMNS[2], line)?,
        optional_field::<i64>(&record[3], TRIP_COLUMNS[3], line)?,
        optional_field::<i64>(&record[4], TRIP_COLUMNS[4], line)?,
    ))
}

/// Reads trips from CSV text with a header row.
///
/// Rows that cannot be decoded, have the wrong column count or carry
/// unparsable numbers are logged and skipped; only I/O failures abort the
/// read. Field-level rules (destination, sign of price) are left to the
/// validator.
pub fn read_trips_csv(data: &[u8]) -> Result<Vec<Trip>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    if headers.iter().map(str::trim).ne(TRIP_COLUMNS.iter().copied()) {
        tracing::warn!(
            "Unexpected trip header {:?}, reading columns as {}",
            headers,
            TRIP_COLUMNS.join(",")
        );
    }

    let mut trips = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                tracing::warn!("Skipping undecodable row: {}", e);
                continue;
            }
        };
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        match parse_row(&record, line) {
            Ok(trip) => trips.push(trip),
            Err(e) => tracing::warn!("Skipping row: {}", e),
        }
    }

    tracing::info!("{} rows read from CSV", trips.len());
    Ok(trips)
}

#[derive(Debug, Default)]
struct StoreState {
    trips: Vec<Trip>,
    next_id: i64,
}

impl StoreState {
    /// Ids at `i64::MAX` are refused: no id could follow them.
    fn assign_id(&mut self, trip: Trip) -> Result<Trip> {
        let (id, trip) = match trip.id() {
            Some(id) => (id, trip),
            None => {
                let id = self.next_id.max(1);
                (id, trip.with_id(id))
            }
        };
        let following = id.checked_add(1).ok_or_else(|| ReportError::ArithmeticOverflow {
            context: format!("trip id {} leaves no next id", id),
        })?;
        self.next_id = self.next_id.max(following);
        Ok(trip)
    }
}

/// Trip table held in memory.
#[derive(Debug, Default)]
pub struct InMemoryTripStore {
    state: RwLock<StoreState>,
}

impl InMemoryTripStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from ingested rows; rows that cannot be stored are logged and skipped.
    pub async fn from_trips(trips: Vec<Trip>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.write().await;
            for trip in trips {
                match state.assign_id(trip) {
                    Ok(trip) => state.trips.push(trip),
                    Err(e) => tracing::warn!("Skipping trip: {}", e),
                }
            }
        }
        store
    }

    pub async fn load_csv<S: Storage>(files: &FileManager<S>, path: &str) -> Result<Self> {
        let trips = read_trips_csv(&files.read(path).await?)?;
        Ok(Self::from_trips(trips).await)
    }

    /// Stores a trip, assigning the next id when it has none. Returns the id.
    pub async fn insert(&self, trip: Trip) -> Result<i64> {
        let mut state = self.state.write().await;
        let trip = state.assign_id(trip)?;
        let id = trip.id().unwrap_or_default();
        state.trips.push(trip);
        Ok(id)
    }

    /// Returns the id of the last inserted trip. Nothing is stored if any trip is refused.
    pub async fn insert_many(&self, trips: Vec<Trip>) -> Result<Option<i64>> {
        let mut state = self.state.write().await;
        let mut staged = StoreState {
            trips: Vec::with_capacity(trips.len()),
            next_id: state.next_id,
        };
        for trip in trips {
            let trip = staged.assign_id(trip)?;
            staged.trips.push(trip);
        }

        let last = staged.trips.last().and_then(Trip::id);
        state.next_id = staged.next_id;
        state.trips.append(&mut staged.trips);
        Ok(last)
    }

    /// Replaces the trip stored under `id`, keeping that id. Returns whether it existed.
    pub async fn update(&self, id: i64, trip: Trip) -> bool {
        let mut state = self.state.write().await;
        match state.trips.iter_mut().find(|t| t.id() == Some(id)) {
            Some(stored) => {
                *stored = trip.with_id(id);
                true
            }
            None => false,
        }
    }

    /// All stored trips keyed by id.
    pub async fn find_all_by_id(&self) -> BTreeMap<i64, Trip> {
        let state = self.state.read().await;
        state
            .trips
            .iter()
            .filter_map(|t| t.id().map(|id| (id, t.clone())))
            .collect()
    }

    pub async fn find_by_id(&self, id: i64) -> Option<Trip> {
        let state = self.state.read().await;
        state.trips.iter().find(|t| t.id() == Some(id)).cloned()
    }

    pub async fn find_by_agency_id(&self, agency_id: i64) -> Vec<Trip> {
        let state = self.state.read().await;
        state
            .trips
            .iter()
            .filter(|t| t.agency_id() == Some(agency_id))
            .cloned()
            .collect()
    }

    /// Removes the trip with `id`, returning whether one existed.
    pub async fn delete(&self, id: i64) -> bool {
        let mut state = self.state.write().await;
        let before = state.trips.len();
        state.trips.retain(|t| t.id() != Some(id));
        state.trips.len() != before
    }

    pub async fn delete_all(&self) {
        self.state.write().await.trips.clear();
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.trips.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TripRepository for InMemoryTripStore {
    async fn fetch_all_valid_trips(&self) -> Result<Vec<Trip>> {
        let trips = self.state.read().await.trips.clone();
        Ok(validate_trips(trips).accepted)
    }

    async fn fetch_all_trips(&self) -> Result<Vec<Trip>> {
        Ok(self.state.read().await.trips.clone())
    }

    /// Most visited first, then alphabetical.
    async fn count_trips_per_destination(&self) -> Result<Vec<(String, u64)>> {
        let state = self.state.read().await;
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for trip in &state.trips {
            *counts.entry(trip.destination()).or_default() += 1;
        }

        let mut counts: Vec<(String, u64)> = counts
            .into_iter()
            .map(|(destination, count)| (destination.to_string(), count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(counts)
    }

    /// For each destination, the agencies with the most trips there,
    /// ordered by destination then agency id. Trips without an agency are ignored.
    async fn max_trips_per_destination_by_agency(&self) -> Result<Vec<(String, i64, u64)>> {
        let state = self.state.read().await;
        let mut per_pair: BTreeMap<(&str, i64), u64> = BTreeMap::new();
        for trip in &state.trips {
            if let Some(agency_id) = trip.agency_id() {
                *per_pair.entry((trip.destination(), agency_id)).or_default() += 1;
            }
        }

        let mut max_per_destination: HashMap<&str, u64> = HashMap::new();
        for (&(destination, _), &count) in &per_pair {
            let max = max_per_destination.entry(destination).or_default();
            *max = (*max).max(count);
        }

        Ok(per_pair
            .into_iter()
            .filter(|((destination, _), count)| max_per_destination.get(destination) == Some(count))
            .map(|((destination, agency_id), count)| (destination.to_string(), agency_id, count))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "id,destination,price,num_of_people,agency_id
1,Spain,1000.00,2,1
2,Italy,1500.50,4,1
3,Spain,900,1,2
4,Spain,not-a-price,1,2
5,Peru,100,1
6,Spain,800,3,2
,Greece,700,2,1
";

    #[test]
    fn test_read_trips_csv_skips_malformed_rows() {
        let trips = read_trips_csv(CSV.as_bytes()).unwrap();
        let ids: Vec<_> = trips.iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3), Some(6), None]);
        assert_eq!(trips[1].price(), Some("1500.50".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_insert_assigns_ids() {
        let store = InMemoryTripStore::from_trips(read_trips_csv(CSV.as_bytes()).unwrap()).await;
        assert_eq!(store.len().await, 5);
        // the id-less Greece row gets the next id after 6
        assert_eq!(store.find_by_id(7).await.unwrap().destination(), "Greece");

        let id = store
            .insert(Trip::new(None, "Norway", Some(Decimal::from(10)), Some(1), Some(3)))
            .await
            .unwrap();
        assert_eq!(id, 8);
        assert_eq!(store.find_by_agency_id(3).await.len(), 1);

        assert!(store.delete(8).await);
        assert!(!store.delete(8).await);
        store.delete_all().await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_count_trips_per_destination() {
        let store = InMemoryTripStore::from_trips(read_trips_csv(CSV.as_bytes()).unwrap()).await;
        let counts = store.count_trips_per_destination().await.unwrap();
        assert_eq!(
            counts,
            vec![
                ("Spain".to_string(), 3),
                ("Greece".to_string(), 1),
                ("Italy".to_string(), 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_max_trips_per_destination_by_agency() {
        let store = InMemoryTripStore::from_trips(read_trips_csv(CSV.as_bytes()).unwrap()).await;
        store
            .insert(Trip::new(None, "Italy", Some(Decimal::from(10)), Some(1), Some(2)))
            .await
            .unwrap();

        let rows = store.max_trips_per_destination_by_agency().await.unwrap();
        assert_eq!(
            rows,
            vec![
                ("Greece".to_string(), 1, 1),
                ("Italy".to_string(), 1, 1),
                ("Italy".to_string(), 2, 1),
                ("Spain".to_string(), 2, 2),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_all_valid_filters_invalid_rows() {
        let store = InMemoryTripStore::from_trips(vec![
            Trip::new(Some(1), "Spain", Some(Decimal::from(10)), Some(1), Some(1)),
            Trip::new(Some(2), "Sp4in", Some(Decimal::from(10)), Some(1), Some(1)),
            Trip::new(Some(3), "Spain", Some(Decimal::from(-1)), Some(1), Some(1)),
        ])
        .await;

        assert_eq!(store.fetch_all_valid_trips().await.unwrap().len(), 1);
        assert_eq!(store.fetch_all_trips().await.unwrap().len(), 3);
    }

    #[test]
    fn test_read_trips_csv_skips_undecodable_row() {
        let mut data = b"id,destination,price,num_of_people,agency_id\n1,Spain,100,1,1\n2,".to_vec();
        data.extend_from_slice(&[0xFF, 0xFE]);
        data.extend_from_slice(b",100,1,1\n3,Italy,200,2,1\n");

        let trips = read_trips_csv(&data).unwrap();
        let ids: Vec<_> = trips.iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![Some(1), Some(3)]);
    }

    #[tokio::test]
    async fn test_insert_refuses_max_id() {
        let store = InMemoryTripStore::new();
        let result = store
            .insert(Trip::new(Some(i64::MAX), "Spain", Some(Decimal::from(10)), Some(1), Some(1)))
            .await;
        assert!(matches!(result, Err(ReportError::ArithmeticOverflow { .. })));
        assert!(store.is_empty().await);

        let id = store
            .insert(Trip::new(None, "Spain", Some(Decimal::from(10)), Some(1), Some(1)))
            .await
            .unwrap();
        assert_eq!(id, 1);
    }

    #[tokio::test]
    async fn test_insert_many_is_all_or_nothing() {
        let store = InMemoryTripStore::new();
        let result = store
            .insert_many(vec![
                Trip::new(None, "Spain", Some(Decimal::from(10)), Some(1), Some(1)),
                Trip::new(Some(i64::MAX), "Italy", Some(Decimal::from(10)), Some(1), Some(1)),
            ])
            .await;
        assert!(result.is_err());
        assert!(store.is_empty().await);

        let last = store
            .insert_many(vec![
                Trip::new(None, "Spain", Some(Decimal::from(10)), Some(1), Some(1)),
                Trip::new(Some(5), "Italy", Some(Decimal::from(10)), Some(1), Some(1)),
            ])
            .await
            .unwrap();
        assert_eq!(last, Some(5));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_from_trips_skips_unstorable_rows() {
        let store = InMemoryTripStore::from_trips(vec![
            Trip::new(Some(i64::MAX), "Spain", Some(Decimal::from(10)), Some(1), Some(1)),
            Trip::new(Some(2), "Italy", Some(Decimal::from(10)), Some(1), Some(1)),
        ])
        .await;
        assert_eq!(store.len().await, 1);
        assert!(store.find_by_id(2).await.is_some());
    }

    #[tokio::test]
    async fn test_update_and_find_all_by_id() {
        let store = InMemoryTripStore::from_trips(read_trips_csv(CSV.as_bytes()).unwrap()).await;

        let replacement = Trip::new(Some(99), "Norway", Some(Decimal::from(50)), Some(2), Some(2));
        assert!(store.update(3, replacement.clone()).await);
        assert!(!store.update(42, replacement).await);

        let updated = store.find_by_id(3).await.unwrap();
        assert_eq!(updated.destination(), "Norway");
        assert_eq!(updated.id(), Some(3));
        assert!(store.find_by_id(99).await.is_none());

        let by_id = store.find_all_by_id().await;
        assert_eq!(by_id.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 6, 7]);
        assert_eq!(by_id[&3].destination(), "Norway");
    }
}
