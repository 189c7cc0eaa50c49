//! In-memory repository with a haversine radius filter. Dev and tests only.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use geo::{Distance, Haversine, Point};

use super::GeoRepository;
use crate::error::ClientError;
use crate::model::{Coordinate, MemoryRecord};

/// Great-circle distance in meters.
fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let pa = Point::new(a.longitude, a.latitude);
    let pb = Point::new(b.longitude, b.latitude);
    Haversine::distance(pa, pb)
}

/// Vector-backed repository. Results are ordered nearest first, ties by insertion order.
///
/// Counts `insert` and `query_nearby` calls (failed ones included) and can be told to fail
/// either operation, so pipeline tests can exercise degraded paths.
///
/// **In-Memory**: All data is lost when the repository is dropped.
#[derive(Default)]
pub struct InMemoryRepository {
    records: Mutex<Vec<MemoryRecord>>,
    insert_calls: AtomicUsize,
    query_calls: AtomicUsize,
    fail_insert: bool,
    fail_query: bool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the repository with existing records (kept as given).
    pub fn with_records(records: Vec<MemoryRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Make every `insert` fail (builder style).
    pub fn failing_insert(mut self) -> Self {
        self.fail_insert = true;
        self
    }

    /// Make every `query_nearby` fail (builder style).
    pub fn failing_query(mut self) -> Self {
        self.fail_query = true;
        self
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    /// Snapshot of all stored records in insertion order.
    pub fn records(&self) -> Vec<MemoryRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl GeoRepository for InMemoryRepository {
    async fn insert(&self, record: &MemoryRecord) -> Result<(), ClientError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert {
            return Err(ClientError::Provider("memory: insert rejected".to_string()));
        }
        let mut stored = record.clone();
        stored.created_at.get_or_insert_with(Utc::now);
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(stored);
        Ok(())
    }

    async fn query_nearby(
        &self,
        coord: Coordinate,
        radius_meters: u32,
    ) -> Result<Vec<MemoryRecord>, ClientError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_query {
            return Err(ClientError::Transport("memory: query failed".to_string()));
        }
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let mut hits: Vec<(f64, &MemoryRecord)> = records
            .iter()
            .map(|r| (distance_meters(coord, r.location), r))
            .filter(|(d, _)| *d <= f64::from(radius_meters))
            .collect();
        // Stable sort keeps insertion order for equal distances.
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(hits.into_iter().map(|(_, r)| r.clone()).collect())
    }
}
