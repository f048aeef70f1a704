//! Request storage seam.
//!
//! The orchestrator talks to storage through [`TravelRequestRepository`] so
//! it can be tested in-memory and swapped for a durable backing. Writes carry
//! the version the caller loaded; a stale expected version is rejected, which
//! is the contract any durable implementation must also honor.

use std::collections::HashMap;
use std::sync::RwLock;

use tripflow_core::{RequestId, TravelError, TravelResult};
use tripflow_travel::TravelRequest;

pub trait TravelRequestRepository: Send + Sync {
    fn get(&self, id: &RequestId) -> TravelResult<TravelRequest>;

    /// All requests, ordered by id.
    fn list(&self) -> TravelResult<Vec<TravelRequest>>;

    /// Store a new request; the id must be unused.
    fn insert(&self, request: TravelRequest) -> TravelResult<()>;

    /// Replace a stored request iff its current version equals
    /// `expected_version` (the version the caller loaded before mutating).
    fn save(&self, request: &TravelRequest, expected_version: u64) -> TravelResult<()>;
}

/// In-memory repository.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryRequestRepository {
    requests: RwLock<HashMap<RequestId, TravelRequest>>,
}

impl InMemoryRequestRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TravelRequestRepository for InMemoryRequestRepository {
    fn get(&self, id: &RequestId) -> TravelResult<TravelRequest> {
        let requests = self
            .requests
            .read()
            .map_err(|_| TravelError::conflict("lock poisoned"))?;
        requests
            .get(id)
            .cloned()
            .ok_or_else(|| TravelError::request_not_found(id.as_str()))
    }

    fn list(&self) -> TravelResult<Vec<TravelRequest>> {
        let requests = self
            .requests
            .read()
            .map_err(|_| TravelError::conflict("lock poisoned"))?;
        let mut all: Vec<TravelRequest> = requests.values().cloned().collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(all)
    }

    fn insert(&self, request: TravelRequest) -> TravelResult<()> {
        let mut requests = self
            .requests
            .write()
            .map_err(|_| TravelError::conflict("lock poisoned"))?;
        if requests.contains_key(request.id()) {
            return Err(TravelError::conflict(format!(
                "request {} already exists",
                request.id()
            )));
        }
        requests.insert(request.id().clone(), request);
        Ok(())
    }

    fn save(&self, request: &TravelRequest, expected_version: u64) -> TravelResult<()> {
        let mut requests = self
            .requests
            .write()
            .map_err(|_| TravelError::conflict("lock poisoned"))?;
        let stored = requests
            .get(request.id())
            .ok_or_else(|| TravelError::request_not_found(request.id().as_str()))?;
        if stored.version() != expected_version {
            return Err(TravelError::conflict(format!(
                "optimistic concurrency check failed (expected {expected_version}, found {})",
                stored.version()
            )));
        }
        requests.insert(request.id().clone(), request.clone());
        Ok(())
    }
}
