use crate::error::GameResult;
use crate::simulate::{run_single, SimulationRequest, SingleOutcome};

use log::warn;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use thiserror::Error;

pub type RequestDigest = u64;

/// Stable digest of a request, used as the cache key for stored outcomes.
/// Two requests with identical parameters always collapse to the same key.
pub fn request_digest(request: &SimulationRequest) -> RequestDigest {
    let mut hasher = DefaultHasher::new();
    format!("{:?}", request).hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("results sink unavailable: {0}")]
    Unavailable(String),
}

/// Where finished outcomes are stored, and looked up before a run is
/// repeated. A sink failure never fails the simulation itself.
pub trait ResultsSink: Send + Sync {
    fn lookup(&self, digest: RequestDigest) -> Result<Option<SingleOutcome>, SinkError>;
    fn store(&self, digest: RequestDigest, outcome: &SingleOutcome) -> Result<(), SinkError>;
}

/// In-process sink backed by a map. Good enough for a driver that repeats
/// requests within one invocation.
#[derive(Default)]
pub struct MemorySink {
    outcomes: Mutex<HashMap<RequestDigest, SingleOutcome>>,
}

impl MemorySink {
    pub fn new() -> MemorySink {
        MemorySink::default()
    }
}

impl ResultsSink for MemorySink {
    fn lookup(&self, digest: RequestDigest) -> Result<Option<SingleOutcome>, SinkError> {
        let outcomes = self.outcomes.lock().expect("sink lock poisoned");
        Ok(outcomes.get(&digest).cloned())
    }

    fn store(&self, digest: RequestDigest, outcome: &SingleOutcome) -> Result<(), SinkError> {
        let mut outcomes = self.outcomes.lock().expect("sink lock poisoned");
        outcomes.insert(digest, outcome.clone());
        Ok(())
    }
}

/// Runs one simulation unless the sink already holds its outcome. Sink
/// trouble is logged and the run proceeds uncached.
pub fn run_single_cached(
    request: &SimulationRequest,
    sink: &dyn ResultsSink,
) -> GameResult<SingleOutcome> {
    let digest = request_digest(request);
    match sink.lookup(digest) {
        Ok(Some(outcome)) => return Ok(outcome),
        Ok(None) => {}
        Err(err) => warn!("results lookup failed: {}", err),
    }
    let outcome = run_single(request)?;
    if let Err(err) = sink.store(digest, &outcome) {
        warn!("results store failed: {}", err);
    }
    Ok(outcome)
}
