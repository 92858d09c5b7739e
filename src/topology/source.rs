/*!
GUI-facing snapshot provider interface.

This module defines:
- `TopologyError`: error type for snapshot retrieval.
- `SnapshotSource`: an async trait that returns the latest controller snapshot.

The HTTP client implements `SnapshotSource`; tests substitute scripted sources.
*/

use async_trait::async_trait;
use thiserror::Error;

use crate::topology::snapshot::Snapshot;

/// Error type for snapshot retrieval.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TopologyError {
    /// Transport failure or a non-success HTTP status.
    #[error("acquisition error: {0}")]
    Acquisition(String),
    /// The body was not a valid snapshot.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// A small async interface for providing snapshots to the poll loop.
/// `Ok(None)` means the controller answered with an empty payload.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_snapshot(&mut self) -> TopologyResult<Option<Snapshot>>;
}

/// Convenience result alias for topology operations.
pub type TopologyResult<T> = Result<T, TopologyError>;
