//! Error types for omni-sync.

use thiserror::Error;

use omni_client::ApiError;
use omni_source::SourceError;

/// Setup failures that stop a sync before any user is processed.
///
/// Per-user and per-write failures never appear here; they are recorded in
/// the [`SyncReport`](crate::SyncReport).
#[derive(Debug, Error)]
pub enum SyncError {
    /// The desired-state files could not be read.
    #[error("data source error: {0}")]
    Source(#[from] SourceError),

    /// The group catalog could not be fetched.
    #[error("could not fetch groups from Omni: {0}")]
    Catalog(#[from] ApiError),
}
