use thiserror::Error;

use crate::runtime::RuntimeError;

/// Everything that can go wrong during a reconciliation.
///
/// Failed runtime *queries* are deliberately not represented here: a query
/// that fails reads as "does not exist" and reconciliation carries on.
#[derive(Debug, Error)]
pub enum Error {
    /// The image/path/tag combination violates the local-vs-remote naming
    /// rules, or a required value is missing. Detected before any runtime
    /// call is made.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The per-container command record could not be created, read, or
    /// written.
    #[error("Failed to access stored docker commands: {0}")]
    Persistence(#[from] std::io::Error),

    /// A runtime action exited nonzero.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
