// Runtime collaborator — blocking queries and actions against the
// container engine, invoked as an external process.

pub mod cli;

pub use cli::{DockerCli, ensure_available};

use std::path::Path;

use chrono::NaiveDateTime;
use thiserror::Error;

/// A runtime action exited nonzero. Carries the failing command line and
/// its captured output. Queries never produce this — a failed query reads
/// as "does not exist".
#[derive(Debug, Error)]
#[error("Docker command failed: {command}\n\n{output}")]
pub struct RuntimeError {
    pub command: String,
    pub output: String,
}

/// Observed state of a named container. Absence is an ordinary answer,
/// not an error: a transient engine failure is indistinguishable from a
/// missing container and is treated the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Running,
    Stopped,
    Absent,
}

/// Interface to the container engine. Everything is synchronous and
/// blocking; calls are made strictly in sequence, and there is no timeout
/// handling — a hung engine hangs the reconciliation.
pub trait Runtime {
    /// Probe the running flag of a named container.
    fn container_state(&self, name: &str) -> ContainerState;

    /// Creation timestamp of a local image, or `None` if the image does
    /// not exist (or the query failed).
    fn image_created(&self, image: &str) -> Option<NaiveDateTime>;

    /// Local image ID for a reference, or `None` if not present locally.
    fn image_id(&self, image: &str) -> Option<String>;

    /// Execute a full `docker run` argv.
    fn run(&self, argv: &[String]) -> Result<(), RuntimeError>;

    /// Execute a full `docker build` argv from the given context directory.
    fn build(&self, argv: &[String], context_dir: &Path) -> Result<(), RuntimeError>;

    fn pull(&self, image: &str) -> Result<(), RuntimeError>;
    fn start(&self, name: &str) -> Result<(), RuntimeError>;
    fn stop(&self, name: &str) -> Result<(), RuntimeError>;
    fn restart(&self, name: &str) -> Result<(), RuntimeError>;
    fn remove(&self, name: &str) -> Result<(), RuntimeError>;
}
