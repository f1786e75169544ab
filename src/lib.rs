// docksteady — declare the state of one docker container; the image is
// built or pulled as needed and the container is converged on that state
// with the minimal set of runtime actions. Designed to be run repeatedly:
// a second invocation with identical inputs changes nothing.

pub mod command;
pub mod config;
pub mod container;
pub mod error;
pub mod history;
pub mod params;
pub mod reconcile;
pub mod runtime;

pub use container::ContainerSpec;
pub use error::Error;
pub use params::{DesiredState, Params};
pub use reconcile::{Outcome, reconcile};
