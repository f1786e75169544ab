// Shared test double for the container engine.

use std::cell::RefCell;
use std::path::Path;

use chrono::{Duration, NaiveDateTime, Utc};

use docksteady::container::ContainerSpec;
use docksteady::history::HistoryStore;
use docksteady::params::Params;
use docksteady::runtime::{ContainerState, Runtime, RuntimeError};

/// In-memory stand-in for the docker CLI. Records every action in order
/// and simulates the state transitions the real engine would make, so a
/// second reconciliation observes what the first one produced.
pub struct MockRuntime {
    state: RefCell<ContainerState>,
    image_created: RefCell<Option<NaiveDateTime>>,
    image_id: RefCell<Option<String>>,
    calls: RefCell<Vec<String>>,
    pub fail_on: Option<&'static str>,
}

impl MockRuntime {
    pub fn new(state: ContainerState) -> Self {
        Self {
            state: RefCell::new(state),
            image_created: RefCell::new(None),
            image_id: RefCell::new(None),
            calls: RefCell::new(Vec::new()),
            fail_on: None,
        }
    }

    /// Pretend the image already exists locally.
    pub fn with_image_present(self) -> Self {
        *self.image_id.borrow_mut() = Some("sha256:0123abcd".to_string());
        *self.image_created.borrow_mut() = Some(Utc::now().naive_utc());
        self
    }

    /// Backdate the image creation time, making every source file look
    /// newer than the image.
    pub fn age_image(&self, hours: i64) {
        let mut created = self.image_created.borrow_mut();
        if let Some(t) = *created {
            *created = Some(t - Duration::hours(hours));
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, sub: &str) -> Result<(), RuntimeError> {
        self.calls.borrow_mut().push(sub.to_string());
        if self.fail_on == Some(sub) {
            return Err(RuntimeError {
                command: format!("docker {sub}"),
                output: "mock failure".to_string(),
            });
        }
        Ok(())
    }
}

impl Runtime for MockRuntime {
    fn container_state(&self, _name: &str) -> ContainerState {
        *self.state.borrow()
    }

    fn image_created(&self, _image: &str) -> Option<NaiveDateTime> {
        *self.image_created.borrow()
    }

    fn image_id(&self, _image: &str) -> Option<String> {
        self.image_id.borrow().clone()
    }

    fn run(&self, _argv: &[String]) -> Result<(), RuntimeError> {
        self.record("run")?;
        *self.state.borrow_mut() = ContainerState::Running;
        Ok(())
    }

    fn build(&self, _argv: &[String], _context_dir: &Path) -> Result<(), RuntimeError> {
        self.record("build")?;
        // A fresh build is newer than anything in the build context.
        *self.image_created.borrow_mut() = Some(Utc::now().naive_utc() + Duration::hours(1));
        Ok(())
    }

    fn pull(&self, _image: &str) -> Result<(), RuntimeError> {
        self.record("pull")?;
        *self.image_id.borrow_mut() = Some("sha256:pulled".to_string());
        Ok(())
    }

    fn start(&self, _name: &str) -> Result<(), RuntimeError> {
        self.record("start")?;
        *self.state.borrow_mut() = ContainerState::Running;
        Ok(())
    }

    fn stop(&self, _name: &str) -> Result<(), RuntimeError> {
        self.record("stop")?;
        *self.state.borrow_mut() = ContainerState::Stopped;
        Ok(())
    }

    fn restart(&self, _name: &str) -> Result<(), RuntimeError> {
        self.record("restart")?;
        *self.state.borrow_mut() = ContainerState::Running;
        Ok(())
    }

    fn remove(&self, _name: &str) -> Result<(), RuntimeError> {
        self.record("rm")?;
        *self.state.borrow_mut() = ContainerState::Absent;
        Ok(())
    }
}

/// Parse params YAML into a validated spec.
pub fn spec(yaml: &str) -> ContainerSpec {
    let params: Params = serde_yaml::from_str(yaml).expect("params should parse");
    ContainerSpec::from_params(params).expect("spec should validate")
}

/// A scratch state directory backed by a tempdir.
pub fn scratch_store() -> (tempfile::TempDir, HistoryStore) {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    let store = HistoryStore::open(dir.path().join("state")).expect("failed to open store");
    (dir, store)
}
