// Reconciliation — decide and execute the minimal sequence of runtime
// actions that converges one container on its desired state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::command;
use crate::container::ContainerSpec;
use crate::error::Error;
use crate::history::{CommandRecord, HistoryStore};
use crate::params::DesiredState;
use crate::runtime::{ContainerState, Runtime};

/// What a reconciliation did, and why. `change_reason` lists every
/// decision and action in execution order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Outcome {
    pub changed: bool,
    pub change_reason: Vec<String>,
}

/// Converge the container described by `spec` on `state`.
///
/// The previous invocation's command strings are loaded from `store` up
/// front. When the target is a running state and a full running
/// specification was computed, the freshly built pair is written back on
/// every exit path, action failure included. A stop leaves the record
/// untouched, so the memory of the last good running configuration
/// survives stop/start cycles.
pub fn reconcile<R: Runtime>(
    spec: &ContainerSpec,
    state: DesiredState,
    runtime: &R,
    store: &HistoryStore,
) -> Result<Outcome, Error> {
    let prev = store.load(&spec.name)?;
    let mut rec = Reconciler::new(spec, runtime, prev);

    let result = match state {
        DesiredState::Running => rec.ensure_running(),
        DesiredState::Restarted => rec.ensure_restarted(),
        DesiredState::Stopped => rec.ensure_stopped(),
    };

    if state != DesiredState::Stopped && rec.has_full_command_pair() {
        store.save(
            &spec.name,
            &CommandRecord {
                build: rec.build_str.clone(),
                run: rec.run_str.clone(),
            },
        )?;
    }

    result?;
    info!(container = %spec.name, changed = rec.changed, "reconciliation finished");
    Ok(Outcome {
        changed: rec.changed,
        change_reason: rec.reasons,
    })
}

struct Reconciler<'a, R: Runtime> {
    spec: &'a ContainerSpec,
    runtime: &'a R,
    prev: CommandRecord,
    build_cmd: Option<Vec<String>>,
    run_cmd: Option<Vec<String>>,
    build_str: String,
    run_str: String,
    changed: bool,
    reasons: Vec<String>,
}

impl<'a, R: Runtime> Reconciler<'a, R> {
    fn new(spec: &'a ContainerSpec, runtime: &'a R, prev: CommandRecord) -> Self {
        let build_cmd = command::build_command(spec);
        let run_cmd = command::run_command(spec);
        let build_str = build_cmd.as_deref().map(command::canonical).unwrap_or_default();
        let run_str = run_cmd.as_deref().map(command::canonical).unwrap_or_default();
        Self {
            spec,
            runtime,
            prev,
            build_cmd,
            run_cmd,
            build_str,
            run_str,
            changed: false,
            reasons: Vec::new(),
        }
    }

    /// The record is only worth persisting once the full pair exists: a
    /// run command, plus a build command when the image is built locally.
    fn has_full_command_pair(&self) -> bool {
        self.run_cmd.is_some() && (!self.spec.is_local_image() || self.build_cmd.is_some())
    }

    fn reason(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        debug!(container = %self.spec.name, "{msg}");
        self.reasons.push(msg);
    }

    // ── Target states ─────────────────────────────────────────────────

    /// Freshness first (rebuild or pull as needed), then converge on a
    /// running container. A running container whose image or run command
    /// changed is recreated — the engine cannot reconfigure in place.
    fn ensure_running(&mut self) -> Result<(), Error> {
        self.refresh_image()?;

        let drifted = self.run_str != self.prev.run;
        if drifted {
            self.reason("Arguments changed for run command");
        }

        match self.runtime.container_state(&self.spec.name) {
            ContainerState::Running => {
                if self.changed || drifted {
                    self.stop()?;
                    self.remove()?;
                    self.run()?;
                }
            }
            ContainerState::Absent => self.run()?,
            ContainerState::Stopped => {
                if self.changed || drifted {
                    self.remove()?;
                    self.run()?;
                } else {
                    self.start()?;
                }
            }
        }
        Ok(())
    }

    /// Cycle the container. Deliberately no freshness check: restart
    /// means "bounce what is there", not "also update the image".
    fn ensure_restarted(&mut self) -> Result<(), Error> {
        match self.runtime.container_state(&self.spec.name) {
            ContainerState::Running => self.restart()?,
            ContainerState::Absent => self.run()?,
            ContainerState::Stopped => {
                if self.changed {
                    self.remove()?;
                    self.run()?;
                } else {
                    self.start()?;
                }
            }
        }
        Ok(())
    }

    /// Stop the container if it runs. No removal, no image action.
    fn ensure_stopped(&mut self) -> Result<(), Error> {
        if self.runtime.container_state(&self.spec.name) == ContainerState::Running {
            self.stop()?;
        }
        Ok(())
    }

    // ── Freshness checks ──────────────────────────────────────────────

    fn refresh_image(&mut self) -> Result<(), Error> {
        if self.spec.is_local_image() {
            if self.needs_rebuild() {
                self.build()?;
            }
        } else if self.needs_pull() {
            self.pull()?;
        }
        Ok(())
    }

    /// A local image is stale when the build command drifted, the image is
    /// missing, or any file under the Dockerfile directory is newer than
    /// the image. Coarse on purpose: any touched file anywhere in the
    /// build context forces a rebuild.
    fn needs_rebuild(&mut self) -> bool {
        if self.build_str != self.prev.build {
            self.reason("Arguments changed for build command");
            return true;
        }

        let image = self.spec.image.as_deref().unwrap_or_default();
        let created = match self.runtime.image_created(image) {
            Some(t) => t,
            None => {
                self.reason("Image not found, needs rebuild");
                return true;
            }
        };

        let path = match &self.spec.path {
            Some(p) => p.clone(),
            None => return false,
        };
        for entry in WalkDir::new(path).into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let modified = match entry.metadata().ok().and_then(|m| m.modified().ok()) {
                Some(t) => t,
                None => continue,
            };
            if DateTime::<Utc>::from(modified).naive_utc() > created {
                self.reason(format!(
                    "File changed: {}",
                    entry.file_name().to_string_lossy()
                ));
                return true;
            }
        }
        false
    }

    /// A pulled image only needs a pull when it is missing locally. Whether
    /// the registry has a newer version is not checked.
    fn needs_pull(&mut self) -> bool {
        match self.runtime.image_id(self.spec.image.as_deref().unwrap_or_default()) {
            Some(id) if !id.is_empty() => false,
            _ => {
                self.reason("Image not found, needs pull");
                true
            }
        }
    }

    // ── Primitive actions ─────────────────────────────────────────────

    fn run(&mut self) -> Result<(), Error> {
        let argv = self
            .run_cmd
            .clone()
            .ok_or_else(|| Error::InvalidArgument("no image name provided".into()))?;
        self.runtime.run(&argv)?;
        self.reason("Executed 'docker run'");
        self.changed = true;
        Ok(())
    }

    fn start(&mut self) -> Result<(), Error> {
        self.runtime.start(&self.spec.name)?;
        self.reason("Executed 'docker start'");
        self.changed = true;
        Ok(())
    }

    /// A plain restart cannot apply a rebuilt image or changed options, so
    /// a prior change escalates to full recreation.
    fn restart(&mut self) -> Result<(), Error> {
        if self.changed {
            self.stop()?;
            self.remove()?;
            self.run()
        } else {
            self.runtime.restart(&self.spec.name)?;
            self.reason("Executed 'docker restart'");
            self.changed = true;
            Ok(())
        }
    }

    fn stop(&mut self) -> Result<(), Error> {
        self.runtime.stop(&self.spec.name)?;
        self.reason("Executed 'docker stop'");
        self.changed = true;
        Ok(())
    }

    fn remove(&mut self) -> Result<(), Error> {
        self.runtime.remove(&self.spec.name)?;
        self.reason("Executed 'docker rm'");
        self.changed = true;
        Ok(())
    }

    fn build(&mut self) -> Result<(), Error> {
        if let (Some(argv), Some(dir)) = (self.build_cmd.as_ref(), self.spec.path.as_ref()) {
            self.runtime.build(argv, dir)?;
            self.reason("Executed 'docker build'");
            self.changed = true;
        }
        Ok(())
    }

    fn pull(&mut self) -> Result<(), Error> {
        let image = self
            .spec
            .image
            .clone()
            .ok_or_else(|| Error::InvalidArgument("no image name provided".into()))?;
        self.runtime.pull(&image)?;
        self.reason("Executed 'docker pull'");
        self.changed = true;
        Ok(())
    }
}
