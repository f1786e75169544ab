use std::path::Path;
use std::process::{Command, Output};

use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use tracing::debug;

use super::{ContainerState, Runtime, RuntimeError};

/// Verify that the Docker daemon is reachable.
pub fn ensure_available() -> Result<()> {
    let status = Command::new("docker")
        .args(["version", "--format", "{{.Server.Version}}"])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .context("failed to invoke `docker` — is it installed and on PATH?")?;

    if !status.success() {
        bail!("docker daemon is not running (exit {})", status);
    }
    Ok(())
}

/// Drives the `docker` binary as a subprocess, one blocking invocation per
/// query or action.
#[derive(Debug, Clone, Copy, Default)]
pub struct DockerCli;

impl DockerCli {
    /// Run a query subcommand. Any failure — spawn error, nonzero exit —
    /// yields `None`; the caller interprets that as absence.
    fn query(&self, args: &[&str]) -> Option<String> {
        let output = Command::new("docker").args(args).output().ok()?;
        if !output.status.success() {
            debug!(?args, "docker query failed, treating as absent");
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run an action argv (first token is the program). Nonzero exit is an
    /// error carrying the command line and combined output.
    fn action(&self, argv: &[String], cwd: Option<&Path>) -> Result<(), RuntimeError> {
        let command_line = shell_words::join(argv);
        debug!(command = %command_line, "executing docker action");

        let (program, args) = argv.split_first().ok_or_else(|| RuntimeError {
            command: command_line.clone(),
            output: "empty command".to_string(),
        })?;

        let mut command = Command::new(program);
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|e| RuntimeError {
            command: command_line.clone(),
            output: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(RuntimeError {
                command: command_line,
                output: combined_output(&output),
            });
        }
        Ok(())
    }

    fn simple_action(&self, subcommand: &str, target: &str) -> Result<(), RuntimeError> {
        let argv = vec![
            "docker".to_string(),
            subcommand.to_string(),
            target.to_string(),
        ];
        self.action(&argv, None)
    }
}

impl Runtime for DockerCli {
    fn container_state(&self, name: &str) -> ContainerState {
        match self.query(&["inspect", "--format", "{{.State.Running}}", name]) {
            Some(s) if s.contains("true") => ContainerState::Running,
            Some(_) => ContainerState::Stopped,
            None => ContainerState::Absent,
        }
    }

    fn image_created(&self, image: &str) -> Option<NaiveDateTime> {
        let raw = self.query(&["inspect", "--format", "{{.Created}}", image])?;
        parse_created(&raw)
    }

    fn image_id(&self, image: &str) -> Option<String> {
        self.query(&["inspect", "--format", "{{.ID}}", image])
            .filter(|id| !id.is_empty())
    }

    fn run(&self, argv: &[String]) -> Result<(), RuntimeError> {
        self.action(argv, None)
    }

    fn build(&self, argv: &[String], context_dir: &Path) -> Result<(), RuntimeError> {
        self.action(argv, Some(context_dir))
    }

    fn pull(&self, image: &str) -> Result<(), RuntimeError> {
        self.simple_action("pull", image)
    }

    fn start(&self, name: &str) -> Result<(), RuntimeError> {
        self.simple_action("start", name)
    }

    fn stop(&self, name: &str) -> Result<(), RuntimeError> {
        self.simple_action("stop", name)
    }

    fn restart(&self, name: &str) -> Result<(), RuntimeError> {
        self.simple_action("restart", name)
    }

    fn remove(&self, name: &str) -> Result<(), RuntimeError> {
        self.simple_action("rm", name)
    }
}

/// Parse the image creation timestamp `docker inspect` reports. The engine
/// emits RFC 3339 with nanosecond precision; only the first 26 characters
/// (microseconds) are significant for the staleness comparison.
fn parse_created(raw: &str) -> Option<NaiveDateTime> {
    let trimmed: String = raw.chars().take(26).collect();
    NaiveDateTime::parse_from_str(&trimmed, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

fn combined_output(output: &Output) -> String {
    let mut s = String::from_utf8_lossy(&output.stdout).into_owned();
    let err = String::from_utf8_lossy(&output.stderr);
    if !err.is_empty() {
        if !s.is_empty() {
            s.push('\n');
        }
        s.push_str(err.trim_end());
    }
    s
}
