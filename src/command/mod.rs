// Command Builder — pure translation of a container spec into `docker`
// argument vectors. No side effects, no I/O.

use std::collections::BTreeMap;

use crate::container::ContainerSpec;
use crate::params::{OptionValue, Scalar};

/// Build the `docker build` argv for a local image, or `None` in
/// remote-pull mode.
///
/// `--no-cache` is always passed: the rebuild decision compares file
/// mtimes against the image creation time, and a cached build would leave
/// that timestamp stale. The trailing `.` is the build context; the
/// executor is responsible for running this from the Dockerfile directory.
pub fn build_command(spec: &ContainerSpec) -> Option<Vec<String>> {
    if !spec.is_local_image() {
        return None;
    }
    let image = spec.image.as_ref()?;

    let mut build_args = spec.build_args.clone();
    build_args.insert(
        "tag".to_string(),
        OptionValue::Single(Scalar::Str(image.clone())),
    );

    let mut cmd = serialize_options("build", &build_args);
    cmd.push("--no-cache".to_string());
    cmd.push(".".to_string());
    Some(cmd)
}

/// Build the `docker run` argv, or `None` when no image was declared
/// (a stopped-only invocation).
///
/// The in-container command has no flag name — it is positional and comes
/// after the image reference. `-d` is always passed; a foreground container
/// would block the whole reconciliation.
pub fn run_command(spec: &ContainerSpec) -> Option<Vec<String>> {
    let image = spec.image.as_ref()?;

    let mut cmd = serialize_options("run", &spec.options);
    cmd.push("-d".to_string());
    cmd.push(image.clone());
    cmd.extend(spec.command.iter().cloned());
    Some(cmd)
}

/// Canonical single-line form of an argv, used for drift comparison
/// against the persisted record. Tokens needing quotes are quoted, so the
/// mapping from argv to string is unambiguous.
pub fn canonical(argv: &[String]) -> String {
    shell_words::join(argv)
}

/// The generic serialization rule: `--` + key with `_` replaced by `-`,
/// list values emitting the flag once per element. Map iteration order is
/// sorted, so two invocations with the same options always produce the
/// same argv.
fn serialize_options(subcommand: &str, options: &BTreeMap<String, OptionValue>) -> Vec<String> {
    let mut cmd = vec!["docker".to_string(), subcommand.to_string()];
    for (key, value) in options {
        let flag = format!("--{}", key.replace('_', "-"));
        match value {
            OptionValue::Many(items) => {
                for item in items {
                    cmd.push(flag.clone());
                    cmd.push(item.to_string());
                }
            }
            OptionValue::Single(item) => {
                cmd.push(flag.clone());
                cmd.push(item.to_string());
            }
        }
    }
    cmd
}
