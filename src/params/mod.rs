// Front-end contract: the declarative option mapping one invocation supplies.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The state the container is declared to be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    Running,
    Stopped,
    Restarted,
}

impl DesiredState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DesiredState::Running => "running",
            DesiredState::Stopped => "stopped",
            DesiredState::Restarted => "restarted",
        }
    }
}

/// A single option leaf. Docker takes strings on the command line, but
/// params files naturally write numbers and booleans, so all three are
/// accepted and rendered to their string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Str(v) => f.write_str(v),
        }
    }
}

/// Value of one runtime option. List-valued options emit their flag once
/// per element (`publish: [80:80, 443:443]` becomes two `--publish` pairs).
///
/// Absence is expressed by leaving the key out of the mapping (or writing
/// an explicit `null`); an explicit `0`, `false` or empty string is a real
/// value and is passed through to the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Many(Vec<Scalar>),
    Single(Scalar),
}

/// Everything the front end declares for one invocation.
///
/// `state` and `name` are always required; `image` is required unless the
/// state is `stopped`. Any key beyond the named fields is collected into
/// `options` and translated 1:1 into a long-form flag of the `docker run`
/// command (`network_alias: web` becomes `--network-alias web`).
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    pub state: DesiredState,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub build_args: Option<BTreeMap<String, Option<OptionValue>>>,
    #[serde(flatten)]
    pub options: BTreeMap<String, Option<OptionValue>>,
}

impl Params {
    /// Load params from a YAML (or JSON — YAML is a superset) file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let params: Params = serde_yaml::from_str(&contents)?;
        Ok(params)
    }
}
