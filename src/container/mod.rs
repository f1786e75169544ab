// Validated container specification — naming rules for local vs. pulled
// images are enforced here, before anything touches the runtime.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::Error;
use crate::params::{OptionValue, Params, Scalar};

/// Tag appended to every locally built image. Keeps locally built and
/// pulled images distinguishable in `docker images` output.
pub const LOCAL_TAG: &str = ":local";

/// A validated specification for one named container.
///
/// Two modes, selected by `path`:
/// - local-build: `path` points at the Dockerfile directory; `image` gets
///   the reserved `:local` tag and the image is built from that context.
/// - remote-pull: no `path`; `image` is fetched from a registry.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    pub name: String,
    pub image: Option<String>,
    pub path: Option<PathBuf>,
    /// In-container process, already split into tokens. Empty means the
    /// image default is used.
    pub command: Vec<String>,
    pub build_args: BTreeMap<String, OptionValue>,
    pub options: BTreeMap<String, OptionValue>,
}

impl ContainerSpec {
    /// Validate front-end params into a spec.
    ///
    /// The container name doubles as the `--name` flag of the run command,
    /// so it is folded into the option mapping here.
    pub fn from_params(params: Params) -> Result<Self, Error> {
        let Params {
            state: _,
            name,
            image,
            path,
            command,
            build_args,
            options,
        } = params;

        let image = match (&path, image) {
            (Some(_), None) => {
                return Err(Error::InvalidArgument(
                    "an image name is required to build a local image".into(),
                ));
            }
            (Some(_), Some(image)) => {
                if image.contains(':') {
                    return Err(Error::InvalidArgument(
                        "no tags are allowed when building a local image".into(),
                    ));
                }
                Some(format!("{image}{LOCAL_TAG}"))
            }
            (None, Some(image)) => {
                if image.ends_with(LOCAL_TAG) {
                    return Err(Error::InvalidArgument(format!(
                        "the '{}' tag is reserved for locally built images",
                        &LOCAL_TAG[1..]
                    )));
                }
                Some(image)
            }
            (None, None) => None,
        };

        let command = match command {
            Some(c) if !c.is_empty() => shell_words::split(&c)
                .map_err(|e| Error::InvalidArgument(format!("unparseable command: {e}")))?,
            _ => Vec::new(),
        };

        // Explicit nulls mean "absent" and are dropped here, so downstream
        // code only ever sees live values.
        let mut options = strip_absent(options);
        options.insert("name".to_string(), OptionValue::Single(Scalar::Str(name.clone())));

        Ok(Self {
            name,
            image,
            path,
            command,
            build_args: strip_absent(build_args.unwrap_or_default()),
            options,
        })
    }

    pub fn is_local_image(&self) -> bool {
        self.path.is_some()
    }
}

fn strip_absent(
    map: BTreeMap<String, Option<OptionValue>>,
) -> BTreeMap<String, OptionValue> {
    map.into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::DesiredState;

    fn params(yaml: &str) -> Params {
        serde_yaml::from_str(yaml).expect("params should parse")
    }

    #[test]
    fn local_image_gets_reserved_tag() {
        let spec = ContainerSpec::from_params(params(
            "state: running\nname: web\nimage: app\npath: /srv/app\n",
        ))
        .unwrap();
        assert_eq!(spec.image.as_deref(), Some("app:local"));
        assert!(spec.is_local_image());
    }

    #[test]
    fn local_image_with_tag_is_rejected() {
        let err = ContainerSpec::from_params(params(
            "state: running\nname: web\nimage: foo:v1\npath: /srv/app\n",
        ))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn pulled_image_with_reserved_tag_is_rejected() {
        let err = ContainerSpec::from_params(params(
            "state: running\nname: web\nimage: foo:local\n",
        ))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn local_mode_without_image_is_rejected() {
        let err = ContainerSpec::from_params(params(
            "state: stopped\nname: web\npath: /srv/app\n",
        ))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn stopped_without_image_is_fine() {
        let spec =
            ContainerSpec::from_params(params("state: stopped\nname: web\n")).unwrap();
        assert_eq!(spec.image, None);
        assert!(!spec.is_local_image());
    }

    #[test]
    fn name_is_folded_into_run_options() {
        let spec = ContainerSpec::from_params(params(
            "state: running\nname: web\nimage: nginx\n",
        ))
        .unwrap();
        assert_eq!(
            spec.options.get("name"),
            Some(&OptionValue::Single(Scalar::Str("web".into())))
        );
    }

    #[test]
    fn null_options_are_dropped() {
        let spec = ContainerSpec::from_params(params(
            "state: running\nname: web\nimage: nginx\nhostname: null\n",
        ))
        .unwrap();
        assert!(!spec.options.contains_key("hostname"));
    }

    #[test]
    fn command_is_tokenized() {
        let spec = ContainerSpec::from_params(params(
            "state: running\nname: web\nimage: nginx\ncommand: sleep 100\n",
        ))
        .unwrap();
        assert_eq!(spec.command, vec!["sleep", "100"]);
    }

    #[test]
    fn empty_command_means_image_default() {
        let spec = ContainerSpec::from_params(params(
            "state: running\nname: web\nimage: nginx\ncommand: \"\"\n",
        ))
        .unwrap();
        assert!(spec.command.is_empty());
    }

    #[test]
    fn unbalanced_quotes_in_command_are_rejected() {
        let err = ContainerSpec::from_params(params(
            "state: running\nname: web\nimage: nginx\ncommand: \"echo 'oops\"\n",
        ))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn desired_state_is_not_part_of_the_spec() {
        let p = params("state: restarted\nname: web\nimage: nginx\n");
        assert_eq!(p.state, DesiredState::Restarted);
        let spec = ContainerSpec::from_params(p).unwrap();
        assert!(!spec.options.contains_key("state"));
    }
}
