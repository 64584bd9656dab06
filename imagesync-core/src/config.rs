//! YAML configuration files.
//!
//! | File                 | Type           | Used by                 |
//! |----------------------|----------------|-------------------------|
//! | `images_config.yaml` | [`ImagesConfig`] | reconcile, push, jobs |
//! | `build_config.yaml`  | [`BuildConfig`]  | build                 |
//! | `jobs_config.yaml`   | `serde_yaml::Value` | job templates      |
//!
//! Each loader returns `ConfigError::NotFound` if the file is absent and
//! `ConfigError::Parse` (with path + line context) if it is malformed.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::types::{ImageName, ImageSpec};
use crate::version::{ParseVersion, VersionScheme};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One `name: version` entry of the `images` mapping, as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclaredImage {
    pub name: ImageName,
    pub version: String,
}

/// Root of `images_config.yaml`.
///
/// ```yaml
/// image_repo: public.ecr.aws/example/prow
/// version_scheme: dotted
/// images:
///   integration-test: "0.0.15"
///   unit-test: "0.0.9"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImagesConfig {
    /// Registry repository URI that built images are pushed to.
    pub image_repo: String,
    #[serde(default)]
    pub version_scheme: VersionScheme,
    /// Declared images in file order.
    #[serde(deserialize_with = "ordered_images")]
    pub images: Vec<DeclaredImage>,
}

/// Root of `build_config.yaml`: toolchain pins handed to the build tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildConfig {
    pub pins: BTreeMap<String, String>,
}

impl BuildConfig {
    /// Pins as `(KEY, value)` build arguments, keys upper-cased.
    pub fn build_args(&self) -> Vec<(String, String)> {
        self.pins
            .iter()
            .map(|(k, v)| (k.to_ascii_uppercase(), v.clone()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Load `images_config.yaml` from `path`.
pub fn load_images_config_at(path: &Path) -> Result<ImagesConfig, ConfigError> {
    load_yaml_at(path)
}

/// Load `build_config.yaml` from `path`.
pub fn load_build_config_at(path: &Path) -> Result<BuildConfig, ConfigError> {
    load_yaml_at(path)
}

/// Load `jobs_config.yaml` from `path` as an untyped YAML document.
pub fn load_jobs_config_at(path: &Path) -> Result<serde_yaml::Value, ConfigError> {
    load_yaml_at(path)
}

fn load_yaml_at<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Desired state
// ---------------------------------------------------------------------------

/// Parse every declared version into the desired state, in file order.
///
/// All-or-nothing: the first unparsable version aborts with
/// [`ConfigError::InvalidDeclaredVersion`], so a partial desired state is
/// never handed to the reconciliation engine.
pub fn desired_images<P>(config: &ImagesConfig, parser: &P) -> Result<Vec<ImageSpec>, ConfigError>
where
    P: ParseVersion + ?Sized,
{
    if config.images.is_empty() {
        return Err(ConfigError::NoImagesDeclared);
    }

    let mut seen = HashSet::new();
    let mut desired = Vec::with_capacity(config.images.len());
    for image in &config.images {
        if !seen.insert(&image.name) {
            return Err(ConfigError::DuplicateImage {
                name: image.name.clone(),
            });
        }
        let declared_version =
            parser
                .parse(&image.version)
                .map_err(|source| ConfigError::InvalidDeclaredVersion {
                    name: image.name.clone(),
                    source,
                })?;
        desired.push(ImageSpec {
            name: image.name.clone(),
            declared_version,
        });
    }
    Ok(desired)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Keep the `images` mapping in file order and insist on string versions.
///
/// An unquoted `1.10` is a YAML float and would silently become `1.1`.
fn ordered_images<'de, D>(deserializer: D) -> Result<Vec<DeclaredImage>, D::Error>
where
    D: Deserializer<'de>,
{
    let mapping = serde_yaml::Mapping::deserialize(deserializer)?;
    let mut images = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let serde_yaml::Value::String(name) = key else {
            return Err(de::Error::custom("image names must be strings"));
        };
        let version = match value {
            serde_yaml::Value::String(version) => version,
            other => {
                return Err(de::Error::custom(format!(
                    "version for image '{name}' must be a quoted string, got {other:?}"
                )))
            }
        };
        images.push(DeclaredImage {
            name: ImageName::from(name),
            version,
        });
    }
    Ok(images)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
