//! Domain types shared by the reducer, the reconciliation engine and the
//! pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::version::Version;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for an image line (e.g. `integration-test`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ImageName(pub String);

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ImageName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ImageName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Desired / observed state
// ---------------------------------------------------------------------------

/// One image line as declared in the images config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSpec {
    pub name: ImageName,
    pub declared_version: Version,
}

/// One tag of one image line as listed by the registry.
///
/// `tag` is the version part only; the registry lister is responsible for
/// splitting the published tag into `name` and `tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryImageRecord {
    pub name: ImageName,
    pub tag: String,
    pub pushed_at: DateTime<Utc>,
}

/// Tag an image is published under in the registry: `<name>-<version>`.
pub fn remote_tag(name: &ImageName, version: &Version) -> String {
    format!("{}-{}", name.0, version.as_str())
}

/// Tag of the locally built image: `<name>:<version>`.
pub fn local_image_ref(name: &ImageName, version: &Version) -> String {
    format!("{}:{}", name.0, version.as_str())
}

// ---------------------------------------------------------------------------
// BuildSet
// ---------------------------------------------------------------------------

/// The images that must be built and pushed, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BuildSet(Vec<ImageSpec>);

impl BuildSet {
    pub fn new(entries: Vec<ImageSpec>) -> Self {
        Self(entries)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImageSpec> {
        self.0.iter()
    }

    pub fn get(&self, name: &ImageName) -> Option<&Version> {
        self.0
            .iter()
            .find(|spec| &spec.name == name)
            .map(|spec| &spec.declared_version)
    }
}

impl<'a> IntoIterator for &'a BuildSet {
    type Item = &'a ImageSpec;
    type IntoIter = std::slice::Iter<'a, ImageSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// `name: version` pairs separated by `, `, e.g. `deploy: 0.0.4, unit-test: 1.2.0`.
impl fmt::Display for BuildSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, spec) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", spec.name, spec.declared_version)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
