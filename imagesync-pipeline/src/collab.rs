//! Seams between the orchestrator and the outside world.
//!
//! The orchestrator only talks to these traits. Production implementations
//! shell out (`aws`, `docker`, `git`, `gh`); tests plug in recording fakes.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use imagesync_core::{BuildConfig, BuildSet, ImageSpec, RegistryImageRecord};

use crate::error::PipelineError;
use crate::writer::WriteResult;

/// Lists every tagged image in a registry repository.
pub trait RegistryLister {
    fn list_images(&mut self, repository: &str) -> Result<Vec<RegistryImageRecord>, PipelineError>;
}

/// Builds every image of a build set locally.
pub trait ImageBuilder {
    fn build(&mut self, build_set: &BuildSet, build_config: &BuildConfig) -> Result<(), PipelineError>;
}

/// Tags and publishes locally built images to `image_repo`.
pub trait ImagePusher {
    fn push(&mut self, image_repo: &str, build_set: &BuildSet) -> Result<(), PipelineError>;
}

/// Regenerates job definitions so they reference the declared images.
pub trait JobGenerator {
    fn generate(&mut self, image_repo: &str, images: &[ImageSpec]) -> Result<WriteResult, PipelineError>;
}

/// Opens a change request against the source repository.
pub trait ChangeProposer {
    fn propose(&mut self, change: &ChangeRequest) -> Result<ProposedChange, PipelineError>;
}

// ---------------------------------------------------------------------------
// Change requests
// ---------------------------------------------------------------------------

const BRANCH_PREFIX: &str = "imagesync-bump";

/// Everything needed to submit regenerated job definitions for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRequest {
    pub branch: String,
    pub title: String,
    pub description: String,
    pub files: Vec<PathBuf>,
}

/// A submitted change request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposedChange {
    pub branch: String,
    /// Review URL, when the hosting service reported one.
    pub url: Option<String>,
}

/// Branch name unique per run: `imagesync-bump-<unix nanos>`.
pub fn branch_name(now: DateTime<Utc>) -> String {
    let stamp = now
        .timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros());
    format!("{BRANCH_PREFIX}-{stamp}")
}

impl ChangeRequest {
    /// Describe a regeneration triggered by `build_set`.
    pub fn for_build_set(build_set: &BuildSet, files: Vec<PathBuf>, now: DateTime<Utc>) -> Self {
        let mut description = String::from(
            "Rebuilt and pushed images whose declared version is ahead of the registry:\n\n",
        );
        for spec in build_set {
            description.push_str(&format!("- {}: {}\n", spec.name, spec.declared_version));
        }
        description.push_str("\nJob definitions were regenerated to reference the new tags.\n");

        let title = match build_set.len() {
            1 => format!("Bump CI image {}", build_set),
            n => format!("Bump {n} CI images"),
        };

        ChangeRequest {
            branch: branch_name(now),
            title,
            description,
            files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use imagesync_core::{ImageName, ParseVersion, VersionScheme};

    fn spec(name: &str, version: &str) -> ImageSpec {
        ImageSpec {
            name: ImageName::from(name),
            declared_version: VersionScheme::Dotted.parse(version).unwrap(),
        }
    }

    #[test]
    fn branch_name_uses_nanoseconds() {
        let now = Utc.timestamp_opt(1_700_000_000, 123).unwrap();
        assert_eq!(branch_name(now), "imagesync-bump-1700000000000000123");
    }

    #[test]
    fn description_lists_every_image() {
        let set = BuildSet::new(vec![spec("unit-test", "0.0.10"), spec("soak", "0.1.0")]);
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let change = ChangeRequest::for_build_set(&set, vec![PathBuf::from("jobs.yaml")], now);

        assert_eq!(change.title, "Bump 2 CI images");
        assert!(change.description.contains("- unit-test: 0.0.10\n"));
        assert!(change.description.contains("- soak: 0.1.0\n"));
        assert_eq!(change.files, [PathBuf::from("jobs.yaml")]);
    }

    #[test]
    fn single_image_title_names_it() {
        let set = BuildSet::new(vec![spec("deploy", "1.2.0")]);
        let change = ChangeRequest::for_build_set(&set, Vec::new(), Utc::now());
        assert_eq!(change.title, "Bump CI image deploy: 1.2.0");
    }
}
