//! Registry listing through the AWS CLI.
//!
//! Images live in a single ECR Public repository, tagged `<name>-<version>`
//! (e.g. `integration-test-0.0.15`). The lister splits each tag back into the
//! image line and its version.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use imagesync_core::{ImageName, ImageSpec, RegistryImageRecord};

use crate::collab::RegistryLister;
use crate::error::{PipelineError, StepFailure};
use crate::process::CommandSpec;

/// ECR Public is only served from this region.
pub const ECR_PUBLIC_REGION: &str = "us-east-1";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeImages {
    #[serde(default)]
    image_details: Vec<ImageDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageDetail {
    #[serde(default)]
    image_tags: Vec<String>,
    image_pushed_at: Option<PushedAt>,
}

/// The CLI prints ISO-8601 by default and epoch seconds in some configs.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PushedAt {
    Epoch(f64),
    Text(String),
}

impl PushedAt {
    fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            PushedAt::Epoch(secs) => {
                let whole = secs.trunc() as i64;
                let nanos = (secs.fract() * 1e9) as u32;
                Utc.timestamp_opt(whole, nanos).single()
            }
            PushedAt::Text(text) => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// Split a published tag into `(image line, version)`.
///
/// The version starts after the first `-` that is followed by a digit, or by
/// `v`/`V` and a digit. Tags with no such split are not image tags.
pub fn split_image_tag(tag: &str) -> Option<(ImageName, String)> {
    for (i, _) in tag.match_indices('-') {
        let (name, rest) = (&tag[..i], &tag[i + 1..]);
        if name.is_empty() {
            continue;
        }
        let mut chars = rest.chars();
        let starts_version = match chars.next() {
            Some(c) if c.is_ascii_digit() => true,
            Some('v' | 'V') => chars.next().is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        };
        if starts_version {
            return Some((ImageName::from(name), rest.to_string()));
        }
    }
    None
}

/// Re-split listed records against the declared image names.
///
/// A name may contain a digit-led segment (`python-3`) that [`split_image_tag`]
/// takes for the start of the version. For each record the longest declared
/// name followed by `-` in the published tag wins. Records matching no
/// declared name are kept as listed.
pub fn attribute_to_declared(
    records: Vec<RegistryImageRecord>,
    declared: &[ImageSpec],
) -> Vec<RegistryImageRecord> {
    records
        .into_iter()
        .map(|mut record| {
            let published = format!("{}-{}", record.name, record.tag);
            let best = declared
                .iter()
                .filter_map(|spec| {
                    let rest = published.strip_prefix(spec.name.0.as_str())?.strip_prefix('-')?;
                    (!rest.is_empty()).then_some((&spec.name, rest))
                })
                .max_by_key(|(name, _)| name.0.len());
            if let Some((name, rest)) = best {
                record.tag = rest.to_string();
                record.name = name.clone();
            }
            record
        })
        .collect()
}

/// Parse `aws ecr-public describe-images --output json` output.
pub fn parse_describe_images(json: &str) -> Result<Vec<RegistryImageRecord>, String> {
    let listing: DescribeImages = serde_json::from_str(json).map_err(|e| e.to_string())?;

    let mut records = Vec::new();
    for detail in listing.image_details {
        let pushed_at = detail
            .image_pushed_at
            .as_ref()
            .and_then(PushedAt::to_utc)
            .unwrap_or_default();
        for tag in detail.image_tags {
            match split_image_tag(&tag) {
                Some((name, version)) => records.push(RegistryImageRecord {
                    name,
                    tag: version,
                    pushed_at,
                }),
                None => tracing::debug!("ignoring tag without an image version: {tag}"),
            }
        }
    }
    Ok(records)
}

/// [`RegistryLister`] backed by `aws ecr-public describe-images`.
#[derive(Debug, Clone)]
pub struct EcrPublicLister {
    program: String,
    region: String,
}

impl Default for EcrPublicLister {
    fn default() -> Self {
        EcrPublicLister {
            program: "aws".to_string(),
            region: ECR_PUBLIC_REGION.to_string(),
        }
    }
}

impl EcrPublicLister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different executable instead of `aws` from `PATH`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn command(&self, repository: &str) -> CommandSpec {
        CommandSpec::new(&self.program).args([
            "ecr-public",
            "describe-images",
            "--repository-name",
            repository,
            "--region",
            self.region.as_str(),
            "--output",
            "json",
        ])
    }
}

impl RegistryLister for EcrPublicLister {
    fn list_images(&mut self, repository: &str) -> Result<Vec<RegistryImageRecord>, PipelineError> {
        let registry_err = |source: StepFailure| PipelineError::Registry {
            repository: repository.to_string(),
            source,
        };

        let command = self.command(repository);
        let stdout = command.run().map_err(registry_err)?;
        let records = parse_describe_images(&stdout).map_err(|reason| {
            registry_err(StepFailure::Output {
                command: command.to_string(),
                reason,
            })
        })?;
        tracing::info!("listed {} image tags in '{repository}'", records.len());
        Ok(records)
    }
}
