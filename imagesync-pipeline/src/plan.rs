//! Read-only preview of a run: per-image decisions and the job diff.

use std::path::{Path, PathBuf};

use similar::TextDiff;

use crate::collab::RegistryLister;
use crate::error::PipelineError;
use crate::generator::TemplateJobGenerator;
use crate::pipeline::{observe, Observation};
use crate::writer::read_existing;

/// Unified diff between the job file on disk and what regeneration would
/// write. `unified_diff` is empty when they already match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobsDiff {
    pub path: PathBuf,
    pub unified_diff: String,
}

impl JobsDiff {
    pub fn is_empty(&self) -> bool {
        self.unified_diff.is_empty()
    }
}

/// Result of [`plan`].
#[derive(Debug, Clone)]
pub struct Plan {
    pub observation: Observation,
    pub jobs_diff: Option<JobsDiff>,
}

/// Observe and reconcile without building, pushing or writing anything.
///
/// With `jobs`, also renders the job definitions and diffs them against the
/// current output file.
pub fn plan(
    images_config: &Path,
    repository: &str,
    registry: &mut dyn RegistryLister,
    jobs: Option<&TemplateJobGenerator>,
) -> Result<Plan, PipelineError> {
    let observation = observe(images_config, repository, registry)?;
    let jobs_diff = match jobs {
        Some(generator) => Some(diff_jobs(generator, &observation)?),
        None => None,
    };
    Ok(Plan {
        observation,
        jobs_diff,
    })
}

fn diff_jobs(
    generator: &TemplateJobGenerator,
    observation: &Observation,
) -> Result<JobsDiff, PipelineError> {
    let generation_err = |source| PipelineError::Generation { source };
    let rendered = generator
        .render(&observation.config.image_repo, &observation.desired)
        .map_err(generation_err)?;
    let existing = read_existing(generator.output())
        .map_err(generation_err)?
        .unwrap_or_default();

    let path = generator.output().to_path_buf();
    if existing == rendered {
        return Ok(JobsDiff {
            path,
            unified_diff: String::new(),
        });
    }

    let name = path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    );
    let unified_diff = TextDiff::from_lines(&existing, &rendered)
        .unified_diff()
        .header(&format!("a/{name}"), &format!("b/{name}"))
        .context_radius(3)
        .to_string();
    Ok(JobsDiff { path, unified_diff })
}
