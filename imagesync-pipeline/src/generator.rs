//! Job-definition regeneration from templates.

use std::path::{Path, PathBuf};

use imagesync_core::config::load_jobs_config_at;
use imagesync_core::ImageSpec;
use imagesync_renderer::{JobContext, JobRenderer};

use crate::collab::JobGenerator;
use crate::error::{PipelineError, StepFailure};
use crate::writer::{atomic_write, WriteResult};

/// Renders `<templates_dir>` against `<jobs_config>` into `<output>`.
#[derive(Debug, Clone)]
pub struct TemplateJobGenerator {
    pub jobs_config: PathBuf,
    pub templates_dir: PathBuf,
    pub output: PathBuf,
}

impl TemplateJobGenerator {
    pub fn new(
        jobs_config: impl Into<PathBuf>,
        templates_dir: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        TemplateJobGenerator {
            jobs_config: jobs_config.into(),
            templates_dir: templates_dir.into(),
            output: output.into(),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Render the job-definitions file without touching disk.
    pub fn render(&self, image_repo: &str, images: &[ImageSpec]) -> Result<String, StepFailure> {
        let jobs = load_jobs_config_at(&self.jobs_config)?;
        let renderer = JobRenderer::from_dir(&self.templates_dir)?;
        tracing::debug!(
            "rendering {} job template(s) from {}",
            renderer.document_names().len(),
            self.templates_dir.display()
        );
        let ctx = JobContext::new(image_repo, images, &jobs)?;
        Ok(renderer.render(&ctx)?)
    }

    /// Render and write the output file.
    pub fn write(
        &self,
        image_repo: &str,
        images: &[ImageSpec],
        dry_run: bool,
    ) -> Result<WriteResult, StepFailure> {
        let content = self.render(image_repo, images)?;
        atomic_write(&self.output, &content, dry_run)
    }
}

impl JobGenerator for TemplateJobGenerator {
    fn generate(&mut self, image_repo: &str, images: &[ImageSpec]) -> Result<WriteResult, PipelineError> {
        self.write(image_repo, images, false)
            .map_err(|source| PipelineError::Generation { source })
    }
}
