//! Error types for imagesync-pipeline.

use std::path::PathBuf;

use thiserror::Error;

use imagesync_core::ConfigError;
use imagesync_renderer::RenderError;

/// All errors that abort a pipeline run.
///
/// Every variant is fatal: the run stops at the step that produced it and
/// nothing already done (e.g. a pushed image) is undone.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A boolean-like flag held something other than `true` or `false`.
    #[error("--{flag} invalid: only accepts true or false (got '{value}')")]
    InvalidFlag { flag: &'static str, value: String },

    /// Desired-state configuration could not be loaded or validated.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("registry error listing '{repository}': {source}")]
    Registry {
        repository: String,
        #[source]
        source: StepFailure,
    },

    #[error("build failed for image '{image}': {source}")]
    Build {
        image: String,
        #[source]
        source: StepFailure,
    },

    #[error("push failed for image '{image}': {source}")]
    Push {
        image: String,
        #[source]
        source: StepFailure,
    },

    #[error("job generation failed: {source}")]
    Generation {
        #[source]
        source: StepFailure,
    },

    #[error("change request submission failed on branch '{branch}': {source}")]
    Submission {
        branch: String,
        #[source]
        source: StepFailure,
    },
}

/// Low-level cause of an external step failing.
#[derive(Debug, Error)]
pub enum StepFailure {
    /// The external program could not be started.
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external program ran and exited unsuccessfully.
    #[error("`{command}` exited with {status}: {stderr}")]
    Exit {
        command: String,
        status: String,
        stderr: String,
    },

    /// The external program succeeded but its output made no sense.
    #[error("unexpected output from `{command}`: {reason}")]
    Output { command: String, reason: String },

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`StepFailure::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StepFailure {
    StepFailure::Io {
        path: path.into(),
        source,
    }
}
