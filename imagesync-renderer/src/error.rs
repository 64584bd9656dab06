use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading or rendering job templates.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Template syntax error, or a failure inside a template.
    #[error("job template error: {0}")]
    Tera(#[from] tera::Error),

    /// The jobs config could not be converted into a template context.
    #[error("cannot build template context: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cannot read job templates at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no job templates (*.tera) found under {path}")]
    NoTemplates { path: PathBuf },
}
