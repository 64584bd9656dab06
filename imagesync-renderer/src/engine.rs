//! Tera rendering engine for job definitions.
//!
//! # Template layout
//!
//! ```text
//! <templates_dir>/
//!   10-presubmits.yaml.tera     rendered, in name order
//!   20-periodics.yaml.tera      rendered
//!   _macros.tera                partial: include/import only
//!   shared/_header.tera         overrides the embedded header
//! ```
//!
//! The generated file is the header followed by every rendered document,
//! documents separated by `---`.

use std::collections::BTreeMap;
use std::path::Path;

use tera::Tera;

use crate::context::JobContext;
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Embedded partials
// ---------------------------------------------------------------------------

const HEADER: &str = "shared/_header.tera";

const TPLS: &[(&str, &str)] = &[(HEADER, include_str!("templates/_partials/header.tera"))];

// ---------------------------------------------------------------------------
// Directory loading
// ---------------------------------------------------------------------------

/// Template name for a path relative to the templates root: `/`-separated,
/// lower-case.
fn template_name(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/").to_lowercase()
}

fn is_partial(name: &str) -> bool {
    name.starts_with("shared/") || name.rsplit('/').next().is_some_and(|f| f.starts_with('_'))
}

/// Recursively read every `*.tera` file below `dir` into `out`, keyed by
/// its name relative to `root`.
fn read_templates(
    root: &Path,
    dir: &Path,
    out: &mut BTreeMap<String, String>,
) -> Result<(), RenderError> {
    let io = |path: &Path, source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    };
    for entry in std::fs::read_dir(dir).map_err(|e| io(dir, e))? {
        let path = entry.map_err(|e| io(dir, e))?.path();
        if path.is_dir() {
            read_templates(root, &path, out)?;
            continue;
        }
        if path.extension().is_some_and(|ext| ext == "tera") {
            let source = std::fs::read_to_string(&path).map_err(|e| io(&path, e))?;
            let rel = path.strip_prefix(root).unwrap_or(&path);
            out.insert(template_name(rel), source);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// JobRenderer
// ---------------------------------------------------------------------------

/// Renders every job template found in a templates directory.
///
/// Create once with [`JobRenderer::from_dir`] and reuse.
#[derive(Debug)]
pub struct JobRenderer {
    tera: Tera,
    documents: Vec<String>,
}

impl JobRenderer {
    /// Load embedded partials plus every `*.tera` file under `dir`.
    ///
    /// Files in `dir` override embedded templates with the same name.
    /// Returns `RenderError::NoTemplates` if `dir` holds only partials.
    pub fn from_dir(dir: &Path) -> Result<Self, RenderError> {
        let mut templates: BTreeMap<String, String> = TPLS
            .iter()
            .map(|(name, source)| (template_name(Path::new(name)), source.to_string()))
            .collect();
        read_templates(dir, dir, &mut templates)?;

        // BTreeMap keys are already sorted, so documents come out in name order.
        let documents: Vec<String> = templates
            .keys()
            .filter(|name| !is_partial(name))
            .cloned()
            .collect();
        if documents.is_empty() {
            return Err(RenderError::NoTemplates {
                path: dir.to_path_buf(),
            });
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)?;
        Ok(JobRenderer { tera, documents })
    }

    /// Names of the templates rendered as documents, in output order.
    pub fn document_names(&self) -> &[String] {
        &self.documents
    }

    /// Render the full job-definitions file.
    ///
    /// Line endings are normalised to LF and every document ends with a
    /// single newline.
    pub fn render(&self, ctx: &JobContext) -> Result<String, RenderError> {
        let context = ctx.to_tera_context()?;
        let mut out = self.tera.render(HEADER, &context)?;
        for (i, name) in self.documents.iter().enumerate() {
            if i > 0 {
                out.push_str("---\n");
            }
            let rendered = self.tera.render(name, &context)?;
            out.push_str(rendered.trim_end());
            out.push('\n');
        }
        Ok(out.replace("\r\n", "\n"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
