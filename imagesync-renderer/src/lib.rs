//! # imagesync-renderer
//!
//! Tera-based generator for CI job definitions. Job templates read the
//! declared image tags from a [`JobContext`] so regenerated jobs always point
//! at the images the pipeline just published.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use imagesync_renderer::{JobContext, JobRenderer};
//!
//! fn render(ctx: &JobContext) {
//!     if let Ok(renderer) = JobRenderer::from_dir(Path::new("jobs/templates")) {
//!         if let Ok(out) = renderer.render(ctx) {
//!             println!("{} bytes", out.len());
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::{ImageCtx, JobContext};
pub use engine::JobRenderer;
pub use error::RenderError;
