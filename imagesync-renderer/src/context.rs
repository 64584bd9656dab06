//! Template context: serializable rendering payload for job templates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use imagesync_core::types::{remote_tag, ImageSpec};

use crate::error::RenderError;

/// Rendering payload handed to every job template.
///
/// ```text
/// {{ image_repo }}
/// {% for image in images %}{{ image.image }}{% endfor %}
/// {{ images_by_name["unit-test"].tag }}
/// {{ jobs.prow_jobs[0].name }}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobContext {
    /// Registry repository URI images are published under.
    pub image_repo: String,
    /// Declared images, in config order.
    pub images: Vec<ImageCtx>,
    /// Same entries keyed by image name, for direct lookups in templates.
    pub images_by_name: BTreeMap<String, ImageCtx>,
    /// The jobs config document, converted to JSON.
    pub jobs: serde_json::Value,
    pub meta: MetaCtx,
}

/// One image as seen by templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCtx {
    pub name: String,
    pub version: String,
    /// `<name>-<version>`
    pub tag: String,
    /// `<image_repo>:<name>-<version>`
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaCtx {
    pub generator_version: String,
}

impl JobContext {
    /// Build a [`JobContext`] from the desired images and the jobs config.
    pub fn new(
        image_repo: &str,
        images: &[ImageSpec],
        jobs: &serde_yaml::Value,
    ) -> Result<Self, RenderError> {
        let images: Vec<ImageCtx> = images
            .iter()
            .map(|spec| {
                let tag = remote_tag(&spec.name, &spec.declared_version);
                ImageCtx {
                    name: spec.name.0.clone(),
                    version: spec.declared_version.to_string(),
                    image: format!("{image_repo}:{tag}"),
                    tag,
                }
            })
            .collect();
        let images_by_name = images
            .iter()
            .map(|image| (image.name.clone(), image.clone()))
            .collect();

        Ok(JobContext {
            image_repo: image_repo.to_string(),
            images,
            images_by_name,
            jobs: serde_json::to_value(jobs)?,
            meta: MetaCtx {
                generator_version: env!("CARGO_PKG_VERSION").to_string(),
            },
        })
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}
