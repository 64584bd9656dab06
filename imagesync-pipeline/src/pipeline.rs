//! The end-to-end run: observe, reconcile, build, push, regenerate, propose.
//!
//! Steps run strictly in order and the first failure aborts the run. Nothing
//! already done is rolled back: pushed images stay pushed.

use std::path::PathBuf;

use chrono::Utc;

use imagesync_core::config::{load_build_config_at, load_images_config_at};
use imagesync_core::{
    desired_images, reconcile_report, reduce_snapshot, ImageSpec, ImagesConfig, Reconciliation,
    Snapshot,
};

use crate::collab::{
    ChangeProposer, ChangeRequest, ImageBuilder, ImagePusher, JobGenerator, ProposedChange,
    RegistryLister,
};
use crate::error::PipelineError;
use crate::registry::attribute_to_declared;
use crate::writer::WriteResult;

/// Registry repository listed when none is given.
pub const DEFAULT_REGISTRY_REPOSITORY: &str = "prow";

/// Parse a boolean-like flag. Only the exact strings `true` and `false` are
/// accepted.
pub fn parse_bool_flag(flag: &'static str, value: &str) -> Result<bool, PipelineError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(PipelineError::InvalidFlag {
            flag,
            value: value.to_string(),
        }),
    }
}

/// Immutable settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub images_config: PathBuf,
    pub build_config: PathBuf,
    pub registry_repository: String,
    pub create_pr: bool,
}

impl RunConfig {
    /// Validates `create_pr` before anything else happens.
    pub fn new(
        images_config: impl Into<PathBuf>,
        build_config: impl Into<PathBuf>,
        registry_repository: impl Into<String>,
        create_pr: &str,
    ) -> Result<Self, PipelineError> {
        let create_pr = parse_bool_flag("create-pr", create_pr)?;
        Ok(RunConfig {
            images_config: images_config.into(),
            build_config: build_config.into(),
            registry_repository: registry_repository.into(),
            create_pr,
        })
    }
}

/// The external collaborators a run drives.
pub struct Collaborators<'a> {
    pub registry: &'a mut dyn RegistryLister,
    pub builder: &'a mut dyn ImageBuilder,
    pub pusher: &'a mut dyn ImagePusher,
    pub generator: &'a mut dyn JobGenerator,
    pub proposer: &'a mut dyn ChangeProposer,
}

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every declared version is already in the registry. Nothing was built.
    UpToDate { reconciliation: Reconciliation },
    /// The build set was built and pushed and jobs were regenerated.
    Rebuilt {
        reconciliation: Reconciliation,
        jobs: WriteResult,
        /// `None` when change requests are disabled or nothing changed.
        change: Option<ProposedChange>,
    },
}

// ---------------------------------------------------------------------------
// Observation (shared with `plan`)
// ---------------------------------------------------------------------------

/// Desired state, observed state and their reconciliation.
#[derive(Debug, Clone)]
pub struct Observation {
    pub config: ImagesConfig,
    pub desired: Vec<ImageSpec>,
    pub records: usize,
    pub snapshot: Snapshot,
    pub reconciliation: Reconciliation,
}

/// Load the images config, list the registry and reconcile.
pub fn observe(
    images_config: &std::path::Path,
    repository: &str,
    registry: &mut dyn RegistryLister,
) -> Result<Observation, PipelineError> {
    let config = load_images_config_at(images_config)?;
    let desired = desired_images(&config, &config.version_scheme)?;
    tracing::info!(
        "{} image(s) declared in {}",
        desired.len(),
        images_config.display()
    );

    let records = attribute_to_declared(registry.list_images(repository)?, &desired);
    let snapshot = reduce_snapshot(&records, &config.version_scheme);
    for rejected in &snapshot.rejected {
        tracing::debug!(
            "skipping tag {}-{}: {}",
            rejected.name,
            rejected.tag,
            rejected.error
        );
    }

    let reconciliation = reconcile_report(&desired, &snapshot.highest)?;
    for line in reconciliation.drifted() {
        if let Some(observed) = line.decision.observed() {
            tracing::warn!(
                "{}: declared {} is behind registry {}",
                line.name,
                line.declared,
                observed
            );
        }
    }

    Ok(Observation {
        config,
        desired,
        records: records.len(),
        snapshot,
        reconciliation,
    })
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

/// Execute one full run.
pub fn run(config: &RunConfig, collab: Collaborators<'_>) -> Result<RunOutcome, PipelineError> {
    let Collaborators {
        registry,
        builder,
        pusher,
        generator,
        proposer,
    } = collab;

    let observation = observe(&config.images_config, &config.registry_repository, registry)?;
    let reconciliation = observation.reconciliation;
    let build_set = &reconciliation.build_set;
    if build_set.is_empty() {
        tracing::info!("all image versions are up to date");
        return Ok(RunOutcome::UpToDate { reconciliation });
    }
    tracing::info!("images to build: {build_set}");

    let build_config = load_build_config_at(&config.build_config)?;
    builder.build(build_set, &build_config)?;

    let image_repo = observation.config.image_repo.as_str();
    pusher.push(image_repo, build_set)?;
    tracing::info!("pushed {} image(s) to {image_repo}", build_set.len());

    let jobs = generator.generate(image_repo, &observation.desired)?;

    let change = if !config.create_pr {
        tracing::info!("change request disabled; leaving regenerated jobs in place");
        None
    } else if !jobs.changed() {
        tracing::info!(
            "{} already references the new images; no change request needed",
            jobs.path().display()
        );
        None
    } else {
        let request =
            ChangeRequest::for_build_set(build_set, vec![jobs.path().to_path_buf()], Utc::now());
        tracing::info!("opening change request on branch {}", request.branch);
        Some(proposer.propose(&request)?)
    };

    Ok(RunOutcome::Rebuilt {
        reconciliation,
        jobs,
        change,
    })
}
