//! # imagesync-pipeline
//!
//! Drives a reconciliation run against real collaborators.
//!
//! [`run`] loads the desired state, lists the registry, reconciles, then
//! builds, pushes, regenerates job definitions and opens a change request.
//! [`plan`] stops after reconciliation and previews the job diff.
//!
//! Every external system sits behind a trait in [`collab`]; the default
//! implementations shell out to `aws`, `docker`, `git` and `gh`.

pub mod collab;
pub mod docker;
pub mod error;
pub mod generator;
pub mod pipeline;
pub mod plan;
pub mod process;
pub mod proposer;
pub mod registry;
pub mod writer;

pub use collab::{
    branch_name, ChangeProposer, ChangeRequest, ImageBuilder, ImagePusher, JobGenerator,
    ProposedChange, RegistryLister,
};
pub use docker::{DockerBuilder, DockerPusher};
pub use error::{PipelineError, StepFailure};
pub use generator::TemplateJobGenerator;
pub use pipeline::{
    observe, parse_bool_flag, run, Collaborators, Observation, RunConfig, RunOutcome,
    DEFAULT_REGISTRY_REPOSITORY,
};
pub use plan::{plan, JobsDiff, Plan};
pub use proposer::GitHubProposer;
pub use registry::EcrPublicLister;
pub use writer::{atomic_write, WriteResult};
