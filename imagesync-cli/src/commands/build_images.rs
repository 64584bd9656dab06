//! `imagesync build-images`: the full reconciliation run.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use imagesync_pipeline::{
    run, Collaborators, DockerBuilder, DockerPusher, EcrPublicLister,
    GitHubProposer, RunConfig, RunOutcome, TemplateJobGenerator, WriteResult,
    DEFAULT_REGISTRY_REPOSITORY,
};

/// Arguments for `imagesync build-images`.
#[derive(Args, Debug)]
pub struct BuildImagesArgs {
    /// Declared images (`images_config.yaml`).
    #[arg(long)]
    pub images_config: PathBuf,

    /// Toolchain pins passed to every build (`build_config.yaml`).
    #[arg(long)]
    pub build_config: PathBuf,

    /// Jobs config handed to the job templates.
    #[arg(long)]
    pub jobs_config: PathBuf,

    /// Directory of `*.tera` job templates.
    #[arg(long)]
    pub jobs_templates: PathBuf,

    /// Generated job-definitions file.
    #[arg(long)]
    pub jobs_output: PathBuf,

    /// Registry repository to list existing tags from.
    #[arg(long, default_value = DEFAULT_REGISTRY_REPOSITORY)]
    pub registry_repository: String,

    /// Open a pull request with the regenerated jobs: `true` or `false`.
    #[arg(long, default_value = "true")]
    pub create_pr: String,

    /// Directory holding `Dockerfile.<image>`.
    #[arg(long, default_value = "dockerfiles")]
    pub dockerfiles_dir: PathBuf,

    /// Docker build context.
    #[arg(long, default_value = ".")]
    pub build_context: PathBuf,

    /// Working copy the pull request is committed from.
    #[arg(long, default_value = ".")]
    pub repo_dir: PathBuf,

    /// Owner of the repository the pull request targets.
    #[arg(long)]
    pub source_owner: Option<String>,

    /// Name of the repository the pull request targets.
    #[arg(long)]
    pub source_repo: Option<String>,

    #[arg(long, default_value = "main")]
    pub base_branch: String,
}

impl BuildImagesArgs {
    pub fn run(self) -> Result<()> {
        // Flag validation comes before any I/O.
        let config = RunConfig::new(
            &self.images_config,
            &self.build_config,
            &self.registry_repository,
            &self.create_pr,
        )?;
        let (owner, repo) = match (&self.source_owner, &self.source_repo) {
            (Some(owner), Some(repo)) => (owner.clone(), repo.clone()),
            _ if config.create_pr => {
                bail!("--source-owner and --source-repo are required when --create-pr is true")
            }
            _ => (String::new(), String::new()),
        };

        let mut registry = EcrPublicLister::new();
        let mut builder = DockerBuilder::new(&self.dockerfiles_dir, &self.build_context);
        let mut pusher = DockerPusher::new();
        let mut generator =
            TemplateJobGenerator::new(&self.jobs_config, &self.jobs_templates, &self.jobs_output);
        let mut proposer = GitHubProposer::new(&self.repo_dir, &owner, &repo, &self.base_branch);

        let outcome = run(
            &config,
            Collaborators {
                registry: &mut registry,
                builder: &mut builder,
                pusher: &mut pusher,
                generator: &mut generator,
                proposer: &mut proposer,
            },
        )
        .context("build-images failed")?;

        print_outcome(&outcome);
        Ok(())
    }
}

fn print_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::UpToDate { .. } => {
            println!("{}", "All image versions are up to date.".green());
        }
        RunOutcome::Rebuilt {
            reconciliation,
            jobs,
            change,
        } => {
            let set = &reconciliation.build_set;
            println!(
                "{} {} image(s): {}",
                "Rebuilt".green().bold(),
                set.len(),
                set
            );
            match jobs {
                WriteResult::Written { path } => println!("  wrote {}", path.display()),
                WriteResult::Unchanged { path } => {
                    println!("  {} unchanged", path.display())
                }
                WriteResult::WouldWrite { path } => {
                    println!("  would write {}", path.display())
                }
            }
            match change {
                Some(change) => match &change.url {
                    Some(url) => println!("  pull request: {url}"),
                    None => println!("  pushed branch {}", change.branch),
                },
                None => println!("  {}", "no pull request opened".dimmed()),
            }
        }
    }
}
