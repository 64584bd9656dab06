//! Change-request submission through `git` and the GitHub CLI.

use std::path::PathBuf;

use crate::collab::{ChangeProposer, ChangeRequest, ProposedChange};
use crate::error::PipelineError;
use crate::process::CommandSpec;

/// Commits the regenerated files on a fresh branch, pushes it and opens a
/// pull request with `gh pr create`.
#[derive(Debug, Clone)]
pub struct GitHubProposer {
    /// Working copy of the repository holding the job definitions.
    pub repo_dir: PathBuf,
    /// `owner/repo` the pull request is opened against.
    pub repository: String,
    pub base_branch: String,
    pub remote: String,
}

impl GitHubProposer {
    pub fn new(
        repo_dir: impl Into<PathBuf>,
        owner: &str,
        repo: &str,
        base_branch: impl Into<String>,
    ) -> Self {
        GitHubProposer {
            repo_dir: repo_dir.into(),
            repository: format!("{owner}/{repo}"),
            base_branch: base_branch.into(),
            remote: "origin".to_string(),
        }
    }

    /// Commands run, in order, to submit `change`.
    pub fn commands(&self, change: &ChangeRequest) -> Vec<CommandSpec> {
        let git = || CommandSpec::new("git").current_dir(&self.repo_dir);
        vec![
            git().args(["checkout", "-b", change.branch.as_str()]),
            git()
                .args(["add", "--"])
                .args(change.files.iter().map(|p| p.to_string_lossy().into_owned())),
            git().args([
                "commit",
                "-m",
                change.title.as_str(),
                "-m",
                change.description.as_str(),
            ]),
            git().args(["push", self.remote.as_str(), change.branch.as_str()]),
            CommandSpec::new("gh").current_dir(&self.repo_dir).args([
                "pr",
                "create",
                "--repo",
                self.repository.as_str(),
                "--base",
                self.base_branch.as_str(),
                "--head",
                change.branch.as_str(),
                "--title",
                change.title.as_str(),
                "--body",
                change.description.as_str(),
            ]),
        ]
    }
}

impl ChangeProposer for GitHubProposer {
    fn propose(&mut self, change: &ChangeRequest) -> Result<ProposedChange, PipelineError> {
        let mut last_stdout = String::new();
        for command in self.commands(change) {
            last_stdout = command.run().map_err(|source| PipelineError::Submission {
                branch: change.branch.clone(),
                source,
            })?;
        }

        // `gh pr create` prints the pull request URL as its last line.
        let url = last_stdout
            .lines()
            .last()
            .filter(|line| line.starts_with("https://"))
            .map(str::to_string);
        if let Some(url) = &url {
            tracing::info!("opened pull request {url}");
        }
        Ok(ProposedChange {
            branch: change.branch.clone(),
            url,
        })
    }
}
