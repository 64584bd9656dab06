//! `imagesync plan`: per-image decisions and the job diff, read-only.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use imagesync_core::{LineDecision, LineOutcome};
use imagesync_pipeline::{plan, EcrPublicLister, Plan, TemplateJobGenerator, DEFAULT_REGISTRY_REPOSITORY};

/// Arguments for `imagesync plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Declared images (`images_config.yaml`).
    #[arg(long)]
    pub images_config: PathBuf,

    /// Registry repository to list existing tags from.
    #[arg(long, default_value = DEFAULT_REGISTRY_REPOSITORY)]
    pub registry_repository: String,

    /// Jobs config; with the templates and output, also diff the job file.
    #[arg(long, requires_all = ["jobs_templates", "jobs_output"])]
    pub jobs_config: Option<PathBuf>,

    #[arg(long, requires = "jobs_config")]
    pub jobs_templates: Option<PathBuf>,

    #[arg(long, requires = "jobs_config")]
    pub jobs_output: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl PlanArgs {
    pub fn run(self) -> Result<()> {
        let generator = match (&self.jobs_config, &self.jobs_templates, &self.jobs_output) {
            (Some(config), Some(templates), Some(output)) => {
                Some(TemplateJobGenerator::new(config, templates, output))
            }
            _ => None,
        };

        let mut registry = EcrPublicLister::new();
        let result = plan(
            &self.images_config,
            &self.registry_repository,
            &mut registry,
            generator.as_ref(),
        )
        .context("plan failed")?;

        if self.json {
            return print_json(&result);
        }
        print_table(&result);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PlanJson<'a> {
    image_repo: &'a str,
    registry_tags: usize,
    rejected_tags: Vec<RejectedJson>,
    images: &'a [LineOutcome],
    build: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    jobs_diff: Option<String>,
}

#[derive(Serialize)]
struct RejectedJson {
    image: String,
    tag: String,
    error: String,
}

#[derive(Tabled)]
struct PlanTableRow {
    #[tabled(rename = "image")]
    image: String,
    #[tabled(rename = "declared")]
    declared: String,
    #[tabled(rename = "registry")]
    registry: String,
    #[tabled(rename = "decision")]
    decision: String,
}

fn print_json(result: &Plan) -> Result<()> {
    let observation = &result.observation;
    let payload = PlanJson {
        image_repo: &observation.config.image_repo,
        registry_tags: observation.records,
        rejected_tags: observation
            .snapshot
            .rejected
            .iter()
            .map(|r| RejectedJson {
                image: r.name.to_string(),
                tag: r.tag.clone(),
                error: r.error.to_string(),
            })
            .collect(),
        images: &observation.reconciliation.lines,
        build: observation
            .reconciliation
            .build_set
            .iter()
            .map(|spec| spec.name.to_string())
            .collect(),
        jobs_diff: result.jobs_diff.as_ref().map(|d| d.unified_diff.clone()),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize plan JSON")?
    );
    Ok(())
}

fn decision_cell(decision: &LineDecision) -> String {
    let label = decision.label();
    match decision {
        LineDecision::FirstBuild | LineDecision::Newer { .. } => label.yellow().to_string(),
        LineDecision::UpToDate { .. } => label.green().to_string(),
        LineDecision::Drift { .. } => label.red().to_string(),
    }
}

fn print_table(result: &Plan) {
    let observation = &result.observation;
    let reconciliation = &observation.reconciliation;
    println!(
        "{} | {} registry tags | {} to build",
        observation.config.image_repo.bold(),
        observation.records,
        reconciliation.build_set.len(),
    );

    let rows: Vec<PlanTableRow> = reconciliation
        .lines
        .iter()
        .map(|line| PlanTableRow {
            image: line.name.to_string(),
            declared: line.declared.to_string(),
            registry: line
                .decision
                .observed()
                .map_or_else(|| "-".to_string(), ToString::to_string),
            decision: decision_cell(&line.decision),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if !observation.snapshot.rejected.is_empty() {
        println!(
            "{}",
            format!(
                "{} registry tag(s) ignored: not a version",
                observation.snapshot.rejected.len()
            )
            .dimmed()
        );
    }
    if reconciliation.drifted().next().is_some() {
        println!(
            "{}",
            "Declared versions behind the registry are not rebuilt.".red()
        );
    }

    match &result.jobs_diff {
        Some(diff) if diff.is_empty() => {
            println!("No job changes for {}.", diff.path.display())
        }
        Some(diff) => {
            print!("{}", diff.unified_diff);
            if !diff.unified_diff.ends_with('\n') {
                println!();
            }
        }
        None => {}
    }
}
