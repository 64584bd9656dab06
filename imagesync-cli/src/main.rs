//! imagesync: keep CI job images in step with their declared versions.
//!
//! # Usage
//!
//! ```text
//! imagesync build-images --images-config <path> --build-config <path>
//!     --jobs-config <path> --jobs-templates <dir> --jobs-output <path>
//!     [--registry-repository prow] [--create-pr true|false]
//!     [--dockerfiles-dir <dir>] [--build-context <dir>]
//!     [--source-owner <owner> --source-repo <repo>] [--base-branch main]
//! imagesync plan --images-config <path> [--registry-repository prow]
//!     [--jobs-config <path> --jobs-templates <dir> --jobs-output <path>] [--json]
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{build_images::BuildImagesArgs, plan::PlanArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "imagesync",
    version,
    about = "Rebuild stale container images and point CI jobs at them",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build and push out-of-date images, regenerate jobs, open a pull request.
    BuildImages(BuildImagesArgs),

    /// Show what build-images would do without changing anything.
    Plan(PlanArgs),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::BuildImages(args) => args.run(),
        Commands::Plan(args) => args.run(),
    }
}
