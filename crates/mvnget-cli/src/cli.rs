//! CLI argument definitions for mvnget.
//!
//! Uses `clap` derive macros. Each command corresponds to a handler in the
//! [`super::commands`] module.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use mvnget_core::config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "mvnget",
    version,
    about = "Download Maven artifacts for inspection before adding them to a local repository",
    long_about = "mvnget downloads every file a Maven 2 repository publishes for an artifact, \
                  verifies checksums, PGP signatures and license policy, and can follow the \
                  dependencies declared in the artifact's POM."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase output verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file to load
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download artifacts and verify them
    Fetch(FetchArgs),

    /// Compare two version strings
    Compare {
        /// First version
        a: String,
        /// Second version
        b: String,
    },
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Artifacts to download: repository URLs or group:artifact:version
    #[arg(required = true, value_name = "ARTIFACT")]
    pub artifacts: Vec<String>,

    /// Directory to store the downloaded files
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Resolve the POM files and download their dependencies, recursively
    #[arg(short, long)]
    pub resolve: bool,

    /// Overwrite files that already exist
    #[arg(short = 'O', long)]
    pub overwrite: bool,

    /// Show a progress indicator
    #[arg(short, long)]
    pub progress: bool,

    /// Download dependency management children (declared in parent and bom files)
    #[arg(short = 'P', long)]
    pub parent: bool,

    /// File to append the discovered problems to (JSON when it ends in .json)
    #[arg(short, long, value_name = "FILE")]
    pub error_file: Option<PathBuf>,

    /// Do not search local repositories for descriptors
    #[arg(short = 'x', long)]
    pub no_local: bool,

    /// Do not download files from the remote repositories
    #[arg(short = 't', long)]
    pub no_remote_download: bool,

    /// Do not perform PGP signature checking
    #[arg(long)]
    pub no_pgp: bool,

    /// Artifacts that declare a license must declare an acceptable one
    #[arg(long)]
    pub require_valid_license: bool,

    /// Artifacts must declare a license
    #[arg(long)]
    pub require_license: bool,

    /// Delete files named by policy violations at exit
    #[arg(long)]
    pub clean_violations: bool,

    /// Number of concurrent downloads
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

impl FetchArgs {
    /// Apply the flags that were given on top of the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.dir {
            config.outdir = dir.clone();
        }
        if let Some(path) = &self.error_file {
            config.problem_file = Some(path.clone());
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        config.recursive |= self.resolve;
        config.overwrite |= self.overwrite;
        config.show_progress |= self.progress;
        config.include_dep_management |= self.parent;
        config.no_pgp |= self.no_pgp;
        config.clean_violations |= self.clean_violations;
        if self.no_local {
            config.check_in_local = false;
        }
        if self.no_remote_download {
            config.remote_download = false;
        }
        if self.require_valid_license {
            config.allow_unacceptable_licenses = false;
        }
        if self.require_license {
            config.allow_no_license = false;
        }
        config.normalize();
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
