use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

use crate::defaults;

/// Console verbosity, from quietest to noisiest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Level selected by `-v` repetitions; `0` keeps the configured level.
    pub fn from_verbosity(count: u8) -> Option<Self> {
        match count {
            0 => None,
            1 => Some(Self::Info),
            2 => Some(Self::Debug),
            _ => Some(Self::Trace),
        }
    }

    /// Level matching the most detailed output an installed filter lets
    /// through, which `RUST_LOG` may have set instead of the configuration.
    pub fn from_level_filter(filter: LevelFilter) -> Self {
        if filter >= LevelFilter::TRACE {
            Self::Trace
        } else if filter >= LevelFilter::DEBUG {
            Self::Debug
        } else if filter >= LevelFilter::INFO {
            Self::Info
        } else {
            Self::Warn
        }
    }

    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Replacement applied by the mislabeled-group heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct GroupReplacement {
    pub group: String,
    pub artifact_prefix: String,
}

impl From<(String, String)> for GroupReplacement {
    fn from((group, artifact_prefix): (String, String)) -> Self {
        Self {
            group,
            artifact_prefix,
        }
    }
}

impl From<GroupReplacement> for (String, String) {
    fn from(r: GroupReplacement) -> Self {
        (r.group, r.artifact_prefix)
    }
}

/// User configuration, loaded from `.mvnget.toml` and overridden by CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Root of the output tree, laid out like a Maven 2 repository.
    pub outdir: PathBuf,
    pub show_progress: bool,
    pub progress_indicators: String,
    pub log_level: LogLevel,
    /// Diagnostics are appended here at exit; `.json` selects structured output.
    pub problem_file: Option<PathBuf>,
    /// Fetch required-but-absent dependencies instead of only reporting them.
    pub recursive: bool,
    pub overwrite: bool,
    pub remote_download: bool,
    /// Treat dependency-management references as real dependencies.
    pub include_dep_management: bool,
    pub check_in_local: bool,
    pub no_pgp: bool,
    /// Delete files named by violation diagnostics at exit.
    pub clean_violations: bool,
    pub remote_repo_urls: Vec<String>,
    pub local_repo_urls: Vec<String>,
    pub pgp_key_servers: Vec<String>,
    pub acceptable_license_urls: Vec<String>,
    pub acceptable_license_names: Vec<String>,
    pub allow_unacceptable_licenses: bool,
    pub allow_no_license: bool,
    pub mislabeled_artifact_groups: BTreeMap<String, GroupReplacement>,
    /// Concurrent download workers.
    pub jobs: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            outdir: PathBuf::from("."),
            show_progress: false,
            progress_indicators: "|/-\\".to_string(),
            log_level: LogLevel::Warn,
            problem_file: None,
            recursive: false,
            overwrite: false,
            remote_download: true,
            include_dep_management: false,
            check_in_local: true,
            no_pgp: false,
            clean_violations: false,
            remote_repo_urls: to_strings(defaults::REMOTE_REPO_URLS),
            local_repo_urls: Vec::new(),
            pgp_key_servers: to_strings(defaults::PGP_KEY_SERVERS),
            acceptable_license_urls: to_strings(defaults::ACCEPTABLE_LICENSE_URLS),
            acceptable_license_names: to_strings(defaults::ACCEPTABLE_LICENSE_NAMES),
            allow_unacceptable_licenses: true,
            allow_no_license: true,
            mislabeled_artifact_groups: defaults::MISLABELED_ARTIFACT_GROUPS
                .iter()
                .map(|(prefix, group, artifact)| {
                    (
                        prefix.to_string(),
                        GroupReplacement {
                            group: group.to_string(),
                            artifact_prefix: artifact.to_string(),
                        },
                    )
                })
                .collect(),
            jobs: default_jobs(),
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl Config {
    /// Parse a configuration document, normalising repository URLs.
    pub fn from_toml(content: &str) -> miette::Result<Self> {
        let mut config: Config =
            toml::from_str(content).map_err(|e| mvnget_util::errors::MvnGetError::Config {
                message: format!("Failed to parse configuration: {e}"),
            })?;
        config.normalize();
        Ok(config)
    }

    /// Load the first configuration file that exists: `explicit`, then
    /// `./.mvnget.toml`, then `~/.mvnget.toml`. Later files are not merged.
    pub fn load(explicit: Option<&Path>) -> miette::Result<Self> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(path) = explicit {
            if !path.is_file() {
                tracing::warn!("Configuration file {} does not exist", path.display());
            }
            candidates.push(path.to_path_buf());
        }
        candidates.push(PathBuf::from(".").join(defaults::CONFIG_FILE_NAME));
        candidates.push(home_dir().join(defaults::CONFIG_FILE_NAME));

        for path in candidates {
            if path.is_file() {
                tracing::debug!("Loading configuration from {}", path.display());
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    mvnget_util::errors::MvnGetError::Config {
                        message: format!("Failed to read {}: {e}", path.display()),
                    }
                })?;
                return Self::from_toml(&content);
            }
        }
        let mut config = Self::default();
        config.normalize();
        Ok(config)
    }

    /// Whether log output is detailed enough that downloads must run one at a time.
    pub fn verbose(&self) -> bool {
        self.log_level >= LogLevel::Info
    }

    /// Ensure every repository base URL ends with `/`.
    pub fn normalize(&mut self) {
        for url in self
            .remote_repo_urls
            .iter_mut()
            .chain(self.local_repo_urls.iter_mut())
        {
            if !url.ends_with('/') {
                url.push('/');
            }
        }
        if self.jobs == 0 {
            self.jobs = 1;
        }
    }

    /// Directory for listing pages, on-demand descriptors and metadata documents.
    pub fn tmp_dir(&self) -> PathBuf {
        self.outdir.join(".tmp")
    }
}

/// The user's home directory, falling back to the working directory.
pub fn home_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
}
