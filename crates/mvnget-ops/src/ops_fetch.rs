//! Operation: download every file of the requested artifacts, verify them,
//! and follow (or report) the dependencies their descriptors declare.

use std::collections::VecDeque;
use std::path::Path;

use mvnget_core::config::Config;
use mvnget_core::coordinate::Coordinate;
use mvnget_core::diagnostic::Diagnostics;
use mvnget_maven::cache::TempCache;
use mvnget_maven::checksum::{self, is_checksum_file};
use mvnget_maven::download::{BatchMode, DownloadTask, Downloader};
use mvnget_maven::listing::{is_valid_filename, list_files};
use mvnget_maven::repository::RepositoryLayout;
use mvnget_maven::signature::{verify_signature, SignatureVerifier};
use mvnget_resolver::cache::VisitedSet;
use mvnget_resolver::resolver::ResolutionSession;
use mvnget_util::errors::MvnGetError;
use mvnget_util::fs::{ensure_dir, list_file_names};
use mvnget_util::progress::{hidden, spinner, status, status_warn};

/// What a fetch run did, per requested or discovered id.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FetchSummary {
    /// Ids whose files were found and downloaded, in processing order.
    pub fetched: Vec<String>,
    /// Ids that produced no candidate URLs or no files.
    pub not_found: Vec<String>,
}

struct Fetcher<'a> {
    config: &'a Config,
    layout: RepositoryLayout,
    temp: TempCache,
    downloader: Downloader,
    session: ResolutionSession,
    verifier: Option<&'a dyn SignatureVerifier>,
    mode: BatchMode,
}

/// Fetch `artifacts` (repository URLs or `group:artifact:version` ids) into
/// the configured output tree.
///
/// Problems with individual artifacts are recorded in `diagnostics`; only
/// unexpected failures are returned as errors.
pub async fn fetch(
    config: &Config,
    artifacts: &[String],
    verifier: Option<&dyn SignatureVerifier>,
    diagnostics: &Diagnostics,
) -> miette::Result<FetchSummary> {
    ensure_dir(&config.outdir).map_err(MvnGetError::Io)?;
    let downloader = Downloader::from_config(config, diagnostics.clone())?;
    let mode = if config.verbose() {
        BatchMode::Sequential
    } else {
        BatchMode::Parallel { jobs: config.jobs }
    };
    let mut fetcher = Fetcher {
        config,
        layout: RepositoryLayout::from_config(config),
        temp: TempCache::new(&config.outdir),
        session: ResolutionSession::new(config, downloader.clone()),
        downloader,
        verifier,
        mode,
    };

    let progress = if config.show_progress {
        spinner("Fetching", &config.progress_indicators)
    } else {
        hidden()
    };

    let mut summary = FetchSummary::default();
    let mut queue: VecDeque<String> = artifacts.iter().cloned().collect();
    let mut visited = VisitedSet::new();
    while let Some(artifact_id) = queue.pop_front() {
        if !visited.visit(&artifact_id) {
            tracing::debug!("Already processed {artifact_id}");
            continue;
        }
        progress.set_message(artifact_id.clone());

        let Some(required) = fetcher.fetch_one(&artifact_id).await? else {
            summary.not_found.push(artifact_id);
            continue;
        };
        for dependency in required {
            let id = dependency.id();
            if config.recursive {
                tracing::info!("Downloading required dependency {id} from {artifact_id}");
                queue.push_back(id);
            } else {
                diagnostics.note(
                    &artifact_id,
                    vec![],
                    format!("requires missing dependency {id}"),
                );
            }
        }
        summary.fetched.push(artifact_id);
    }
    progress.finish_and_clear();
    Ok(summary)
}

impl Fetcher<'_> {
    fn diagnostics(&self) -> &Diagnostics {
        self.downloader.diagnostics()
    }

    /// Download one artifact from the first candidate URL that lists files.
    ///
    /// Returns the dependencies still missing from the output tree, or
    /// `None` when nothing was found.
    async fn fetch_one(&mut self, artifact_id: &str) -> miette::Result<Option<Vec<Coordinate>>> {
        status("Fetching", artifact_id);
        let source_urls = self
            .layout
            .convert_to_repo_urls(artifact_id, self.diagnostics());
        if source_urls.is_empty() {
            status_warn("Skipped", artifact_id);
            tracing::warn!("{artifact_id} - skipped");
            return Ok(None);
        }

        for source_url in &source_urls {
            tracing::info!("{source_url}");
            let dest_dir = self
                .config
                .outdir
                .join(self.layout.artifact_path_for_url(source_url)?);
            ensure_dir(&dest_dir).map_err(MvnGetError::Io)?;

            let mut tasks = Vec::new();
            for file in list_files(&self.downloader, &self.temp, source_url).await? {
                if !is_valid_filename(&file.name) {
                    tracing::info!("Skipping file {} (invalid file)", file.name);
                    continue;
                }
                tasks.push(DownloadTask {
                    url: format!("{source_url}{}", file.name),
                    dest: dest_dir.join(&file.name),
                    overwrite: self.config.overwrite,
                    required: file.required,
                });
            }
            if tasks.is_empty() {
                continue;
            }

            self.downloader
                .run_batch(tasks, self.mode)
                .await
                .into_result()?;
            self.verify_directory(artifact_id, &dest_dir)?;
            let required = self.session.required_dependencies(&dest_dir).await?;
            tracing::debug!("Found {artifact_id} under {source_url}; no more download attempts.");
            return Ok(Some(required));
        }

        self.diagnostics().note(
            artifact_id,
            vec![],
            format!("Did not find any artifact at {source_urls:?}"),
        );
        Ok(None)
    }

    /// Check every downloaded file's checksums, and each signature whose
    /// signed file is present.
    fn verify_directory(&self, artifact_id: &str, dir: &Path) -> miette::Result<()> {
        let diagnostics = self.diagnostics();
        for name in list_file_names(dir).map_err(MvnGetError::Io)? {
            let path = dir.join(&name);
            if !is_checksum_file(&name) {
                checksum::verify_file(artifact_id, &path, diagnostics)?;
            }
            // .asc files carry checksums of their own, so this is not an else
            let Some(base) = name.strip_suffix(".asc") else {
                continue;
            };
            let signed = dir.join(base);
            if signed.is_file() {
                verify_signature(
                    artifact_id,
                    &signed,
                    &path,
                    self.verifier,
                    &self.config.pgp_key_servers,
                    diagnostics,
                )?;
            } else {
                tracing::debug!(
                    " - Downloaded asc file ({name}) with no corresponding signed file (expected {})",
                    signed.display()
                );
            }
        }
        Ok(())
    }
}
