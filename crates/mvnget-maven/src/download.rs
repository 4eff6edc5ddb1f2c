//! Retrieval layer: single-file downloads with retries, and batches run
//! either one at a time or on a bounded pool of tokio tasks.
//!
//! Bodies are streamed into a temp file beside the destination and
//! persisted over it only once complete, so a destination path never holds
//! a truncated file.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use mvnget_core::config::Config;
use mvnget_core::diagnostic::Diagnostics;
use mvnget_util::errors::MvnGetError;
use mvnget_util::fs::delete_file;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 10;

/// Network failures worth another attempt, matched against the error chain.
const TRANSIENT_MARKERS: &[&str] = &[
    "Resource temporarily unavailable",
    "Name or service not known",
];

/// Build the HTTP client shared by every download.
///
/// A 308 answer is returned as is rather than followed: repositories use it
/// for artifacts they do not hold.
pub fn build_client() -> miette::Result<Client> {
    let redirects = Policy::custom(|attempt| {
        if attempt.status() == StatusCode::PERMANENT_REDIRECT {
            attempt.stop()
        } else if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else {
            attempt.follow()
        }
    });
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(redirects)
        .user_agent(concat!("mvnget/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            MvnGetError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            }
            .into()
        })
}

/// One file to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub url: String,
    pub dest: PathBuf,
    pub overwrite: bool,
    /// A missing required file is reported; a missing optional one is not.
    pub required: bool,
}

/// How a download ended when it did not raise an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded,
    /// The destination existed and overwriting was not requested.
    AlreadyPresent,
    /// HTTP 404/308, or a `file://` source that does not exist.
    NotFound,
    /// Remote downloads are disabled and the URL is remote.
    Unavailable,
    /// Retries were exhausted or the server answered with an error status.
    Failed,
}

impl DownloadOutcome {
    /// Whether the destination now holds the file.
    pub fn is_present(self) -> bool {
        matches!(self, Self::Downloaded | Self::AlreadyPresent)
    }
}

/// Which failures get recorded as diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPolicy {
    pub show_errors: bool,
    pub show_not_found: bool,
}

impl ReportPolicy {
    /// Probing downloads: nothing is recorded and nothing is raised.
    pub const QUIET: Self = Self {
        show_errors: false,
        show_not_found: false,
    };

    pub fn for_task(required: bool) -> Self {
        Self {
            show_errors: true,
            show_not_found: required,
        }
    }
}

/// How a batch is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// In submission order; the first error stops the batch.
    Sequential,
    /// Concurrently on at most `jobs` tasks; every task runs to completion.
    Parallel { jobs: usize },
}

/// Every outcome of a batch, in submission order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<(DownloadTask, miette::Result<DownloadOutcome>)>,
}

impl BatchReport {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_err()).count()
    }

    /// Tasks whose destination now holds the file.
    pub fn present(&self) -> Vec<&DownloadTask> {
        self.results
            .iter()
            .filter(|(_, r)| matches!(r, Ok(o) if o.is_present()))
            .map(|(t, _)| t)
            .collect()
    }

    /// The first error in submission order, once every task has finished.
    pub fn into_result(self) -> miette::Result<Vec<(DownloadTask, DownloadOutcome)>> {
        let mut done = Vec::with_capacity(self.results.len());
        for (task, result) in self.results {
            done.push((task, result?));
        }
        Ok(done)
    }
}

#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error("{0}")]
    Transient(String),
    #[error("HTTP {0}")]
    Status(StatusCode),
    #[error("{0}")]
    Fatal(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Downloads files, recording expected failures as diagnostics.
///
/// Cheap to clone: the client and the diagnostic sink are shared handles.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    remote_bases: Arc<Vec<String>>,
    remote_download: bool,
    diagnostics: Diagnostics,
}

impl Downloader {
    pub fn new(
        client: Client,
        remote_bases: Vec<String>,
        remote_download: bool,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            client,
            remote_bases: Arc::new(remote_bases),
            remote_download,
            diagnostics,
        }
    }

    pub fn from_config(config: &Config, diagnostics: Diagnostics) -> miette::Result<Self> {
        Ok(Self::new(
            build_client()?,
            config.remote_repo_urls.clone(),
            config.remote_download,
            diagnostics,
        ))
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Fetch `url` into `dest`.
    ///
    /// Expected failures come back as an outcome (and, per `policy`, a
    /// diagnostic). Only unexpected failures are raised; in every failure
    /// case `dest` is left absent.
    pub async fn download(
        &self,
        url: &str,
        dest: &Path,
        overwrite: bool,
        policy: ReportPolicy,
    ) -> miette::Result<DownloadOutcome> {
        if dest.is_file() {
            if !overwrite {
                tracing::debug!("Skipping existing file {}", dest.display());
                return Ok(DownloadOutcome::AlreadyPresent);
            }
            tracing::debug!("Overwriting existing file {}", dest.display());
            delete_file(dest);
        }
        if !self.remote_download
            && self
                .remote_bases
                .iter()
                .any(|base| url.starts_with(base.as_str()))
        {
            tracing::debug!("Remote download disabled; not fetching {url}");
            return Ok(DownloadOutcome::Unavailable);
        }

        let mut last_err = None;
        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                tokio::time::sleep(RETRY_DELAY).await;
            }
            tracing::trace!("Downloading {url} (attempt {attempt})");
            match self.fetch_once(url, dest).await {
                Ok(()) => return Ok(DownloadOutcome::Downloaded),
                Err(AttemptError::Transient(msg)) => {
                    tracing::debug!("Encountered {msg}; waiting to try again: {url}");
                    last_err = Some(msg);
                }
                Err(AttemptError::Status(status)) => {
                    delete_file(dest);
                    return Ok(self.status_outcome(url, dest, status, policy));
                }
                Err(AttemptError::Fatal(msg)) => {
                    delete_file(dest);
                    tracing::debug!("URL ({url}) error: {msg}");
                    if !policy.show_errors {
                        return Ok(DownloadOutcome::Failed);
                    }
                    self.diagnostics.violation(
                        url,
                        vec![dest.to_path_buf()],
                        format!("Failed to download: {msg}"),
                    );
                    return Err(MvnGetError::Network {
                        message: format!("Request to {url} failed: {msg}"),
                    }
                    .into());
                }
                Err(AttemptError::Io(e)) => {
                    delete_file(dest);
                    tracing::warn!("Error downloading {url} into {}", dest.display());
                    return Err(MvnGetError::Io(e).into());
                }
            }
        }

        delete_file(dest);
        if policy.show_errors {
            let message = match last_err {
                Some(e) => format!("Failed to download: {e} (too many disconnects)"),
                None => "Failed to download (too many disconnects)".to_string(),
            };
            self.diagnostics
                .violation(url, vec![dest.to_path_buf()], message);
        }
        Ok(DownloadOutcome::Failed)
    }

    fn status_outcome(
        &self,
        url: &str,
        dest: &Path,
        status: StatusCode,
        policy: ReportPolicy,
    ) -> DownloadOutcome {
        let not_found =
            status == StatusCode::NOT_FOUND || status == StatusCode::PERMANENT_REDIRECT;
        let report = if not_found {
            policy.show_not_found
        } else {
            policy.show_errors
        };
        if report {
            self.diagnostics.violation(
                url,
                vec![dest.to_path_buf()],
                format!("Failed to download: HTTP {status}"),
            );
        }
        if not_found {
            DownloadOutcome::NotFound
        } else {
            DownloadOutcome::Failed
        }
    }

    async fn fetch_once(&self, url: &str, dest: &Path) -> Result<(), AttemptError> {
        if let Some(source) = url.strip_prefix("file://") {
            return copy_local(Path::new(source), dest);
        }

        let resp = self.client.get(url).send().await.map_err(classify)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AttemptError::Status(status));
        }

        let mut staged = staging_file(dest)?;
        let mut body = resp.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(classify)?;
            staged.write_all(&chunk)?;
        }
        staged.persist(dest).map_err(|e| AttemptError::Io(e.error))?;
        Ok(())
    }

    async fn run_task(&self, task: &DownloadTask) -> miette::Result<DownloadOutcome> {
        tracing::info!("  -> {}", task.url);
        tracing::debug!("  ---> {}", task.dest.display());
        let result = self
            .download(
                &task.url,
                &task.dest,
                task.overwrite,
                ReportPolicy::for_task(task.required),
            )
            .await;
        if result.is_err() {
            delete_file(&task.dest);
        }
        result
    }

    /// Run a batch of downloads.
    ///
    /// In parallel mode one task failing does not cancel its siblings; call
    /// [`BatchReport::into_result`] to re-raise the first error.
    pub async fn run_batch(&self, tasks: Vec<DownloadTask>, mode: BatchMode) -> BatchReport {
        match mode {
            BatchMode::Sequential => self.run_sequential(tasks).await,
            BatchMode::Parallel { jobs } => self.run_parallel(tasks, jobs).await,
        }
    }

    async fn run_sequential(&self, tasks: Vec<DownloadTask>) -> BatchReport {
        let mut report = BatchReport::default();
        for task in tasks {
            let result = self.run_task(&task).await;
            let failed = result.is_err();
            report.results.push((task, result));
            if failed {
                break;
            }
        }
        report
    }

    async fn run_parallel(&self, tasks: Vec<DownloadTask>, jobs: usize) -> BatchReport {
        let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
        let mut slots: Vec<Option<miette::Result<DownloadOutcome>>> =
            tasks.iter().map(|_| None).collect();

        let mut join_set = JoinSet::new();
        for (index, task) in tasks.iter().cloned().enumerate() {
            let downloader = self.clone();
            let sem = semaphore.clone();
            join_set.spawn(async move {
                let _permit = sem.acquire_owned().await;
                let result = downloader.run_task(&task).await;
                (index, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => {
                    if let Err(ref e) = result {
                        tracing::warn!("Exception in {index}: {e}");
                    }
                    slots[index] = Some(result);
                }
                Err(e) => tracing::warn!("Download task aborted: {e}"),
            }
        }

        let results = tasks
            .into_iter()
            .zip(slots)
            .map(|(task, slot)| {
                let result = slot.unwrap_or_else(|| {
                    delete_file(&task.dest);
                    Err(MvnGetError::Generic {
                        message: format!("Download of {} did not complete", task.url),
                    }
                    .into())
                });
                (task, result)
            })
            .collect();
        BatchReport { results }
    }
}

fn staging_file(dest: &Path) -> Result<tempfile::NamedTempFile, AttemptError> {
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    Ok(tempfile::Builder::new()
        .prefix(".mvnget-")
        .suffix(".part")
        .tempfile_in(dir)?)
}

/// Copy a `file://` source. A directory yields a generated index page, so a
/// plain directory tree can serve as a repository.
fn copy_local(source: &Path, dest: &Path) -> Result<(), AttemptError> {
    if !source.exists() {
        return Err(AttemptError::Status(StatusCode::NOT_FOUND));
    }
    let mut staged = staging_file(dest)?;
    if source.is_dir() {
        staged.write_all(directory_index(source)?.as_bytes())?;
    } else {
        let mut input = std::fs::File::open(source)?;
        std::io::copy(&mut input, &mut staged)?;
    }
    staged.persist(dest).map_err(|e| AttemptError::Io(e.error))?;
    Ok(())
}

fn directory_index(dir: &Path) -> std::io::Result<String> {
    let mut page = String::from("<html><body><pre>\n");
    page.push_str("<a href=\"../\">../</a>\n");
    for name in mvnget_util::fs::list_file_names(dir)? {
        page.push_str(&format!("<a href=\"{name}\">{name}</a>\n"));
    }
    page.push_str("</pre></body></html>\n");
    Ok(page)
}

fn classify(err: reqwest::Error) -> AttemptError {
    let text = error_chain(&err);
    if err.is_body() || TRANSIENT_MARKERS.iter().any(|m| text.contains(m)) {
        AttemptError::Transient(text)
    } else {
        AttemptError::Fatal(text)
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
