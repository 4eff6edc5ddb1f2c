//! Maven 2 repository layout: turning user-supplied artifact identifiers into
//! version-directory URLs, and URLs back into output-tree paths.

use std::path::PathBuf;

use mvnget_core::config::Config;
use mvnget_core::coordinate::Coordinate;
use mvnget_core::diagnostic::Diagnostics;
use mvnget_util::errors::MvnGetError;

/// The configured remote and local repository base URLs.
///
/// Every base URL ends with `/`.
#[derive(Debug, Clone, Default)]
pub struct RepositoryLayout {
    remote: Vec<String>,
    local: Vec<String>,
}

impl RepositoryLayout {
    pub fn new(remote: Vec<String>, local: Vec<String>) -> Self {
        Self {
            remote: remote.into_iter().map(with_trailing_slash).collect(),
            local: local.into_iter().map(with_trailing_slash).collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.remote_repo_urls.clone(),
            config.local_repo_urls.clone(),
        )
    }

    pub fn remote_urls(&self) -> &[String] {
        &self.remote
    }

    pub fn local_urls(&self) -> &[String] {
        &self.local
    }

    /// Whether `url` lives under one of the remote repositories.
    pub fn is_remote(&self, url: &str) -> bool {
        self.remote.iter().any(|base| url.starts_with(base.as_str()))
    }

    /// Candidate version-directory URLs for a user-supplied identifier:
    /// a repository URL or a `group:artifact:version` triple.
    ///
    /// Unrecognised input is recorded as a diagnostic and yields no URLs.
    pub fn convert_to_repo_urls(
        &self,
        artifact_id: &str,
        diagnostics: &Diagnostics,
    ) -> Vec<String> {
        if artifact_id.starts_with("http://") || artifact_id.starts_with("https://") {
            return self.urls_from_url(artifact_id, diagnostics);
        }
        if artifact_id.matches(':').count() == 2 {
            if let Some(coordinate) = Coordinate::parse(artifact_id) {
                return self.version_dir_urls(&coordinate);
            }
        }
        diagnostics.note(
            artifact_id,
            vec![],
            "Unknown format artifact format.  Must be either a maven repo URL or group:artifact:version",
        );
        Vec::new()
    }

    /// `<base><group/path>/<artifact>/<version>/` for each remote repository.
    pub fn version_dir_urls(&self, coordinate: &Coordinate) -> Vec<String> {
        self.remote
            .iter()
            .map(|base| format!("{base}{}/", coordinate.path()))
            .collect()
    }

    /// `<base><group/path>/<artifact>/maven-metadata.xml` for each remote repository.
    pub fn metadata_urls(&self, group: &str, artifact: &str) -> Vec<String> {
        self.remote
            .iter()
            .map(|base| {
                format!(
                    "{base}{}/{artifact}/maven-metadata.xml",
                    group.replace('.', "/")
                )
            })
            .collect()
    }

    /// Map a URL from any known repository onto every remote repository.
    ///
    /// A trailing `.jar` or `.pom` file name is dropped, and a dotted first
    /// path segment (mvnrepository.com style) is split into path segments.
    fn urls_from_url(&self, src_url: &str, diagnostics: &Diagnostics) -> Vec<String> {
        let Some(base) = self
            .remote
            .iter()
            .chain(self.local.iter())
            .find(|base| src_url.starts_with(base.as_str()))
        else {
            diagnostics.note(src_url, vec![], "Unknown source repository.");
            return Vec::new();
        };

        let mut parts: Vec<String> = src_url[base.len()..]
            .split('/')
            .map(str::to_string)
            .collect();
        if parts
            .last()
            .is_some_and(|last| last.ends_with(".jar") || last.ends_with(".pom"))
        {
            parts.pop();
        }
        if parts.first().is_some_and(|first| first.find('.').is_some_and(|p| p > 0)) {
            let first = parts.remove(0);
            let mut split: Vec<String> = first.split('.').map(str::to_string).collect();
            split.append(&mut parts);
            parts = split;
        }

        let relative = parts.join("/");
        self.remote
            .iter()
            .map(|prefix| with_trailing_slash(format!("{prefix}{relative}")))
            .collect()
    }

    /// Output-tree directory (relative to the output root) for a remote URL.
    pub fn artifact_path_for_url(&self, url: &str) -> miette::Result<PathBuf> {
        let base = self
            .remote
            .iter()
            .find(|base| url.starts_with(base.as_str()))
            .ok_or_else(|| MvnGetError::Generic {
                message: format!("unknown artifact url {url}"),
            })?;
        Ok(url[base.len()..]
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .collect())
    }
}

fn with_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}
