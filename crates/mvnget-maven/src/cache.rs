//! Scratch cache at `<outdir>/.tmp/` for listing pages, descriptors fetched
//! on demand, local-origin markers, and metadata documents.

use std::fs;
use std::path::{Path, PathBuf};

use mvnget_core::coordinate::Coordinate;
use mvnget_util::errors::MvnGetError;

const LOCAL_MARKER_SUFFIX: &str = "..local";

/// The `.tmp` directory under an output tree.
#[derive(Debug, Clone)]
pub struct TempCache {
    root: PathBuf,
}

impl TempCache {
    pub fn new(outdir: &Path) -> Self {
        Self {
            root: outdir.join(".tmp"),
        }
    }

    /// The cache directory, created on first use.
    pub fn root(&self) -> miette::Result<&Path> {
        if !self.root.is_dir() {
            tracing::warn!(
                "Creating temporary directory to store downloaded files at {}",
                self.root.display()
            );
            fs::create_dir_all(&self.root).map_err(MvnGetError::Io)?;
        }
        Ok(&self.root)
    }

    /// Where the listing page for `url` is kept.
    pub fn listing_path(&self, url: &str) -> miette::Result<PathBuf> {
        let name: String = url
            .chars()
            .map(|c| match c {
                ':' | '/' | '?' | '+' => '_',
                other => other,
            })
            .collect();
        Ok(self.root()?.join(name))
    }

    /// Where a descriptor fetched on demand is kept: `<artifact>-<version>.pom`.
    pub fn pom_path(&self, coordinate: &Coordinate) -> miette::Result<PathBuf> {
        Ok(self.root()?.join(coordinate.pom_file_name()))
    }

    /// Where the metadata document for `group:artifact` is kept.
    pub fn metadata_path(&self, group: &str, artifact: &str) -> miette::Result<PathBuf> {
        Ok(self
            .root()?
            .join(format!("{group}-{artifact}-maven-metadata.xml")))
    }

    /// Whether `cached` was obtained from a local repository.
    pub fn is_local(cached: &Path) -> bool {
        marker_path(cached).is_file()
    }

    /// Remember that `cached` came from a local repository.
    pub fn mark_local(cached: &Path) -> miette::Result<()> {
        fs::write(marker_path(cached), "Downloaded from local repo").map_err(MvnGetError::Io)?;
        Ok(())
    }
}

fn marker_path(cached: &Path) -> PathBuf {
    let mut name = cached.as_os_str().to_os_string();
    name.push(LOCAL_MARKER_SUFFIX);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_created_lazily() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cache = TempCache::new(tmp.path());
        assert!(!tmp.path().join(".tmp").exists());
        let root = cache.root().unwrap().to_path_buf();
        assert!(root.is_dir());
        assert!(root.ends_with(".tmp"));
    }

    #[test]
    fn listing_name_is_flattened() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cache = TempCache::new(tmp.path());
        let path = cache
            .listing_path("https://repo1.maven.org/maven2/a/b+c/1.0/?x")
            .unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "https___repo1.maven.org_maven2_a_b_c_1.0__x"
        );
    }

    #[test]
    fn pom_and_metadata_names() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cache = TempCache::new(tmp.path());
        let c = Coordinate::new("org.example", "lib", "1.0");
        assert!(cache.pom_path(&c).unwrap().ends_with("lib-1.0.pom"));
        assert!(cache
            .metadata_path("org.example", "lib")
            .unwrap()
            .ends_with("org.example-lib-maven-metadata.xml"));
    }

    #[test]
    fn local_marker_round_trip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cache = TempCache::new(tmp.path());
        let pom = cache
            .pom_path(&Coordinate::new("g", "a", "1"))
            .unwrap();
        assert!(!TempCache::is_local(&pom));
        TempCache::mark_local(&pom).unwrap();
        assert!(TempCache::is_local(&pom));
        assert!(cache.root().unwrap().join("a-1.pom..local").is_file());
    }
}
