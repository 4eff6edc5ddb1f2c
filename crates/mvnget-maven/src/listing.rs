//! Version-directory listings: the HTML index page a repository serves for
//! `<group>/<artifact>/<version>/`, reduced to the file names it links to.

use lazy_static::lazy_static;
use regex::Regex;

use crate::cache::TempCache;
use crate::download::{Downloader, ReportPolicy};
use mvnget_util::errors::MvnGetError;

lazy_static! {
    static ref LINK_REGEX: Regex =
        Regex::new(r#"(?is)<a\s+(.*?)>\s*(.*?)\s*</a>"#).expect("valid link pattern");
    static ref HREF_REGEX: Regex =
        Regex::new(r#"(?i)href\s*=\s*["'](.*?)["']"#).expect("valid href pattern");
}

/// Sidecar extensions probed for every listed file.
pub const VERIFY_FILE_EXTENSIONS: [&str; 7] = [
    ".md5", ".sha1", ".asc", ".md5.asc", ".sha1.asc", ".asc.md5", ".asc.sha1",
];

/// Checksums of checksums and signatures of signatures: published by some
/// artifacts, never useful.
const INVALID_SUFFIXES: [&str; 13] = [
    ".md5.md5",
    ".md5.sha1",
    ".sha1.md5",
    ".sha1.sha1",
    ".asc.asc",
    ".md5.asc",
    ".sha1.asc",
    ".asc.asc.md5",
    ".asc.asc.sha1",
    ".md5.asc.md5",
    ".md5.asc.sha1",
    ".sha1.asc.md5",
    ".sha1.asc.sha1",
];

/// A file expected in a version directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFile {
    pub name: String,
    /// Listed by the server, as opposed to a guessed sidecar.
    pub required: bool,
}

impl ListedFile {
    fn new(name: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            required,
        }
    }
}

pub fn is_valid_filename(name: &str) -> bool {
    !INVALID_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// A single file name that stays inside the version directory it is
/// written to.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with("..") && !name.contains(['/', '\\'])
}

/// File names linked from an HTML directory page.
pub fn parse_links(page: &str) -> Vec<String> {
    let mut names = Vec::new();
    for link in LINK_REGEX.captures_iter(page) {
        let Some(href) = HREF_REGEX.captures(&link[1]) else {
            continue;
        };
        let mut target = href[1].to_string();
        if target.starts_with("http://") || target.starts_with("https://") {
            if let Some(pos) = target.rfind('/') {
                target = target[pos + 1..].to_string();
            }
        }
        let target = target.trim_start_matches(['/', ':']);
        if is_plain_file_name(target) {
            names.push(target.to_string());
        } else if !target.is_empty() {
            tracing::debug!("Ignoring link to {target}");
        }
    }
    names
}

/// Mark listed files required, and add optional sidecar guesses for files
/// that are not themselves sidecars.
pub fn with_sidecars(names: &[String]) -> Vec<ListedFile> {
    let mut files = Vec::new();
    for name in names {
        files.push(ListedFile::new(name.clone(), true));
        for ext in VERIFY_FILE_EXTENSIONS {
            if name.ends_with(ext) {
                continue;
            }
            let extended = format!("{name}{ext}");
            if names.contains(&extended) {
                continue;
            }
            files.push(ListedFile::new(extended, false));
        }
    }
    files
}

/// Fetch (or reuse) the listing page for `url` and return the files it names.
///
/// A page that cannot be fetched yields an empty list.
pub async fn list_files(
    downloader: &Downloader,
    cache: &TempCache,
    url: &str,
) -> miette::Result<Vec<ListedFile>> {
    let page_path = cache.listing_path(url)?;
    let outcome = downloader
        .download(
            url,
            &page_path,
            false,
            ReportPolicy {
                show_errors: true,
                show_not_found: false,
            },
        )
        .await?;
    if !outcome.is_present() {
        return Ok(Vec::new());
    }
    tracing::trace!("reading from {}", page_path.display());
    let bytes = std::fs::read(&page_path).map_err(MvnGetError::Io)?;
    let page = String::from_utf8_lossy(&bytes);
    Ok(with_sidecars(&parse_links(&page)))
}
