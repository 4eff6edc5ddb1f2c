//! Checksum sidecar verification (MD5, SHA-1, and SHA-256 when published).

use std::path::{Path, PathBuf};

use mvnget_core::diagnostic::Diagnostics;
use mvnget_util::errors::MvnGetError;
use mvnget_util::hash::DigestAlgorithm;

/// Extensions that mark a file as a checksum sidecar itself.
pub const CHECKSUM_EXTENSIONS: [&str; 3] = [".md5", ".sha1", ".sha256"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecksumStatus {
    Match,
    Mismatch { expected: String, actual: String },
    NoSidecar,
}

pub fn is_checksum_file(name: &str) -> bool {
    CHECKSUM_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// `<file>.<ext>` for the given algorithm.
pub fn sidecar_path(path: &Path, algorithm: DigestAlgorithm) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(algorithm.extension());
    PathBuf::from(name)
}

/// Pull the hex digest out of a sidecar's text.
///
/// Accepts `digest`, `digest  filename`, `ALGO(filename)= digest` and
/// `ALGO(digest) filename`. The first token of the expected hex length
/// wins; otherwise the first token is used as-is.
pub fn extract_digest(content: &str, algorithm: DigestAlgorithm) -> String {
    let expected_len = match algorithm {
        DigestAlgorithm::Md5 => 32,
        DigestAlgorithm::Sha1 => 40,
        DigestAlgorithm::Sha256 => 64,
    };
    let is_digest =
        |s: &str| s.len() == expected_len && s.chars().all(|c| c.is_ascii_hexdigit());

    for token in content.split_whitespace() {
        let candidate = token.trim_end_matches('=');
        if is_digest(candidate) {
            return candidate.to_string();
        }
        if let (Some(open), Some(close)) = (candidate.find('('), candidate.rfind(')')) {
            if open < close && is_digest(&candidate[open + 1..close]) {
                return candidate[open + 1..close].to_string();
            }
        }
    }
    content
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Compare `path` against its sidecar for `algorithm`, if there is one.
pub fn check_file(path: &Path, algorithm: DigestAlgorithm) -> miette::Result<ChecksumStatus> {
    let sidecar = sidecar_path(path, algorithm);
    if !sidecar.is_file() {
        return Ok(ChecksumStatus::NoSidecar);
    }
    let content = std::fs::read_to_string(&sidecar).map_err(MvnGetError::Io)?;
    let expected = extract_digest(&content, algorithm);
    let actual = algorithm.hex_file(path).map_err(MvnGetError::Io)?;
    if actual.eq_ignore_ascii_case(&expected) {
        tracing::debug!("{} ok for {}", algorithm.extension(), path.display());
        Ok(ChecksumStatus::Match)
    } else {
        Ok(ChecksumStatus::Mismatch { expected, actual })
    }
}

/// Check every published checksum of `path`, recording mismatches as
/// violations and missing MD5/SHA-1 sidecars as notes.
///
/// Signature files commonly ship without checksums, so their missing
/// sidecars are only logged.
pub fn verify_file(subject: &str, path: &Path, diagnostics: &Diagnostics) -> miette::Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let is_signature = name.ends_with(".asc");

    for algorithm in [
        DigestAlgorithm::Md5,
        DigestAlgorithm::Sha1,
        DigestAlgorithm::Sha256,
    ] {
        match check_file(path, algorithm)? {
            ChecksumStatus::Match => {}
            ChecksumStatus::Mismatch { expected, actual } => diagnostics.violation(
                subject,
                vec![path.to_path_buf()],
                format!(
                    "{} {} does not match downloaded checksum file ({actual} vs {expected})",
                    path.display(),
                    algorithm.extension()
                ),
            ),
            ChecksumStatus::NoSidecar if algorithm == DigestAlgorithm::Sha256 => {}
            ChecksumStatus::NoSidecar if is_signature => {
                tracing::debug!("  !> {name} has no {} file", algorithm.extension());
            }
            ChecksumStatus::NoSidecar => {
                tracing::info!("  !> {name} has no {} file", algorithm.extension());
                diagnostics.note(
                    subject,
                    vec![path.to_path_buf()],
                    format!("{name} has no {} file", algorithm.extension()),
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_MD5: &str = "5eb63bbbe01eeed093cb22bb8f5acdc3";
    const HELLO_SHA1: &str = "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed";

    #[test]
    fn extract_plain_and_with_filename() {
        assert_eq!(extract_digest("abc123\n", DigestAlgorithm::Md5), "abc123");
        assert_eq!(
            extract_digest(&format!("{HELLO_MD5}  hello.txt\n"), DigestAlgorithm::Md5),
            HELLO_MD5
        );
    }

    #[test]
    fn extract_bsd_style() {
        assert_eq!(
            extract_digest(&format!("MD5(hello.txt)= {HELLO_MD5}"), DigestAlgorithm::Md5),
            HELLO_MD5
        );
        assert_eq!(
            extract_digest(&format!("SHA1({HELLO_SHA1}) hello.txt"), DigestAlgorithm::Sha1),
            HELLO_SHA1
        );
    }

    #[test]
    fn extract_empty() {
        assert_eq!(extract_digest("  \n", DigestAlgorithm::Sha1), "");
    }

    #[test]
    fn sidecar_names() {
        let p = Path::new("/x/lib-1.0.jar");
        assert_eq!(
            sidecar_path(p, DigestAlgorithm::Sha1),
            PathBuf::from("/x/lib-1.0.jar.sha1")
        );
        assert!(is_checksum_file("lib-1.0.jar.sha256"));
        assert!(!is_checksum_file("lib-1.0.jar.asc"));
    }

    #[test]
    fn verify_match_mismatch_and_missing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file = tmp.path().join("hello.txt");
        std::fs::write(&file, b"hello world").unwrap();
        std::fs::write(tmp.path().join("hello.txt.md5"), HELLO_MD5.to_uppercase()).unwrap();
        std::fs::write(
            tmp.path().join("hello.txt.sha1"),
            "0000000000000000000000000000000000000000",
        )
        .unwrap();

        assert_eq!(check_file(&file, DigestAlgorithm::Md5).unwrap(), ChecksumStatus::Match);

        let diags = Diagnostics::new();
        verify_file("g:a:1", &file, &diags).unwrap();
        let records = diags.snapshot();
        assert_eq!(records.len(), 1);
        assert!(records[0].violation);
        assert!(records[0].message.contains("sha1 does not match"));
        assert_eq!(records[0].files, vec![file.clone()]);
    }

    #[test]
    fn missing_sidecars_are_notes_except_for_signatures() {
        let tmp = tempfile::TempDir::new().unwrap();
        let jar = tmp.path().join("a.jar");
        let asc = tmp.path().join("a.jar.asc");
        std::fs::write(&jar, b"x").unwrap();
        std::fs::write(&asc, b"sig").unwrap();

        let diags = Diagnostics::new();
        verify_file("g:a:1", &asc, &diags).unwrap();
        assert!(diags.is_empty());

        verify_file("g:a:1", &jar, &diags).unwrap();
        let records = diags.snapshot();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| !r.violation));
    }
}
