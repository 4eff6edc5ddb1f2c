//! Detached PGP signature checks.
//!
//! The verifier itself is an external collaborator behind
//! [`SignatureVerifier`]; [`GpgVerifier`] drives the `gpg` binary.

use std::path::{Path, PathBuf};

use mvnget_core::diagnostic::Diagnostics;
use mvnget_util::errors::MvnGetError;
use mvnget_util::process::{self, CommandBuilder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    Valid,
    NoPublicKey,
    Bad,
    /// Anything else the verifier reported, verbatim.
    Other(String),
}

impl std::fmt::Display for SignatureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Valid => f.write_str("signature valid"),
            Self::NoPublicKey => f.write_str("no public key"),
            Self::Bad => f.write_str("signature bad"),
            Self::Other(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub status: SignatureStatus,
    pub key_id: Option<String>,
}

pub trait SignatureVerifier: Send + Sync {
    /// Check `signature` (a detached `.asc`) against `signed`.
    fn verify(&self, signed: &Path, signature: &Path) -> miette::Result<Verification>;

    /// Import `key_id` from a key server.
    fn receive_key(&self, server: &str, key_id: &str) -> miette::Result<()>;
}

/// Verifies with the `gpg` binary, using a keyring under the output tree.
#[derive(Debug, Clone)]
pub struct GpgVerifier {
    home: PathBuf,
}

impl GpgVerifier {
    pub fn new(home: PathBuf) -> Self {
        Self { home }
    }

    /// A verifier keyed to `<outdir>/.gnupg`, or `None` when `gpg` cannot be run.
    pub fn detect(outdir: &Path) -> miette::Result<Option<Self>> {
        if !process::is_available("gpg") {
            tracing::debug!("gpg not found; signature checks disabled");
            return Ok(None);
        }
        let home = outdir.join(".gnupg");
        mvnget_util::fs::ensure_dir(&home).map_err(MvnGetError::Io)?;
        restrict_permissions(&home);
        Ok(Some(Self::new(home)))
    }

    fn gpg(&self) -> CommandBuilder {
        CommandBuilder::new("gpg")
            .env("GNUPGHOME", self.home.to_string_lossy())
            .arg("--batch")
    }
}

#[cfg(unix)]
fn restrict_permissions(dir: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700)) {
        tracing::debug!("Could not restrict {}: {e}", dir.display());
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_dir: &Path) {}

impl SignatureVerifier for GpgVerifier {
    fn verify(&self, signed: &Path, signature: &Path) -> miette::Result<Verification> {
        let output = self
            .gpg()
            .args(["--status-fd", "1", "--verify"])
            .arg(signature.to_string_lossy().to_string())
            .arg(signed.to_string_lossy().to_string())
            .exec_stdout()?;
        Ok(parse_status(&output))
    }

    fn receive_key(&self, server: &str, key_id: &str) -> miette::Result<()> {
        let output = self
            .gpg()
            .args(["--keyserver", server, "--recv-keys", key_id])
            .exec()?;
        if !output.status.success() {
            tracing::debug!(
                "gpg could not receive key {key_id} from {server}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

/// Map `gpg --status-fd` output onto a verdict.
pub fn parse_status(output: &str) -> Verification {
    let mut key_id = None;
    let mut status = None;
    let mut last_line = String::new();

    for line in output.lines() {
        let Some(rest) = line.strip_prefix("[GNUPG:] ") else {
            continue;
        };
        last_line = rest.to_string();
        let mut fields = rest.split_whitespace();
        let keyword = fields.next().unwrap_or_default();
        let field = fields.next().map(str::to_string);
        match keyword {
            "GOODSIG" | "VALIDSIG" => {
                key_id = key_id.or(field);
                status.get_or_insert(SignatureStatus::Valid);
            }
            "NO_PUBKEY" | "ERRSIG" if status.is_none() => {
                key_id = field;
                if keyword == "NO_PUBKEY" {
                    status = Some(SignatureStatus::NoPublicKey);
                }
            }
            "BADSIG" => {
                key_id = field;
                status = Some(SignatureStatus::Bad);
            }
            _ => {}
        }
    }

    let status = status.unwrap_or_else(|| {
        if last_line.is_empty() {
            SignatureStatus::Other("no verdict from gpg".to_string())
        } else {
            SignatureStatus::Other(last_line)
        }
    });
    Verification { status, key_id }
}

/// Verify `signature` over `signed` and record the verdict.
///
/// A missing public key is fetched from each key server before one retry.
/// Does nothing when no verifier is available or no key servers are set.
pub fn verify_signature(
    subject: &str,
    signed: &Path,
    signature: &Path,
    verifier: Option<&dyn SignatureVerifier>,
    key_servers: &[String],
    diagnostics: &Diagnostics,
) -> miette::Result<()> {
    let Some(verifier) = verifier.filter(|_| !key_servers.is_empty()) else {
        tracing::debug!(" - skipped PGP signature checking of {}", signed.display());
        return Ok(());
    };

    let mut verdict = verifier.verify(signed, signature)?;
    if verdict.status == SignatureStatus::NoPublicKey {
        if let Some(key_id) = verdict.key_id.clone() {
            tracing::debug!(" - loading public key {key_id}");
            for server in key_servers {
                verifier.receive_key(server, &key_id)?;
            }
            verdict = verifier.verify(signed, signature)?;
        }
    }

    let both = vec![signed.to_path_buf(), signature.to_path_buf()];
    match verdict.status {
        SignatureStatus::Valid => {
            tracing::info!("  ~> PGP signature valid for {}", signed.display());
            tracing::debug!("  -- key id: {}", verdict.key_id.unwrap_or_default());
        }
        SignatureStatus::NoPublicKey => diagnostics.violation(
            subject,
            both,
            format!(
                "PGP signature could not be validated for {}: {}",
                signed.display(),
                verdict.status
            ),
        ),
        SignatureStatus::Bad => diagnostics.violation(
            subject,
            vec![signature.to_path_buf()],
            format!(
                "PGP signature validation failed for {}: signature file is corrupted",
                signed.display()
            ),
        ),
        SignatureStatus::Other(ref text) => diagnostics.violation(
            subject,
            both,
            format!(
                "PGP signature validation failed for {}: {text}",
                signed.display()
            ),
        ),
    }
    Ok(())
}
