use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all mvnget operations.
#[derive(Debug, Error, Diagnostic)]
pub enum MvnGetError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration file or option.
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check your .mvnget.toml for syntax errors"))]
    Config { message: String },

    /// Network request or download failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// An XML document (POM, metadata, listing) could not be parsed.
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// A version string or version range could not be parsed.
    #[error("Invalid version: {message}")]
    Version { message: String },

    /// Checksum or signature verification could not be performed.
    #[error("Verification error: {message}")]
    Verification { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type MvnGetResult<T> = miette::Result<T>;
