//! Shared utilities for mvnget.
//!
//! Cross-cutting helpers used by every other mvnget crate: the unified error
//! type, filesystem helpers, file digests, external process spawning, and
//! console status output.

pub mod errors;
pub mod fs;
pub mod hash;
pub mod process;
pub mod progress;
