//! Declaration graph resolution: Maven version ordering and ranges,
//! descriptor building with property substitution and parent inheritance,
//! and the resolution session that discovers required dependencies.

pub mod cache;
pub mod descriptor;
pub mod range;
pub mod resolver;
pub mod version;
