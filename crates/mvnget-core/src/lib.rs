//! Core data types shared by every mvnget crate: artifact coordinates, user
//! configuration, and the diagnostic records accumulated during a run.

pub mod config;
pub mod coordinate;
pub mod defaults;
pub mod diagnostic;
