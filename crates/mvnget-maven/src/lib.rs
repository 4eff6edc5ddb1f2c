//! Maven 2 repository protocol: repository layout, directory listings,
//! the concurrent retrieval layer, POM and metadata parsing, and the
//! checksum, signature and license checks applied to downloaded files.

pub mod cache;
pub mod checksum;
pub mod download;
pub mod license;
pub mod listing;
pub mod metadata;
pub mod pom;
pub mod repository;
pub mod signature;
