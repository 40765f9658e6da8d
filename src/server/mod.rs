//! Server binary management domain.
//!
//! Handles installation status, version tracking and installation of the
//! language server. Installations live in `<storage_root>/<package_name>/`.

pub mod manager;
pub mod releases;
