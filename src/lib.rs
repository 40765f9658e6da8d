//! Binary lifecycle management for the gopls language server.
//!
//! [`server::manager::ServerManager`] decides whether the server binary is
//! missing or stale and installs it through the Go toolchain, tracking the
//! installed version in a marker file. Hosts drive it through the
//! [`host::ManagedServer`] capability, usually via
//! [`runtime::lifecycle::ServerLifecycle`].

pub mod api;
pub mod config;
pub mod host;
pub mod runtime;
pub mod server;

pub use api::types::{InstallError, LifecycleState, ServerStatus};
pub use config::{ManagerConfig, ServerSettings};
pub use server::manager::ServerManager;
