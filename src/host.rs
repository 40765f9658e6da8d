//! Host boundary traits.
//!
//! `ManagedServer` is the capability a host plugin layer consumes before it
//! starts a language-server session. `LifecycleHost` is the callback a host
//! implements to learn about lifecycle transitions (progress UI, error
//! dialogs). Neither trait knows anything about a particular editor.

use async_trait::async_trait;

use crate::api::types::{InstallError, LifecycleState};

/// A language server whose binary is managed on the host's behalf.
#[async_trait]
pub trait ManagedServer: Send + Sync {
    /// Session name (e.g., "gopls").
    fn name(&self) -> &str;

    /// Queried before establishing a language-server connection.
    async fn needs_update_or_installation(&self) -> bool;

    /// Invoked when the check above returns true. An error must abort
    /// server startup.
    async fn install_or_update(&self) -> Result<(), InstallError>;
}

/// Callback interface for lifecycle transitions.
pub trait LifecycleHost: Send + Sync {
    /// Called on every state change, including `Error`.
    fn set_state(&self, server: &str, state: &LifecycleState);
}

/// Host that only logs transitions.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHost;

impl LifecycleHost for LoggingHost {
    fn set_state(&self, server: &str, state: &LifecycleState) {
        match state {
            LifecycleState::Error { message } => {
                log::error!("Lifecycle error: server={server}, error={message}")
            }
            other => log::info!("Lifecycle state: server={server}, state={other:?}"),
        }
    }
}
