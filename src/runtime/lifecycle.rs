//! Server Lifecycle - drives the install decision for one managed server.
//!
//! Each activation re-enters the state machine:
//!
//! ```text
//! NotChecked -> NeedsInstall | UpToDate
//! NeedsInstall -> UpToDate   (install succeeded)
//! NeedsInstall -> Error      (install failed, no retry)
//! ```
//!
//! Every transition is reported to the `LifecycleHost`. Mutation goes through
//! `&mut self`, so one lifecycle cannot run two installs at once.

use std::sync::Arc;

use crate::api::types::{InstallError, LifecycleState};
use crate::host::{LifecycleHost, ManagedServer};

pub struct ServerLifecycle {
    server: Arc<dyn ManagedServer>,
    host: Arc<dyn LifecycleHost>,
    state: LifecycleState,
}

impl ServerLifecycle {
    pub fn new(server: Arc<dyn ManagedServer>, host: Arc<dyn LifecycleHost>) -> Self {
        Self {
            server,
            host,
            state: LifecycleState::NotChecked,
        }
    }

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    fn transition(&mut self, state: LifecycleState) {
        log::debug!(
            "Lifecycle transition: server={}, from={:?}, to={:?}",
            self.server.name(),
            self.state,
            state
        );
        self.host.set_state(self.server.name(), &state);
        self.state = state;
    }

    /// Decide whether an install is needed, without installing.
    pub async fn check(&mut self) -> LifecycleState {
        self.state = LifecycleState::NotChecked;
        let next = if self.server.needs_update_or_installation().await {
            LifecycleState::NeedsInstall
        } else {
            LifecycleState::UpToDate
        };
        self.transition(next.clone());
        next
    }

    /// Check, then install if needed.
    ///
    /// On failure the lifecycle ends in `Error` and the typed error is
    /// returned so the host can abort server startup.
    pub async fn activate(&mut self) -> Result<LifecycleState, InstallError> {
        if self.check().await == LifecycleState::UpToDate {
            return Ok(LifecycleState::UpToDate);
        }

        log::info!("Starting server install: server={}", self.server.name());

        match self.server.install_or_update().await {
            Ok(()) => {
                self.transition(LifecycleState::UpToDate);
                Ok(LifecycleState::UpToDate)
            }
            Err(e) => {
                self.transition(LifecycleState::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }
}
