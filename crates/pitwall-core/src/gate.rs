//! Update gate: decides whether this session shows the update prompt.
//!
//! The gate starts `Idle`, moves to `Checking` for the single in-flight
//! query, and then settles on `Idle` (nothing to show or the check failed),
//! `PromptVisible` or `Suppressed`. Once suppressed it stays that way until
//! the process restarts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info};
use pitwall_platform::Platform;
use thiserror::Error;

use crate::skip::SkipMemory;
use crate::store::{StoreOpenError, StoreOpener};
use crate::update::{BuildNumber, UpdateInfo, UpdateSource};
use crate::version::VersionString;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GateState {
    #[default]
    Idle,
    Checking,
    PromptVisible(UpdateInfo),
    Suppressed,
}

impl GateState {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Checking => "checking",
            Self::PromptVisible(_) => "prompt visible",
            Self::Suppressed => "suppressed",
        }
    }
}

impl std::fmt::Display for GateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("no update prompt is visible (gate is {state})")]
    NoPrompt { state: &'static str },
    #[error(transparent)]
    StoreOpen(#[from] StoreOpenError),
}

/// Details about the running build, supplied by the packaging layer.
#[derive(Debug, Clone)]
pub struct HostInfo {
    pub current_version: VersionString,
    pub platform: Platform,
    pub build_number: BuildNumber,
}

pub struct UpdateGate {
    host: HostInfo,
    source: Arc<dyn UpdateSource>,
    skip_memory: Arc<dyn SkipMemory>,
    store: Arc<dyn StoreOpener>,
    state: Mutex<GateState>,
    startup_check_issued: AtomicBool,
}

impl UpdateGate {
    pub fn new(
        host: HostInfo,
        source: Arc<dyn UpdateSource>,
        skip_memory: Arc<dyn SkipMemory>,
        store: Arc<dyn StoreOpener>,
    ) -> Self {
        Self {
            host,
            source,
            skip_memory,
            store,
            state: Mutex::new(GateState::Idle),
            startup_check_issued: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn state(&self) -> GateState {
        self.lock_state().clone()
    }

    #[must_use]
    pub fn update_info(&self) -> Option<UpdateInfo> {
        match &*self.lock_state() {
            GateState::PromptVisible(info) => Some(info.clone()),
            _ => None,
        }
    }

    /// The automatic cold-start check. Only the first call per gate runs a
    /// query; later calls return `None` untouched.
    pub async fn run_startup_check(&self) -> Option<GateState> {
        if self.startup_check_issued.swap(true, Ordering::SeqCst) {
            debug!("Startup update check already issued");
            return None;
        }
        Some(self.check_for_updates().await)
    }

    /// Query for an update and settle the gate. Returns the resulting state.
    ///
    /// Only runs from `Idle`; in any other state (including while another
    /// check is in flight) it returns the current state without querying.
    /// Query failures are logged and leave the gate `Idle`.
    pub async fn check_for_updates(&self) -> GateState {
        {
            let mut state = self.lock_state();
            if *state != GateState::Idle {
                debug!("Skipping update check, gate is {}", *state);
                return state.clone();
            }
            *state = GateState::Checking;
        }

        let result = self
            .source
            .check_for_updates(
                &self.host.current_version,
                self.host.platform,
                &self.host.build_number,
            )
            .await;

        let next = match result {
            Err(error) => {
                debug!("App update check failed: {error}");
                GateState::Idle
            }
            Ok(info) if !info.has_update => {
                debug!("No app update available");
                GateState::Idle
            }
            Ok(info) => self.settle_available_update(info),
        };

        *self.lock_state() = next.clone();
        next
    }

    fn settle_available_update(&self, info: UpdateInfo) -> GateState {
        if !info.is_newer_than_current() {
            debug!(
                "Server offered {} although {} is not older",
                info.latest_version, info.current_version
            );
        }

        if self.skip_memory.was_skipped(&info.latest_version) {
            debug!("Update {} was skipped earlier", info.latest_version);
            GateState::Suppressed
        } else {
            info!(
                "App update available: {} -> {}",
                info.current_version, info.latest_version
            );
            GateState::PromptVisible(info)
        }
    }

    /// Hide the prompt for this session only.
    ///
    /// # Errors
    /// Returns [`GateError::NoPrompt`] unless the prompt is visible.
    pub fn dismiss(&self) -> Result<(), GateError> {
        let mut state = self.lock_state();
        let GateState::PromptVisible(info) = &*state else {
            return Err(no_prompt(&state));
        };
        info!("Update {} dismissed for this session", info.latest_version);
        *state = GateState::Suppressed;
        Ok(())
    }

    /// Hide the prompt and never offer this version again.
    ///
    /// # Errors
    /// Returns [`GateError::NoPrompt`] unless the prompt is visible.
    pub fn skip(&self) -> Result<(), GateError> {
        let mut state = self.lock_state();
        let GateState::PromptVisible(info) = &*state else {
            return Err(no_prompt(&state));
        };
        info!("Skipping update {}", info.latest_version);
        self.skip_memory.record_skipped(&info.latest_version);
        *state = GateState::Suppressed;
        Ok(())
    }

    /// Send the user to the store. The prompt stays up if that fails so the
    /// user can retry.
    ///
    /// # Errors
    /// Returns [`GateError::NoPrompt`] unless the prompt is visible, and
    /// [`GateError::StoreOpen`] when the store page could not be opened.
    pub fn accept_and_open_store(&self) -> Result<(), GateError> {
        let update_url = {
            let state = self.lock_state();
            let GateState::PromptVisible(info) = &*state else {
                return Err(no_prompt(&state));
            };
            info.update_url.clone()
        };

        // The opener may block on the OS launcher; the state lock is not held.
        self.store.open_store(update_url.as_deref())?;

        let mut state = self.lock_state();
        if matches!(*state, GateState::PromptVisible(_)) {
            *state = GateState::Suppressed;
        }
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn no_prompt(state: &GateState) -> GateError {
    GateError::NoPrompt {
        state: state.name(),
    }
}
