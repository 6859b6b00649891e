//! Core update-availability logic for Pitwall.
//!
//! This crate is independent of any UI and provides:
//! - Dotted numeric version parsing and ordering.
//! - The update-check query against the game backend.
//! - Persistent memory of the version the user chose to skip.
//! - Store hand-off for accepted updates.
//! - The update gate tying these together for one app session.

mod gate;
mod skip;
mod store;
mod update;
mod version;

/// Session state machine deciding whether to show the update prompt.
pub use gate::{GateError, GateState, HostInfo, UpdateGate};
/// Skipped-version persistence.
pub use skip::{FileSkipMemory, SkipMemory, SkippedVersionRecord, StorageError};
/// Platform store hand-off.
pub use store::{StoreOpenError, StoreOpener, StoreTarget, SystemStoreOpener};
/// Update query model and HTTP client.
pub use update::{BuildNumber, QueryError, UpdateClient, UpdateInfo, UpdateSource};
/// Version ordering helpers.
pub use version::{VersionString, is_older};
