//! Thin client for the Syncthing REST API.
//!
//! The [`SyncthingApi`] trait is the seam the scheduler core programs
//! against; [`RestSyncthingClient`] is the production implementation.

pub mod provider;
pub mod rest;
pub mod types;

pub use provider::SyncthingApi;
pub use rest::{ClientOptions, RestSyncthingClient};
pub use types::{FolderConfig, FolderStatus, SystemConfig};
