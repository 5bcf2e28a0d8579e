//! Remote mirroring of diaries and the message of the day.
//!
//! ## Model
//!
//! Local storage is authoritative. Each local mutation is pushed to the
//! service in the background (create, update, delete, MOTD) and a failed push
//! never undoes the local write. A pull replaces the local diary collection
//! wholesale, but only when the service returned a non-empty collection.
//!
//! Sync is inert unless an endpoint and API key are configured.

mod client;
mod coordinator;
mod error;
mod protocol;
mod remote;

pub use client::{ApiClient, DEFAULT_TIMEOUT};
pub use coordinator::{PushOp, RemoteSnapshot, SyncCoordinator, UNKNOWN_ACTOR};
pub use error::SyncError;
pub use protocol::{ApiResponse, CreateDiaryRequest, MotdRequest, UpdateDiaryRequest};
pub use remote::RemoteApi;

#[cfg(test)]
pub(crate) use coordinator::testing;
