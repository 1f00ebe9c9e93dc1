pub mod client;
pub mod error;
pub mod firebase;
pub mod sync;
pub mod throttle;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{ProgressSnapshot, RateLimitConfig, RemoteBackend, RemoteSession};
pub use error::RemoteError;
pub use firebase::FirebaseBackend;
pub use sync::{RemoteSync, SyncOperation, SyncOutcome};
