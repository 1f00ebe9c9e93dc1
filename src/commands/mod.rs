//! User actions, each an `impl Journal` block grouped by screen.

pub mod auth;
pub mod import;
pub mod journal;
pub mod milestones;
pub mod profile;
pub mod settings;
pub mod stats;
pub mod sync;
pub mod trades;
pub mod transactions;

pub use auth::*;
pub use import::*;
pub use profile::*;
pub use stats::*;
pub use sync::*;
pub use trades::*;
