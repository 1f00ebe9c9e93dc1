pub mod de;
pub mod journal_entry;
pub mod profile;
pub mod settings;
pub mod trade;
pub mod transaction;
pub mod user;

pub use journal_entry::*;
pub use profile::*;
pub use settings::*;
pub use trade::*;
pub use transaction::*;
pub use user::*;
