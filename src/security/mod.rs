pub mod hashing;

pub use hashing::{hash_password, verify_password};
