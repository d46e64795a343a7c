//! Small shared helpers

pub mod hashing;
pub mod paths;

pub use hashing::stable_id;
pub use paths::{normalize_path, safe_relative_path};
