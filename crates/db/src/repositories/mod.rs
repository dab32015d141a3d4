//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod preheat_policy_repo;

pub use preheat_policy_repo::{PolicyQueryError, PreheatPolicyRepo};
