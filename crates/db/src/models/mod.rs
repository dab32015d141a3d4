//! Row types for the tables owned by this crate.

pub mod preheat_policy;
