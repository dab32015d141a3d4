//! Preheat policy domain logic.
//!
//! Pure types and the policy manager. Persistence lives behind the
//! [`policy_store::PolicyStore`] trait; `preheat-db` provides the Postgres
//! implementation.

pub mod error;
pub mod policy_manager;
pub mod policy_store;
pub mod preheat_policy;
pub mod query;
pub mod types;
