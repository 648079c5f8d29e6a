//! `certportal-auth` — caller identity and authorization checks.
//!
//! Token verification lives upstream (gateway); this crate only models the
//! resolved `(user, role)` pair and the pure policy checks the workflow
//! engine performs at its boundary.

pub mod principal;
pub mod role;

pub use principal::Principal;
pub use role::Role;
