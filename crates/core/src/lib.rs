//! `certportal-core` — workflow foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the workflow error taxonomy, and the unique-code
//! formats used for human-readable numbers.

pub mod code;
pub mod error;
pub mod id;

pub use code::CodeKind;
pub use error::{Precondition, WorkflowError, WorkflowResult};
pub use id::{CompanyId, RecordId, UserId};
