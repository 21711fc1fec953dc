//! `goodjob-audit`: append-only audit trail.
//!
//! Every mutating handler records who did what to which entity, with full
//! before/after document images for edits. Recording is strictly best-effort:
//! a failed audit write is logged under the `audit` tracing target and
//! swallowed, never failing the primary operation.

pub mod action;
pub mod entry;
pub mod recorder;

pub use action::{AuditAction, AuditEntity};
pub use entry::{AuditDetail, AuditEntry};
pub use recorder::AuditRecorder;
