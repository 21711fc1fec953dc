//! `goodjob-core`: shared domain primitives.
//!
//! The domain error model, date-only normalization, and the RUT (Chilean
//! national ID) value object.

pub mod date;
pub mod error;
pub mod rut;

pub use date::normalize_date;
pub use error::{DomainError, DomainResult};
pub use rut::Rut;
