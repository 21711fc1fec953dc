//! `goodjob-auth`: authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: token
//! verification works on raw strings, and every guard is a pure predicate
//! over plain data. The API layer supplies the caller identity and the
//! stored role; nothing here performs IO.

pub mod claims;
pub mod guard;
pub mod policy;
pub mod roles;
pub mod token;

pub use claims::AuthClaims;
pub use guard::{
    can_annotate_case, can_delete_case, can_edit_case, can_modify_observation, can_modify_owned,
};
pub use policy::{permits, RouteAction};
pub use roles::Role;
pub use token::{Hs256TokenVerifier, TokenError, TokenVerifier};
