//! `goodjob-domain`: entity model.
//!
//! Typed shapes for the documents the platform stores. Field names serialize
//! to the exact wire names the frontend and the stored documents use
//! (Spanish camelCase), so these structs round-trip through the schemaless
//! store and the REST surface unchanged.

pub mod area;
pub mod case;
pub mod gender;
pub mod mobile_user;
pub mod observation;
pub mod protocol;
pub mod survey;
pub mod web_user;

pub use area::Area;
pub use case::{Case, CaseStatus};
pub use gender::{expand_genero, Gender, GeneroInput};
pub use mobile_user::{normalize_emergency_contacts, Contacto, MobileUser};
pub use observation::Observation;
pub use protocol::Protocol;
pub use survey::{Question, QuestionType, Survey};
pub use web_user::WebUser;

/// Collection names as they appear in the backing document store.
pub mod collections {
    pub const SURVEYS: &str = "encuestas";
    pub const AREAS: &str = "areas";
    pub const MOBILE_USERS: &str = "UsuarioMovil";
    pub const WEB_USERS: &str = "usuariosWeb";
    pub const CASES: &str = "abusos";
    pub const PROTOCOLS: &str = "protocolos";
    pub const OBSERVATIONS: &str = "observaciones";
    pub const AUDIT: &str = "auditoria";
}
