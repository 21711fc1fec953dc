//! Web-portal staff accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use goodjob_auth::Role;

/// A staff account for the admin portal. This is the document the role
/// lookup reads on every authorized request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebUser {
    pub uid: String,
    pub nombres: String,
    pub apellidos: String,
    pub rut: String,
    pub correo: String,
    pub area: String,
    pub rol: Role,
    #[serde(default)]
    pub contacto: String,
    /// Forces a password change after first login.
    pub requiere_cambio_password: bool,
    pub creado_en: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actualizado_en: Option<DateTime<Utc>>,
}
