//! Mobile-app users (employees).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A name + phone pair (emergency contact, HR contact).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contacto {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub telefono: String,
}

/// An employee using the mobile app.
///
/// The document ID equals the identity-provider account UID (also mirrored
/// in `uid`). `area` is an Area ID or the empty string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileUser {
    pub uid: String,
    pub nombres: String,
    pub apellidos: String,
    pub rut: String,
    pub correo: String,
    #[serde(default)]
    pub genero: String,
    #[serde(default)]
    pub fecha_nacimiento: String,
    pub rol: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub es_vulnerado: bool,
    #[serde(default)]
    pub recibe_encuesta: bool,
    #[serde(default)]
    pub firmo_contrato_privacidad: bool,
    #[serde(default)]
    pub contacto: String,
    pub tipo_usuario: String,
    #[serde(default)]
    pub contactos_emergencia: Vec<Contacto>,
    #[serde(default, rename = "contactoRRHH")]
    pub contacto_rrhh: Contacto,
    pub creado_en: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actualizado_en: Option<DateTime<Utc>>,
}

/// Clean up caller-supplied emergency contacts: drop empty entries, trim
/// whitespace, keep at most 3.
pub fn normalize_emergency_contacts(input: Vec<Contacto>) -> Vec<Contacto> {
    input
        .into_iter()
        .filter(|c| !c.nombre.trim().is_empty() || !c.telefono.trim().is_empty())
        .map(|c| Contacto {
            nombre: c.nombre.trim().to_string(),
            telefono: c.telefono.trim().to_string(),
        })
        .take(3)
        .collect()
}
