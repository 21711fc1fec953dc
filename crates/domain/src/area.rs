//! Organizational areas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An organizational department/unit. Surveys target areas; mobile users
/// belong to at most one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub nombre_area: String,
    pub nombre_encargado: String,
    pub correo_encargado: String,
    #[serde(default)]
    pub descripcion: String,
    pub creada_por: String,
    pub creado_en: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actualizado_en: Option<DateTime<Utc>>,
}
