//! Case observations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A free-text annotation on a case, written by the assigned gestor.
///
/// Ownership is deliberately *not* denormalized here: authorization re-reads
/// the parent case's `gestorAsignado` on every call, so reassigning a gestor
/// immediately changes who may touch existing observations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub caso_id: String,
    pub gestor_id: String,
    pub texto: String,
    pub fecha: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_actualizacion: Option<DateTime<Utc>>,
}
