//! Incident cases ("abusos").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Case workflow state.
///
/// No transition table is enforced: any value may follow any other via PATCH.
/// That is intentional: the workflow is driven by the case managers, not by
/// the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseStatus {
    Pendiente,
    #[serde(rename = "En proceso")]
    EnProceso,
    Finalizado,
}

impl CaseStatus {
    /// Open cases are eligible for automatic protocol linking.
    pub fn is_open(&self) -> bool {
        matches!(self, CaseStatus::Pendiente | CaseStatus::EnProceso)
    }

    /// The stored strings for open states, for `in`-set queries.
    pub fn open_states() -> &'static [&'static str] {
        &["Pendiente", "En proceso"]
    }
}

impl Default for CaseStatus {
    fn default() -> Self {
        CaseStatus::Pendiente
    }
}

/// A tracked incident concerning one mobile user.
///
/// `fecha` is a date-only string when the caller supplied a usable date,
/// otherwise the server timestamp at creation. `observaciones` is the
/// free-text field on the case itself, distinct from the Observation
/// sub-entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub usuario_id: String,
    pub fecha: String,
    #[serde(default)]
    pub estado: CaseStatus,
    #[serde(default)]
    pub observaciones: String,
    pub gestor_asignado: Option<String>,
    #[serde(default)]
    pub protocolos_asociados: Vec<String>,
    pub creado_en: DateTime<Utc>,
    pub creada_por: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actualizado_en: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estado_serializes_to_stored_strings() {
        assert_eq!(
            serde_json::to_value(CaseStatus::EnProceso).unwrap(),
            "En proceso"
        );
        assert_eq!(
            serde_json::from_value::<CaseStatus>("Pendiente".into()).unwrap(),
            CaseStatus::Pendiente
        );
    }

    #[test]
    fn only_pendiente_and_en_proceso_are_open() {
        assert!(CaseStatus::Pendiente.is_open());
        assert!(CaseStatus::EnProceso.is_open());
        assert!(!CaseStatus::Finalizado.is_open());
    }
}
