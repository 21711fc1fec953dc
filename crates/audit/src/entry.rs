use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::{AuditAction, AuditEntity};

/// Detail payload of an audit entry.
///
/// Creates and deletes carry the full document; edits carry the full
/// before/after pair rather than a diff, since the frontend renders both
/// sides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuditDetail {
    Cambio { antes: Value, despues: Value },
    Datos { datos: Value },
}

/// One append-only audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub usuario_uid: Option<String>,
    pub usuario_email: Option<String>,
    pub accion: AuditAction,
    pub entidad: AuditEntity,
    pub entidad_id: String,
    pub detalle: AuditDetail,
}

impl AuditEntry {
    /// Entry for a create or delete, carrying the full document.
    pub fn datos(
        uid: Option<String>,
        email: Option<String>,
        accion: AuditAction,
        entidad: AuditEntity,
        entidad_id: impl Into<String>,
        datos: Value,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            usuario_uid: uid,
            usuario_email: email,
            accion,
            entidad,
            entidad_id: entidad_id.into(),
            detalle: AuditDetail::Datos { datos },
        }
    }

    /// Entry for an edit, carrying the full pre/post images.
    pub fn cambio(
        uid: Option<String>,
        email: Option<String>,
        accion: AuditAction,
        entidad: AuditEntity,
        entidad_id: impl Into<String>,
        antes: Value,
        despues: Value,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            usuario_uid: uid,
            usuario_email: email,
            accion,
            entidad,
            entidad_id: entidad_id.into(),
            detalle: AuditDetail::Cambio { antes, despues },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn edit_detail_serializes_as_antes_despues() {
        let entry = AuditEntry::cambio(
            Some("uid-1".into()),
            Some("ana@x.com".into()),
            AuditAction::EditarAbuso,
            AuditEntity::Abuso,
            "caso-1",
            json!({"estado": "Pendiente"}),
            json!({"estado": "En proceso"}),
        );

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["accion"], "Editar abuso");
        assert_eq!(value["entidad"], "Abuso");
        assert_eq!(value["entidadId"], "caso-1");
        assert_eq!(value["detalle"]["antes"]["estado"], "Pendiente");
        assert_eq!(value["detalle"]["despues"]["estado"], "En proceso");
    }

    #[test]
    fn create_detail_serializes_as_datos() {
        let entry = AuditEntry::datos(
            None,
            None,
            AuditAction::CrearUsuario,
            AuditEntity::UsuarioMovil,
            "u1",
            json!({"nombres": "Ana"}),
        );
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["detalle"]["datos"]["nombres"], "Ana");
        assert_eq!(value["usuarioUid"], Value::Null);
    }
}
