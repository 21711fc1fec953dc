//! Closed enums for audit actions and entities.
//!
//! The stored strings match the labels the frontend's audit-log page already
//! displays (including their historical casing quirks).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    #[serde(rename = "Crear usuario")]
    CrearUsuario,
    #[serde(rename = "Editar usuario")]
    EditarUsuario,
    #[serde(rename = "Eliminar Usuario")]
    EliminarUsuario,
    #[serde(rename = "Carga Masiva Usuarios")]
    CargaMasivaUsuarios,
    #[serde(rename = "Crear usuario web")]
    CrearUsuarioWeb,
    #[serde(rename = "Editar usuario web")]
    EditarUsuarioWeb,
    #[serde(rename = "Eliminar Usuario web")]
    EliminarUsuarioWeb,
    #[serde(rename = "Crear encuesta")]
    CrearEncuesta,
    #[serde(rename = "Editar encuesta")]
    EditarEncuesta,
    #[serde(rename = "Eliminar encuesta")]
    EliminarEncuesta,
    #[serde(rename = "Crear area")]
    CrearArea,
    #[serde(rename = "Editar area")]
    EditarArea,
    #[serde(rename = "Eliminar area")]
    EliminarArea,
    #[serde(rename = "Crear abuso")]
    CrearAbuso,
    #[serde(rename = "Ver detalle abuso")]
    VerDetalleAbuso,
    #[serde(rename = "Editar abuso")]
    EditarAbuso,
    #[serde(rename = "Eliminar abuso")]
    EliminarAbuso,
    #[serde(rename = "Crear observación")]
    CrearObservacion,
    #[serde(rename = "Editar observación")]
    EditarObservacion,
    #[serde(rename = "Eliminar observación")]
    EliminarObservacion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEntity {
    UsuarioMovil,
    UsuarioWeb,
    Encuesta,
    Area,
    Abuso,
    Observacion,
}
