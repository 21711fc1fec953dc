//! Request DTOs and JSON mapping helpers.
//!
//! Requests are deserialized permissively (every field optional) and
//! validated in the handlers, so a missing field yields the domain's own
//! "Faltan campos requeridos" response instead of a serde parse error.

use serde::Deserialize;
use serde_json::Value;

use goodjob_domain::{Contacto, GeneroInput, Question};
use goodjob_store::Document;

/// A field the API accepts either as a scalar or as a list (`area` on
/// surveys). Stored as a list either way.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScalarOrList {
    Lista(Vec<String>),
    Una(String),
}

impl ScalarOrList {
    pub fn into_list(self) -> Vec<String> {
        match self {
            ScalarOrList::Lista(list) => list,
            ScalarOrList::Una(one) => vec![one],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyRequest {
    pub titulo: Option<String>,
    pub preguntas: Option<Vec<Question>>,
    pub area: Option<ScalarOrList>,
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
    pub activa: Option<bool>,
    pub genero: Option<GeneroInput>,
    pub edad_minima: Option<u32>,
    pub edad_maxima: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaRequest {
    pub nombre_area: Option<String>,
    pub nombre_encargado: Option<String>,
    pub correo_encargado: Option<String>,
    pub descripcion: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileUserRequest {
    pub nombres: Option<String>,
    pub apellidos: Option<String>,
    pub rut: Option<String>,
    pub correo: Option<String>,
    pub genero: Option<String>,
    pub fecha_nacimiento: Option<String>,
    pub rol: Option<String>,
    pub area: Option<String>,
    pub recibe_encuesta: Option<bool>,
    pub es_vulnerado: Option<bool>,
    pub firmo_contrato_privacidad: Option<bool>,
    pub contacto: Option<String>,
    pub contactos_emergencia: Option<Vec<Contacto>>,
    #[serde(rename = "contactoRRHH")]
    pub contacto_rrhh: Option<Contacto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkImportRequest {
    pub usuarios: Option<Vec<MobileUserRequest>>,
    /// Area assigned to every imported row.
    pub area: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebUserRequest {
    pub nombres: Option<String>,
    pub apellidos: Option<String>,
    pub rut: Option<String>,
    pub correo: Option<String>,
    pub area: Option<String>,
    pub rol: Option<String>,
    pub contacto: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseCreateRequest {
    pub usuario_id: Option<String>,
    pub fecha: Option<String>,
    /// Raw string; the handler validates it against the closed estado set so
    /// an unknown value gets the JSON error contract, not a body rejection.
    pub estado: Option<String>,
    pub observaciones: Option<String>,
    pub gestor_asignado: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationCreateRequest {
    pub caso_id: Option<String>,
    pub gestor_id: Option<String>,
    pub texto: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ObservationPatchRequest {
    pub texto: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolListQuery {
    pub usuario_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationListQuery {
    pub caso_id: Option<String>,
}

/// `{<key>: <id>, ...doc}`, the response shape every list/read endpoint uses.
pub fn with_id(key: &str, id: &str, doc: Document) -> Value {
    let mut out = Document::new();
    out.insert(key.to_string(), Value::String(id.to_string()));
    out.extend(doc);
    Value::Object(out)
}

/// Trimmed, non-empty string or `None`.
pub fn non_empty(opt: &Option<String>) -> Option<String> {
    opt.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn area_accepts_scalar_and_list() {
        let req: SurveyRequest = serde_json::from_value(json!({"area": "a1"})).unwrap();
        assert_eq!(req.area.unwrap().into_list(), vec!["a1"]);

        let req: SurveyRequest =
            serde_json::from_value(json!({"area": ["a1", "a2"]})).unwrap();
        assert_eq!(req.area.unwrap().into_list(), vec!["a1", "a2"]);
    }

    #[test]
    fn with_id_puts_the_id_first() {
        let mut doc = Document::new();
        doc.insert("titulo".to_string(), json!("Clima"));
        let value = with_id("encuestaId", "e1", doc);
        assert_eq!(value["encuestaId"], "e1");
        assert_eq!(value["titulo"], "Clima");
    }

    #[test]
    fn non_empty_trims_and_drops_blank() {
        assert_eq!(non_empty(&Some("  ana  ".into())), Some("ana".to_string()));
        assert_eq!(non_empty(&Some("   ".into())), None);
        assert_eq!(non_empty(&None), None);
    }
}
