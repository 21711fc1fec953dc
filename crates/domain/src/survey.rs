//! Climate surveys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gender::Gender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Texto,
    Alternativas,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub texto: String,
    pub tipo: QuestionType,
    #[serde(default)]
    pub opciones: Vec<String>,
}

/// A climate survey targeted at areas and demographic slices.
///
/// `fecha_inicio`/`fecha_fin` are date-only strings (`YYYY-MM-DD`); `genero`
/// is always the explicit expanded list, never a keyword.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub titulo: String,
    pub preguntas: Vec<Question>,
    #[serde(default)]
    pub area: Vec<String>,
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
    pub creada_por: String,
    pub fecha_creacion: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_actualizacion: Option<DateTime<Utc>>,
    pub activa: bool,
    #[serde(default)]
    pub genero: Vec<Gender>,
    pub edad_minima: Option<u32>,
    pub edad_maxima: Option<u32>,
}
