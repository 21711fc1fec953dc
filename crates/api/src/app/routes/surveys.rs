use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use goodjob_audit::{AuditAction, AuditEntity};
use goodjob_core::date::normalize_date;
use goodjob_domain::{collections, expand_genero, Survey};

use crate::app::dto::{self, SurveyRequest};
use crate::app::errors::ApiError;
use crate::app::services::{to_document, AppServices};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", axum::routing::post(create_survey).get(list_surveys))
        .route(
            "/:id",
            get(get_survey).patch(update_survey).delete(delete_survey),
        )
}

pub async fn create_survey(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<SurveyRequest>,
) -> Result<Response, ApiError> {
    let (Some(titulo), Some(preguntas)) = (dto::non_empty(&body.titulo), body.preguntas) else {
        return Err(ApiError::validation("Faltan campos requeridos"));
    };

    let survey = Survey {
        titulo,
        preguntas,
        area: body.area.map(|a| a.into_list()).unwrap_or_default(),
        fecha_inicio: body.fecha_inicio.as_deref().and_then(normalize_date),
        fecha_fin: body.fecha_fin.as_deref().and_then(normalize_date),
        creada_por: caller.uid().to_string(),
        fecha_creacion: Utc::now(),
        fecha_actualizacion: None,
        activa: body.activa.unwrap_or(true),
        genero: expand_genero(body.genero),
        edad_minima: body.edad_minima,
        edad_maxima: body.edad_maxima,
    };

    let doc = to_document(&survey);
    let id = services.store.insert(collections::SURVEYS, doc.clone()).await?;

    services
        .audit_datos(
            &caller,
            AuditAction::CrearEncuesta,
            AuditEntity::Encuesta,
            &id,
            doc.clone().into(),
        )
        .await;

    Ok((StatusCode::CREATED, Json(dto::with_id("encuestaId", &id, doc))).into_response())
}

pub async fn list_surveys(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Response, ApiError> {
    let surveys = services
        .store
        .list(collections::SURVEYS)
        .await?
        .into_iter()
        .map(|(id, doc)| dto::with_id("encuestaId", &id, doc))
        .collect::<Vec<_>>();
    Ok(Json(surveys).into_response())
}

pub async fn get_survey(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let doc = services
        .store
        .get(collections::SURVEYS, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Encuesta no encontrada"))?;
    Ok(Json(dto::with_id("encuestaId", &id, doc)).into_response())
}

pub async fn update_survey(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(body): Json<SurveyRequest>,
) -> Result<Response, ApiError> {
    let antes = services
        .store
        .get(collections::SURVEYS, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Encuesta no encontrada"))?;

    let role = services.role_of(&caller).await?;
    let creada_por = antes.get("creadaPor").and_then(|v| v.as_str()).unwrap_or("");
    if !goodjob_auth::guard::can_modify_owned(caller.uid(), role, creada_por) {
        return Err(ApiError::forbidden("No autorizado para editar"));
    }

    // Gender, area, and the date windows are re-normalized exactly like on
    // create; the two paths share the same functions and cannot drift.
    let mut patch = goodjob_store::Document::new();
    if let Some(titulo) = dto::non_empty(&body.titulo) {
        patch.insert("titulo".to_string(), json!(titulo));
    }
    if let Some(preguntas) = body.preguntas {
        patch.insert("preguntas".to_string(), json!(preguntas));
    }
    if let Some(activa) = body.activa {
        patch.insert("activa".to_string(), json!(activa));
    }
    patch.insert("genero".to_string(), json!(expand_genero(body.genero)));
    patch.insert(
        "area".to_string(),
        json!(body.area.map(|a| a.into_list()).unwrap_or_default()),
    );
    patch.insert(
        "fechaInicio".to_string(),
        json!(body.fecha_inicio.as_deref().and_then(normalize_date)),
    );
    patch.insert(
        "fechaFin".to_string(),
        json!(body.fecha_fin.as_deref().and_then(normalize_date)),
    );
    patch.insert("edadMinima".to_string(), json!(body.edad_minima));
    patch.insert("edadMaxima".to_string(), json!(body.edad_maxima));
    patch.insert("fechaActualizacion".to_string(), json!(Utc::now()));

    let despues = services.store.update(collections::SURVEYS, &id, patch).await?;

    services
        .audit_cambio(
            &caller,
            AuditAction::EditarEncuesta,
            AuditEntity::Encuesta,
            &id,
            antes.into(),
            despues.clone().into(),
        )
        .await;

    Ok(Json(dto::with_id("encuestaId", &id, despues)).into_response())
}

pub async fn delete_survey(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let doc = services
        .store
        .get(collections::SURVEYS, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Encuesta no encontrada"))?;

    let role = services.role_of(&caller).await?;
    let creada_por = doc.get("creadaPor").and_then(|v| v.as_str()).unwrap_or("");
    if !goodjob_auth::guard::can_modify_owned(caller.uid(), role, creada_por) {
        return Err(ApiError::forbidden("No autorizado para eliminar esta encuesta"));
    }

    services.store.delete(collections::SURVEYS, &id).await?;

    services
        .audit_datos(
            &caller,
            AuditAction::EliminarEncuesta,
            AuditEntity::Encuesta,
            &id,
            doc.into(),
        )
        .await;

    Ok(Json(json!({ "message": "Encuesta eliminada con éxito" })).into_response())
}
