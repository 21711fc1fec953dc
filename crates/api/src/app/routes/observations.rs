use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query as UrlQuery},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use goodjob_audit::{AuditAction, AuditEntity};
use goodjob_auth::guard;
use goodjob_domain::{collections, Observation};
use goodjob_store::{Document, Query};

use crate::app::dto::{self, ObservationCreateRequest, ObservationListQuery, ObservationPatchRequest};
use crate::app::errors::ApiError;
use crate::app::services::{to_document, AppServices};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route(
            "/",
            axum::routing::get(list_observations).post(create_observation),
        )
        .route(
            "/:id",
            axum::routing::patch(update_observation).delete(delete_observation),
        )
}

/// The parent case's current `gestorAsignado`. Ownership of observations is
/// always re-derived from the case, never stored on the observation.
async fn case_gestor(
    services: &AppServices,
    caso_id: &str,
) -> Result<Option<String>, ApiError> {
    let case = services
        .store
        .get(collections::CASES, caso_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Caso no encontrado"))?;
    Ok(case
        .get("gestorAsignado")
        .and_then(|v| v.as_str())
        .map(str::to_string))
}

pub async fn list_observations(
    Extension(services): Extension<Arc<AppServices>>,
    UrlQuery(params): UrlQuery<ObservationListQuery>,
) -> Result<Response, ApiError> {
    let Some(caso_id) = params.caso_id.filter(|c| !c.is_empty()) else {
        return Err(ApiError::validation("Falta el parámetro 'casoId'"));
    };

    let rows = services
        .store
        .query(
            collections::OBSERVATIONS,
            &Query::new().filter_eq("casoId", caso_id.as_str()),
        )
        .await?
        .into_iter()
        .map(|(id, doc)| dto::with_id("observacionId", &id, doc))
        .collect::<Vec<_>>();
    Ok(Json(rows).into_response())
}

pub async fn create_observation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<ObservationCreateRequest>,
) -> Result<Response, ApiError> {
    let (Some(caso_id), Some(_gestor_id), Some(texto)) = (
        dto::non_empty(&body.caso_id),
        dto::non_empty(&body.gestor_id),
        dto::non_empty(&body.texto),
    ) else {
        return Err(ApiError::validation("Campos requeridos: casoId, gestorId, texto"));
    };

    let gestor = case_gestor(&services, &caso_id).await?;
    if !guard::can_annotate_case(caller.uid(), gestor.as_deref()) {
        return Err(ApiError::forbidden(
            "No autorizado: solo el gestor asignado puede agregar observaciones",
        ));
    }

    let obs = Observation {
        caso_id,
        gestor_id: caller.uid().to_string(),
        texto,
        fecha: Utc::now(),
        fecha_actualizacion: None,
    };

    let doc = to_document(&obs);
    let id = services
        .store
        .insert(collections::OBSERVATIONS, doc.clone())
        .await?;

    services
        .audit_datos(
            &caller,
            AuditAction::CrearObservacion,
            AuditEntity::Observacion,
            &id,
            doc.clone().into(),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(dto::with_id("observacionId", &id, doc)),
    )
        .into_response())
}

pub async fn update_observation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(body): Json<ObservationPatchRequest>,
) -> Result<Response, ApiError> {
    let antes = services
        .store
        .get(collections::OBSERVATIONS, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Observación no encontrada"))?;

    let Some(texto) = dto::non_empty(&body.texto) else {
        return Err(ApiError::validation("Campo 'texto' requerido."));
    };

    let caso_id = antes.get("casoId").and_then(|v| v.as_str()).unwrap_or("");
    let gestor = case_gestor(&services, caso_id).await?;
    let role = services.role_of(&caller).await?;
    if !guard::can_modify_observation(caller.uid(), role, gestor.as_deref()) {
        return Err(ApiError::forbidden("No autorizado para editar esta observación"));
    }

    let mut patch = Document::new();
    patch.insert("texto".to_string(), json!(texto));
    patch.insert("fechaActualizacion".to_string(), json!(Utc::now()));

    let despues = services
        .store
        .update(collections::OBSERVATIONS, &id, patch)
        .await?;

    services
        .audit_cambio(
            &caller,
            AuditAction::EditarObservacion,
            AuditEntity::Observacion,
            &id,
            antes.into(),
            despues.clone().into(),
        )
        .await;

    Ok(Json(dto::with_id("observacionId", &id, despues)).into_response())
}

pub async fn delete_observation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let obs = services
        .store
        .get(collections::OBSERVATIONS, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Observación no encontrada"))?;

    let caso_id = obs.get("casoId").and_then(|v| v.as_str()).unwrap_or("");
    let gestor = case_gestor(&services, caso_id).await?;
    let role = services.role_of(&caller).await?;
    if !guard::can_modify_observation(caller.uid(), role, gestor.as_deref()) {
        return Err(ApiError::forbidden("No autorizado para eliminar esta observación"));
    }

    services.store.delete(collections::OBSERVATIONS, &id).await?;

    services
        .audit_datos(
            &caller,
            AuditAction::EliminarObservacion,
            AuditEntity::Observacion,
            &id,
            obs.into(),
        )
        .await;

    Ok(Json(json!({ "message": "Observación eliminada con éxito" })).into_response())
}
