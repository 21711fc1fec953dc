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
use goodjob_auth::guard;
use goodjob_core::date::normalize_date;
use goodjob_domain::{collections, Case, CaseStatus};
use goodjob_store::{Document, Query};

use crate::app::dto::{self, CaseCreateRequest};
use crate::app::errors::ApiError;
use crate::app::services::{to_document, AppServices};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", axum::routing::post(create_case).get(list_cases))
        .route("/:id", get(get_case).patch(update_case).delete(delete_case))
}

pub async fn create_case(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<CaseCreateRequest>,
) -> Result<Response, ApiError> {
    let Some(usuario_id) = dto::non_empty(&body.usuario_id) else {
        return Err(ApiError::validation("Falta campo requerido: usuarioId"));
    };

    let estado = match body.estado.as_deref() {
        None => CaseStatus::default(),
        Some(raw) => serde_json::from_value::<CaseStatus>(json!(raw))
            .map_err(|_| ApiError::validation("Estado inválido"))?,
    };

    // Date-only when the caller supplied a usable date, server timestamp
    // otherwise.
    let fecha = body
        .fecha
        .as_deref()
        .and_then(normalize_date)
        .unwrap_or_else(|| Utc::now().to_rfc3339());

    // Protocols that already exist for this subject get linked at creation;
    // a failed lookup costs only the pre-population, never the case.
    let protocolos_previos = match services
        .store
        .query(
            collections::PROTOCOLS,
            &Query::new().filter_eq("usuarioId", usuario_id.as_str()),
        )
        .await
    {
        Ok(rows) => rows.into_iter().map(|(id, _)| id).collect(),
        Err(e) => {
            tracing::warn!(%usuario_id, error = %e, "protocol pre-population lookup failed");
            Vec::new()
        }
    };

    let case = Case {
        usuario_id,
        fecha,
        estado,
        observaciones: body.observaciones.unwrap_or_default(),
        gestor_asignado: body.gestor_asignado,
        protocolos_asociados: protocolos_previos,
        creado_en: Utc::now(),
        creada_por: caller.uid().to_string(),
        actualizado_en: None,
    };

    let doc = to_document(&case);
    let id = services.store.insert(collections::CASES, doc.clone()).await?;

    services
        .audit_datos(
            &caller,
            AuditAction::CrearAbuso,
            AuditEntity::Abuso,
            &id,
            doc.clone().into(),
        )
        .await;

    Ok((StatusCode::CREATED, Json(dto::with_id("abusoId", &id, doc))).into_response())
}

pub async fn list_cases(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Response, ApiError> {
    let query = Query::new().order_by_desc("creadoEn");
    let cases = services
        .store
        .query(collections::CASES, &query)
        .await?
        .into_iter()
        .map(|(id, doc)| dto::with_id("abusoId", &id, doc))
        .collect::<Vec<_>>();
    Ok(Json(cases).into_response())
}

/// Reading one case is itself audited: detail views expose sensitive data
/// about an at-risk person.
pub async fn get_case(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let doc = services
        .store
        .get(collections::CASES, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Abuso no encontrado"))?;

    services
        .audit_datos(
            &caller,
            AuditAction::VerDetalleAbuso,
            AuditEntity::Abuso,
            &id,
            doc.clone().into(),
        )
        .await;

    Ok(Json(dto::with_id("abusoId", &id, doc)).into_response())
}

pub async fn update_case(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(mut body): Json<Document>,
) -> Result<Response, ApiError> {
    let antes = services
        .store
        .get(collections::CASES, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Abuso no encontrado"))?;

    let role = services.role_of(&caller).await?;
    let creada_por = antes.get("creadaPor").and_then(|v| v.as_str()).unwrap_or("");
    let gestor = antes.get("gestorAsignado").and_then(|v| v.as_str());
    if !guard::can_edit_case(caller.uid(), role, creada_por, gestor) {
        return Err(ApiError::forbidden("No autorizado para editar abuso"));
    }

    // Any of the three estados may follow any other; the value itself still
    // has to be one of them.
    if let Some(estado) = body.get("estado") {
        if serde_json::from_value::<CaseStatus>(estado.clone()).is_err() {
            return Err(ApiError::validation("Estado inválido"));
        }
    }
    if let Some(fecha) = body.get("fecha").and_then(|v| v.as_str()) {
        if let Some(normalized) = normalize_date(fecha) {
            body.insert("fecha".to_string(), json!(normalized));
        }
    }
    body.insert("actualizadoEn".to_string(), json!(Utc::now()));

    let despues = services.store.update(collections::CASES, &id, body).await?;

    services
        .audit_cambio(
            &caller,
            AuditAction::EditarAbuso,
            AuditEntity::Abuso,
            &id,
            antes.into(),
            despues.clone().into(),
        )
        .await;

    Ok(Json(dto::with_id("abusoId", &id, despues)).into_response())
}

pub async fn delete_case(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let doc = services
        .store
        .get(collections::CASES, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Abuso no encontrado"))?;

    let role = services.role_of(&caller).await?;
    let creada_por = doc.get("creadaPor").and_then(|v| v.as_str()).unwrap_or("");
    if !guard::can_delete_case(caller.uid(), role, creada_por) {
        return Err(ApiError::forbidden("No autorizado para eliminar abuso"));
    }

    services.store.delete(collections::CASES, &id).await?;

    services
        .audit_datos(
            &caller,
            AuditAction::EliminarAbuso,
            AuditEntity::Abuso,
            &id,
            doc.into(),
        )
        .await;

    Ok(Json(json!({ "message": "Abuso eliminado con éxito" })).into_response())
}
