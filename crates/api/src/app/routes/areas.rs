use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use goodjob_audit::{AuditAction, AuditEntity};
use goodjob_domain::{collections, Area};
use goodjob_store::{BatchOp, Query};

use crate::app::dto::{self, AreaRequest};
use crate::app::errors::ApiError;
use crate::app::services::{to_document, AppServices};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", axum::routing::post(create_area).get(list_areas))
        .route("/:id", get(get_area).patch(update_area).delete(delete_area))
}

fn required_fields(body: &AreaRequest) -> Option<(String, String, String)> {
    Some((
        dto::non_empty(&body.nombre_area)?,
        dto::non_empty(&body.nombre_encargado)?,
        dto::non_empty(&body.correo_encargado)?,
    ))
}

pub async fn create_area(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<AreaRequest>,
) -> Result<Response, ApiError> {
    let Some((nombre_area, nombre_encargado, correo_encargado)) = required_fields(&body) else {
        return Err(ApiError::validation("Faltan campos requeridos"));
    };

    let area = Area {
        nombre_area,
        nombre_encargado,
        correo_encargado,
        descripcion: body.descripcion.unwrap_or_default(),
        creada_por: caller.uid().to_string(),
        creado_en: Utc::now(),
        actualizado_en: None,
    };

    let doc = to_document(&area);
    let id = services.store.insert(collections::AREAS, doc.clone()).await?;

    services
        .audit_datos(
            &caller,
            AuditAction::CrearArea,
            AuditEntity::Area,
            &id,
            doc.clone().into(),
        )
        .await;

    Ok((StatusCode::CREATED, Json(dto::with_id("areaId", &id, doc))).into_response())
}

pub async fn list_areas(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Response, ApiError> {
    let query = Query::new().order_by_desc("creadoEn");
    let areas = services
        .store
        .query(collections::AREAS, &query)
        .await?
        .into_iter()
        .map(|(id, doc)| dto::with_id("areaId", &id, doc))
        .collect::<Vec<_>>();
    Ok(Json(areas).into_response())
}

pub async fn get_area(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let doc = services
        .store
        .get(collections::AREAS, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Área no encontrada"))?;
    Ok(Json(dto::with_id("areaId", &id, doc)).into_response())
}

pub async fn update_area(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(body): Json<AreaRequest>,
) -> Result<Response, ApiError> {
    let antes = services
        .store
        .get(collections::AREAS, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Área no encontrada"))?;

    let Some((nombre_area, nombre_encargado, correo_encargado)) = required_fields(&body) else {
        return Err(ApiError::validation("Faltan campos requeridos"));
    };

    let mut patch = goodjob_store::Document::new();
    patch.insert("nombreArea".to_string(), json!(nombre_area));
    patch.insert("nombreEncargado".to_string(), json!(nombre_encargado));
    patch.insert("correoEncargado".to_string(), json!(correo_encargado));
    patch.insert(
        "descripcion".to_string(),
        json!(body.descripcion.unwrap_or_default()),
    );
    patch.insert("actualizadoEn".to_string(), json!(Utc::now()));

    let despues = services.store.update(collections::AREAS, &id, patch).await?;

    services
        .audit_cambio(
            &caller,
            AuditAction::EditarArea,
            AuditEntity::Area,
            &id,
            antes.into(),
            despues.clone().into(),
        )
        .await;

    Ok(Json(dto::with_id("areaId", &id, despues)).into_response())
}

/// Delete an area and clean every reference to it: the area ID is removed
/// from each survey's `area` list and each mobile user referencing it gets
/// `area = ""`. One atomic batch covers the delete and all the cleanups.
pub async fn delete_area(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let doc = services
        .store
        .get(collections::AREAS, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Área no encontrada"))?;

    let surveys = services
        .store
        .query(
            collections::SURVEYS,
            &Query::new().filter_array_contains("area", id.as_str()),
        )
        .await?;
    let users = services
        .store
        .query(
            collections::MOBILE_USERS,
            &Query::new().filter_eq("area", id.as_str()),
        )
        .await?;

    let mut ops = vec![BatchOp::Delete {
        collection: collections::AREAS.to_string(),
        id: id.clone(),
    }];
    for (survey_id, _) in &surveys {
        ops.push(BatchOp::ArrayRemove {
            collection: collections::SURVEYS.to_string(),
            id: survey_id.clone(),
            field: "area".to_string(),
            value: Value::String(id.clone()),
        });
    }
    for (user_id, _) in &users {
        let mut patch = goodjob_store::Document::new();
        patch.insert("area".to_string(), json!(""));
        patch.insert("actualizadoEn".to_string(), json!(Utc::now()));
        ops.push(BatchOp::Update {
            collection: collections::MOBILE_USERS.to_string(),
            id: user_id.clone(),
            patch,
        });
    }
    services.store.batch(ops).await?;

    services
        .audit_datos(
            &caller,
            AuditAction::EliminarArea,
            AuditEntity::Area,
            &id,
            doc.into(),
        )
        .await;

    Ok(Json(json!({
        "message": "Área eliminada correctamente y referencias limpiadas",
        "encuestasActualizadas": surveys.len(),
        "usuariosActualizados": users.len(),
    }))
    .into_response())
}
