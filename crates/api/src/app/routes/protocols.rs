//! Protocols are read-only here: they are created by the mobile panic-button
//! pipeline and arrive through the store's created-document feed.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query as UrlQuery},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use goodjob_domain::collections;
use goodjob_store::Query;

use crate::app::dto::{self, ProtocolListQuery};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_protocols))
        .route("/:id", get(get_protocol))
}

pub async fn list_protocols(
    Extension(services): Extension<Arc<AppServices>>,
    UrlQuery(params): UrlQuery<ProtocolListQuery>,
) -> Result<Response, ApiError> {
    let mut query = Query::new();
    if let Some(usuario_id) = params.usuario_id.filter(|u| !u.is_empty()) {
        query = query.filter_eq("usuarioId", usuario_id);
    }

    let rows = services
        .store
        .query(collections::PROTOCOLS, &query)
        .await?
        .into_iter()
        .map(|(id, doc)| dto::with_id("protocoloId", &id, doc))
        .collect::<Vec<_>>();
    Ok(Json(rows).into_response())
}

pub async fn get_protocol(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let doc = services
        .store
        .get(collections::PROTOCOLS, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Protocolo no encontrado"))?;
    Ok(Json(dto::with_id("protocoloId", &id, doc)).into_response())
}
