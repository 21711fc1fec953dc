use std::sync::Arc;

use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
    Json,
};

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

/// The last 100 audit entries, newest first.
pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Response, ApiError> {
    let rows = services
        .audit
        .recent(100)
        .await?
        .into_iter()
        .map(|(id, doc)| dto::with_id("id", &id, doc))
        .collect::<Vec<_>>();
    Ok(Json(rows).into_response())
}
