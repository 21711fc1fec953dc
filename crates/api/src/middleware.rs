use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use goodjob_auth::{TokenError, TokenVerifier};

use crate::app::errors::ApiError;
use crate::context::CallerContext;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
}

/// Verify the bearer token and attach the caller context.
///
/// A missing token and an invalid one are distinct failures so the frontend
/// can tell "log in" apart from "session expired".
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers()).ok_or(ApiError::AuthRequired)?;

    let claims = state.verifier.verify(token).map_err(|e| match e {
        TokenError::Expired => ApiError::InvalidToken("token has expired".to_string()),
        TokenError::Invalid(detail) => ApiError::InvalidToken(detail),
    })?;

    req.extensions_mut()
        .insert(CallerContext::new(claims.sub, claims.email));

    Ok(next.run(req).await)
}

/// One log line per request, method and path.
pub async fn log_requests(
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let res = next.run(req).await;

    tracing::info!(%method, %path, status = %res.status(), "request");
    res
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let token = header.to_str().ok()?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(extract_bearer(&headers_with("Bearer abc.def")), Some("abc.def"));
    }

    #[test]
    fn rejects_missing_or_malformed_header() {
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
        assert_eq!(extract_bearer(&headers_with("Basic abc")), None);
        assert_eq!(extract_bearer(&headers_with("Bearer ")), None);
    }
}
