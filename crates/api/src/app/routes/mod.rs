use axum::{routing::get, Router};

pub mod areas;
pub mod audit;
pub mod cases;
pub mod mobile_users;
pub mod observations;
pub mod protocols;
pub mod surveys;
pub mod system;
pub mod web_users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/encuestas", surveys::router())
        .nest("/areas", areas::router())
        .nest("/UsuarioMovil", mobile_users::router())
        .nest("/usuariosWeb", web_users::router())
        .nest("/abusos", cases::router())
        .nest("/protocolos", protocols::router())
        .nest("/observaciones", observations::router())
        .route("/auditoria", get(audit::list))
}
