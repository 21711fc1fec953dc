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
use goodjob_auth::{permits, Role, RouteAction};
use goodjob_core::Rut;
use goodjob_domain::{collections, WebUser};
use goodjob_store::UniqueCheck;

use crate::app::dto::{self, WebUserRequest};
use crate::app::errors::ApiError;
use crate::app::services::{to_document, AppServices};
use crate::context::CallerContext;
use crate::identity::IdentityError;

pub fn router() -> Router {
    Router::new()
        .route("/", axum::routing::post(create_web_user).get(list_web_users))
        .route("/basic", get(list_web_users_basic))
        .route("/check/:uid", get(check_web_user))
        .route(
            "/:id",
            axum::routing::patch(update_web_user).delete(delete_web_user),
        )
}

async fn require(
    services: &AppServices,
    caller: &CallerContext,
    action: RouteAction,
) -> Result<(), ApiError> {
    let role = services.role_of(caller).await?;
    if !permits(action, role) {
        return Err(ApiError::forbidden("Acceso solo Admin RRHH"));
    }
    Ok(())
}

struct ValidatedWebUser {
    nombres: String,
    apellidos: String,
    rut: String,
    correo: String,
    area: String,
    rol: Role,
    contacto: String,
}

fn validate(body: WebUserRequest) -> Result<ValidatedWebUser, ApiError> {
    let (Some(nombres), Some(apellidos), Some(rut), Some(correo), Some(area), Some(rol)) = (
        dto::non_empty(&body.nombres),
        dto::non_empty(&body.apellidos),
        dto::non_empty(&body.rut),
        dto::non_empty(&body.correo),
        dto::non_empty(&body.area),
        dto::non_empty(&body.rol),
    ) else {
        return Err(ApiError::validation("Faltan campos requeridos"));
    };
    if !Rut::is_valid(&rut) {
        return Err(ApiError::validation("RUT inválido."));
    }
    let rol = Role::parse(&rol)
        .ok_or_else(|| ApiError::validation(format!("Rol desconocido: {rol}")))?;
    Ok(ValidatedWebUser {
        nombres,
        apellidos,
        rut,
        correo,
        area,
        rol,
        contacto: dto::non_empty(&body.contacto).unwrap_or_default(),
    })
}

fn unique_checks(rut: &str, correo: &str) -> Vec<UniqueCheck> {
    vec![
        UniqueCheck::new("rut", rut),
        UniqueCheck::new("correo", correo),
    ]
}

pub async fn create_web_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<WebUserRequest>,
) -> Result<Response, ApiError> {
    require(&services, &caller, RouteAction::WebUserCreate).await?;
    let input = validate(body)?;

    let temp_password = input.correo.clone();
    let display_name = format!("{} {}", input.nombres, input.apellidos);
    let uid = services
        .identity
        .create_account(&input.correo, &temp_password, &display_name)
        .await?;

    let user = WebUser {
        uid: uid.clone(),
        nombres: input.nombres,
        apellidos: input.apellidos,
        rut: input.rut.clone(),
        correo: input.correo.clone(),
        area: input.area,
        rol: input.rol,
        contacto: input.contacto,
        requiere_cambio_password: true,
        creado_en: Utc::now(),
        actualizado_en: None,
    };

    let doc = to_document(&user);
    if let Err(e) = services
        .store
        .set_unique(
            collections::WEB_USERS,
            &uid,
            doc.clone(),
            &unique_checks(&input.rut, &input.correo),
        )
        .await
    {
        if let Err(del) = services.identity.delete_account(&uid).await {
            tracing::warn!(%uid, error = %del, "orphan account cleanup failed");
        }
        return Err(e.into());
    }

    services
        .audit_datos(
            &caller,
            AuditAction::CrearUsuarioWeb,
            AuditEntity::UsuarioWeb,
            &uid,
            doc.into(),
        )
        .await;

    services.send_welcome(&input.correo).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "uid": uid, "correo": input.correo, "tempPassword": temp_password })),
    )
        .into_response())
}

pub async fn list_web_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Response, ApiError> {
    require(&services, &caller, RouteAction::WebUserList).await?;
    let users = services
        .store
        .list(collections::WEB_USERS)
        .await?
        .into_iter()
        .map(|(id, doc)| dto::with_id("id", &id, doc))
        .collect::<Vec<_>>();
    Ok(Json(users).into_response())
}

/// Lightweight listing (id, names, role) for dropdowns. Open to any
/// authenticated caller.
pub async fn list_web_users_basic(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Response, ApiError> {
    let users = services
        .store
        .list(collections::WEB_USERS)
        .await?
        .into_iter()
        .map(|(id, doc)| {
            json!({
                "id": id,
                "nombres": doc.get("nombres"),
                "apellidos": doc.get("apellidos"),
                "rol": doc.get("rol"),
            })
        })
        .collect::<Vec<_>>();
    Ok(Json(users).into_response())
}

/// Post-login check: does the caller's staff document force a password
/// change? Missing document means the account has no portal access.
pub async fn check_web_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(uid): Path<String>,
) -> Result<Response, ApiError> {
    let doc = services
        .store
        .get(collections::WEB_USERS, &uid)
        .await?
        .ok_or_else(|| {
            ApiError::not_found("No tienes permisos para acceder a esta plataforma.")
        })?;

    let requiere = doc
        .get("requiereCambioPassword")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    Ok(Json(json!({ "requiereCambioPassword": requiere })).into_response())
}

pub async fn update_web_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(body): Json<WebUserRequest>,
) -> Result<Response, ApiError> {
    require(&services, &caller, RouteAction::WebUserEdit).await?;
    let input = validate(body)?;

    let antes = services
        .store
        .get(collections::WEB_USERS, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Usuario web no encontrado"))?;

    let mut patch = goodjob_store::Document::new();
    patch.insert("nombres".to_string(), json!(input.nombres));
    patch.insert("apellidos".to_string(), json!(input.apellidos));
    patch.insert("rut".to_string(), json!(input.rut));
    patch.insert("correo".to_string(), json!(input.correo));
    patch.insert("area".to_string(), json!(input.area));
    patch.insert("rol".to_string(), json!(input.rol));
    patch.insert("contacto".to_string(), json!(input.contacto));
    patch.insert("actualizadoEn".to_string(), json!(Utc::now()));

    // Store write first: a rejected duplicate must leave the identity
    // account untouched.
    let despues = services
        .store
        .update_unique(
            collections::WEB_USERS,
            &id,
            patch,
            &unique_checks(&input.rut, &input.correo),
        )
        .await?;

    if let Err(e) = services
        .identity
        .update_account(
            &id,
            &input.correo,
            &format!("{} {}", input.nombres, input.apellidos),
        )
        .await
    {
        if let Err(revert) = services
            .store
            .set(collections::WEB_USERS, &id, antes.clone())
            .await
        {
            tracing::error!(%id, error = %revert, "document revert after account update failure failed");
        }
        return Err(e.into());
    }

    services
        .audit_cambio(
            &caller,
            AuditAction::EditarUsuarioWeb,
            AuditEntity::UsuarioWeb,
            &id,
            antes.into(),
            despues.into(),
        )
        .await;

    Ok(Json(json!({ "message": "Usuario web actualizado correctamente" })).into_response())
}

pub async fn delete_web_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    require(&services, &caller, RouteAction::WebUserDelete).await?;

    let datos_previos = services
        .store
        .get(collections::WEB_USERS, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Usuario web no encontrado"))?;

    match services.identity.delete_account(&id).await {
        Ok(()) | Err(IdentityError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }
    services.store.delete(collections::WEB_USERS, &id).await?;

    services
        .audit_datos(
            &caller,
            AuditAction::EliminarUsuarioWeb,
            AuditEntity::UsuarioWeb,
            &id,
            datos_previos.into(),
        )
        .await;

    Ok(Json(json!({ "message": "Usuario web eliminado correctamente" })).into_response())
}
