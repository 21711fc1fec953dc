use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use goodjob_audit::{AuditAction, AuditEntity};
use goodjob_core::Rut;
use goodjob_domain::{collections, normalize_emergency_contacts, MobileUser};
use goodjob_store::{StoreError, UniqueCheck};

use crate::app::dto::{self, BulkImportRequest, MobileUserRequest};
use crate::app::errors::{duplicate_message, ApiError};
use crate::app::services::{to_document, AppServices};
use crate::context::CallerContext;
use crate::identity::IdentityError;

const RUT_INVALIDO: &str =
    "RUT inválido. Debe tener formato 12345678-9 y dígito verificador correcto.";

pub fn router() -> Router {
    Router::new()
        .route(
            "/",
            axum::routing::post(create_mobile_user).get(list_mobile_users),
        )
        .route("/bulk", axum::routing::post(bulk_import))
        .route(
            "/:id",
            axum::routing::patch(update_mobile_user).delete(delete_mobile_user),
        )
}

/// Uniqueness checks for a mobile user document. `correo` is also enforced by
/// the identity provider; checking it here too keeps the store consistent
/// even if the account and the document ever drift.
fn unique_checks(rut: &str, correo: &str) -> Vec<UniqueCheck> {
    vec![
        UniqueCheck::new("rut", rut),
        UniqueCheck::new("correo", correo),
    ]
}

pub async fn create_mobile_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<MobileUserRequest>,
) -> Result<Response, ApiError> {
    let (Some(nombres), Some(apellidos), Some(rut), Some(correo), Some(rol)) = (
        dto::non_empty(&body.nombres),
        dto::non_empty(&body.apellidos),
        dto::non_empty(&body.rut),
        dto::non_empty(&body.correo),
        dto::non_empty(&body.rol),
    ) else {
        return Err(ApiError::validation("Faltan campos requeridos"));
    };

    if !Rut::is_valid(&rut) {
        return Err(ApiError::validation(RUT_INVALIDO));
    }

    // The temporary password equals the email; the welcome email tells the
    // user to change it on first login.
    let temp_password = correo.clone();
    let display_name = format!("{nombres} {apellidos}");
    let uid = services
        .identity
        .create_account(&correo, &temp_password, &display_name)
        .await?;

    let user = MobileUser {
        uid: uid.clone(),
        nombres,
        apellidos,
        rut: rut.clone(),
        correo: correo.clone(),
        genero: body.genero.unwrap_or_default(),
        fecha_nacimiento: body.fecha_nacimiento.unwrap_or_default(),
        rol,
        area: body.area.unwrap_or_default(),
        es_vulnerado: body.es_vulnerado.unwrap_or(false),
        recibe_encuesta: body.recibe_encuesta.unwrap_or(false),
        firmo_contrato_privacidad: body.firmo_contrato_privacidad.unwrap_or(false),
        contacto: body.contacto.unwrap_or_default(),
        tipo_usuario: "UsuarioMovil".to_string(),
        contactos_emergencia: normalize_emergency_contacts(
            body.contactos_emergencia.unwrap_or_default(),
        ),
        contacto_rrhh: body.contacto_rrhh.unwrap_or_default(),
        creado_en: Utc::now(),
        actualizado_en: None,
    };

    let doc = to_document(&user);
    if let Err(e) = services
        .store
        .set_unique(collections::MOBILE_USERS, &uid, doc.clone(), &unique_checks(&rut, &correo))
        .await
    {
        // The account was already provisioned; undo it before reporting.
        if let Err(del) = services.identity.delete_account(&uid).await {
            tracing::warn!(%uid, error = %del, "orphan account cleanup failed");
        }
        return Err(e.into());
    }

    services
        .audit_datos(
            &caller,
            AuditAction::CrearUsuario,
            AuditEntity::UsuarioMovil,
            &uid,
            doc.into(),
        )
        .await;

    services.send_welcome(&correo).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "uid": uid, "correo": correo, "tempPassword": temp_password })),
    )
        .into_response())
}

pub async fn list_mobile_users(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Response, ApiError> {
    let users = services
        .store
        .list(collections::MOBILE_USERS)
        .await?
        .into_iter()
        .map(|(id, doc)| dto::with_id("id", &id, doc))
        .collect::<Vec<_>>();
    Ok(Json(users).into_response())
}

pub async fn update_mobile_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(body): Json<MobileUserRequest>,
) -> Result<Response, ApiError> {
    let (Some(nombres), Some(apellidos), Some(correo), Some(contacto), Some(rut), Some(rol)) = (
        dto::non_empty(&body.nombres),
        dto::non_empty(&body.apellidos),
        dto::non_empty(&body.correo),
        dto::non_empty(&body.contacto),
        dto::non_empty(&body.rut),
        dto::non_empty(&body.rol),
    ) else {
        return Err(ApiError::validation("Faltan campos requeridos"));
    };

    if !Rut::is_valid(&rut) {
        return Err(ApiError::validation(RUT_INVALIDO));
    }

    let antes = services
        .store
        .get(collections::MOBILE_USERS, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Usuario no encontrado"))?;

    let mut patch = goodjob_store::Document::new();
    patch.insert("nombres".to_string(), json!(nombres));
    patch.insert("apellidos".to_string(), json!(apellidos));
    patch.insert("correo".to_string(), json!(correo));
    patch.insert("contacto".to_string(), json!(contacto));
    patch.insert("rut".to_string(), json!(rut));
    patch.insert(
        "fechaNacimiento".to_string(),
        json!(body.fecha_nacimiento.unwrap_or_default()),
    );
    patch.insert("genero".to_string(), json!(body.genero.unwrap_or_default()));
    patch.insert(
        "esVulnerado".to_string(),
        json!(body.es_vulnerado.unwrap_or(false)),
    );
    patch.insert(
        "recibeEncuesta".to_string(),
        json!(body.recibe_encuesta.unwrap_or(false)),
    );
    patch.insert(
        "firmoContratoPrivacidad".to_string(),
        json!(body.firmo_contrato_privacidad.unwrap_or(false)),
    );
    patch.insert(
        "contactosEmergencia".to_string(),
        json!(normalize_emergency_contacts(
            body.contactos_emergencia.unwrap_or_default()
        )),
    );
    patch.insert(
        "contactoRRHH".to_string(),
        json!(body.contacto_rrhh.unwrap_or_default()),
    );
    patch.insert("area".to_string(), json!(body.area.unwrap_or_default()));
    patch.insert("rol".to_string(), json!(rol));
    patch.insert("actualizadoEn".to_string(), json!(Utc::now()));

    // Uniqueness excluding this document: another user with the same email
    // or RUT is a conflict, the user's own values are not. The store write
    // goes first so a rejected duplicate leaves the identity account
    // untouched.
    let despues = services
        .store
        .update_unique(
            collections::MOBILE_USERS,
            &id,
            patch,
            &unique_checks(&rut, &correo),
        )
        .await?;

    if let Err(e) = services
        .identity
        .update_account(&id, &correo, &format!("{nombres} {apellidos}"))
        .await
    {
        // Put the document back so the two stores stay in step.
        if let Err(revert) = services
            .store
            .set(collections::MOBILE_USERS, &id, antes.clone())
            .await
        {
            tracing::error!(%id, error = %revert, "document revert after account update failure failed");
        }
        return Err(e.into());
    }

    services
        .audit_cambio(
            &caller,
            AuditAction::EditarUsuario,
            AuditEntity::UsuarioMovil,
            &id,
            antes.into(),
            despues.into(),
        )
        .await;

    Ok(Json(json!({ "message": "Usuario actualizado correctamente" })).into_response())
}

pub async fn delete_mobile_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let datos_previos = services
        .store
        .get(collections::MOBILE_USERS, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Usuario no encontrado"))?;

    match services.identity.delete_account(&id).await {
        Ok(()) | Err(IdentityError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }
    services.store.delete(collections::MOBILE_USERS, &id).await?;

    services
        .audit_datos(
            &caller,
            AuditAction::EliminarUsuario,
            AuditEntity::UsuarioMovil,
            &id,
            datos_previos.into(),
        )
        .await;

    Ok(Json(json!({ "message": "Usuario eliminado correctamente" })).into_response())
}

/// Row-scoped bulk import of pre-parsed rows. One row's failure is recorded
/// in its result entry and never aborts the rest of the batch.
pub async fn bulk_import(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<BulkImportRequest>,
) -> Result<Response, ApiError> {
    let usuarios = match body.usuarios {
        Some(usuarios) if !usuarios.is_empty() => usuarios,
        _ => {
            return Err(ApiError::validation(
                "Formato inválido. Debe enviar 'usuarios' como array.",
            ));
        }
    };
    let area = body.area.unwrap_or_default();

    let total = usuarios.len();
    let mut ok = 0;
    let mut error = 0;
    let mut results = Vec::with_capacity(total);

    for (index, row) in usuarios.into_iter().enumerate() {
        let correo = dto::non_empty(&row.correo)
            .unwrap_or_default()
            .to_lowercase();
        match import_row(&services, &caller, row, &correo, &area).await {
            Ok(uid) => {
                results.push(json!({ "index": index, "correo": correo, "uid": uid, "status": "ok" }));
                ok += 1;
            }
            Err(message) => {
                results.push(
                    json!({ "index": index, "correo": correo, "status": "error", "error": message }),
                );
                error += 1;
            }
        }
    }

    Ok(Json(json!({ "total": total, "ok": ok, "error": error, "results": results })).into_response())
}

async fn import_row(
    services: &AppServices,
    caller: &CallerContext,
    row: MobileUserRequest,
    correo: &str,
    area: &str,
) -> Result<String, String> {
    let (Some(nombres), Some(apellidos), Some(rut), Some(contacto)) = (
        dto::non_empty(&row.nombres),
        dto::non_empty(&row.apellidos),
        dto::non_empty(&row.rut),
        dto::non_empty(&row.contacto),
    ) else {
        return Err(
            "Faltan campos requeridos (nombres, apellidos, rut, correo, contacto)".to_string(),
        );
    };
    if correo.is_empty() {
        return Err(
            "Faltan campos requeridos (nombres, apellidos, rut, correo, contacto)".to_string(),
        );
    }
    if !Rut::is_valid(&rut) {
        return Err("RUT inválido (formato y DV)".to_string());
    }

    let uid = services
        .identity
        .create_account(correo, correo, &format!("{nombres} {apellidos}"))
        .await
        .map_err(|e| match e {
            IdentityError::EmailTaken => "Correo ya registrado".to_string(),
            other => other.to_string(),
        })?;

    let user = MobileUser {
        uid: uid.clone(),
        nombres,
        apellidos,
        rut: rut.clone(),
        correo: correo.to_string(),
        genero: dto::non_empty(&row.genero).unwrap_or_default(),
        fecha_nacimiento: dto::non_empty(&row.fecha_nacimiento).unwrap_or_default(),
        rol: dto::non_empty(&row.rol).unwrap_or_else(|| "UsuarioAppMovil".to_string()),
        area: area.to_string(),
        es_vulnerado: row.es_vulnerado.unwrap_or(false),
        recibe_encuesta: row.recibe_encuesta.unwrap_or(false),
        firmo_contrato_privacidad: row.firmo_contrato_privacidad.unwrap_or(false),
        contacto,
        tipo_usuario: "UsuarioMovil".to_string(),
        contactos_emergencia: normalize_emergency_contacts(
            row.contactos_emergencia.unwrap_or_default(),
        ),
        contacto_rrhh: row.contacto_rrhh.unwrap_or_default(),
        creado_en: Utc::now(),
        actualizado_en: None,
    };

    let doc = to_document(&user);
    if let Err(e) = services
        .store
        .set_unique(
            collections::MOBILE_USERS,
            &uid,
            doc.clone(),
            &unique_checks(&rut, correo),
        )
        .await
    {
        if let Err(del) = services.identity.delete_account(&uid).await {
            tracing::warn!(%uid, error = %del, "orphan account cleanup failed");
        }
        return Err(match e {
            StoreError::Duplicate(field) if field == "rut" => "RUT ya registrado".to_string(),
            StoreError::Duplicate(field) => duplicate_message(&field),
            other => other.to_string(),
        });
    }

    services
        .audit_datos(
            caller,
            AuditAction::CargaMasivaUsuarios,
            AuditEntity::UsuarioMovil,
            &uid,
            doc.into(),
        )
        .await;

    services.send_welcome(correo).await;

    Ok(uid)
}
