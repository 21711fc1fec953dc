//! Infrastructure wiring shared by every handler.

use std::sync::Arc;

use serde_json::Value;

use goodjob_audit::{AuditAction, AuditEntity, AuditEntry, AuditRecorder};
use goodjob_auth::Role;
use goodjob_domain::{collections, CaseStatus, WebUser};
use goodjob_store::{DocumentStore, Query, StoreError};

use crate::config::BootstrapAdmin;
use crate::context::CallerContext;
use crate::identity::IdentityProvider;
use crate::mailer::{Mailer, WelcomeEmail};

pub struct AppServices {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub mailer: Arc<dyn Mailer>,
    pub audit: AuditRecorder,
    break_glass_email: Option<String>,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        mailer: Arc<dyn Mailer>,
        break_glass_email: Option<String>,
    ) -> Self {
        let audit = AuditRecorder::new(store.clone());
        Self {
            store,
            identity,
            mailer,
            audit,
            break_glass_email,
        }
    }

    /// The caller's stored role, looked up from their staff document on every
    /// request. No document (or an unknown `rol` string) means roleless, and
    /// role gates fail closed.
    ///
    /// The optional break-glass email grants SuperAdmin without a document,
    /// so a deployment cannot lock itself out by deleting the last admin.
    pub async fn role_of(&self, caller: &CallerContext) -> Result<Option<Role>, StoreError> {
        let doc = self.store.get(collections::WEB_USERS, caller.uid()).await?;
        let role = doc
            .and_then(|d| d.get("rol").and_then(Value::as_str).and_then(Role::parse));

        if role.is_none() {
            if let (Some(break_glass), Some(email)) = (&self.break_glass_email, caller.email()) {
                if break_glass == email {
                    tracing::warn!(target: "audit", uid = %caller.uid(), "break-glass SuperAdmin access");
                    return Ok(Some(Role::SuperAdmin));
                }
            }
        }

        Ok(role)
    }

    /// Best-effort audit entry carrying a full document image.
    pub async fn audit_datos(
        &self,
        caller: &CallerContext,
        accion: AuditAction,
        entidad: AuditEntity,
        entidad_id: &str,
        datos: Value,
    ) {
        self.audit
            .record(AuditEntry::datos(
                Some(caller.uid().to_string()),
                caller.email().map(str::to_string),
                accion,
                entidad,
                entidad_id,
                datos,
            ))
            .await;
    }

    /// Best-effort audit entry carrying full before/after images.
    pub async fn audit_cambio(
        &self,
        caller: &CallerContext,
        accion: AuditAction,
        entidad: AuditEntity,
        entidad_id: &str,
        antes: Value,
        despues: Value,
    ) {
        self.audit
            .record(AuditEntry::cambio(
                Some(caller.uid().to_string()),
                caller.email().map(str::to_string),
                accion,
                entidad,
                entidad_id,
                antes,
                despues,
            ))
            .await;
    }

    /// Best-effort welcome email. Failure is logged, never propagated.
    pub async fn send_welcome(&self, correo: &str) {
        let mail = WelcomeEmail {
            to: correo.to_string(),
            usuario: correo.to_string(),
            password: correo.to_string(),
        };
        if let Err(e) = self.mailer.send_welcome(&mail).await {
            tracing::warn!(to = %mail.to, error = %e, "welcome email failed");
        }
    }

    /// Seed the initial SuperAdmin staff account, if configured and absent.
    pub async fn seed_bootstrap_admin(&self, admin: &BootstrapAdmin) -> Result<(), StoreError> {
        if self
            .store
            .get(collections::WEB_USERS, &admin.uid)
            .await?
            .is_some()
        {
            return Ok(());
        }

        let user = WebUser {
            uid: admin.uid.clone(),
            nombres: admin.nombres.clone(),
            apellidos: admin.apellidos.clone(),
            rut: String::new(),
            correo: admin.correo.clone(),
            area: String::new(),
            rol: Role::SuperAdmin,
            contacto: String::new(),
            requiere_cambio_password: true,
            creado_en: chrono::Utc::now(),
            actualizado_en: None,
        };
        let doc = to_document(&user);
        self.store.set(collections::WEB_USERS, &admin.uid, doc).await?;
        tracing::info!(uid = %admin.uid, "seeded bootstrap SuperAdmin");
        Ok(())
    }

    /// Link a freshly created protocol to the most recent open case of the
    /// same subject. No open case means the protocol stays unlinked.
    pub async fn link_protocol_to_open_case(&self, protocolo_id: &str, doc: &goodjob_store::Document) {
        let Some(usuario_id) = doc.get("usuarioId").and_then(Value::as_str) else {
            tracing::warn!(%protocolo_id, "protocol without usuarioId; skipping link");
            return;
        };

        let open_states = CaseStatus::open_states()
            .iter()
            .map(|s| Value::String(s.to_string()))
            .collect();
        let query = Query::new()
            .filter_eq("usuarioId", usuario_id)
            .filter_in("estado", open_states)
            .order_by_desc("creadoEn")
            .limit(1);

        let cases = match self.store.query(collections::CASES, &query).await {
            Ok(cases) => cases,
            Err(e) => {
                tracing::error!(%protocolo_id, error = %e, "case lookup for protocol link failed");
                return;
            }
        };

        let Some((case_id, _)) = cases.into_iter().next() else {
            tracing::info!(%protocolo_id, %usuario_id, "no open case; protocol left unlinked");
            return;
        };

        match self
            .store
            .array_union(
                collections::CASES,
                &case_id,
                "protocolosAsociados",
                Value::String(protocolo_id.to_string()),
            )
            .await
        {
            Ok(true) => {
                tracing::info!(%protocolo_id, %case_id, "protocol linked to case");
            }
            Ok(false) => {
                // Already linked; re-delivery of the created event is harmless.
            }
            Err(e) => {
                tracing::error!(%protocolo_id, %case_id, error = %e, "protocol link failed");
            }
        }
    }
}

/// Run the protocol-to-case linker off the store's created-document feed.
pub fn spawn_protocol_linker(services: Arc<AppServices>) {
    let mut created = services.store.subscribe_created();
    tokio::spawn(async move {
        loop {
            match created.recv().await {
                Ok(event) if event.collection == collections::PROTOCOLS => {
                    services
                        .link_protocol_to_open_case(&event.id, &event.doc)
                        .await;
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "protocol linker lagged; events dropped");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Serialize a domain value into a stored document.
///
/// The domain shapes serialize to JSON objects; anything else would be a
/// programming error, so this is infallible at the call sites that use it.
pub fn to_document<T: serde::Serialize>(value: &T) -> goodjob_store::Document {
    match serde_json::to_value(value) {
        Ok(Value::Object(doc)) => doc,
        _ => goodjob_store::Document::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::InMemoryIdentityProvider;
    use crate::mailer::RecordingMailer;
    use goodjob_store::MemoryStore;
    use serde_json::json;

    fn services_with(store: Arc<MemoryStore>) -> AppServices {
        AppServices::new(
            store,
            Arc::new(InMemoryIdentityProvider::new()),
            Arc::new(RecordingMailer::new()),
            Some("root@goodjob.cl".to_string()),
        )
    }

    fn doc(value: Value) -> goodjob_store::Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn role_lookup_fails_closed_without_document() {
        let store = Arc::new(MemoryStore::new());
        let services = services_with(store);
        let caller = CallerContext::new("u1".into(), Some("u1@x.com".into()));
        assert_eq!(services.role_of(&caller).await.unwrap(), None);
    }

    #[tokio::test]
    async fn break_glass_email_grants_superadmin() {
        let store = Arc::new(MemoryStore::new());
        let services = services_with(store);
        let caller = CallerContext::new("u1".into(), Some("root@goodjob.cl".into()));
        assert_eq!(
            services.role_of(&caller).await.unwrap(),
            Some(Role::SuperAdmin)
        );
    }

    #[tokio::test]
    async fn stored_role_wins_over_break_glass() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                collections::WEB_USERS,
                "u1",
                doc(json!({"rol": "Gestor Casos"})),
            )
            .await
            .unwrap();
        let services = services_with(store);
        let caller = CallerContext::new("u1".into(), Some("root@goodjob.cl".into()));
        assert_eq!(
            services.role_of(&caller).await.unwrap(),
            Some(Role::GestorCasos)
        );
    }

    #[tokio::test]
    async fn protocol_links_to_most_recent_open_case_only() {
        let store = Arc::new(MemoryStore::new());
        let services = services_with(store.clone());

        store
            .set(
                collections::CASES,
                "c-old",
                doc(json!({
                    "usuarioId": "u1",
                    "estado": "Pendiente",
                    "creadoEn": "2025-01-01T00:00:00Z",
                    "protocolosAsociados": []
                })),
            )
            .await
            .unwrap();
        store
            .set(
                collections::CASES,
                "c-new",
                doc(json!({
                    "usuarioId": "u1",
                    "estado": "En proceso",
                    "creadoEn": "2025-06-01T00:00:00Z",
                    "protocolosAsociados": []
                })),
            )
            .await
            .unwrap();
        store
            .set(
                collections::CASES,
                "c-closed",
                doc(json!({
                    "usuarioId": "u1",
                    "estado": "Finalizado",
                    "creadoEn": "2025-07-01T00:00:00Z",
                    "protocolosAsociados": []
                })),
            )
            .await
            .unwrap();

        let protocol = doc(json!({"usuarioId": "u1"}));
        services.link_protocol_to_open_case("p1", &protocol).await;

        let newest = store.get(collections::CASES, "c-new").await.unwrap().unwrap();
        assert_eq!(newest["protocolosAsociados"], json!(["p1"]));
        let old = store.get(collections::CASES, "c-old").await.unwrap().unwrap();
        assert_eq!(old["protocolosAsociados"], json!([]));
        let closed = store.get(collections::CASES, "c-closed").await.unwrap().unwrap();
        assert_eq!(closed["protocolosAsociados"], json!([]));
    }

    #[tokio::test]
    async fn relinking_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let services = services_with(store.clone());
        store
            .set(
                collections::CASES,
                "c1",
                doc(json!({
                    "usuarioId": "u1",
                    "estado": "Pendiente",
                    "creadoEn": "2025-01-01T00:00:00Z",
                    "protocolosAsociados": ["p1"]
                })),
            )
            .await
            .unwrap();

        let protocol = doc(json!({"usuarioId": "u1"}));
        services.link_protocol_to_open_case("p1", &protocol).await;

        let case = store.get(collections::CASES, "c1").await.unwrap().unwrap();
        assert_eq!(case["protocolosAsociados"], json!(["p1"]));
    }
}
