use std::sync::Arc;

use goodjob_store::{Direction, DocumentStore, Query};

use crate::entry::AuditEntry;

const COLLECTION: &str = "auditoria";

/// Best-effort post-commit audit writer.
///
/// `record` never returns an error: failures land on the `audit` tracing
/// target so operators can alert on them, and the caller's primary operation
/// stays successful. Entries are append-only; nothing here mutates or
/// deletes them.
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn DocumentStore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, entry: AuditEntry) {
        let doc = match serde_json::to_value(&entry) {
            Ok(serde_json::Value::Object(doc)) => doc,
            Ok(_) | Err(_) => {
                tracing::warn!(target: "audit", "audit entry did not serialize to an object");
                return;
            }
        };

        if let Err(e) = self.store.insert(COLLECTION, doc).await {
            tracing::warn!(
                target: "audit",
                error = %e,
                accion = ?entry.accion,
                entidad_id = %entry.entidad_id,
                "audit write failed; entry dropped"
            );
        }
    }

    /// The most recent `limit` entries, newest first.
    pub async fn recent(
        &self,
        limit: usize,
    ) -> Result<Vec<(String, goodjob_store::Document)>, goodjob_store::StoreError> {
        let query = Query {
            filters: Vec::new(),
            order_by: Some(("timestamp".to_string(), Direction::Desc)),
            limit: Some(limit),
        };
        self.store.query(COLLECTION, &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{AuditAction, AuditEntity};
    use goodjob_store::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn record_appends_and_recent_returns_newest_first() {
        let store = Arc::new(MemoryStore::new());
        let recorder = AuditRecorder::new(store.clone());

        for i in 0..3 {
            recorder
                .record(AuditEntry::datos(
                    Some("uid".into()),
                    None,
                    AuditAction::CrearAbuso,
                    AuditEntity::Abuso,
                    format!("caso-{i}"),
                    json!({"n": i}),
                ))
                .await;
        }

        let rows = recorder.recent(2).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].1["entidadId"], "caso-2");
        assert_eq!(rows[1].1["entidadId"], "caso-1");
    }
}
