//! In-memory document store.
//!
//! Default backend for development and tests. A single `RwLock` over the
//! whole keyspace keeps multi-key invariants (uniqueness checks, batches)
//! trivially atomic.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::StoreError;
use crate::traits::{
    BatchOp, Direction, Document, DocumentCreated, DocumentStore, Filter, Query, UniqueCheck,
};

type Collections = HashMap<String, BTreeMap<String, Document>>;

pub struct MemoryStore {
    inner: RwLock<Collections>,
    created_tx: broadcast::Sender<DocumentCreated>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (created_tx, _) = broadcast::channel(256);
        Self {
            inner: RwLock::new(HashMap::new()),
            created_tx,
        }
    }

    fn emit_created(&self, collection: &str, id: &str, doc: &Document) {
        // Lossy by contract: nobody listening is fine.
        let _ = self.created_tx.send(DocumentCreated {
            collection: collection.to_string(),
            id: id.to_string(),
            doc: doc.clone(),
        });
    }

    fn check_unique(
        collections: &Collections,
        collection: &str,
        exclude_id: Option<&str>,
        unique: &[UniqueCheck],
    ) -> Result<(), StoreError> {
        let Some(docs) = collections.get(collection) else {
            return Ok(());
        };
        for check in unique {
            let taken = docs.iter().any(|(id, doc)| {
                exclude_id != Some(id.as_str()) && doc.get(&check.field) == Some(&check.value)
            });
            if taken {
                return Err(StoreError::Duplicate(check.field.clone()));
            }
        }
        Ok(())
    }

    fn matches(doc: &Document, filter: &Filter) -> bool {
        match filter {
            Filter::Eq(field, value) => doc.get(field) == Some(value),
            Filter::ArrayContains(field, value) => doc
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|arr| arr.contains(value)),
            Filter::In(field, values) => doc
                .get(field)
                .is_some_and(|v| values.iter().any(|candidate| candidate == v)),
        }
    }

    fn compare(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (a, b) {
            (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
            (Some(Value::Number(x)), Some(Value::Number(y))) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            _ => Ordering::Equal,
        }
    }

    fn lock_read(&self) -> std::sync::RwLockReadGuard<'_, Collections> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_write(&self) -> std::sync::RwLockWriteGuard<'_, Collections> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .lock_read()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn insert(&self, collection: &str, doc: Document) -> Result<String, StoreError> {
        let id = Uuid::now_v7().to_string();
        {
            let mut collections = self.lock_write();
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.clone(), doc.clone());
        }
        self.emit_created(collection, &id, &doc);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), StoreError> {
        let created = {
            let mut collections = self.lock_write();
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), doc.clone())
                .is_none()
        };
        if created {
            self.emit_created(collection, id, &doc);
        }
        Ok(())
    }

    async fn set_unique(
        &self,
        collection: &str,
        id: &str,
        doc: Document,
        unique: &[UniqueCheck],
    ) -> Result<(), StoreError> {
        {
            let mut collections = self.lock_write();
            Self::check_unique(&collections, collection, None, unique)?;
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), doc.clone());
        }
        self.emit_created(collection, id, &doc);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
    ) -> Result<Document, StoreError> {
        let mut collections = self.lock_write();
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or(StoreError::NotFound)?;
        for (key, value) in patch {
            doc.insert(key, value);
        }
        Ok(doc.clone())
    }

    async fn update_unique(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
        unique: &[UniqueCheck],
    ) -> Result<Document, StoreError> {
        let mut collections = self.lock_write();
        Self::check_unique(&collections, collection, Some(id), unique)?;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or(StoreError::NotFound)?;
        for (key, value) in patch {
            doc.insert(key, value);
        }
        Ok(doc.clone())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.lock_write()
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, StoreError> {
        Ok(self
            .lock_read()
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, doc)| (id.clone(), doc.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn query(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        let collections = self.lock_read();
        let mut rows: Vec<(String, Document)> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| query.filters.iter().all(|f| Self::matches(doc, f)))
                    .map(|(id, doc)| (id.clone(), doc.clone()))
                    .collect()
            })
            .unwrap_or_default();
        drop(collections);

        if let Some((field, direction)) = &query.order_by {
            rows.sort_by(|(_, a), (_, b)| {
                let ord = Self::compare(a.get(field), b.get(field));
                match direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        Ok(rows)
    }

    async fn batch(&self, ops: Vec<BatchOp>) -> Result<(), StoreError> {
        let mut collections = self.lock_write();

        // Validate everything before touching anything: all-or-nothing.
        for op in &ops {
            let (collection, id) = match op {
                BatchOp::Set { .. } => continue,
                BatchOp::Update { collection, id, .. }
                | BatchOp::ArrayRemove { collection, id, .. }
                | BatchOp::Delete { collection, id } => (collection, id),
            };
            let exists = collections
                .get(collection.as_str())
                .is_some_and(|docs| docs.contains_key(id.as_str()));
            if !exists {
                return Err(StoreError::NotFound);
            }
        }

        let mut created: Vec<(String, String, Document)> = Vec::new();
        for op in ops {
            match op {
                BatchOp::Set {
                    collection,
                    id,
                    doc,
                } => {
                    let was_new = collections
                        .entry(collection.clone())
                        .or_default()
                        .insert(id.clone(), doc.clone())
                        .is_none();
                    if was_new {
                        created.push((collection, id, doc));
                    }
                }
                BatchOp::Update {
                    collection,
                    id,
                    patch,
                } => {
                    let doc = collections
                        .get_mut(&collection)
                        .and_then(|docs| docs.get_mut(&id))
                        .expect("validated above");
                    for (key, value) in patch {
                        doc.insert(key, value);
                    }
                }
                BatchOp::ArrayRemove {
                    collection,
                    id,
                    field,
                    value,
                } => {
                    let doc = collections
                        .get_mut(&collection)
                        .and_then(|docs| docs.get_mut(&id))
                        .expect("validated above");
                    if let Some(arr) = doc.get_mut(&field).and_then(Value::as_array_mut) {
                        arr.retain(|v| v != &value);
                    }
                }
                BatchOp::Delete { collection, id } => {
                    collections
                        .get_mut(&collection)
                        .map(|docs| docs.remove(&id));
                }
            }
        }
        drop(collections);

        for (collection, id, doc) in created {
            self.emit_created(&collection, &id, &doc);
        }
        Ok(())
    }

    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<bool, StoreError> {
        let mut collections = self.lock_write();
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or(StoreError::NotFound)?;

        let arr = doc
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        let arr = arr
            .as_array_mut()
            .ok_or_else(|| StoreError::Internal(format!("field '{field}' is not an array")))?;

        if arr.contains(&value) {
            Ok(false)
        } else {
            arr.push(value);
            Ok(true)
        }
    }

    fn subscribe_created(&self) -> broadcast::Receiver<DocumentCreated> {
        self.created_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn set_unique_rejects_duplicate_field_value() {
        let store = MemoryStore::new();
        store
            .set_unique(
                "usuarios",
                "a",
                doc(json!({"rut": "12345678-5"})),
                &[UniqueCheck::new("rut", "12345678-5")],
            )
            .await
            .unwrap();

        let err = store
            .set_unique(
                "usuarios",
                "b",
                doc(json!({"rut": "12345678-5"})),
                &[UniqueCheck::new("rut", "12345678-5")],
            )
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Duplicate("rut".into()));

        // The failed write left nothing behind.
        assert!(store.get("usuarios", "b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_unique_excludes_own_document() {
        let store = MemoryStore::new();
        store
            .set("usuarios", "a", doc(json!({"correo": "ana@x.com"})))
            .await
            .unwrap();

        // Re-writing the same value on the same document is fine.
        store
            .update_unique(
                "usuarios",
                "a",
                doc(json!({"correo": "ana@x.com"})),
                &[UniqueCheck::new("correo", "ana@x.com")],
            )
            .await
            .unwrap();

        store
            .set("usuarios", "b", doc(json!({"correo": "ben@x.com"})))
            .await
            .unwrap();
        let err = store
            .update_unique(
                "usuarios",
                "b",
                doc(json!({"correo": "ana@x.com"})),
                &[UniqueCheck::new("correo", "ana@x.com")],
            )
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Duplicate("correo".into()));
    }

    #[tokio::test]
    async fn query_filters_order_and_limit() {
        let store = MemoryStore::new();
        for (id, user, when) in [
            ("1", "u1", "2025-01-01T10:00:00Z"),
            ("2", "u1", "2025-03-01T10:00:00Z"),
            ("3", "u2", "2025-02-01T10:00:00Z"),
        ] {
            store
                .set(
                    "abusos",
                    id,
                    doc(json!({"usuarioId": user, "estado": "Pendiente", "creadoEn": when})),
                )
                .await
                .unwrap();
        }

        let rows = store
            .query(
                "abusos",
                &Query::new()
                    .filter_eq("usuarioId", "u1")
                    .filter_in(
                        "estado",
                        vec![json!("Pendiente"), json!("En proceso")],
                    )
                    .order_by_desc("creadoEn")
                    .limit(1),
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "2");
    }

    #[tokio::test]
    async fn array_contains_filter() {
        let store = MemoryStore::new();
        store
            .set("encuestas", "s1", doc(json!({"area": ["a1", "a2"]})))
            .await
            .unwrap();
        store
            .set("encuestas", "s2", doc(json!({"area": ["a2"]})))
            .await
            .unwrap();

        let rows = store
            .query(
                "encuestas",
                &Query::new().filter_array_contains("area", "a1"),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "s1");
    }

    #[tokio::test]
    async fn array_union_is_idempotent() {
        let store = MemoryStore::new();
        store
            .set("abusos", "c1", doc(json!({"protocolosAsociados": ["p1"]})))
            .await
            .unwrap();

        assert!(store
            .array_union("abusos", "c1", "protocolosAsociados", json!("p2"))
            .await
            .unwrap());
        assert!(!store
            .array_union("abusos", "c1", "protocolosAsociados", json!("p2"))
            .await
            .unwrap());

        let case = store.get("abusos", "c1").await.unwrap().unwrap();
        assert_eq!(case["protocolosAsociados"], json!(["p1", "p2"]));
    }

    #[tokio::test]
    async fn batch_is_all_or_nothing() {
        let store = MemoryStore::new();
        store
            .set("areas", "a1", doc(json!({"nombreArea": "Ventas"})))
            .await
            .unwrap();

        let err = store
            .batch(vec![
                BatchOp::Delete {
                    collection: "areas".into(),
                    id: "a1".into(),
                },
                BatchOp::Update {
                    collection: "areas".into(),
                    id: "missing".into(),
                    patch: doc(json!({"x": 1})),
                },
            ])
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound);

        // The delete in the same batch must not have applied.
        assert!(store.get("areas", "a1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn created_feed_fires_for_new_documents_only() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe_created();

        store
            .set("protocolos", "p1", doc(json!({"usuarioId": "u1"})))
            .await
            .unwrap();
        // Overwrite: not a creation.
        store
            .set("protocolos", "p1", doc(json!({"usuarioId": "u1", "x": 1})))
            .await
            .unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.collection, "protocolos");
        assert_eq!(event.id, "p1");
        assert!(rx.try_recv().is_err());
    }
}
