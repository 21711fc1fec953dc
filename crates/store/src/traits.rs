use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::StoreError;

/// A stored document: a flat JSON object.
pub type Document = serde_json::Map<String, Value>;

/// Notification emitted when a document is first created in a collection.
///
/// Powers background triggers such as protocol-to-case linking. Delivery is
/// lossy under lag; consumers must treat it as best-effort.
#[derive(Debug, Clone)]
pub struct DocumentCreated {
    pub collection: String,
    pub id: String,
    pub doc: Document,
}

/// Query filter over document fields.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Field equals value.
    Eq(String, Value),
    /// Field is an array containing value.
    ArrayContains(String, Value),
    /// Field equals one of the given values.
    In(String, Vec<Value>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// A simple range query: conjunctive filters, optional ordering, optional limit.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(field.into(), value.into()));
        self
    }

    pub fn filter_array_contains(
        mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.filters
            .push(Filter::ArrayContains(field.into(), value.into()));
        self
    }

    pub fn filter_in(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.filters.push(Filter::In(field.into(), values));
        self
    }

    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some((field.into(), Direction::Desc));
        self
    }

    pub fn order_by_asc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some((field.into(), Direction::Asc));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}

/// A uniqueness requirement evaluated atomically with a write.
#[derive(Debug, Clone)]
pub struct UniqueCheck {
    pub field: String,
    pub value: Value,
}

impl UniqueCheck {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// One operation inside an atomic batch.
#[derive(Debug, Clone)]
pub enum BatchOp {
    /// Create or replace a document.
    Set {
        collection: String,
        id: String,
        doc: Document,
    },
    /// Merge fields into an existing document.
    Update {
        collection: String,
        id: String,
        patch: Document,
    },
    /// Remove a value from an array field (no-op if absent).
    ArrayRemove {
        collection: String,
        id: String,
        field: String,
        value: Value,
    },
    /// Delete a document.
    Delete { collection: String, id: String },
}

/// Schemaless document store.
///
/// All mutating operations take effect per-document atomically; `batch` is
/// all-or-nothing across the documents it names. Reads that precede a batch
/// are not part of the same snapshot, mirroring the backing stores this
/// abstraction is modeled on.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Insert with an auto-generated ID; returns the new ID.
    async fn insert(&self, collection: &str, doc: Document) -> Result<String, StoreError>;

    /// Create or replace a document at a caller-chosen ID.
    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), StoreError>;

    /// Create a document at a caller-chosen ID, enforcing field uniqueness
    /// atomically with the write. Fails with `Duplicate` naming the first
    /// violated field.
    async fn set_unique(
        &self,
        collection: &str,
        id: &str,
        doc: Document,
        unique: &[UniqueCheck],
    ) -> Result<(), StoreError>;

    /// Merge `patch` into an existing document; returns the post-image.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
    ) -> Result<Document, StoreError>;

    /// Like `update`, but enforcing field uniqueness atomically. Documents
    /// other than `id` holding one of the values cause `Duplicate`; the
    /// document's own current values do not.
    async fn update_unique(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
        unique: &[UniqueCheck],
    ) -> Result<Document, StoreError>;

    /// Delete a document.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// All documents in a collection, in ID order.
    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, StoreError>;

    /// Filtered query.
    async fn query(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<(String, Document)>, StoreError>;

    /// Atomic multi-document batch. If any operation cannot apply (e.g. an
    /// `Update` on a missing document), nothing is applied.
    async fn batch(&self, ops: Vec<BatchOp>) -> Result<(), StoreError>;

    /// Add a value to an array field if not already present (set-union).
    /// Returns whether the value was newly added.
    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<bool, StoreError>;

    /// Subscribe to created-document notifications.
    fn subscribe_created(&self) -> broadcast::Receiver<DocumentCreated>;
}
