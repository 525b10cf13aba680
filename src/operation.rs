//! Bulk operation model and metadata resolution.
//!
//! A [`BulkOperation`] carries an action tag, optional explicit metadata
//! (index, type, id, routing) and an optional source document. Metadata may
//! also be embedded in the source document under `_index`, `_type`, `_id`
//! and `_routing`; at encode time the three layers are merged with a fixed
//! precedence: explicit values win, then embedded values, then the defaults
//! of an index- or type-scoped bulk endpoint. Embedded keys are stripped
//! from the emitted source line either way.

use serde_json::{Map, Value, json};

use crate::types::{DocId, IndexName, TypeName};

/// Action tag of a bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    /// Index a document, replacing any existing one.
    Index,
    /// Create a document, failing if the id already exists.
    Create,
    /// Apply a partial update to an existing document.
    Update,
    /// Delete a document.
    Delete,
}

impl BulkAction {
    /// Wire name of the action, as used for the action header key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// One operation in a bulk request.
///
/// Construct with [`BulkOperation::index`], [`BulkOperation::create`],
/// [`BulkOperation::update`] or [`BulkOperation::delete`], then attach
/// metadata with the `with_*` builders. Construction never fails; malformed
/// operations (no resolvable index, conflicting metadata, delete without an
/// id) are reported per operation when the batch is encoded.
#[derive(Debug, Clone)]
pub struct BulkOperation {
    action: BulkAction,
    index: Option<IndexName>,
    doc_type: Option<TypeName>,
    id: Option<DocId>,
    routing: Option<String>,
    source: Option<Value>,
}

impl BulkOperation {
    fn new(action: BulkAction, source: Option<Value>) -> Self {
        Self {
            action,
            index: None,
            doc_type: None,
            id: None,
            routing: None,
            source,
        }
    }

    /// Index `source` as a full document.
    pub fn index(source: Value) -> Self {
        Self::new(BulkAction::Index, Some(source))
    }

    /// Create `source` as a new document; the engine rejects duplicates.
    pub fn create(source: Value) -> Self {
        Self::new(BulkAction::Create, Some(source))
    }

    /// Partially update a document with `partial`.
    ///
    /// The partial is wrapped into the engine's `{"doc": ...}` envelope at
    /// encode time, after any embedded metadata has been stripped from it.
    pub fn update(partial: Value) -> Self {
        Self::new(BulkAction::Update, Some(partial))
    }

    /// Delete a document. An id must be attached with [`Self::with_id`];
    /// encoding fails without one.
    pub fn delete() -> Self {
        Self::new(BulkAction::Delete, None)
    }

    /// Target index for this operation.
    pub fn with_index(mut self, index: IndexName) -> Self {
        self.index = Some(index);
        self
    }

    /// Mapping type for this operation.
    pub fn with_doc_type(mut self, doc_type: TypeName) -> Self {
        self.doc_type = Some(doc_type);
        self
    }

    /// Document id for this operation.
    pub fn with_id(mut self, id: impl Into<DocId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Routing key for this operation.
    pub fn with_routing(mut self, routing: impl Into<String>) -> Self {
        self.routing = Some(routing.into());
        self
    }

    /// The operation's action tag.
    pub fn action(&self) -> BulkAction {
        self.action
    }

    /// Merge explicit, embedded and default metadata and produce the NDJSON
    /// lines for this operation.
    ///
    /// Errors are plain reason strings; the encoder attaches the operation's
    /// position in the batch.
    pub(crate) fn resolve(
        self,
        default_index: Option<&IndexName>,
        default_type: Option<&TypeName>,
    ) -> Result<BulkLines, String> {
        let BulkOperation {
            action,
            index,
            doc_type,
            id,
            routing,
            mut source,
        } = self;

        let embedded = split_embedded(source.as_mut())?;

        let index = merge_meta(
            "_index",
            index.map(String::from),
            embedded.index,
            default_index.map(|i| i.as_str().to_string()),
        )?
        .ok_or_else(|| {
            "no target index: set one on the operation, embed `_index` in the source, \
             or submit to an index-scoped bulk endpoint"
                .to_string()
        })?;

        let doc_type = merge_meta(
            "_type",
            doc_type.map(String::from),
            embedded.doc_type,
            default_type.map(|t| t.as_str().to_string()),
        )?;

        let id = merge_id(id, embedded.id)?;
        if action == BulkAction::Delete && id.is_none() {
            return Err("delete requires a document id".to_string());
        }

        let routing = merge_meta("_routing", routing, embedded.routing, None)?;

        // update payloads gain their envelope only after the strip above
        let source = match (action, source) {
            (BulkAction::Update, Some(partial)) => Some(json!({ "doc": partial })),
            (_, source) => source,
        };

        let mut meta = Map::new();
        meta.insert("_index".to_string(), Value::String(index));
        if let Some(doc_type) = doc_type {
            meta.insert("_type".to_string(), Value::String(doc_type));
        }
        if let Some(id) = id {
            meta.insert("_id".to_string(), id.to_value());
        }
        if let Some(routing) = routing {
            meta.insert("_routing".to_string(), Value::String(routing));
        }
        let mut header = Map::new();
        header.insert(action.as_str().to_string(), Value::Object(meta));

        Ok(BulkLines {
            header: Value::Object(header),
            source,
        })
    }
}

/// Resolved NDJSON lines for one operation: the action header and, for
/// actions that carry one, the source document.
#[derive(Debug)]
pub(crate) struct BulkLines {
    pub(crate) header: Value,
    pub(crate) source: Option<Value>,
}

struct EmbeddedMeta {
    index: Option<String>,
    doc_type: Option<String>,
    id: Option<DocId>,
    routing: Option<String>,
}

/// Remove metadata keys from the source object and return their values.
/// Non-object sources carry no embedded metadata and pass through intact.
fn split_embedded(source: Option<&mut Value>) -> Result<EmbeddedMeta, String> {
    let mut meta = EmbeddedMeta {
        index: None,
        doc_type: None,
        id: None,
        routing: None,
    };
    let Some(Value::Object(map)) = source else {
        return Ok(meta);
    };
    if let Some(value) = map.remove("_index") {
        meta.index = Some(meta_string("_index", &value)?);
    }
    if let Some(value) = map.remove("_type") {
        meta.doc_type = Some(meta_string("_type", &value)?);
    }
    if let Some(value) = map.remove("_id") {
        meta.id = Some(DocId::from_meta_value(&value).ok_or_else(|| {
            "embedded `_id` must be a non-empty string or integer".to_string()
        })?);
    }
    if let Some(value) = map.remove("_routing") {
        meta.routing = Some(meta_string("_routing", &value)?);
    }
    Ok(meta)
}

fn meta_string(key: &str, value: &Value) -> Result<String, String> {
    match value.as_str() {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(format!("embedded `{key}` must be a non-empty string")),
    }
}

/// Explicit wins; embedded next; the default never overrides either.
/// Unequal explicit and embedded values are a conflict.
fn merge_meta(
    key: &str,
    explicit: Option<String>,
    embedded: Option<String>,
    default: Option<String>,
) -> Result<Option<String>, String> {
    match (explicit, embedded) {
        (Some(explicit), Some(embedded)) if explicit != embedded => Err(format!(
            "conflicting `{key}`: explicit \"{explicit}\" vs embedded \"{embedded}\""
        )),
        (Some(explicit), _) => Ok(Some(explicit)),
        (None, embedded) => Ok(embedded.or(default)),
    }
}

fn merge_id(explicit: Option<DocId>, embedded: Option<DocId>) -> Result<Option<DocId>, String> {
    match (explicit, embedded) {
        (Some(explicit), Some(embedded)) if explicit != embedded => Err(format!(
            "conflicting `_id`: explicit \"{explicit}\" vs embedded \"{embedded}\""
        )),
        (Some(explicit), _) => Ok(Some(explicit)),
        (None, embedded) => Ok(embedded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_name(name: &str) -> IndexName {
        IndexName::new(name).unwrap()
    }

    fn type_name(name: &str) -> TypeName {
        TypeName::new(name).unwrap()
    }

    #[test]
    fn test_explicit_metadata_builds_header() {
        let lines = BulkOperation::index(json!({"title": "one"}))
            .with_index(index_name("logs"))
            .with_doc_type(type_name("event"))
            .with_id(DocId::new("k1").unwrap())
            .resolve(None, None)
            .unwrap();

        assert_eq!(
            lines.header,
            json!({"index": {"_index": "logs", "_type": "event", "_id": "k1"}})
        );
        assert_eq!(lines.source, Some(json!({"title": "one"})));
    }

    #[test]
    fn test_embedded_metadata_is_used_and_stripped() {
        let lines = BulkOperation::create(json!({
            "_index": "logs",
            "_id": "k2",
            "title": "two"
        }))
        .resolve(None, None)
        .unwrap();

        assert_eq!(
            lines.header,
            json!({"create": {"_index": "logs", "_id": "k2"}})
        );
        assert_eq!(lines.source, Some(json!({"title": "two"})));
    }

    #[test]
    fn test_matching_explicit_and_embedded_values_agree() {
        let lines = BulkOperation::index(json!({"_index": "logs", "n": 1}))
            .with_index(index_name("logs"))
            .resolve(None, None)
            .unwrap();

        assert_eq!(lines.header, json!({"index": {"_index": "logs"}}));
        assert_eq!(lines.source, Some(json!({"n": 1})));
    }

    #[test]
    fn test_conflicting_index_is_an_error() {
        let err = BulkOperation::index(json!({"_index": "other"}))
            .with_index(index_name("logs"))
            .resolve(None, None)
            .unwrap_err();

        assert!(err.contains("conflicting `_index`"), "{err}");
    }

    #[test]
    fn test_conflicting_id_is_an_error() {
        let err = BulkOperation::index(json!({"_id": "b"}))
            .with_index(index_name("logs"))
            .with_id(DocId::new("a").unwrap())
            .resolve(None, None)
            .unwrap_err();

        assert!(err.contains("conflicting `_id`"), "{err}");
    }

    #[test]
    fn test_default_index_is_fallback_only() {
        let fallback = index_name("fallback");

        // embedded value beats the endpoint default
        let lines = BulkOperation::index(json!({"_index": "embedded"}))
            .resolve(Some(&fallback), None)
            .unwrap();
        assert_eq!(lines.header, json!({"index": {"_index": "embedded"}}));

        // nothing else set: the default applies
        let lines = BulkOperation::index(json!({"n": 1}))
            .resolve(Some(&fallback), Some(&type_name("event")))
            .unwrap();
        assert_eq!(
            lines.header,
            json!({"index": {"_index": "fallback", "_type": "event"}})
        );
    }

    #[test]
    fn test_unresolvable_index_is_an_error() {
        let err = BulkOperation::index(json!({"n": 1}))
            .resolve(None, None)
            .unwrap_err();

        assert!(err.contains("no target index"), "{err}");
    }

    #[test]
    fn test_delete_requires_an_id() {
        let err = BulkOperation::delete()
            .with_index(index_name("logs"))
            .resolve(None, None)
            .unwrap_err();
        assert!(err.contains("delete requires"), "{err}");

        let lines = BulkOperation::delete()
            .with_index(index_name("logs"))
            .with_id(7_i64)
            .resolve(None, None)
            .unwrap();
        assert_eq!(lines.header, json!({"delete": {"_index": "logs", "_id": 7}}));
        assert!(lines.source.is_none());
    }

    #[test]
    fn test_update_wraps_partial_after_strip() {
        let lines = BulkOperation::update(json!({"_id": "k3", "count": 2}))
            .with_index(index_name("logs"))
            .resolve(None, None)
            .unwrap();

        assert_eq!(
            lines.header,
            json!({"update": {"_index": "logs", "_id": "k3"}})
        );
        assert_eq!(lines.source, Some(json!({"doc": {"count": 2}})));
    }

    #[test]
    fn test_numeric_embedded_id_stays_numeric() {
        let lines = BulkOperation::index(json!({"_id": 41}))
            .with_index(index_name("logs"))
            .resolve(None, None)
            .unwrap();

        assert_eq!(lines.header, json!({"index": {"_index": "logs", "_id": 41}}));
    }

    #[test]
    fn test_malformed_embedded_id_is_an_error() {
        let err = BulkOperation::index(json!({"_id": true}))
            .with_index(index_name("logs"))
            .resolve(None, None)
            .unwrap_err();

        assert!(err.contains("`_id`"), "{err}");
    }

    #[test]
    fn test_routing_reaches_the_header() {
        let lines = BulkOperation::index(json!({"n": 1}))
            .with_index(index_name("logs"))
            .with_routing("shard-7")
            .resolve(None, None)
            .unwrap();

        assert_eq!(
            lines.header,
            json!({"index": {"_index": "logs", "_routing": "shard-7"}})
        );
    }
}
