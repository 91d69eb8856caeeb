//! Builders shared by the unit tests.

use serde_json::{json, Value as JsonValue};

use crate::model::{
    DocumentKey, MaybeDocument, QueryData, QueryPurpose, ResourcePath, SnapshotVersion, Target, TargetId, Timestamp,
};

pub fn key(path: &str) -> DocumentKey {
    DocumentKey::from_string(path).unwrap()
}

pub fn version(seconds: i64) -> SnapshotVersion {
    SnapshotVersion::new(Timestamp::new(seconds, 0))
}

pub fn doc(path: &str, seconds: i64) -> MaybeDocument {
    doc_with(path, seconds, json!({}))
}

pub fn doc_with(path: &str, seconds: i64, data: JsonValue) -> MaybeDocument {
    MaybeDocument::from_json(key(path), version(seconds), data)
}

pub fn deleted(path: &str, seconds: i64) -> MaybeDocument {
    MaybeDocument::no_document(key(path), version(seconds))
}

pub fn collection_query(target_id: TargetId, collection: &str) -> QueryData {
    QueryData::new(
        Target::Query(ResourcePath::from_segments([collection])),
        target_id,
        QueryPurpose::Listen,
    )
}

pub fn document_query(target_id: TargetId, path: &str, purpose: QueryPurpose) -> QueryData {
    QueryData::new(Target::Document(key(path)), target_id, purpose)
}
