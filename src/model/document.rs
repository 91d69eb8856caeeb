use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::model::{DocumentKey, SnapshotVersion};

/// Field data of an existing document.
pub type ObjectValue = JsonMap<String, JsonValue>;

/// The state of a document as reported by the watch stream.
#[derive(Clone, Debug, PartialEq)]
pub enum MaybeDocument {
    /// The document exists and its contents are known.
    Document {
        key: DocumentKey,
        version: SnapshotVersion,
        data: ObjectValue,
    },
    /// The document is known not to exist at `version`.
    NoDocument {
        key: DocumentKey,
        version: SnapshotVersion,
    },
    /// The document exists but its contents are unknown.
    UnknownDocument {
        key: DocumentKey,
        version: SnapshotVersion,
    },
}

impl MaybeDocument {
    pub fn document(key: DocumentKey, version: SnapshotVersion, data: ObjectValue) -> Self {
        MaybeDocument::Document { key, version, data }
    }

    /// Builds a found document from a JSON value; non-object values produce an
    /// empty field map.
    pub fn from_json(key: DocumentKey, version: SnapshotVersion, value: JsonValue) -> Self {
        let data = match value {
            JsonValue::Object(map) => map,
            _ => ObjectValue::new(),
        };
        MaybeDocument::Document { key, version, data }
    }

    pub fn no_document(key: DocumentKey, version: SnapshotVersion) -> Self {
        MaybeDocument::NoDocument { key, version }
    }

    pub fn key(&self) -> &DocumentKey {
        match self {
            MaybeDocument::Document { key, .. }
            | MaybeDocument::NoDocument { key, .. }
            | MaybeDocument::UnknownDocument { key, .. } => key,
        }
    }

    pub fn version(&self) -> SnapshotVersion {
        match self {
            MaybeDocument::Document { version, .. }
            | MaybeDocument::NoDocument { version, .. }
            | MaybeDocument::UnknownDocument { version, .. } => *version,
        }
    }

    pub fn is_found_document(&self) -> bool {
        matches!(self, MaybeDocument::Document { .. })
    }

    pub fn data(&self) -> Option<&ObjectValue> {
        match self {
            MaybeDocument::Document { data, .. } => Some(data),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Timestamp;
    use serde_json::json;

    fn key() -> DocumentKey {
        DocumentKey::from_string("rooms/eros").unwrap()
    }

    #[test]
    fn builds_found_document_from_json() {
        let version = SnapshotVersion::new(Timestamp::new(5, 0));
        let doc = MaybeDocument::from_json(key(), version, json!({ "name": "Eros" }));
        assert!(doc.is_found_document());
        assert_eq!(doc.version(), version);
        assert_eq!(doc.data().unwrap().get("name"), Some(&json!("Eros")));
    }

    #[test]
    fn tombstones_have_no_data() {
        let doc = MaybeDocument::no_document(key(), SnapshotVersion::none());
        assert!(!doc.is_found_document());
        assert!(doc.data().is_none());
        assert_eq!(doc.key(), &key());
    }
}
