use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::model::{DocumentKey, DocumentKeySet, QueryData, TargetId};

/// Exposes target metadata owned by the caller so the aggregator can reason
/// about documents it has already raised.
pub trait TargetMetadataProvider: Send + Sync {
    /// The set of remote document keys for the target as of the last raised
    /// snapshot.
    fn remote_keys_for_target(&self, target_id: TargetId) -> DocumentKeySet;

    /// The query data of a target the caller still listens to, or `None` once
    /// the caller lost interest in it.
    fn query_data_for_target(&self, target_id: TargetId) -> Option<QueryData>;
}

impl TargetMetadataProvider for () {
    fn remote_keys_for_target(&self, _target_id: TargetId) -> DocumentKeySet {
        DocumentKeySet::new()
    }

    fn query_data_for_target(&self, _target_id: TargetId) -> Option<QueryData> {
        None
    }
}

#[derive(Default)]
struct InMemoryTargets {
    query_data: BTreeMap<TargetId, QueryData>,
    remote_keys: BTreeMap<TargetId, DocumentKeySet>,
}

/// Provider backed by in-memory maps. Interior mutability lets the owner
/// update membership while an aggregator holds it.
#[derive(Default)]
pub struct InMemoryTargetMetadata {
    inner: RwLock<InMemoryTargets>,
}

impl InMemoryTargetMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_query_data(&self, query_data: QueryData) {
        let mut inner = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.query_data.insert(query_data.target_id, query_data);
    }

    /// Stops reporting the target as active.
    pub fn remove_query_data(&self, target_id: TargetId) {
        let mut inner = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.query_data.remove(&target_id);
    }

    pub fn set_remote_keys<I>(&self, target_id: TargetId, keys: I)
    where
        I: IntoIterator<Item = DocumentKey>,
    {
        let mut inner = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.remote_keys.insert(target_id, keys.into_iter().collect());
    }
}

impl TargetMetadataProvider for InMemoryTargetMetadata {
    fn remote_keys_for_target(&self, target_id: TargetId) -> DocumentKeySet {
        let inner = self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.remote_keys.get(&target_id).cloned().unwrap_or_default()
    }

    fn query_data_for_target(&self, target_id: TargetId) -> Option<QueryData> {
        let inner = self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.query_data.get(&target_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QueryPurpose, ResourcePath, Target};
    use crate::test_support::key;

    #[test]
    fn reports_configured_targets() {
        let metadata = InMemoryTargetMetadata::new();
        let query = QueryData::new(Target::Query(ResourcePath::from_segments(["docs"])), 1, QueryPurpose::Listen);
        metadata.set_query_data(query.clone());
        metadata.set_remote_keys(1, [key("docs/a")]);

        assert_eq!(metadata.query_data_for_target(1), Some(query));
        assert_eq!(metadata.remote_keys_for_target(1), DocumentKeySet::from([key("docs/a")]));
        assert!(metadata.remote_keys_for_target(2).is_empty());

        metadata.remove_query_data(1);
        assert!(metadata.query_data_for_target(1).is_none());
    }
}
