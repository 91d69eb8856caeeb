use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::json;
use watch_aggregator::error::unavailable;
use watch_aggregator::model::{
    DocumentKey, MaybeDocument, QueryData, QueryPurpose, ResourcePath, ResumeToken, SnapshotVersion, Target,
    TargetId, Timestamp,
};
use watch_aggregator::remote::{
    DocumentWatchChange, ExistenceFilter, ExistenceFilterWatchChange, InMemoryTargetMetadata, RemoteEvent,
    TargetFailure, WatchChange, WatchChangeAggregator, WatchTargetChange, WatchTargetChangeState,
};

fn key(path: &str) -> DocumentKey {
    DocumentKey::from_string(path).unwrap()
}

fn version(seconds: i64) -> SnapshotVersion {
    SnapshotVersion::new(Timestamp::new(seconds, 0))
}

fn doc(path: &str, seconds: i64) -> MaybeDocument {
    MaybeDocument::from_json(key(path), version(seconds), json!({ "updated": seconds }))
}

fn query(target_id: TargetId, purpose: QueryPurpose) -> QueryData {
    QueryData::new(Target::Query(ResourcePath::from_segments(["rooms"])), target_id, purpose)
}

fn target_change(state: WatchTargetChangeState, target_ids: Vec<TargetId>, token: &str) -> WatchChange {
    WatchTargetChange::new(state, target_ids)
        .with_resume_token(token)
        .into()
}

fn document_change(updated: Vec<TargetId>, removed: Vec<TargetId>, document: MaybeDocument) -> WatchChange {
    let key = document.key().clone();
    DocumentWatchChange::new(updated, removed, key, Some(document)).into()
}

fn keys(paths: &[&str]) -> BTreeSet<DocumentKey> {
    paths.iter().map(|path| key(path)).collect()
}

/// Plays the part of the local store: remembers what each target contains
/// after every raised event and reports it back through the metadata provider.
struct FakeLocalStore {
    metadata: Arc<InMemoryTargetMetadata>,
    remote_keys: BTreeMap<TargetId, BTreeSet<DocumentKey>>,
    documents: BTreeMap<DocumentKey, MaybeDocument>,
}

impl FakeLocalStore {
    fn new(metadata: Arc<InMemoryTargetMetadata>) -> Self {
        Self {
            metadata,
            remote_keys: BTreeMap::new(),
            documents: BTreeMap::new(),
        }
    }

    fn apply(&mut self, event: &RemoteEvent) {
        for (target_id, change) in &event.target_changes {
            let keys = self.remote_keys.entry(*target_id).or_default();
            keys.extend(change.added_documents.iter().cloned());
            keys.extend(change.modified_documents.iter().cloned());
            for removed in &change.removed_documents {
                keys.remove(removed);
            }
            self.metadata.set_remote_keys(*target_id, keys.iter().cloned());
        }

        for target_id in &event.target_mismatches {
            self.remote_keys.remove(target_id);
            self.metadata.set_remote_keys(*target_id, Vec::new());
        }

        for (key, document) in &event.document_updates {
            self.documents.insert(key.clone(), document.clone());
        }
    }
}

fn feed(aggregator: &mut WatchChangeAggregator<InMemoryTargetMetadata>, changes: Vec<WatchChange>) -> Vec<TargetFailure> {
    changes
        .into_iter()
        .flat_map(|change| aggregator.handle_watch_change(change))
        .collect()
}

#[test]
fn recovers_from_existence_filter_mismatch() {
    let metadata = Arc::new(InMemoryTargetMetadata::new());
    let mut store = FakeLocalStore::new(Arc::clone(&metadata));
    let mut aggregator = WatchChangeAggregator::new(Arc::clone(&metadata));

    metadata.set_query_data(query(1, QueryPurpose::Listen));
    aggregator.record_pending_target_request(1);
    feed(
        &mut aggregator,
        vec![
            target_change(WatchTargetChangeState::Added, vec![1], "rt0"),
            document_change(vec![1], vec![], doc("rooms/a", 1)),
            document_change(vec![1], vec![], doc("rooms/b", 1)),
            target_change(WatchTargetChangeState::Current, vec![1], "rt1"),
        ],
    );
    let event = aggregator.create_remote_event(version(1));
    let change = &event.target_changes[&1];
    assert_eq!(change.added_documents, keys(&["rooms/a", "rooms/b"]));
    assert!(change.current);
    assert_eq!(change.resume_token, ResumeToken::from("rt1"));
    store.apply(&event);

    // The server dropped rooms/b without telling us and only reports a count.
    aggregator.handle_existence_filter(ExistenceFilterWatchChange::new(ExistenceFilter::new(1), 1));
    let event = aggregator.create_remote_event(version(2));
    assert_eq!(event.target_mismatches, BTreeSet::from([1]));
    assert!(!event.target_changes[&1].current);
    store.apply(&event);

    // Re-listen from scratch: unwatch and watch are both acknowledged.
    metadata.set_query_data(query(1, QueryPurpose::ExistenceFilterMismatch));
    aggregator.record_pending_target_request(1);
    aggregator.record_pending_target_request(1);
    let failures = feed(
        &mut aggregator,
        vec![
            WatchTargetChange::new(WatchTargetChangeState::Removed, vec![1]).into(),
            // Still waiting for the add, so this stale document is dropped.
            document_change(vec![1], vec![], doc("rooms/stale", 2)),
            target_change(WatchTargetChangeState::Added, vec![1], ""),
            document_change(vec![1], vec![], doc("rooms/a", 3)),
            target_change(WatchTargetChangeState::Current, vec![1], "rt2"),
        ],
    );
    assert!(failures.is_empty());
    assert!(aggregator.is_tracking(1));

    let event = aggregator.create_remote_event(version(3));
    let change = &event.target_changes[&1];
    assert_eq!(change.added_documents, keys(&["rooms/a"]));
    assert!(change.removed_documents.is_empty());
    assert!(change.current);
    assert_eq!(change.resume_token, ResumeToken::from("rt2"));
    store.apply(&event);

    aggregator.handle_existence_filter(ExistenceFilterWatchChange::new(ExistenceFilter::new(1), 1));
    assert!(aggregator.create_remote_event(version(4)).target_mismatches.is_empty());
    assert_eq!(store.remote_keys[&1], keys(&["rooms/a"]));
}

#[test]
fn overlapping_targets_track_documents_independently() {
    let metadata = Arc::new(InMemoryTargetMetadata::new());
    let mut store = FakeLocalStore::new(Arc::clone(&metadata));
    let mut aggregator = WatchChangeAggregator::new(Arc::clone(&metadata));

    for target_id in [1, 2] {
        metadata.set_query_data(query(target_id, QueryPurpose::Listen));
        aggregator.record_pending_target_request(target_id);
    }
    feed(
        &mut aggregator,
        vec![
            target_change(WatchTargetChangeState::Added, vec![1, 2], ""),
            document_change(vec![1, 2], vec![], doc("rooms/a", 1)),
            document_change(vec![], vec![2], doc("rooms/a", 1)),
            target_change(WatchTargetChangeState::Current, vec![], "rt1"),
        ],
    );

    let event = aggregator.create_remote_event(version(1));
    assert_eq!(event.target_changes[&1].added_documents, keys(&["rooms/a"]));
    assert!(event.target_changes[&2].added_documents.is_empty());
    assert!(event.target_changes[&2].removed_documents.is_empty());
    assert!(event.target_changes.values().all(|change| change.current));
    store.apply(&event);

    feed(
        &mut aggregator,
        vec![document_change(
            vec![],
            vec![1],
            MaybeDocument::no_document(key("rooms/a"), version(2)),
        )],
    );
    let event = aggregator.create_remote_event(version(2));
    assert_eq!(event.target_changes[&1].removed_documents, keys(&["rooms/a"]));
    assert!(!event.target_changes.contains_key(&2));
    store.apply(&event);

    assert!(store.remote_keys[&1].is_empty());
    assert!(!store.documents[&key("rooms/a")].is_found_document());
}

#[test]
fn empty_resume_tokens_keep_the_last_token() {
    let metadata = Arc::new(InMemoryTargetMetadata::new());
    let mut aggregator = WatchChangeAggregator::new(Arc::clone(&metadata));

    metadata.set_query_data(query(1, QueryPurpose::Listen));
    aggregator.record_pending_target_request(1);
    feed(
        &mut aggregator,
        vec![
            target_change(WatchTargetChangeState::Added, vec![1], "rt1"),
            target_change(WatchTargetChangeState::NoChange, vec![], ""),
            target_change(WatchTargetChangeState::Current, vec![1], ""),
        ],
    );

    let event = aggregator.create_remote_event(version(1));
    assert_eq!(event.target_changes[&1].resume_token, ResumeToken::from("rt1"));

    feed(&mut aggregator, vec![target_change(WatchTargetChangeState::NoChange, vec![], "rt2")]);
    let event = aggregator.create_remote_event(version(2));
    assert_eq!(event.target_changes[&1].resume_token, ResumeToken::from("rt2"));
    assert!(event.target_changes[&1].current);
}

#[test]
fn rejected_targets_are_reported_without_failing_the_stream() {
    let metadata = Arc::new(InMemoryTargetMetadata::new());
    let mut aggregator = WatchChangeAggregator::new(Arc::clone(&metadata));

    for target_id in [1, 2] {
        metadata.set_query_data(query(target_id, QueryPurpose::Listen));
        aggregator.record_pending_target_request(target_id);
    }

    let cause = unavailable("backend unavailable");
    let failures = feed(
        &mut aggregator,
        vec![
            target_change(WatchTargetChangeState::Added, vec![2], ""),
            WatchTargetChange::new(WatchTargetChangeState::Removed, vec![1])
                .with_cause(cause.clone())
                .into(),
        ],
    );

    assert_eq!(failures, vec![TargetFailure { target_id: 1, cause }]);
    assert!(!aggregator.is_tracking(1));
    metadata.remove_query_data(1);

    feed(&mut aggregator, vec![document_change(vec![1, 2], vec![], doc("rooms/a", 1))]);
    assert!(!aggregator.is_tracking(1));

    let event = aggregator.create_remote_event(version(1));
    assert_eq!(event.target_changes.keys().copied().collect::<Vec<_>>(), vec![2]);
    assert_eq!(event.target_changes[&2].added_documents, keys(&["rooms/a"]));
}
