use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::model::{
    DocumentKey, DocumentKeySet, DocumentViewChangeType, MaybeDocument, QueryData, QueryPurpose, SnapshotVersion,
    Target, TargetId,
};
use crate::remote::metadata::TargetMetadataProvider;
use crate::remote::remote_event::{RemoteEvent, TargetFailure};
use crate::remote::settings::WatchAggregatorSettings;
use crate::remote::target_state::TargetState;
use crate::remote::watch_change::{
    DocumentWatchChange, ExistenceFilterWatchChange, WatchChange, WatchTargetChange, WatchTargetChangeState,
};
use crate::util::hard_assert;

/// Accumulates watch changes into `RemoteEvent`s.
///
/// The aggregator is driven by a single stream consumer: every mutation takes
/// `&mut self` and changes must be fed in the order the stream delivered them.
/// Nothing is observable until `create_remote_event` drains the accumulated
/// state.
pub struct WatchChangeAggregator<P = ()>
where
    P: TargetMetadataProvider,
{
    metadata: Arc<P>,
    settings: WatchAggregatorSettings,
    /// The internal state of all tracked targets.
    target_states: HashMap<TargetId, TargetState>,
    /// Documents to update since the last raised snapshot.
    pending_document_updates: BTreeMap<DocumentKey, MaybeDocument>,
    /// Targets that currently include each document.
    pending_document_target_mappings: BTreeMap<DocumentKey, BTreeSet<TargetId>>,
    /// Targets that dropped each document since the last raised snapshot.
    pending_document_removals: BTreeMap<DocumentKey, BTreeSet<TargetId>>,
    /// Targets whose existence filter did not match. Their listens have to be
    /// re-established by the caller.
    pending_target_resets: BTreeSet<TargetId>,
}

impl<P> WatchChangeAggregator<P>
where
    P: TargetMetadataProvider + 'static,
{
    pub fn new(metadata: Arc<P>) -> Self {
        Self::with_settings(metadata, WatchAggregatorSettings::default())
    }

    pub fn with_settings(metadata: Arc<P>, settings: WatchAggregatorSettings) -> Self {
        Self {
            metadata,
            settings,
            target_states: HashMap::new(),
            pending_document_updates: BTreeMap::new(),
            pending_document_target_mappings: BTreeMap::new(),
            pending_document_removals: BTreeMap::new(),
            pending_target_resets: BTreeSet::new(),
        }
    }

    pub fn settings(&self) -> &WatchAggregatorSettings {
        &self.settings
    }

    pub fn target_state(&self, target_id: TargetId) -> Option<&TargetState> {
        self.target_states.get(&target_id)
    }

    pub fn is_tracking(&self, target_id: TargetId) -> bool {
        self.target_states.contains_key(&target_id)
    }

    pub fn pending_target_resets(&self) -> &BTreeSet<TargetId> {
        &self.pending_target_resets
    }

    /// Dispatches a decoded stream message to the matching handler. Returns the
    /// targets the server removed with an error.
    pub fn handle_watch_change(&mut self, change: WatchChange) -> Vec<TargetFailure> {
        match change {
            WatchChange::Document(document_change) => {
                self.handle_document_change(document_change);
                Vec::new()
            }
            WatchChange::Target(target_change) => self.handle_target_change(target_change),
            WatchChange::ExistenceFilter(filter) => {
                self.handle_existence_filter(filter);
                Vec::new()
            }
        }
    }

    pub fn handle_document_change(&mut self, change: DocumentWatchChange) {
        let DocumentWatchChange {
            updated_target_ids,
            removed_target_ids,
            key,
            new_document,
        } = change;

        // Compared once against the body pending before this change, so every
        // target sees the same answer.
        let content_changed = match (&new_document, self.pending_document_updates.get(&key)) {
            (Some(document), Some(previous)) => document != previous,
            _ => true,
        };

        for target_id in &updated_target_ids {
            match &new_document {
                Some(document) if document.is_found_document() => {
                    self.add_document_to_target(*target_id, document, content_changed);
                }
                _ => self.remove_document_from_target(*target_id, &key, new_document.clone()),
            }
        }

        for target_id in &removed_target_ids {
            self.remove_document_from_target(*target_id, &key, new_document.clone());
        }

        if updated_target_ids.is_empty() && removed_target_ids.is_empty() {
            if let Some(document) = new_document.as_ref().filter(|doc| doc.is_found_document()) {
                self.mark_mapped_targets_changed(document.key(), content_changed);
            }
        }

        if let Some(document) = new_document {
            self.pending_document_updates.insert(key, document);
        }
    }

    /// Applies a target change to every target it names, or to all active
    /// targets when it names none.
    pub fn handle_target_change(&mut self, change: WatchTargetChange) -> Vec<TargetFailure> {
        hard_assert(
            change.state != WatchTargetChangeState::Removed || !change.target_ids.is_empty(),
            "a removed target change must name the targets it removes",
        );
        let mut failures = Vec::new();

        for target_id in self.target_ids_for_change(&change) {
            match change.state {
                WatchTargetChangeState::NoChange => {}
                WatchTargetChangeState::Added => {
                    let state = self.ensure_target_state(target_id);
                    state.record_target_response();
                    if !state.is_pending() {
                        // A target can be removed and added back (e.g. after an
                        // existence filter mismatch); changes from the old listen
                        // no longer apply.
                        state.discard_document_changes();
                        self.drop_document_mappings(target_id);
                    }
                }
                WatchTargetChangeState::Removed => {
                    if let Some(cause) = change.cause.as_ref() {
                        log::warn!("watch target {target_id} removed by the server: {cause}");
                        self.remove_target(target_id);
                        failures.push(TargetFailure {
                            target_id,
                            cause: cause.clone(),
                        });
                        continue;
                    }

                    let state = self.ensure_target_state(target_id);
                    state.record_target_response();
                    if !state.is_pending() {
                        self.remove_target(target_id);
                    }
                    continue;
                }
                WatchTargetChangeState::Current => {
                    if self.is_active_target(target_id) {
                        self.ensure_target_state(target_id).mark_current();
                    }
                }
                WatchTargetChangeState::Reset => {
                    if self.is_active_target(target_id) {
                        self.reset_target(target_id);
                    }
                }
            }

            if !change.resume_token.is_empty() {
                self.ensure_target_state(target_id)
                    .update_resume_token(&change.resume_token);
            }
        }

        failures
    }

    /// Compares the server's document count for a target with the local count
    /// and resets the target when they differ. The server does not say which
    /// documents are missing, so any difference invalidates the whole target.
    pub fn handle_existence_filter(&mut self, change: ExistenceFilterWatchChange) {
        let target_id = change.target_id;
        if self.query_data_for_active_target(target_id).is_none() {
            return;
        }

        let expected = change.filter.count;
        let actual = self.current_document_count_for_target(target_id);
        if expected != actual {
            log::debug!(
                "existence filter mismatch for target {target_id}: expected {expected} documents, found {actual}"
            );
            self.reset_target(target_id);
            self.pending_target_resets.insert(target_id);
        }
    }

    /// Converts the accumulated changes into a remote event at
    /// `snapshot_version` and clears them.
    pub fn create_remote_event(&mut self, snapshot_version: SnapshotVersion) -> RemoteEvent {
        let mut target_ids: Vec<TargetId> = self.target_states.keys().copied().collect();
        target_ids.sort_unstable();

        let mut target_changes = BTreeMap::new();
        for target_id in target_ids {
            let Some(query_data) = self.metadata.query_data_for_target(target_id) else {
                continue;
            };

            if self.settings.synthesize_document_query_deletes {
                self.synthesize_missing_document(target_id, &query_data, snapshot_version);
            }

            let Some(state) = self.target_states.get_mut(&target_id) else {
                continue;
            };
            if state.has_pending_changes() {
                target_changes.insert(target_id, state.to_target_change(&self.pending_document_updates));
                state.clear_pending_changes();
            }
        }

        let resolved_limbo_documents = if self.settings.resolve_limbo_documents {
            self.resolved_limbo_documents()
        } else {
            DocumentKeySet::new()
        };

        let event = RemoteEvent {
            snapshot_version,
            target_changes,
            target_mismatches: std::mem::take(&mut self.pending_target_resets),
            document_updates: std::mem::take(&mut self.pending_document_updates),
            resolved_limbo_documents,
        };
        self.pending_document_target_mappings.clear();
        self.pending_document_removals.clear();

        log::trace!(
            "raised remote event at {}: {} target changes, {} document updates, {} target resets",
            event.snapshot_version,
            event.target_changes.len(),
            event.document_updates.len(),
            event.target_mismatches.len()
        );
        event
    }

    /// Drops all state of the target, including its document mappings.
    pub fn remove_target(&mut self, target_id: TargetId) {
        log::debug!("no longer tracking watch target {target_id}");
        self.target_states.remove(&target_id);
        self.drop_document_mappings(target_id);
    }

    /// Increments the number of acknowledgements needed before the target is
    /// considered in sync with the server.
    pub fn record_pending_target_request(&mut self, target_id: TargetId) {
        self.ensure_target_state(target_id).record_pending_target_request();
    }

    /// Returns the explicitly listed targets, or all active targets when the
    /// change lists none.
    fn target_ids_for_change(&self, change: &WatchTargetChange) -> Vec<TargetId> {
        if !change.target_ids.is_empty() {
            return change.target_ids.clone();
        }

        let mut target_ids: Vec<TargetId> = self
            .target_states
            .keys()
            .copied()
            .filter(|target_id| self.is_active_target(*target_id))
            .collect();
        target_ids.sort_unstable();
        target_ids
    }

    fn add_document_to_target(&mut self, target_id: TargetId, document: &MaybeDocument, content_changed: bool) {
        if !self.is_active_target(target_id) {
            return;
        }

        let key = document.key().clone();
        let change_type = if !self.target_contains_document(target_id, &key) {
            DocumentViewChangeType::Added
        } else if content_changed {
            DocumentViewChangeType::Modified
        } else {
            DocumentViewChangeType::Metadata
        };

        self.ensure_target_state(target_id)
            .add_document_change(key.clone(), change_type);
        self.pending_document_target_mappings
            .entry(key.clone())
            .or_default()
            .insert(target_id);
        self.pending_document_updates.insert(key, document.clone());
    }

    /// Removes the document from the target. When the new state of the document
    /// is known (e.g. it was deleted), it is recorded so storage can catch up.
    fn remove_document_from_target(
        &mut self,
        target_id: TargetId,
        key: &DocumentKey,
        updated_document: Option<MaybeDocument>,
    ) {
        if !self.is_active_target(target_id) {
            return;
        }

        if self.target_contains_document(target_id, key) {
            self.ensure_target_state(target_id)
                .add_document_change(key.clone(), DocumentViewChangeType::Removed);
        } else {
            // Entered and left the target before a snapshot was raised.
            self.ensure_target_state(target_id).remove_document_change(key);
        }

        if let Some(targets) = self.pending_document_target_mappings.get_mut(key) {
            targets.remove(&target_id);
            if targets.is_empty() {
                self.pending_document_target_mappings.remove(key);
            }
        }
        self.pending_document_removals
            .entry(key.clone())
            .or_default()
            .insert(target_id);

        if let Some(document) = updated_document {
            self.pending_document_updates.insert(key.clone(), document);
        }
    }

    /// Records a change for every active target that includes the document in
    /// this window.
    fn mark_mapped_targets_changed(&mut self, key: &DocumentKey, content_changed: bool) {
        let Some(target_ids) = self.pending_document_target_mappings.get(key).cloned() else {
            return;
        };

        let change_type = if content_changed {
            DocumentViewChangeType::Modified
        } else {
            DocumentViewChangeType::Metadata
        };
        for target_id in target_ids {
            if self.is_active_target(target_id) {
                self.ensure_target_state(target_id)
                    .add_document_change(key.clone(), change_type);
            }
        }
    }

    /// A current single-document target without its document means the document
    /// does not exist. Storage only learns that from an explicit tombstone.
    fn synthesize_missing_document(
        &mut self,
        target_id: TargetId,
        query_data: &QueryData,
        snapshot_version: SnapshotVersion,
    ) {
        let Target::Document(key) = &query_data.target else {
            return;
        };
        let eligible = self
            .target_states
            .get(&target_id)
            .is_some_and(|state| state.current() && !state.is_pending() && state.has_pending_changes());
        if !eligible
            || self.pending_document_updates.contains_key(key)
            || self.target_contains_document(target_id, key)
        {
            return;
        }

        log::debug!("synthesizing delete of {key} for current document target {target_id}");
        let tombstone = MaybeDocument::no_document(key.clone(), snapshot_version);
        self.remove_document_from_target(target_id, key, Some(tombstone));
    }

    /// Documents whose interested targets in this window are all limbo
    /// resolutions.
    fn resolved_limbo_documents(&self) -> DocumentKeySet {
        let mut touched: BTreeMap<&DocumentKey, BTreeSet<TargetId>> = BTreeMap::new();
        for (key, target_ids) in self
            .pending_document_target_mappings
            .iter()
            .chain(self.pending_document_removals.iter())
        {
            touched.entry(key).or_default().extend(target_ids.iter().copied());
        }

        touched
            .into_iter()
            .filter(|(_, target_ids)| {
                target_ids.iter().all(|target_id| {
                    self.query_data_for_active_target(*target_id)
                        .map_or(true, |query_data| query_data.purpose == QueryPurpose::LimboResolution)
                })
            })
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of documents in the target: the ones raised so far plus pending
    /// additions minus pending removals.
    fn current_document_count_for_target(&self, target_id: TargetId) -> usize {
        let remote_count = self.metadata.remote_keys_for_target(target_id).len();
        match self.target_states.get(&target_id) {
            Some(state) => {
                let change = state.to_target_change(&self.pending_document_updates);
                (remote_count + change.added_documents.len()).saturating_sub(change.removed_documents.len())
            }
            None => remote_count,
        }
    }

    fn ensure_target_state(&mut self, target_id: TargetId) -> &mut TargetState {
        self.target_states.entry(target_id).or_default()
    }

    /// Active targets have no outstanding adds or removes and are still of
    /// interest to the caller. Events for other targets may belong to a listen
    /// the server has not caught up with yet.
    fn is_active_target(&self, target_id: TargetId) -> bool {
        self.query_data_for_active_target(target_id).is_some()
    }

    fn query_data_for_active_target(&self, target_id: TargetId) -> Option<QueryData> {
        if self
            .target_states
            .get(&target_id)
            .is_some_and(TargetState::is_pending)
        {
            return None;
        }
        self.metadata.query_data_for_target(target_id)
    }

    /// Puts the target back into its initial state: not current, no resume
    /// token, no document changes and no document mappings.
    fn reset_target(&mut self, target_id: TargetId) {
        hard_assert(
            !self
                .target_states
                .get(&target_id)
                .is_some_and(TargetState::is_pending),
            format!("should only reset active targets (target {target_id})"),
        );
        log::debug!("resetting watch target {target_id}");
        self.target_states.insert(target_id, TargetState::new());
        self.drop_document_mappings(target_id);
    }

    fn drop_document_mappings(&mut self, target_id: TargetId) {
        for mappings in [&mut self.pending_document_target_mappings, &mut self.pending_document_removals] {
            mappings.retain(|_, target_ids| {
                target_ids.remove(&target_id);
                !target_ids.is_empty()
            });
        }
    }

    /// Whether the target contains the document: either it was part of the
    /// last raised snapshot or it was added since.
    fn target_contains_document(&self, target_id: TargetId, key: &DocumentKey) -> bool {
        if self.metadata.remote_keys_for_target(target_id).contains(key) {
            return true;
        }
        self.target_states
            .get(&target_id)
            .and_then(|state| state.document_change(key))
            == Some(DocumentViewChangeType::Added)
    }
}
