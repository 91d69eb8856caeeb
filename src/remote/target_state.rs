use std::collections::{BTreeMap, HashMap};

use crate::model::{fold_change, DocumentKey, DocumentKeySet, DocumentViewChangeType, MaybeDocument, ResumeToken};
use crate::remote::remote_event::TargetChange;
use crate::util::hard_assert;

/// Tracks the internal state of a watch target between two remote events.
#[derive(Debug, Clone)]
pub struct TargetState {
    /// Adds or removes still waiting for an acknowledgement. Only targets with
    /// no outstanding responses are considered active.
    outstanding_responses: u32,
    /// Document changes since the last raised snapshot, already folded.
    document_changes: HashMap<DocumentKey, DocumentViewChangeType>,
    resume_token: ResumeToken,
    current: bool,
    /// Starts out true so that newly added targets appear in the next event.
    has_pending_changes: bool,
}

impl Default for TargetState {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetState {
    pub fn new() -> Self {
        Self {
            outstanding_responses: 0,
            document_changes: HashMap::new(),
            resume_token: ResumeToken::empty(),
            current: false,
            has_pending_changes: true,
        }
    }

    /// Whether the server declared this target consistent with the stream.
    pub fn current(&self) -> bool {
        self.current
    }

    pub fn resume_token(&self) -> &ResumeToken {
        &self.resume_token
    }

    pub fn outstanding_responses(&self) -> u32 {
        self.outstanding_responses
    }

    /// Whether this target has pending target adds or removes.
    pub fn is_pending(&self) -> bool {
        self.outstanding_responses != 0
    }

    pub fn has_pending_changes(&self) -> bool {
        self.has_pending_changes
    }

    /// Stores the token unless it is empty. Empty tokens never clear a token
    /// received earlier.
    pub fn update_resume_token(&mut self, resume_token: &ResumeToken) {
        if resume_token.is_empty() {
            return;
        }
        self.has_pending_changes = true;
        self.resume_token = resume_token.clone();
    }

    /// Builds the target change for the current set of document changes.
    ///
    /// `Metadata` entries only count as modifications when a found document for
    /// the key is part of `pending_updates`. Call `clear_pending_changes` once
    /// the change has been raised.
    pub fn to_target_change(&self, pending_updates: &BTreeMap<DocumentKey, MaybeDocument>) -> TargetChange {
        let mut added_documents = DocumentKeySet::new();
        let mut modified_documents = DocumentKeySet::new();
        let mut removed_documents = DocumentKeySet::new();

        for (key, change_type) in &self.document_changes {
            match change_type {
                DocumentViewChangeType::Added => {
                    added_documents.insert(key.clone());
                }
                DocumentViewChangeType::Modified => {
                    modified_documents.insert(key.clone());
                }
                DocumentViewChangeType::Removed => {
                    removed_documents.insert(key.clone());
                }
                DocumentViewChangeType::Metadata => {
                    if pending_updates.get(key).is_some_and(MaybeDocument::is_found_document) {
                        modified_documents.insert(key.clone());
                    }
                }
            }
        }

        TargetChange {
            resume_token: self.resume_token.clone(),
            current: self.current,
            added_documents,
            modified_documents,
            removed_documents,
        }
    }

    pub fn clear_pending_changes(&mut self) {
        self.has_pending_changes = false;
        self.document_changes.clear();
    }

    /// Drops document changes left over from a previous listen of the same
    /// target while keeping it in the next event.
    pub(crate) fn discard_document_changes(&mut self) {
        self.document_changes.clear();
        self.has_pending_changes = true;
    }

    pub fn document_change(&self, key: &DocumentKey) -> Option<DocumentViewChangeType> {
        self.document_changes.get(key).copied()
    }

    /// Folds `change_type` into the change already recorded for `key`.
    pub fn add_document_change(&mut self, key: DocumentKey, change_type: DocumentViewChangeType) {
        self.has_pending_changes = true;
        match fold_change(self.document_changes.get(&key).copied(), change_type) {
            Some(folded) => {
                self.document_changes.insert(key, folded);
            }
            None => {
                self.document_changes.remove(&key);
            }
        }
    }

    pub fn remove_document_change(&mut self, key: &DocumentKey) {
        self.has_pending_changes = true;
        self.document_changes.remove(key);
    }

    pub fn record_pending_target_request(&mut self) {
        self.outstanding_responses += 1;
    }

    pub fn record_target_response(&mut self) {
        hard_assert(
            self.outstanding_responses > 0,
            "received a target response without an outstanding target request",
        );
        self.outstanding_responses -= 1;
    }

    pub fn mark_current(&mut self) {
        self.has_pending_changes = true;
        self.current = true;
    }
}
