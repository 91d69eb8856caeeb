use std::collections::{BTreeMap, BTreeSet};

use crate::error::WatchError;
use crate::model::{DocumentKey, DocumentKeySet, MaybeDocument, ResumeToken, SnapshotVersion, TargetId};

/// Aggregated result of the watch changes received since the previous event.
/// Owns all of its data; later aggregator mutations never affect it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteEvent {
    pub snapshot_version: SnapshotVersion,
    pub target_changes: BTreeMap<TargetId, TargetChange>,
    /// Targets whose existence filter did not match and must be re-listened.
    pub target_mismatches: BTreeSet<TargetId>,
    pub document_updates: BTreeMap<DocumentKey, MaybeDocument>,
    /// Documents whose only interested targets are limbo resolutions.
    pub resolved_limbo_documents: DocumentKeySet,
}

impl RemoteEvent {
    pub fn is_empty(&self) -> bool {
        self.target_changes.is_empty()
            && self.document_updates.is_empty()
            && self.target_mismatches.is_empty()
            && self.resolved_limbo_documents.is_empty()
    }
}

/// Changes for one target since the last raised snapshot. The document
/// contents live in `RemoteEvent::document_updates` since a document can
/// belong to several targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetChange {
    pub resume_token: ResumeToken,
    /// Whether the server declared the target consistent with the rest of the
    /// stream.
    pub current: bool,
    pub added_documents: DocumentKeySet,
    pub modified_documents: DocumentKeySet,
    pub removed_documents: DocumentKeySet,
}

impl TargetChange {
    pub fn has_document_changes(&self) -> bool {
        !(self.added_documents.is_empty()
            && self.modified_documents.is_empty()
            && self.removed_documents.is_empty())
    }
}

/// A target the server removed with an error. Only that target stops being
/// tracked; the rest of the stream is unaffected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFailure {
    pub target_id: TargetId,
    pub cause: WatchError,
}
