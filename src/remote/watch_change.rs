use crate::error::WatchError;
use crate::model::{DocumentKey, MaybeDocument, ResumeToken, TargetId};

/// A single decoded message of the watch stream.
#[derive(Clone, Debug)]
pub enum WatchChange {
    Document(DocumentWatchChange),
    Target(WatchTargetChange),
    ExistenceFilter(ExistenceFilterWatchChange),
}

impl From<DocumentWatchChange> for WatchChange {
    fn from(change: DocumentWatchChange) -> Self {
        WatchChange::Document(change)
    }
}

impl From<WatchTargetChange> for WatchChange {
    fn from(change: WatchTargetChange) -> Self {
        WatchChange::Target(change)
    }
}

impl From<ExistenceFilterWatchChange> for WatchChange {
    fn from(change: ExistenceFilterWatchChange) -> Self {
        WatchChange::ExistenceFilter(change)
    }
}

/// A document moved into or out of one or more targets, or changed while
/// staying in them.
#[derive(Clone, Debug)]
pub struct DocumentWatchChange {
    /// Targets the document now matches.
    pub updated_target_ids: Vec<TargetId>,
    /// Targets the document no longer matches.
    pub removed_target_ids: Vec<TargetId>,
    pub key: DocumentKey,
    /// The new state of the document, if known. A tombstone or `None` means the
    /// document was deleted or its state is unknown.
    pub new_document: Option<MaybeDocument>,
}

impl DocumentWatchChange {
    pub fn new(
        updated_target_ids: Vec<TargetId>,
        removed_target_ids: Vec<TargetId>,
        key: DocumentKey,
        new_document: Option<MaybeDocument>,
    ) -> Self {
        Self {
            updated_target_ids,
            removed_target_ids,
            key,
            new_document,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchTargetChangeState {
    NoChange,
    Added,
    Removed,
    Current,
    Reset,
}

#[derive(Clone, Debug)]
pub struct WatchTargetChange {
    pub state: WatchTargetChangeState,
    /// Targets the change applies to; empty means every active target.
    pub target_ids: Vec<TargetId>,
    pub resume_token: ResumeToken,
    /// Only set for `Removed` changes the server rejected.
    pub cause: Option<WatchError>,
}

impl WatchTargetChange {
    pub fn new(state: WatchTargetChangeState, target_ids: Vec<TargetId>) -> Self {
        Self {
            state,
            target_ids,
            resume_token: ResumeToken::empty(),
            cause: None,
        }
    }

    pub fn with_resume_token(mut self, resume_token: impl Into<ResumeToken>) -> Self {
        self.resume_token = resume_token.into();
        self
    }

    pub fn with_cause(mut self, cause: WatchError) -> Self {
        self.cause = Some(cause);
        self
    }
}

/// Number of documents the server holds for a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExistenceFilter {
    pub count: usize,
}

impl ExistenceFilter {
    pub fn new(count: usize) -> Self {
        Self { count }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExistenceFilterWatchChange {
    pub filter: ExistenceFilter,
    pub target_id: TargetId,
}

impl ExistenceFilterWatchChange {
    pub fn new(filter: ExistenceFilter, target_id: TargetId) -> Self {
        Self { filter, target_id }
    }
}
