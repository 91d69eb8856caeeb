use crate::model::{DocumentKey, ResourcePath, TargetId};

/// What the server is asked to watch for a target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// A lookup of exactly one document.
    Document(DocumentKey),
    /// A query over the documents of a collection.
    Query(ResourcePath),
}

/// Why the client listens to a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryPurpose {
    /// A regular listen issued on behalf of a user query.
    Listen,
    /// A re-listen after an existence filter mismatch.
    ExistenceFilterMismatch,
    /// A single-document listen confirming whether a limbo document exists.
    LimboResolution,
}

/// Descriptor of an active target as known by the metadata provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryData {
    pub target: Target,
    pub target_id: TargetId,
    pub purpose: QueryPurpose,
}

impl QueryData {
    pub fn new(target: Target, target_id: TargetId, purpose: QueryPurpose) -> Self {
        Self {
            target,
            target_id,
            purpose,
        }
    }
}
