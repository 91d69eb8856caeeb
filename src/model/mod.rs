mod document;
mod document_key;
mod query_data;
mod resource_path;
mod resume_token;
mod snapshot_version;
mod timestamp;
mod view_change;

use std::collections::BTreeSet;

pub use document::{MaybeDocument, ObjectValue};
pub use document_key::DocumentKey;
pub use query_data::{QueryData, QueryPurpose, Target};
pub use resource_path::ResourcePath;
pub use resume_token::ResumeToken;
pub use snapshot_version::SnapshotVersion;
pub use timestamp::Timestamp;
pub use view_change::{fold_change, DocumentViewChangeType};

/// Caller-assigned handle of a watch target.
pub type TargetId = i32;

pub type DocumentKeySet = BTreeSet<DocumentKey>;
