use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};

use crate::model::Timestamp;

/// The server read time a remote event is consistent with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotVersion {
    timestamp: Timestamp,
}

impl SnapshotVersion {
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    /// The version before any server snapshot; sorts below every real version.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        *self == Self::none()
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

impl From<Timestamp> for SnapshotVersion {
    fn from(timestamp: Timestamp) -> Self {
        Self::new(timestamp)
    }
}

impl From<DateTime<Utc>> for SnapshotVersion {
    fn from(time: DateTime<Utc>) -> Self {
        Self::new(Timestamp::from_datetime(time))
    }
}

impl Display for SnapshotVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            return write!(f, "SnapshotVersion(none)");
        }
        write!(f, "SnapshotVersion({})", self.timestamp.to_rfc3339())
    }
}
