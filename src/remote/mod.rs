mod metadata;
mod remote_event;
mod settings;
mod target_state;
mod watch_change;
mod watch_change_aggregator;

pub use metadata::{InMemoryTargetMetadata, TargetMetadataProvider};
pub use remote_event::{RemoteEvent, TargetChange, TargetFailure};
pub use settings::WatchAggregatorSettings;
pub use target_state::TargetState;
pub use watch_change::{
    DocumentWatchChange, ExistenceFilter, ExistenceFilterWatchChange, WatchChange, WatchTargetChange,
    WatchTargetChangeState,
};
pub use watch_change_aggregator::WatchChangeAggregator;
