#![doc = include_str!("RUSTDOC.md")]

pub mod error;
pub mod model;
pub mod remote;
pub mod util;

#[cfg(test)]
pub mod test_support;

pub use error::{WatchError, WatchErrorCode, WatchResult};
