/// Panics with an internal assertion message when the condition is false.
///
/// Used for contract violations by the caller (e.g. acknowledging a target
/// that was never requested); these are bugs, not recoverable errors.
#[track_caller]
pub fn hard_assert(condition: bool, message: impl AsRef<str>) {
    if !condition {
        panic!("{}", assertion_error(message));
    }
}

/// Builds the string used for failed internal assertions.
pub fn assertion_error(message: impl AsRef<str>) -> String {
    format!(
        "watch-aggregator ({}) INTERNAL ASSERT FAILED: {}",
        env!("CARGO_PKG_VERSION"),
        message.as_ref()
    )
}
