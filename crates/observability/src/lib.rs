//! Process-wide tracing setup shared by every binary and test harness.

/// Initialize process-wide logging from the environment.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    self::tracing::init(&self::tracing::LogSettings::from_env());
}

pub mod tracing;

pub use self::tracing::{init_for_tests, LogFormat, LogSettings};
