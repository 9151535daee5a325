//! Tracing/logging setup shared by the binaries.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use self::tracing::{LogFormat, ParseLogFormatError};

/// Initialize process-wide logging with JSON output.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    self::tracing::init_with(LogFormat::Json, "info");
}

/// Initialize process-wide logging with the given output format.
pub fn init_with(format: LogFormat) {
    self::tracing::init_with(format, "info");
}
