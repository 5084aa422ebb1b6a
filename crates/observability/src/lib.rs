//! Process-wide logging setup shared by the gateway and the services.

/// Initialize process-wide observability (tracing/logging).
///
/// The output format comes from `LOG_FORMAT`. This is safe to call multiple
/// times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Tracing configuration (filters, layers).
pub mod tracing;
