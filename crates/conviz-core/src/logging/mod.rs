//! Structured logging with `tracing`.
//!
//! - [`init_subscriber`] installs the process-wide stderr subscriber
//! - [`capture_logs`] installs a thread-local capturing subscriber for tests
//!
//! Context such as the visualization id or event type is attached as span or
//! event fields rather than formatted into messages, so it stays queryable.

pub mod capture;

pub use capture::{CapturedEvent, CapturedLogs, capture_logs};

/// Default log level when neither settings nor `RUST_LOG` specify one.
pub const DEFAULT_LEVEL: &str = "warn";

/// Initialize the global tracing subscriber with stderr output.
///
/// Call once at application startup. Subsequent calls are no-ops.
/// `RUST_LOG` takes precedence over `level` when set.
///
/// # Arguments
///
/// * `level` - Minimum log level (or full `EnvFilter` directive) to display.
pub fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // try_init fails only if a global subscriber is already set
    let _ = subscriber.try_init();
}
