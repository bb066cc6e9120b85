use std::sync::Once;

use dwh_config::Environment;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

/// Default filter when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "info";

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("failed to install the tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Flushes buffered log lines when dropped.
///
/// Keep it alive until the end of `main`, otherwise the last lines of a failing run are lost.
#[must_use = "dropping the flusher stops log output"]
pub struct LogFlusher {
    _guard: WorkerGuard,
}

/// Installs the global subscriber for a binary.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. In the `prod` environment lines are
/// written as JSON.
pub fn init_tracing(
    app_name: &'static str,
    environment: Environment,
) -> Result<LogFlusher, TracingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(DEFAULT_LOG_FILTER)?,
    };

    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());

    let registry = tracing_subscriber::registry().with(filter);
    if environment.is_prod() {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(writer),
            )
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(writer))
            .try_init()?;
    }

    tracing::info!(app = app_name, environment = %environment, "tracing initialized");

    Ok(LogFlusher { _guard: guard })
}

static INIT_TEST_TRACING: Once = Once::new();

/// Installs a test subscriber once per test binary.
///
/// Output goes through the libtest writer so it is only shown for failing tests. Set `RUST_LOG`
/// to change verbosity.
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_test_writer())
            .try_init();
    });
}
