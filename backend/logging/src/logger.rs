//! Structured Logger
//!
//! Wraps `tracing` to provide console output (stderr), optional rolling NDJSON files,
//! and environment-based level control.

use std::path::Path;
use tracing::Dispatch;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt, fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Initialize the global structured logger.
///
/// `RUST_LOG` takes precedence over `level`. When `log_dir` is set, a daily
/// rolling file (`receiptforge.log.YYYY-MM-DD`) receives JSON lines; the
/// returned guard must be held for the life of the process so buffered
/// lines are flushed.
pub fn init_logger(level: &str, json_console: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = if json_console {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(true)
            .boxed()
    };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "receiptforge.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    guard
}

/// Console-only dispatcher for the window before config is loaded.
///
/// Use it with `WithSubscriber` around config loading so override and
/// validation warnings reach stderr. `RUST_LOG` applies; default is `info`.
pub fn bootstrap_dispatch() -> Dispatch {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    Dispatch::new(
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .finish(),
    )
}

/// Same as [`bootstrap_dispatch`] with a fixed level and custom writer.
pub fn bootstrap_dispatch_with_writer<W>(level: &str, writer: W) -> Dispatch
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    Dispatch::new(
        fmt()
            .with_env_filter(EnvFilter::new(level))
            .with_writer(writer)
            .with_ansi(false)
            .finish(),
    )
}
