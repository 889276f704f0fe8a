//! File logging. The TUI owns stdout, so events go to a daily-rolled file
//! under the user's data directory instead of the terminal.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Install the global subscriber. `RUST_LOG` wins over `level` when set.
///
/// Returns the writer guard, which must live until exit so buffered lines
/// are flushed. Returns `None` (and logs nothing) when the log directory
/// can't be created.
pub fn init_logging(level: &str) -> Option<WorkerGuard> {
  let dir = Config::log_dir()?;
  std::fs::create_dir_all(&dir).ok()?;

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(level)));
  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(&dir, "reel.log"));

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
    .try_init()
    .ok()?;

  Some(guard)
}

fn default_directive(level: &str) -> String {
  format!("reel={}", level.trim().to_lowercase())
}
