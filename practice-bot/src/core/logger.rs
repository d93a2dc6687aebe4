//! Tracing setup. Every run appends plain-text lines to the log file; development runs also
//! echo them to stdout and default to debug for this crate.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

const PRODUCTION_FILTER: &str = "info,sqlx=warn,reqwest=warn,hyper=warn";
const DEVELOPMENT_FILTER: &str = "info,practice_bot=debug,storage=debug,sqlx=warn";

struct LocalTimestamp;

impl FormatTime for LocalTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{} ", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Opens `path` for appending, creating it and its parent directory when missing.
pub(crate) fn open_log_file(path: &str) -> io::Result<File> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn default_filter(development: bool) -> &'static str {
    if development {
        DEVELOPMENT_FILTER
    } else {
        PRODUCTION_FILTER
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the default filter; load `.env` first.
///
/// Lines look like `2024-09-01 09:00:00 INFO practice_bot::digest: Digest finished ...`.
pub fn init_tracing(log_file_path: &str, development: bool) -> anyhow::Result<()> {
    let file = Arc::new(open_log_file(log_file_path)?);
    let writer = if development {
        BoxMakeWriter::new(io::stdout.and(file))
    } else {
        BoxMakeWriter::new(file)
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(development)));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_timer(LocalTimestamp)
        .with_target(true)
        .with_ansi(false);

    Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    /// **Test: the log file and its missing directories are created, and reopening appends.**
    #[test]
    fn test_open_log_file_creates_and_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("bot.log");
        let path = path.to_str().unwrap();

        writeln!(open_log_file(path).unwrap(), "first").unwrap();
        writeln!(open_log_file(path).unwrap(), "second").unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_default_filter_by_environment() {
        assert!(default_filter(true).contains("practice_bot=debug"));
        assert!(!default_filter(false).contains("debug"));
    }
}
