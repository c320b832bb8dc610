//! File-based logging bootstrap.
//!
//! The console owns the terminal, so log output always goes to a file and
//! only when a log directory was requested. Initialization happens at most
//! once per process; repeated calls are no-ops.

use std::path::Path;

use anyhow::{Context, Result};
use flexi_logger::{FileSpec, Logger, LoggerHandle, WriteMode};
use once_cell::sync::OnceCell;

const LOG_FILE_BASENAME: &str = "hbnb_console";

static LOGGER: OnceCell<LoggerHandle> = OnceCell::new();

/// Start logging at `level` into a file under `log_dir`, creating the
/// directory if needed.
pub fn init_logging(level: &str, log_dir: &Path) -> Result<()> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("can't create log directory {}", log_dir.display()))?;
    let handle = Logger::try_with_str(level)
        .with_context(|| format!("invalid log level `{}`", level))?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_FILE_BASENAME),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .start()
        .context("failed to start logger")?;
    let _ = LOGGER.set(handle);
    log::info!(
        "event=console_start version={} level={}",
        env!("CARGO_PKG_VERSION"),
        level
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::init_logging;
    use tempfile::TempDir;

    #[test]
    fn test_init_logging_is_idempotent() {
        let dir = TempDir::new().expect("temp dir");
        init_logging("info", dir.path()).expect("first init succeeds");
        init_logging("debug", dir.path()).expect("second init is a no-op");
    }
}
