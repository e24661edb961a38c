use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{errors::Error, Result};

/// Environment variable naming an optional log file.
pub const LOG_FILE_VAR: &str = "LOG_FILE";

/// Default filter when `RUST_LOG` is not set: info for our crates, warn for
/// everything else (teloxide is chatty at info).
pub fn default_filter(service_name: &str) -> String {
    format!("warn,tgrelay=info,tgrelay_core=info,tgrelay_telegram=info,{service_name}=info")
}

/// Split a log file path into the directory and file name the appender wants.
/// A bare file name lands in the working directory.
pub fn file_target(path: &Path) -> Result<(PathBuf, PathBuf)> {
    let name = path.file_name().ok_or_else(|| {
        Error::Config(format!("{LOG_FILE_VAR} has no file name: {}", path.display()))
    })?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, PathBuf::from(name)))
}

/// Initialize logging/tracing for the bot.
///
/// Console output always; with `log_file` set, the same events are also
/// appended to that file without ANSI colours. Hold the returned guard until
/// exit or buffered file lines are lost.
///
/// Can be overridden with `RUST_LOG`.
pub fn init(service_name: &str, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(service_name)));

    let console = fmt::layer().with_target(false).with_ansi(true);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (dir, name) = file_target(path)?;
            std::fs::create_dir_all(&dir)
                .map_err(|e| Error::Config(format!("cannot create {}: {e}", dir.display())))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_target(false)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("logging already initialized: {e}")))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_filter_parses() {
        let filter = default_filter("tgrelay");
        assert!(filter.contains("tgrelay_core=info"));
        assert!(EnvFilter::try_new(filter).is_ok());
    }

    #[rstest]
    #[case("bot.log", ".", "bot.log")]
    #[case("logs/bot.log", "logs", "bot.log")]
    #[case("/var/log/tgrelay/relay.log", "/var/log/tgrelay", "relay.log")]
    fn file_target_splits_dir_and_name(
        #[case] path: &str,
        #[case] dir: &str,
        #[case] name: &str,
    ) {
        let (d, n) = file_target(Path::new(path)).unwrap();
        assert_eq!(d, PathBuf::from(dir));
        assert_eq!(n, PathBuf::from(name));
    }

    #[test]
    fn file_target_rejects_path_without_name() {
        let err = file_target(Path::new("/")).unwrap_err();
        assert!(err.to_string().contains("LOG_FILE"));
    }
}
