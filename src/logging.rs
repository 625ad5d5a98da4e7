// Logging setup.
// The terminal belongs to the TUI, so logs go to a file in the data directory.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::cache;
use crate::config::Config;

/// Install the global subscriber.
///
/// The filter comes from `RUST_LOG` when set, else `config.log_level`.
/// If the log file can't be opened logging stays off. Calling this more
/// than once is harmless.
pub fn init(config: &Config) {
    let Some(path) = cache::log_path() else {
        return;
    };
    if let Some(dir) = path.parent() {
        if std::fs::create_dir_all(dir).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}
