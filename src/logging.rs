use tracing_subscriber::EnvFilter;

use crate::config::Config;

pub const LOG_ENV: &str = "TIMETABLED_LOG";

/// Installs the global subscriber. Logs go to stderr; stdout is the IPC
/// channel.
pub fn init(config: &Config) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
