use std::path::PathBuf;

use tracing::{error, info};

use tgrelay_core::{
    config::{self, Config},
    logging::{self, LOG_FILE_VAR},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `.env` may carry RUST_LOG and LOG_FILE, so it goes in before the subscriber.
    config::load_dotenv();
    let log_file = std::env::var(LOG_FILE_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);
    let _log_guard = logging::init("tgrelay", log_file.as_deref())?;

    let cfg = Config::load().inspect_err(|e| error!(error = %e, "Invalid configuration"))?;
    info!(?cfg, "Configuration loaded");

    tgrelay_telegram::router::run_polling(cfg)
        .await
        .inspect_err(|e| error!(error = %format!("{e:#}"), "Relay stopped with an error"))?;

    info!("Relay stopped");
    Ok(())
}
