use anyhow::Result;
use tracing::{error, info, warn};

use chat_keyword_forwarder::config::{self, Config};
use chat_keyword_forwarder::logging;
use chat_keyword_forwarder::scheduler::tasks::WatchTask;
use chat_keyword_forwarder::scheduler::Scheduler;
use chat_keyword_forwarder::store;

#[tokio::main]
async fn main() -> Result<()> {
    config::load_env_file();
    logging::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            error!("Set it in the environment or in .env, then start again");
            return Ok(());
        }
    };

    info!("Configuration loaded successfully");
    info!("  Source chat: {}", config.watch.source_chat);
    info!("  Forward to: {}", config.watch.forward_to);
    info!("  Keywords: {:?}", config.watch.keywords);
    info!("  Lookback: {} hours", config.watch.hours_back);
    info!("  Session file: {}", config.telegram.session_file.display());
    info!(
        "  Poll interval: {}s, retry delay: {}s",
        config.schedule.poll_interval.as_secs(),
        config.schedule.retry_delay.as_secs()
    );
    if config.watch.has_empty_keyword() {
        warn!("KEYWORDS contains an empty entry; every message will match it");
    }
    if !config.telegram.session_file.exists() {
        warn!("No session file yet; run the login tool first");
    }

    let store = store::open(&config.store)?;
    let scheduler = Scheduler::new(config.schedule.clone());
    let mut task = WatchTask::new(config, store);

    info!("Starting hourly chat monitoring, press Ctrl+C to stop");
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    scheduler.run(&mut task, shutdown).await;
    Ok(())
}
