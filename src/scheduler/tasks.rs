use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::CycleError;
use crate::matcher::KeywordMatcher;
use crate::platform::telegram::TelegramClient;
use crate::poller::{ChatPoller, CycleReport};
use crate::scheduler::Cycle;
use crate::store::ForwardedStore;

/// The production cycle: connect, poll the source chat, save the session.
///
/// A fresh connection is made for every cycle so a dropped connection only
/// costs one retry.
pub struct WatchTask {
    config: Config,
    store: Box<dyn ForwardedStore>,
    matcher: KeywordMatcher,
}

impl WatchTask {
    pub fn new(config: Config, store: Box<dyn ForwardedStore>) -> Self {
        let matcher = KeywordMatcher::new(&config.watch.keywords);
        Self {
            config,
            store,
            matcher,
        }
    }
}

#[async_trait]
impl Cycle for WatchTask {
    async fn run(&mut self) -> Result<CycleReport, CycleError> {
        let client = TelegramClient::connect(&self.config.telegram)
            .await
            .map_err(CycleError::Connect)?;

        let poller = ChatPoller::new(
            &client,
            self.store.as_ref(),
            &self.matcher,
            &self.config.watch.forward_to,
        );
        let result = poller
            .poll(&self.config.watch.source_chat, self.config.watch.hours_back)
            .await;

        if let Err(e) = client.save_session() {
            warn!("{:#}", e);
        }
        drop(client);
        debug!("Disconnected from Telegram");

        result
    }
}
