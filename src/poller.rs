use chrono::{DateTime, Duration, Utc};
use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::error::CycleError;
use crate::format::{match_header, relative_age};
use crate::matcher::KeywordMatcher;
use crate::platform::{ChatClient, IncomingMessage, MessageId, Peer};
use crate::store::{ForwardedIds, ForwardedStore};

/// A fetched text message and the keywords it matched
#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub id: MessageId,
    pub date: DateTime<Utc>,
    pub sender_name: String,
    pub text: String,
    pub matched_keywords: Vec<String>,
}

impl MessageRecord {
    fn new(message: IncomingMessage, matched_keywords: Vec<String>) -> Self {
        Self {
            id: message.id,
            date: message.date,
            sender_name: message
                .sender_name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            text: message.text,
            matched_keywords,
        }
    }
}

/// Counts for one poll cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Text messages inside the lookback window
    pub seen: usize,
    /// Matches not forwarded before (forward attempted)
    pub new_matches: usize,
    pub forwarded: usize,
    pub skipped_duplicates: usize,
    pub failed: usize,
    /// Set when the cycle stopped at entity resolution
    pub aborted: Option<String>,
}

impl CycleReport {
    fn aborted(reason: String) -> Self {
        Self {
            aborted: Some(reason),
            ..Default::default()
        }
    }
}

/// One sweep over a chat: fetch recent messages, match, forward new matches.
pub struct ChatPoller<'a, C: ?Sized, S: ?Sized> {
    client: &'a C,
    store: &'a S,
    matcher: &'a KeywordMatcher,
    forward_to: &'a str,
}

impl<'a, C, S> ChatPoller<'a, C, S>
where
    C: ChatClient + ?Sized,
    S: ForwardedStore + ?Sized,
{
    pub fn new(
        client: &'a C,
        store: &'a S,
        matcher: &'a KeywordMatcher,
        forward_to: &'a str,
    ) -> Self {
        Self {
            client,
            store,
            matcher,
            forward_to,
        }
    }

    pub async fn poll(&self, chat_handle: &str, hours_back: u32) -> Result<CycleReport, CycleError> {
        self.poll_at(Utc::now(), chat_handle, hours_back).await
    }

    /// Same as [`poll`](Self::poll) with an explicit "now".
    pub async fn poll_at(
        &self,
        now: DateTime<Utc>,
        chat_handle: &str,
        hours_back: u32,
    ) -> Result<CycleReport, CycleError> {
        let cutoff = cutoff(now, hours_back);
        info!(
            "Getting messages from {} from last {} hours (since {})",
            chat_handle,
            hours_back,
            cutoff.format("%Y-%m-%d %H:%M:%S")
        );
        debug!(
            "Looking for keywords: {}",
            self.matcher.keywords().collect::<Vec<_>>().join(", ")
        );

        let mut forwarded = self.store.load();
        info!("Loaded {} previously forwarded message ids", forwarded.len());

        if !self
            .client
            .is_authorized()
            .await
            .map_err(CycleError::Transport)?
        {
            return Err(CycleError::Unauthorized);
        }

        let chat = match self.client.resolve(chat_handle).await {
            Ok(chat) => {
                info!("Found chat: {}", chat.name);
                chat
            }
            Err(e) => {
                error!("Could not find chat '{}': {:#}", chat_handle, e);
                return Ok(CycleReport::aborted(format!("chat '{}' not found", chat_handle)));
            }
        };

        let target = match self.client.resolve(self.forward_to).await {
            Ok(target) => {
                info!("Found target user: {}", target.name);
                target
            }
            Err(e) => {
                error!("Could not find user '{}': {:#}", self.forward_to, e);
                return Ok(CycleReport::aborted(format!(
                    "user '{}' not found",
                    self.forward_to
                )));
            }
        };

        let mut report = CycleReport::default();
        let mut messages = self.client.messages(&chat);

        while let Some(message) = messages.next().await {
            let message = message.map_err(CycleError::Transport)?;
            if message.date < cutoff {
                break;
            }
            if message.text.is_empty() {
                continue;
            }

            report.seen += 1;
            let matched = self.matcher.matches(&message.text);
            if matched.is_empty() {
                continue;
            }

            let record = MessageRecord::new(message, matched);
            if forwarded.contains(&record.id) {
                info!("Skip: message {} already forwarded", record.id);
                report.skipped_duplicates += 1;
                continue;
            }

            report.new_matches += 1;
            info!(
                "Match: message {} from {} has keywords {:?}",
                record.id, record.sender_name, record.matched_keywords
            );

            match self.forward(&chat, &target, &record, now).await {
                Ok(()) => {
                    report.forwarded += 1;
                    info!("Forwarded message {} to {}", record.id, target.handle);
                    self.remember(&mut forwarded, record.id);
                }
                Err(e) => {
                    report.failed += 1;
                    error!("Failed to forward message {}: {:#}", record.id, e);
                }
            }
        }

        log_summary(&report, hours_back);
        Ok(report)
    }

    async fn forward(
        &self,
        chat: &Peer,
        target: &Peer,
        record: &MessageRecord,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let header = match_header(&record.matched_keywords, &relative_age(now, record.date));
        self.client.send_text(target, &header).await?;
        self.client.forward(target, chat, record.id).await?;
        Ok(())
    }

    fn remember(&self, forwarded: &mut ForwardedIds, id: MessageId) {
        if let Err(e) = self.store.add(forwarded, id) {
            // Already forwarded; without the write it will be forwarded again next cycle.
            warn!("Failed to persist forwarded message {}: {:#}", id, e);
        }
    }
}

/// Oldest timestamp still in range. Clamped to the earliest representable
/// date when the lookback reaches past it.
fn cutoff(now: DateTime<Utc>, hours_back: u32) -> DateTime<Utc> {
    now.checked_sub_signed(Duration::hours(i64::from(hours_back)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn log_summary(report: &CycleReport, hours_back: u32) {
    info!(
        "Processed {} messages from last {} hours",
        report.seen, hours_back
    );
    info!("Found {} new matching messages", report.new_matches);
    if report.skipped_duplicates > 0 {
        info!(
            "Skipped {} already forwarded messages",
            report.skipped_duplicates
        );
    }
    if report.failed > 0 {
        warn!("{} matching messages could not be forwarded", report.failed);
    }
    if report.new_matches == 0 && report.skipped_duplicates == 0 {
        info!("No messages found with your keywords in the specified time period");
    }
}
