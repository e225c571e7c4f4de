//! In-memory [`ChatClient`] for poller tests.
//!
//! Serves a fixed newest-first history and records every outgoing call so
//! tests can assert on what would have reached Telegram.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};

use chat_keyword_forwarder::platform::{ChatClient, IncomingMessage, MessageId, Peer};

/// One outgoing call, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text { to: String, text: String },
    Forward { to: String, from: String, id: MessageId },
}

pub struct MockClient {
    authorized: bool,
    peers: HashMap<String, Peer>,
    history: Vec<IncomingMessage>,
    /// Yield an error instead of the message at this index.
    history_error_at: Option<usize>,
    failing_forwards: HashSet<MessageId>,
    sent: Mutex<Vec<Sent>>,
}

impl MockClient {
    /// Client that knows the chat `@market` and the user `@me`.
    pub fn new(history: Vec<IncomingMessage>) -> Self {
        let mut peers = HashMap::new();
        for (id, handle, name) in [(100, "market", "Flea Market"), (200, "me", "Me Myself")] {
            peers.insert(
                handle.to_string(),
                Peer {
                    id,
                    handle: handle.to_string(),
                    name: name.to_string(),
                },
            );
        }
        Self {
            authorized: true,
            peers,
            history,
            history_error_at: None,
            failing_forwards: HashSet::new(),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn unauthorized(mut self) -> Self {
        self.authorized = false;
        self
    }

    pub fn without_peer(mut self, handle: &str) -> Self {
        self.peers.remove(handle);
        self
    }

    pub fn history_error_at(mut self, index: usize) -> Self {
        self.history_error_at = Some(index);
        self
    }

    pub fn failing_forward(mut self, id: i32) -> Self {
        self.failing_forwards.insert(MessageId(id));
        self
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn forwarded_ids(&self) -> Vec<MessageId> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Forward { id, .. } => Some(id),
                Sent::Text { .. } => None,
            })
            .collect()
    }

    pub fn clear_sent(&self) {
        self.sent.lock().unwrap().clear();
    }
}

pub fn message(id: i32, date: DateTime<Utc>, text: &str) -> IncomingMessage {
    IncomingMessage {
        id: MessageId(id),
        date,
        text: text.to_string(),
        sender_name: Some("Seller".to_string()),
    }
}

#[async_trait]
impl ChatClient for MockClient {
    async fn is_authorized(&self) -> Result<bool> {
        Ok(self.authorized)
    }

    async fn resolve(&self, handle: &str) -> Result<Peer> {
        self.peers
            .get(handle.trim_start_matches('@'))
            .cloned()
            .ok_or_else(|| anyhow!("No chat or user named '{}'", handle))
    }

    fn messages<'a>(&'a self, _chat: &'a Peer) -> BoxStream<'a, Result<IncomingMessage>> {
        let error_at = self.history_error_at;
        stream::iter(self.history.iter().cloned().enumerate())
            .map(move |(i, m)| {
                if Some(i) == error_at {
                    Err(anyhow!("connection reset"))
                } else {
                    Ok(m)
                }
            })
            .boxed()
    }

    async fn send_text(&self, to: &Peer, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Text {
            to: to.handle.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn forward(&self, to: &Peer, from: &Peer, message: MessageId) -> Result<()> {
        if self.failing_forwards.contains(&message) {
            return Err(anyhow!("FLOOD_WAIT"));
        }
        self.sent.lock().unwrap().push(Sent::Forward {
            to: to.handle.clone(),
            from: from.handle.clone(),
            id: message,
        });
        Ok(())
    }
}
