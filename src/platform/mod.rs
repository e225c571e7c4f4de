pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Message id, unique within the monitored chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i32);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A chat or user resolved from a handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// Platform id
    pub id: i64,
    /// The handle this peer was resolved from
    pub handle: String,
    /// Title for chats, full name for users
    pub name: String,
}

/// A message read from chat history
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: MessageId,
    pub date: DateTime<Utc>,
    /// Message text, or the caption for media. Empty when there is neither.
    pub text: String,
    /// Display name of the sender, if the platform exposes one
    pub sender_name: Option<String>,
}

/// The slice of a messaging platform client the poller needs.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn is_authorized(&self) -> Result<bool>;

    /// Resolve a handle (with or without a leading `@`) to a peer.
    ///
    /// Accepts public usernames and `me` for the logged-in account. Numeric
    /// ids and phone numbers are not looked up.
    async fn resolve(&self, handle: &str) -> Result<Peer>;

    /// History of `chat`, newest first.
    fn messages<'a>(&'a self, chat: &'a Peer) -> BoxStream<'a, Result<IncomingMessage>>;

    async fn send_text(&self, to: &Peer, text: &str) -> Result<()>;

    /// Forward `message` from `from` to `to` verbatim.
    async fn forward(&self, to: &Peer, from: &Peer, message: MessageId) -> Result<()>;
}
