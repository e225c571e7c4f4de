use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use grammers_client::types::{Chat, Message};
use grammers_client::{Client, Config as ClientConfig, InitParams, SignInError};
use grammers_session::{PackedChat, Session};
use tracing::{debug, info};

use crate::config::TelegramConfig;
use crate::platform::{ChatClient, IncomingMessage, MessageId, Peer};

/// Logged-in account details
#[derive(Debug, Clone)]
pub struct Account {
    pub name: String,
    pub username: Option<String>,
    pub phone: Option<String>,
}

/// Telegram user-account client backed by grammers.
///
/// Peers must be resolved through this client before they can be used as a
/// source or destination: the access hashes live in a local cache.
pub struct TelegramClient {
    client: Client,
    session_file: PathBuf,
    peers: Mutex<HashMap<i64, PackedChat>>,
}

impl TelegramClient {
    /// Open (or create) the session file and connect.
    pub async fn connect(config: &TelegramConfig) -> Result<Self> {
        let session = Session::load_file_or_create(&config.session_file).with_context(|| {
            format!(
                "Failed to open session file: {}",
                config.session_file.display()
            )
        })?;

        let client = Client::connect(ClientConfig {
            session,
            api_id: config.api_id,
            api_hash: config.api_hash.clone(),
            params: InitParams::default(),
        })
        .await
        .context("Failed to connect to Telegram")?;

        debug!("Connected to Telegram");

        Ok(Self {
            client,
            session_file: config.session_file.clone(),
            peers: Mutex::new(HashMap::new()),
        })
    }

    pub fn save_session(&self) -> Result<()> {
        self.client
            .session()
            .save_to_file(&self.session_file)
            .with_context(|| {
                format!(
                    "Failed to save session file: {}",
                    self.session_file.display()
                )
            })
    }

    pub async fn account(&self) -> Result<Account> {
        let me = self
            .client
            .get_me()
            .await
            .context("Failed to fetch the logged-in account")?;
        Ok(Account {
            name: me.full_name(),
            username: me.username().map(str::to_string),
            phone: me.phone().map(str::to_string),
        })
    }

    /// Interactive sign-in. `prompt` shows a question and returns the answer.
    pub async fn login<F>(&self, phone: &str, mut prompt: F) -> Result<()>
    where
        F: FnMut(&str) -> Result<String>,
    {
        info!("Sending verification code to {}", phone);
        let token = self
            .client
            .request_login_code(phone)
            .await
            .context("Failed to request a login code")?;

        let code = prompt("Enter the verification code from Telegram: ")?;

        match self.client.sign_in(&token, code.trim()).await {
            Ok(_) => {}
            Err(SignInError::PasswordRequired(password_token)) => {
                info!("Two-factor authentication is enabled");
                let hint = password_token.hint().unwrap_or("none").to_string();
                let password = prompt(&format!("Enter your 2FA password (hint: {}): ", hint))?;
                self.client
                    .check_password(password_token, password.trim())
                    .await
                    .context("Failed to sign in with the 2FA password")?;
            }
            Err(e) => return Err(e).context("Failed to sign in"),
        }

        self.save_session()?;
        info!("Session saved to {}", self.session_file.display());
        Ok(())
    }

    /// The logged-in account itself (its "Saved Messages" chat).
    async fn resolve_self(&self, handle: &str) -> Result<Peer> {
        let me = self
            .client
            .get_me()
            .await
            .context("Failed to fetch the logged-in account")?;

        let peer = Peer {
            id: me.id(),
            handle: handle.to_string(),
            name: me.full_name().trim().to_string(),
        };
        self.peers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(peer.id, me.pack());
        Ok(peer)
    }

    fn packed(&self, peer: &Peer) -> Result<PackedChat> {
        let peers = self.peers.lock().unwrap_or_else(|e| e.into_inner());
        peers
            .get(&peer.id)
            .copied()
            .ok_or_else(|| anyhow!("Peer '{}' was not resolved by this client", peer.handle))
    }
}

#[async_trait]
impl ChatClient for TelegramClient {
    async fn is_authorized(&self) -> Result<bool> {
        self.client
            .is_authorized()
            .await
            .context("Failed to check authorization")
    }

    async fn resolve(&self, handle: &str) -> Result<Peer> {
        let username = handle.trim_start_matches('@');
        if username.eq_ignore_ascii_case("me") {
            return self.resolve_self(handle).await;
        }

        let chat = self
            .client
            .resolve_username(username)
            .await
            .with_context(|| format!("Failed to resolve '{}'", handle))?
            .ok_or_else(|| anyhow!("No chat or user named '{}'", handle))?;

        let peer = Peer {
            id: chat.id(),
            handle: handle.to_string(),
            name: display_name(&chat),
        };

        self.peers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(peer.id, chat.pack());

        Ok(peer)
    }

    fn messages<'a>(&'a self, chat: &'a Peer) -> BoxStream<'a, Result<IncomingMessage>> {
        let packed = match self.packed(chat) {
            Ok(packed) => packed,
            Err(e) => return stream::once(async move { Err(e) }).boxed(),
        };

        let iter = self.client.iter_messages(packed);
        stream::try_unfold(iter, |mut iter| async move {
            let next = iter
                .next()
                .await
                .context("Failed to fetch chat history")?;
            Ok::<_, anyhow::Error>(next.map(|message| (incoming_from(&message), iter)))
        })
        .boxed()
    }

    async fn send_text(&self, to: &Peer, text: &str) -> Result<()> {
        self.client
            .send_message(self.packed(to)?, text)
            .await
            .with_context(|| format!("Failed to send message to '{}'", to.handle))?;
        Ok(())
    }

    async fn forward(&self, to: &Peer, from: &Peer, message: MessageId) -> Result<()> {
        self.client
            .forward_messages(self.packed(to)?, &[message.0], self.packed(from)?)
            .await
            .with_context(|| format!("Failed to forward message {} to '{}'", message, to.handle))?;
        Ok(())
    }
}

fn incoming_from(message: &Message) -> IncomingMessage {
    IncomingMessage {
        id: MessageId(message.id()),
        date: message.date(),
        text: message.text().to_string(),
        sender_name: message.sender().map(|sender| display_name(&sender)),
    }
}

/// Full name for users, title for groups and channels
fn display_name(chat: &Chat) -> String {
    match chat {
        Chat::User(user) => user.full_name().trim().to_string(),
        other => other.name().to_string(),
    }
}
