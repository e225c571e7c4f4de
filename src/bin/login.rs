//! First-time Telegram login and connection check.
//!
//! Reads `API_ID`, `API_HASH` and `PHONE_NUMBER` from the environment (or
//! `.env`), signs in interactively if the session file is not authorized yet,
//! and saves the session for the watcher to reuse.

use anyhow::Result;
use std::io::{self, Write};
use tracing::error;

use chat_keyword_forwarder::config::{self, TelegramConfig};
use chat_keyword_forwarder::logging;
use chat_keyword_forwarder::platform::telegram::{Account, TelegramClient};
use chat_keyword_forwarder::platform::ChatClient;

const SETUP_INSTRUCTIONS: &str = "\
You need to set up your Telegram API credentials:

1. Go to https://my.telegram.org/auth
2. Log in with your phone number
3. Go to 'API Development tools'
4. Create a new application (any name/description)
5. Put the API ID and API hash into .env as API_ID and API_HASH
6. Add PHONE_NUMBER (with country code)

Then run this tool again.";

#[tokio::main]
async fn main() -> Result<()> {
    config::load_env_file();
    logging::init();

    let config = match TelegramConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            println!("Error: {}\n\n{}", e, SETUP_INSTRUCTIONS);
            return Ok(());
        }
    };
    let Some(phone) = config.phone_number.clone() else {
        println!("Error: PHONE_NUMBER is not set\n\n{}", SETUP_INSTRUCTIONS);
        return Ok(());
    };

    println!("Testing Telegram connection using phone number {}", phone);

    if let Err(e) = login(&config, &phone).await {
        error!("Login failed: {:#}", e);
        println!();
        println!("Common issues:");
        println!("- Wrong API_ID or API_HASH");
        println!("- Wrong phone number format (should include country code)");
        println!("- Network connection issues");
        return Ok(());
    }

    println!();
    println!("Success! Your credentials work and the session is saved.");
    println!("Session file: {}", config.session_file.display());
    Ok(())
}

async fn login(config: &TelegramConfig, phone: &str) -> Result<()> {
    let client = TelegramClient::connect(config).await?;

    if client.is_authorized().await? {
        println!("Already logged in!");
    } else {
        println!("Authentication required...");
        client.login(phone, read_line).await?;
        println!("Authentication successful!");
    }

    print_account(&client.account().await?);
    Ok(())
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut buf = String::new();
    io::stdin().read_line(&mut buf)?;
    Ok(buf.trim().to_owned())
}

fn print_account(account: &Account) {
    println!("Logged in as: {}", account.name);
    if let Some(username) = &account.username {
        println!("Username: @{}", username);
    }
    if let Some(phone) = &account.phone {
        println!("Phone: {}", phone);
    }
}
