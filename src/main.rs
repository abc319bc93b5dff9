#![recursion_limit = "256"]
//! # Main Entry Point
//!
//! Boundary glue for the bot session:
//! - Domain: Configuration, Types, Errors
//! - Infrastructure: Matrix, Setlist, Completion
//! - Application: Router, Formatter, State
//!
//! Owns startup (config, logging, Matrix login), the inbound event
//! subscription, and the shared cache and conversation state.

mod application;
mod domain;
mod infrastructure;
mod strings;

use anyhow::{Context, Result};
use matrix_sdk::{
    Client,
    config::SyncSettings,
    room::Room,
    ruma::events::room::{
        member::{MembershipState, StrippedRoomMemberEvent},
        message::SyncRoomMessageEvent,
    },
};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::application::router::CommandRouter;
use crate::application::state::BotState;
use crate::domain::config::{AppConfig, resolve_secret};
use crate::infrastructure::cache::SetlistCache;
use crate::infrastructure::completion::{CompletionClient, HttpCompletionApi};
use crate::infrastructure::matrix::MatrixService;
use crate::infrastructure::retry::RetryPolicy;
use crate::infrastructure::setlist::{HttpSetlistApi, SetlistClient};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load Configuration
    let config_content =
        fs::read_to_string("data/config.yaml").context("Failed to read config.yaml")?;
    let config: AppConfig =
        serde_yaml::from_str(&config_content).context("Failed to parse config.yaml")?;

    // Resolve secrets up front; a partially configured process must not start.
    let setlist_key = resolve_secret(
        &config.services.setlist.api_key,
        &config.services.setlist.api_key_env,
        "setlist api key",
    )?;
    let completion_key = resolve_secret(
        &config.services.completion.api_key,
        &config.services.completion.api_key_env,
        "completion api key",
    )?;

    // 2. Logging Setup
    if !std::path::Path::new("data").exists() {
        fs::create_dir("data").context("Failed to create data directory")?;
    }

    let file_appender = tracing_appender::rolling::never("data", "session.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "info,matrix_sdk=warn,matrix_sdk_base=warn,matrix_sdk_crypto=error,ruma=warn,hyper=warn",
        )
    });

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);
    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    tracing::info!("Starting Encore...");

    // 3. Initialize Clients
    // The cache and conversation state live here so their lifecycle ends
    // with the session, not with any single dispatch.
    let cache = Arc::new(SetlistCache::new(Duration::from_secs(
        config.services.setlist.cache_ttl_secs,
    )));
    let retry = RetryPolicy::from_config(&config.retry);

    let setlist_api = Arc::new(HttpSetlistApi::new(&config.services.setlist, setlist_key)?);
    let setlist = Arc::new(SetlistClient::new(setlist_api, cache, retry));

    let completion_api = Arc::new(HttpCompletionApi::new(
        &config.services.completion,
        completion_key,
    )?);
    let completion = Arc::new(CompletionClient::new(
        completion_api,
        &config.retry,
        config.services.completion.context_budget_chars,
    ));

    let state = Arc::new(Mutex::new(BotState::new(
        config.services.completion.window_turns,
    )));
    let router = Arc::new(CommandRouter::new(setlist, completion, state));

    // 4. Matrix Setup
    let client = Client::builder()
        .homeserver_url(&config.services.matrix.homeserver)
        .build()
        .await?;

    client
        .matrix_auth()
        .login_username(
            &config.services.matrix.username,
            &config.services.matrix.password,
        )
        .send()
        .await?;

    tracing::info!("Logged in as {}", config.services.matrix.username);

    // 5. Event Loop
    let start_time = std::time::SystemTime::now();
    let loop_router = router.clone();

    client.add_event_handler(move |ev: SyncRoomMessageEvent, room: Room| {
        let router = loop_router.clone();

        async move {
            if let Some(original_msg) = ev.as_original() {
                // Ignore events older than start_time
                let ts = ev.origin_server_ts();
                let event_time =
                    std::time::UNIX_EPOCH + std::time::Duration::from_millis(ts.get().into());
                if event_time < start_time {
                    return;
                }

                if let matrix_sdk::ruma::events::room::message::MessageType::Text(text_content) =
                    &original_msg.content.msgtype
                {
                    if original_msg.sender == room.own_user_id() {
                        return;
                    }

                    let body = text_content.body.clone();
                    let sender = original_msg.sender.to_string();
                    tracing::info!("Received message from {}: \n{}", sender, body);

                    // Dispatch on its own task so a slow upstream call never
                    // blocks receipt of the next message.
                    tokio::spawn(async move {
                        let chat = MatrixService::new(room);
                        if let Err(e) = router.route(&chat, &body, &sender).await {
                            tracing::error!("Failed to route message: {}", e);
                        }
                    });
                }
            }
        }
    });

    // Handle Invites
    client.add_event_handler(|ev: StrippedRoomMemberEvent, room: Room| async move {
        if ev.content.membership == MembershipState::Invite {
            let _ = room.join().await;
        }
    });

    // 6. Sync Loop
    client
        .sync(SyncSettings::default())
        .await
        .context("Matrix sync loop ended")?;

    Ok(())
}
