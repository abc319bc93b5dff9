//! # Command Router
//!
//! Classifies an inbound message into a `Command` and dispatches it to the
//! matching client. Stateless across messages apart from the per-room
//! conversation window it reads from `BotState`. The router never retries
//! and never interprets error internals; ApiResults go to the formatter
//! verbatim so failure classification survives to the user-facing text.

use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::formatter;
use crate::application::state::BotState;
use crate::domain::traits::ChatProvider;
use crate::domain::types::{Command, ConversationTurn};
use crate::infrastructure::completion::CompletionClient;
use crate::infrastructure::setlist::SetlistClient;
use crate::strings::messages;

/// Classify raw message text. `None` means ordinary chatter the bot
/// should stay silent on.
pub fn parse_command(message: &str) -> Option<Command> {
    let msg = message.trim();
    if !msg.starts_with('!') {
        return None;
    }

    let (cmd, args) = match msg.find(char::is_whitespace) {
        Some(idx) => (&msg[..idx], msg[idx..].trim()),
        None => (msg, ""),
    };

    match cmd {
        "!setlist" => {
            if args.is_empty() {
                Some(Command::FetchLatestSetlist)
            } else {
                match NaiveDate::parse_from_str(args, "%Y-%m-%d") {
                    Ok(date) => Some(Command::FetchSetlistByDate(date)),
                    Err(_) => Some(Command::Unrecognized(msg.to_string())),
                }
            }
        }
        "!ask" => {
            if args.is_empty() {
                Some(Command::Unrecognized(msg.to_string()))
            } else {
                Some(Command::AskQuestion(args.to_string()))
            }
        }
        _ => Some(Command::Unrecognized(msg.to_string())),
    }
}

pub struct CommandRouter {
    setlist: Arc<SetlistClient>,
    completion: Arc<CompletionClient>,
    state: Arc<Mutex<BotState>>,
}

impl CommandRouter {
    pub fn new(
        setlist: Arc<SetlistClient>,
        completion: Arc<CompletionClient>,
        state: Arc<Mutex<BotState>>,
    ) -> Self {
        Self {
            setlist,
            completion,
            state,
        }
    }

    pub async fn route<C>(&self, chat: &C, message: &str, sender: &str) -> Result<()>
    where
        C: ChatProvider,
    {
        let Some(command) = parse_command(message) else {
            return Ok(());
        };

        tracing::info!("Router dispatching {command:?} sender='{sender}'");

        match command {
            Command::FetchLatestSetlist => {
                let _ = chat.typing(true).await;
                let result = self.setlist.fetch_latest().await;
                let _ = chat.typing(false).await;
                chat.send_message(&formatter::format_setlist(&result))
                    .await
                    .map_err(|e| anyhow::anyhow!(e))?;
            }
            Command::FetchSetlistByDate(date) => {
                let _ = chat.typing(true).await;
                let result = self.setlist.fetch_by_date(date).await;
                let _ = chat.typing(false).await;
                chat.send_message(&formatter::format_setlist(&result))
                    .await
                    .map_err(|e| anyhow::anyhow!(e))?;
            }
            Command::AskQuestion(question) => {
                // Snapshot the window; the lock is never held across the
                // network call.
                let window = {
                    let mut guard = self.state.lock().await;
                    guard.room_mut(&chat.room_id()).window.clone()
                };

                let _ = chat.typing(true).await;
                let result = self.completion.complete(&window, &question).await;
                let _ = chat.typing(false).await;

                // The client never touches history; appending both turns on
                // success is the router's job.
                if let Ok(answer) = &result {
                    let mut guard = self.state.lock().await;
                    let room = guard.room_mut(&chat.room_id());
                    room.window.push(ConversationTurn::user(question));
                    room.window.push(ConversationTurn::assistant(answer.clone()));
                }

                chat.send_message(&formatter::format_answer(&result))
                    .await
                    .map_err(|e| anyhow::anyhow!(e))?;
            }
            Command::Unrecognized(text) => {
                chat.send_message(messages::usage_for(&text))
                    .await
                    .map_err(|e| anyhow::anyhow!(e))?;
            }
        }

        Ok(())
    }
}
