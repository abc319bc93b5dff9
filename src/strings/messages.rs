//! # Messages
//!
//! Constant strings for user-facing messages. Error texts are stable per
//! error kind; raw transport detail stays in the logs.

use crate::domain::error::ApiError;
use crate::strings::help;

pub const SETLIST_USAGE: &str = "Usage: `!setlist [YYYY-MM-DD]`";
pub const ASK_USAGE: &str = "Usage: `!ask <question>`";

pub const ERR_TRANSPORT: &str = "⚠️ Having trouble reaching the service. Please try again.";
pub const ERR_RATE_LIMITED: &str = "⏳ We are being rate limited. Please try again shortly.";
pub const ERR_CLIENT: &str = "❓ The service rejected that request. Check the command arguments.";
pub const ERR_MALFORMED: &str = "⚠️ The service sent back something unexpected. Please try again later.";
pub const ERR_UNAVAILABLE: &str = "🛑 The service is unavailable right now. Please try again later.";

/// One stable line per error kind.
pub fn error_text(error: &ApiError) -> &'static str {
    match error {
        ApiError::Transport(_) => ERR_TRANSPORT,
        ApiError::RateLimited { .. } => ERR_RATE_LIMITED,
        ApiError::Client(_) => ERR_CLIENT,
        ApiError::MalformedResponse(_) => ERR_MALFORMED,
        ApiError::ServiceUnavailable => ERR_UNAVAILABLE,
    }
}

/// Pick the usage line matching a rejected input, falling back to the
/// full help text for anything unrecognized.
pub fn usage_for(text: &str) -> &'static str {
    let first = text.split_whitespace().next().unwrap_or("");
    match first {
        "!ask" => ASK_USAGE,
        "!setlist" => SETLIST_USAGE,
        _ => help::MAIN,
    }
}
