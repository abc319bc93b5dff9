//! # Response Formatter
//!
//! Turns ApiResults into platform-safe message text. This is the only place
//! an error kind becomes user-visible wording, so messaging stays consistent
//! and raw transport strings never leak into chat. Pure functions; the same
//! input always renders the same bytes.

use crate::domain::error::{ApiError, ApiResult};
use crate::domain::types::SetlistRecord;
use crate::strings::messages;

/// Conservative cap well under the Matrix event size limit.
pub const MAX_MESSAGE_LEN: usize = 4000;
const TRUNCATION_MARKER: &str = "\n… (truncated)";

pub fn format_setlist(result: &ApiResult<SetlistRecord>) -> String {
    match result {
        Ok(record) => cap(render_record(record)),
        Err(error) => format_error(error),
    }
}

pub fn format_answer(result: &ApiResult<String>) -> String {
    match result {
        Ok(answer) => cap(answer.clone()),
        Err(error) => format_error(error),
    }
}

fn format_error(error: &ApiError) -> String {
    tracing::warn!("rendering failure to user: {error}");
    messages::error_text(error).to_string()
}

fn render_record(record: &SetlistRecord) -> String {
    let mut out = format!("**{} - {}**\n", record.venue, record.date);
    for song in &record.songs {
        out.push('\n');
        out.push_str(song);
    }
    if let Some(notes) = &record.notes {
        out.push_str("\n\n_");
        out.push_str(notes);
        out.push('_');
    }
    out
}

/// Enforce the platform length limit, marking the cut when one happens.
fn cap(text: String) -> String {
    if text.len() <= MAX_MESSAGE_LEN {
        return text;
    }
    let mut cut = MAX_MESSAGE_LEN - TRUNCATION_MARKER.len();
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut out = text;
    out.truncate(cut);
    out.push_str(TRUNCATION_MARKER);
    out
}
