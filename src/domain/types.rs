//! # Domain Types
//!
//! Common data structures used across the application logic.

use chrono::NaiveDate;
use std::collections::VecDeque;

/// A parsed inbound message. Each message is classified independently;
/// exhaustive matching in the router keeps every variant handled.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchLatestSetlist,
    FetchSetlistByDate(NaiveDate),
    AskQuestion(String),
    Unrecognized(String),
}

/// One show as returned by the setlist API. Immutable once fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct SetlistRecord {
    pub venue: String,
    pub date: NaiveDate,
    /// Set order preserved.
    pub songs: Vec<String>,
    pub notes: Option<String>,
}

/// Key into the setlist cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Latest,
    Date(NaiveDate),
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Latest => write!(f, "latest"),
            CacheKey::Date(d) => write!(f, "{d}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Bounded sliding window of conversation turns. Pushing past capacity
/// evicts the oldest turn, so memory never grows with chat history.
#[derive(Debug, Clone)]
pub struct ConversationWindow {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
}

impl ConversationWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        while self.turns.len() >= self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    /// Turns in order, oldest first.
    pub fn turns(&self) -> impl DoubleEndedIterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
