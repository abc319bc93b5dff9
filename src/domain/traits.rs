//! # Domain Traits
//!
//! Abstract interfaces for the external collaborators (Chat, Setlist API,
//! Completion API). Allows for pluggable implementations in the
//! Infrastructure layer and fake implementations in tests.

use async_trait::async_trait;

use crate::domain::error::ApiResult;
use crate::domain::types::{CacheKey, ConversationTurn, SetlistRecord};

/// Abstract interface for a Chat Provider (e.g., Matrix, Console)
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send a message to the room
    async fn send_message(&self, content: &str) -> Result<String, String>;

    /// Send a typing indicator
    async fn typing(&self, active: bool) -> Result<(), String>;

    /// Get the current room ID
    fn room_id(&self) -> String;
}

/// One network attempt against the setlist service. Caching and retry live
/// above this seam, in `SetlistClient`.
#[async_trait]
pub trait SetlistApi: Send + Sync {
    async fn fetch(&self, key: &CacheKey) -> ApiResult<SetlistRecord>;
}

/// One request against the completion service with a fully assembled turn
/// sequence. Context budgeting and retry live above this seam, in
/// `CompletionClient`.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    async fn complete(&self, turns: &[ConversationTurn]) -> ApiResult<String>;
}
