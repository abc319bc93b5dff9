//! # Infrastructure Layer
//!
//! Handles interactions with external systems and services.
//! Implements the traits defined in the Domain layer (e.g., ChatProvider, SetlistApi).

pub mod cache;
pub mod completion;
pub(crate) mod http;
pub mod matrix;
pub mod retry;
pub mod setlist;
