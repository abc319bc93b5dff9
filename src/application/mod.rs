//! # Application Layer
//!
//! Contains the core logic of the bot: command routing, response
//! formatting, and per-room conversation state.

pub mod formatter;
pub mod router;
pub mod state;
