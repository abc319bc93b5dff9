//! # Bot State
//!
//! Per-room conversation state, shared across concurrent dispatches behind
//! an `Arc<Mutex<..>>` owned by startup. Nothing here is persisted; a
//! restart starts with empty windows.

use std::collections::HashMap;

use crate::domain::types::ConversationWindow;

pub struct RoomState {
    pub window: ConversationWindow,
}

pub struct BotState {
    rooms: HashMap<String, RoomState>,
    window_turns: usize,
}

impl BotState {
    pub fn new(window_turns: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            window_turns,
        }
    }

    pub fn room(&self, room_id: &str) -> Option<&RoomState> {
        self.rooms.get(room_id)
    }

    pub fn room_mut(&mut self, room_id: &str) -> &mut RoomState {
        let capacity = self.window_turns;
        self.rooms
            .entry(room_id.to_string())
            .or_insert_with(|| RoomState {
                window: ConversationWindow::new(capacity),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ConversationTurn;

    #[test]
    fn test_rooms_are_isolated() {
        let mut state = BotState::new(4);
        state
            .room_mut("!a:example.org")
            .window
            .push(ConversationTurn::user("hi"));

        assert_eq!(state.room("!a:example.org").unwrap().window.len(), 1);
        assert!(state.room("!b:example.org").is_none());
    }
}
