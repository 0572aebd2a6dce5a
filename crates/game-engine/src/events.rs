//! Typed events the orchestrator publishes, and the listener set it owns.

use serde::Serialize;

use chess_core::{GameOverReason, GameResult, MoveDescriptor, Side};
use move_insight::MoveInsight;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    #[serde(rename_all = "camelCase")]
    GameStarted { player_color: Side, session: u64 },

    #[serde(rename_all = "camelCase")]
    PlayerMoveApplied {
        #[serde(rename = "move")]
        mv: MoveDescriptor,
        position_after: String,
        move_number: u32,
        is_capture: bool,
        is_check: bool,
        insight: Option<MoveInsight>,
    },

    #[serde(rename_all = "camelCase")]
    AiMoveApplied {
        #[serde(rename = "move")]
        mv: MoveDescriptor,
        position_after: String,
        move_number: u32,
        is_capture: bool,
        is_check: bool,
        backend: String,
    },

    #[serde(rename_all = "camelCase")]
    TurnChanged { is_player_turn: bool },

    #[serde(rename_all = "camelCase")]
    GameEnded {
        result: GameResult,
        reason: GameOverReason,
        player_color: Side,
        message: String,
    },
}

pub type ListenerId = u64;
pub type Listener = Box<dyn FnMut(&GameEvent) + Send>;

/// Listeners are called in registration order.
#[derive(Default)]
pub struct Listeners {
    entries: Vec<(ListenerId, Listener)>,
    next_id: ListenerId,
}

impl Listeners {
    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        self.next_id += 1;
        self.entries.push((self.next_id, listener));
        self.next_id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn emit(&mut self, event: &GameEvent) {
        for (_, listener) in self.entries.iter_mut() {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_order_and_unsubscribe() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = Listeners::default();

        let first = seen.clone();
        let a = listeners.subscribe(Box::new(move |_: &GameEvent| first.lock().unwrap().push("a")));
        let second = seen.clone();
        listeners.subscribe(Box::new(move |_: &GameEvent| second.lock().unwrap().push("b")));

        listeners.emit(&GameEvent::TurnChanged { is_player_turn: true });
        assert!(listeners.unsubscribe(a));
        assert!(!listeners.unsubscribe(a));
        listeners.emit(&GameEvent::TurnChanged { is_player_turn: false });

        assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "b"]);
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn test_wire_shape() {
        let event = GameEvent::GameStarted {
            player_color: Side::Black,
            session: 2,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "gameStarted");
        assert_eq!(json["playerColor"], "black");
    }
}
