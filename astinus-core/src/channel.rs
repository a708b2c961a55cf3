//! Session Channel: the bidirectional, session-bound transport between a
//! client and its Coordinator Loop.

use crate::dice::Outcome;
use crate::game_state::{DiceCheckRequest, GamePhase};
use crate::i18n::Lang;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Inbound message from the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    PlayerInput {
        content: String,
        lang: Lang,
        #[serde(default)]
        stream: bool,
    },
    DiceResult {
        result: i32,
        all_rolls: Vec<u32>,
        kept_rolls: Vec<u32>,
        outcome: Outcome,
    },
}

/// Outbound message produced by the Loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Advisory "which agent is working"; not authoritative.
    Status {
        phase: String,
        #[serde(default)]
        message: Option<String>,
    },
    /// Authoritative game-phase transition.
    Phase { phase: GamePhase },
    /// Optional streamed narrative chunk.
    Content {
        chunk: String,
        is_partial: bool,
        chunk_index: u32,
    },
    /// A dice check is required to continue the turn.
    DiceCheck { check_request: DiceCheckRequest },
    /// End of turn.
    Complete {
        content: String,
        metadata: serde_json::Value,
        success: bool,
    },
    /// Recoverable failure, narrated to the client without ending the
    /// session.
    Error { error: String },
}

/// Error raised when an inbound message is rejected outright (not
/// surfaced as a narrated `ServerMessage::Error`, since the turn never
/// started).
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// A turn is mid-flight and the inbound message isn't the one
    /// exception (`dice_result` during `dice_check`).
    #[error("session busy")]
    Busy,
    /// A `dice_result` arrived with no matching `pending_resume`.
    #[error("no pending state")]
    NoPendingState,
}

/// Whether `message` may be accepted while the session is in `phase`.
///
/// Busy-rejection policy: any inbound message is rejected while a turn is
/// mid-flight (phase != `waiting_input`), **except** `dice_result` while
/// phase is exactly `dice_check`.
pub fn admits(phase: GamePhase, message: &ClientMessage) -> Result<(), ChannelError> {
    match (phase, message) {
        (GamePhase::WaitingInput, _) => Ok(()),
        (GamePhase::DiceCheck, ClientMessage::DiceResult { .. }) => Ok(()),
        _ => Err(ChannelError::Busy),
    }
}

/// A bidirectional, session-bound transport. Implementations adapt this to
/// a WebSocket, a line-delimited stdio stream, or an in-process channel;
/// ordering of `send` calls within a session must match emission order.
#[async_trait]
pub trait SessionChannel: Send + Sync {
    async fn send(&self, message: ServerMessage) -> Result<(), ChannelError>;
    async fn recv(&mut self) -> Option<ClientMessage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waiting_input_admits_player_input() {
        let msg = ClientMessage::PlayerInput {
            content: "look".into(),
            lang: Lang::En,
            stream: false,
        };
        assert!(admits(GamePhase::WaitingInput, &msg).is_ok());
    }

    #[test]
    fn mid_flight_rejects_player_input_as_busy() {
        let msg = ClientMessage::PlayerInput {
            content: "look".into(),
            lang: Lang::En,
            stream: false,
        };
        assert!(matches!(
            admits(GamePhase::Processing, &msg),
            Err(ChannelError::Busy)
        ));
    }

    #[test]
    fn dice_check_phase_admits_dice_result() {
        let msg = ClientMessage::DiceResult {
            result: 9,
            all_rolls: vec![4, 5],
            kept_rolls: vec![5, 4],
            outcome: Outcome::Partial,
        };
        assert!(admits(GamePhase::DiceCheck, &msg).is_ok());
    }

    #[test]
    fn dice_check_phase_rejects_player_input() {
        let msg = ClientMessage::PlayerInput {
            content: "hurry".into(),
            lang: Lang::En,
            stream: false,
        };
        assert!(matches!(
            admits(GamePhase::DiceCheck, &msg),
            Err(ChannelError::Busy)
        ));
    }

    #[test]
    fn client_message_serde_tag_shape() {
        let msg = ClientMessage::PlayerInput {
            content: "look".into(),
            lang: Lang::En,
            stream: false,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "player_input");
        assert_eq!(json["data"]["content"], "look");
    }

    #[test]
    fn server_message_complete_round_trips() {
        let msg = ServerMessage::Complete {
            content: "you look around".into(),
            metadata: serde_json::json!({}),
            success: true,
        };
        let json = serde_json::to_string(&msg).unwrap();
        let restored: ServerMessage = serde_json::from_str(&json).unwrap();
        assert!(matches!(restored, ServerMessage::Complete { success: true, .. }));
    }
}
