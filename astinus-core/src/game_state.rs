//! Game State: per-session authoritative state, owned exclusively by the
//! Coordinator.

use crate::dice::PoolSpec;
use crate::i18n::{Lang, LocalizedString};
use crate::model::PlayerCharacter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The turn-level phase a session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    WaitingInput,
    Processing,
    DiceCheck,
    NpcResponse,
    Narrating,
}

/// A single logged turn event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
    pub turn: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// The traits/tags relevant to a dice check, embedded for narration context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InfluencingFactors {
    pub traits: Vec<String>,
    pub tags: Vec<String>,
}

/// A request that a dice check be rolled, produced by the Rule Adjudicator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiceCheckRequest {
    pub intention: String,
    pub influencing_factors: InfluencingFactors,
    pub pool: PoolSpec,
    pub instructions: LocalizedString,
}

impl DiceCheckRequest {
    pub fn dice_formula(&self) -> String {
        self.pool.formula()
    }
}

/// A snapshot of Loop state saved at the `dice_check` suspension point;
/// restored verbatim when the matching `dice_result` arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingResume {
    pub player_input: String,
    pub iteration: u32,
    pub agent_results: Vec<serde_json::Value>,
}

/// Per-session authoritative state. Single owner: the Coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub session_id: String,
    pub world_pack_id: String,
    pub language: Lang,
    pub player: PlayerCharacter,
    pub current_location: String,
    pub active_npc_ids: Vec<String>,
    pub turn_count: u64,
    pub game_phase: GamePhase,
    pub discovered_items: HashSet<String>,
    pub flags: HashSet<String>,
    pub messages: Vec<Message>,
    pub last_check_result: Option<crate::dice::DiceResult>,
    pub pending_resume: Option<PendingResume>,
    pub updated_at: DateTime<Utc>,
}

impl GameState {
    pub fn new(
        session_id: impl Into<String>,
        world_pack_id: impl Into<String>,
        language: Lang,
        player: PlayerCharacter,
        starting_location: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            world_pack_id: world_pack_id.into(),
            language,
            player,
            current_location: starting_location.into(),
            active_npc_ids: Vec::new(),
            turn_count: 0,
            game_phase: GamePhase::WaitingInput,
            discovered_items: HashSet::new(),
            flags: HashSet::new(),
            messages: Vec::new(),
            last_check_result: None,
            pending_resume: None,
            updated_at: Utc::now(),
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Append-only: no deletes, no rewrites within a session.
    pub fn add_message(&mut self, role: impl Into<String>, content: impl Into<String>, metadata: Option<serde_json::Value>) {
        self.messages.push(Message {
            role: role.into(),
            content: content.into(),
            turn: self.turn_count,
            timestamp: Utc::now(),
            metadata: metadata.unwrap_or(serde_json::Value::Null),
        });
        self.touch();
    }

    pub fn get_recent_messages(&self, k: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(k);
        &self.messages[start..]
    }

    pub fn update_location(&mut self, location_id: impl Into<String>, npc_ids: Option<Vec<String>>) {
        self.current_location = location_id.into();
        if let Some(npc_ids) = npc_ids {
            self.active_npc_ids = npc_ids;
        }
        self.touch();
    }

    pub fn add_flag(&mut self, flag: impl Into<String>) {
        self.flags.insert(flag.into());
        self.touch();
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn add_discovered_item(&mut self, item_id: impl Into<String>) {
        self.discovered_items.insert(item_id.into());
        self.touch();
    }

    pub fn has_discovered_item(&self, item_id: &str) -> bool {
        self.discovered_items.contains(item_id)
    }

    pub fn increment_turn(&mut self) {
        self.turn_count += 1;
        self.touch();
    }

    pub fn set_phase(&mut self, phase: GamePhase) {
        self.game_phase = phase;
        self.touch();
    }

    /// Snapshot the Loop state for later resumption at a `dice_check`
    /// suspension point.
    pub fn save_react_state(&mut self, player_input: impl Into<String>, iteration: u32, agent_results: Vec<serde_json::Value>) {
        self.pending_resume = Some(PendingResume {
            player_input: player_input.into(),
            iteration,
            agent_results,
        });
        self.touch();
    }

    pub fn clear_react_state(&mut self) {
        self.pending_resume = None;
        self.touch();
    }
}
