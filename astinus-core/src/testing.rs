//! Testing utilities: tools for integration tests without API calls.
//!
//! - [`MockLlmProvider`] returns scripted completions in order, standing in
//!   for every sub-agent's LLM call (the Rule Adjudicator, Lore Retriever,
//!   NPC Roleplayer, and the Loop's own decision call all go through the
//!   same [`agentic::llm::LlmProvider`] trait, so one mock drives all of
//!   them).
//! - [`RecordingChannel`] captures every [`ServerMessage`] sent during a
//!   turn for assertion, and optionally has queued [`ClientMessage`]s ready
//!   for `recv`.
//! - [`TestHarness`] wires a [`Coordinator`] to both, with a seeded RNG, so
//!   a whole turn can be driven deterministically.

use crate::channel::{ChannelError, ClientMessage, ServerMessage, SessionChannel};
use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::game_state::GameState;
use crate::vector_store::{InMemoryVectorStore, VectorStore};
use crate::world_pack::WorldPack;
use agentic::error::LlmError;
use agentic::llm::{CompletionRequest, CompletionResponse, LlmProvider, StopReason, StreamEvent, TokenUsage};
use agentic::message::Message;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio_stream::Stream;

/// A mock LLM provider that returns scripted text completions in order.
///
/// Every sub-agent call goes through the same `chat()` wrapper, so the
/// queued responses must be ordered the way the Loop actually dispatches:
/// the ReAct decision call first, then whichever sub-agent it names.
pub struct MockLlmProvider {
    responses: Mutex<VecDeque<String>>,
}

impl MockLlmProvider {
    pub fn new(responses: Vec<impl Into<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
        }
    }

    /// Queue an additional scripted response.
    pub fn queue(&self, response: impl Into<String>) {
        self.responses.lock().unwrap().push_back(response.into());
    }

    fn next_response(&self) -> String {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "{}".to_string())
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Ok(CompletionResponse {
            id: "mock".to_string(),
            model: "mock-llm".to_string(),
            message: Message::assistant(self.next_response()),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        })
    }

    async fn complete_stream(
        &self,
        _request: CompletionRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>, LlmError> {
        unimplemented!("MockLlmProvider does not support streaming")
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn supported_models(&self) -> &[&str] {
        &["mock-llm"]
    }

    fn is_ready(&self) -> bool {
        true
    }
}

/// Captures every [`ServerMessage`] sent during a turn, and plays back a
/// queue of [`ClientMessage`]s for `recv` (used to script a dice result
/// arriving mid-turn in tests that exercise [`Coordinator::resume_turn`]).
#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<ServerMessage>>,
    inbound: Mutex<VecDeque<ClientMessage>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_inbound(&self, message: ClientMessage) {
        self.inbound.lock().unwrap().push_back(message);
    }

    pub fn sent(&self) -> Vec<ServerMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// The narrative of the last `Complete` message sent, if any.
    pub fn last_complete_content(&self) -> Option<String> {
        self.sent.lock().unwrap().iter().rev().find_map(|m| match m {
            ServerMessage::Complete { content, .. } => Some(content.clone()),
            _ => None,
        })
    }

    pub fn contains_error(&self) -> bool {
        self.sent.lock().unwrap().iter().any(|m| matches!(m, ServerMessage::Error { .. }))
    }
}

#[async_trait]
impl SessionChannel for RecordingChannel {
    async fn send(&self, message: ServerMessage) -> Result<(), ChannelError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn recv(&mut self) -> Option<ClientMessage> {
        self.inbound.lock().unwrap().pop_front()
    }
}

/// Bundles a [`Coordinator`], a [`GameState`], a [`RecordingChannel`], and a
/// seeded RNG so a whole turn can be driven and inspected in one call.
pub struct TestHarness {
    pub coordinator: Coordinator,
    pub state: GameState,
    pub channel: RecordingChannel,
    rng: StdRng,
}

impl TestHarness {
    /// Build a harness with a scripted LLM, an in-memory vector store,
    /// default config, and a deterministic RNG (seeded, not random, so
    /// dice outcomes are reproducible across runs).
    pub fn new(world_pack: WorldPack, state: GameState, llm_responses: Vec<impl Into<String>>) -> Self {
        let coordinator = Coordinator::new(
            Arc::new(world_pack),
            Arc::new(MockLlmProvider::new(llm_responses)),
            Arc::new(InMemoryVectorStore::default()) as Arc<dyn VectorStore>,
            Config::default(),
        );
        Self {
            coordinator,
            state,
            channel: RecordingChannel::new(),
            rng: StdRng::seed_from_u64(42),
        }
    }

    /// Drive one player turn to completion (or suspension).
    pub async fn input(&mut self, text: &str) -> Result<(), crate::error::AstinusError> {
        self.coordinator
            .run_turn(&mut self.state, &self.channel, text, &mut self.rng)
            .await
    }

    /// Resume a suspended turn with a client-supplied dice result.
    pub async fn resume(&mut self, result: crate::dice::DiceResult) -> Result<(), crate::error::AstinusError> {
        self.coordinator
            .resume_turn(&mut self.state, &self.channel, result, &mut self.rng)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{Lang, LocalizedString};
    use crate::model::{PlayerCharacter, Trait};
    use crate::world_pack::WorldPackInfo;
    use std::collections::HashMap;

    fn fixture_player() -> PlayerCharacter {
        PlayerCharacter::new(
            "Hero",
            LocalizedString::new("冒险者", "Adventurer"),
            vec![Trait {
                name: LocalizedString::new("勇敢", "Brave"),
                description: LocalizedString::default(),
                positive_aspect: LocalizedString::default(),
                negative_aspect: LocalizedString::default(),
            }],
            3,
            vec![],
        )
        .unwrap()
    }

    fn fixture_pack() -> WorldPack {
        WorldPack {
            info: WorldPackInfo {
                id: "test-pack".to_string(),
                name: LocalizedString::new("世界", "World"),
                description: LocalizedString::default(),
                starting_location_id: "study".to_string(),
                version: "1.0.0".to_string(),
                author: "test".to_string(),
                setting: None,
                player_hook: None,
            },
            entries: HashMap::new(),
            npcs: HashMap::new(),
            locations: HashMap::from([(
                "study".to_string(),
                crate::model::Location {
                    id: "study".to_string(),
                    name: LocalizedString::new("书房", "Study"),
                    description: LocalizedString::default(),
                    atmosphere: None,
                    region_id: None,
                    connected_locations: vec![],
                    present_npc_ids: vec![],
                    visible_items: vec![],
                    hidden_items: vec![],
                    items: vec![],
                    lore_tags: vec![],
                },
            )]),
            preset_characters: vec![],
            regions: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn harness_drives_a_respond_turn_and_records_completion() {
        let state = GameState::new("s1", "pack1", Lang::En, fixture_player(), "study");
        let mut harness = TestHarness::new(
            fixture_pack(),
            state,
            vec![r#"{"action": "RESPOND", "narrative": "You look around the dusty study."}"#],
        );

        harness.input("look around").await.unwrap();

        assert_eq!(
            harness.channel.last_complete_content().as_deref(),
            Some("You look around the dusty study.")
        );
        assert!(!harness.channel.contains_error());
    }

    #[test]
    fn mock_llm_provider_falls_back_to_empty_object_when_exhausted() {
        let provider = MockLlmProvider::new(vec!["first"]);
        assert_eq!(provider.next_response(), "first");
        assert_eq!(provider.next_response(), "{}");
    }

    #[tokio::test]
    async fn recording_channel_replays_queued_inbound_messages() {
        let mut channel = RecordingChannel::new();
        channel.queue_inbound(ClientMessage::PlayerInput {
            content: "hi".to_string(),
            lang: Lang::En,
            stream: false,
        });
        assert!(channel.recv().await.is_some());
        assert!(channel.recv().await.is_none());
    }
}
