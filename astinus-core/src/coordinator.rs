//! Coordinator: the ReAct Loop. Owns a session's [`GameState`], routes to
//! sub-agents with sliced contexts, suspends at dice checks, resumes, and
//! synthesizes the turn's final narrative. Sub-agents never call each
//! other; the Coordinator is the sole hub.

use crate::adjudicator;
use crate::channel::{ServerMessage, SessionChannel};
use crate::config::Config;
use crate::dice::{self, DiceResult};
use crate::error::AstinusError;
use crate::game_state::{GamePhase, GameState};
use crate::i18n::Lang;
use crate::location_context::{self, SceneBundle};
use crate::lore::{self, LoreWeights};
use crate::npc::{self, NarrativeStyle, NpcContext};
use crate::vector_store::VectorStore;
use crate::world_pack::WorldPack;
use agentic::llm::LlmProvider;
use agentic::message::Message as LlmMessage;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One entry in `agent_results`, matching §4.6's `{agent, content, metadata,
/// success}` shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub agent: String,
    pub content: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub success: bool,
}

/// Parsed shape of the Loop's own LLM decision.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
enum LoopAction {
    Respond {
        narrative: String,
        #[serde(default)]
        target_location: Option<String>,
        #[serde(default)]
        reasoning: String,
    },
    CallAgent {
        agent_name: String,
        #[serde(default)]
        agent_context: serde_json::Value,
        #[serde(default)]
        reasoning: String,
    },
}

enum DispatchOutcome {
    Result(AgentResult),
    DiceCheck(crate::game_state::DiceCheckRequest),
}

const REACT_SYSTEM_PROMPT: &str = "You are the game master controller. On each turn, decide either to \
respond directly to the player or to delegate to a sub-agent. Respond with a single JSON object only, one of: \
{\"action\": \"RESPOND\", \"narrative\": string, \"target_location\": string | null, \"reasoning\": string} or \
{\"action\": \"CALL_AGENT\", \"agent_name\": string, \"agent_context\": object, \"reasoning\": string}. \
Valid agent_name values: \"rule\", \"lore\", or \"npc_<id>\" for an NPC present in the scene.";

/// The ReAct controller for one world pack. Stateless across turns; all
/// per-session state lives in the [`GameState`] passed to [`Coordinator::run_turn`]
/// and [`Coordinator::resume_turn`].
pub struct Coordinator {
    pub world_pack: Arc<WorldPack>,
    pub llm: Arc<dyn LlmProvider>,
    pub vector_store: Arc<dyn VectorStore>,
    pub config: Config,
}

impl Coordinator {
    pub fn new(
        world_pack: Arc<WorldPack>,
        llm: Arc<dyn LlmProvider>,
        vector_store: Arc<dyn VectorStore>,
        config: Config,
    ) -> Self {
        Self {
            world_pack,
            llm,
            vector_store,
            config,
        }
    }

    /// Steps 1-3 of §4.6: log the player's utterance, announce the turn,
    /// then enter the Loop at iteration 0.
    pub async fn run_turn<R: Rng>(
        &self,
        state: &mut GameState,
        channel: &dyn SessionChannel,
        player_input: &str,
        rng: &mut R,
    ) -> Result<(), AstinusError> {
        state.increment_turn();
        state.add_message("player", player_input, None);
        let _ = channel
            .send(ServerMessage::Status {
                phase: "gm".to_string(),
                message: None,
            })
            .await;

        self.advance(state, channel, player_input.to_string(), 0, Vec::new(), None, rng)
            .await
    }

    /// §4.6 step 5: a `dice_result` arrived. Restore the snapshot, clear it,
    /// and resume the Loop with the result in scope.
    pub async fn resume_turn<R: Rng>(
        &self,
        state: &mut GameState,
        channel: &dyn SessionChannel,
        result: DiceResult,
        rng: &mut R,
    ) -> Result<(), AstinusError> {
        let pending = state.pending_resume.clone().ok_or(AstinusError::NoPendingState)?;
        state.clear_react_state();
        state.last_check_result = Some(result.clone());

        self.advance(
            state,
            channel,
            pending.player_input,
            pending.iteration,
            pending.agent_results,
            Some(result),
            rng,
        )
        .await
    }

    async fn advance<R: Rng>(
        &self,
        state: &mut GameState,
        channel: &dyn SessionChannel,
        player_input: String,
        mut iteration: u32,
        mut agent_results: Vec<serde_json::Value>,
        mut dice_result: Option<DiceResult>,
        rng: &mut R,
    ) -> Result<(), AstinusError> {
        let max = self.config.max_iterations as u32;
        state.set_phase(GamePhase::Processing);
        let _ = channel.send(ServerMessage::Phase { phase: GamePhase::Processing }).await;

        loop {
            let scene = location_context::assemble_scene(
                &self.world_pack,
                &state.current_location,
                &state.discovered_items,
                state.language,
            )
            .map_err(|e| AstinusError::Invariant(e.to_string()))?;

            let force_output = iteration + 1 >= max;
            let prompt = self.build_react_prompt(state, &scene, &player_input, &agent_results, dice_result.as_ref(), force_output);

            let text = crate::llm::chat(self.llm.as_ref(), Some(REACT_SYSTEM_PROMPT), vec![LlmMessage::user(prompt)])
                .await
                .map_err(|e| AstinusError::Llm(e.to_string()))?;

            let action = crate::llm_json::extract_json_as::<LoopAction>(&text).unwrap_or(LoopAction::Respond {
                narrative: text,
                target_location: None,
                reasoning: String::new(),
            });

            match action {
                LoopAction::Respond { narrative, target_location, .. } => {
                    self.apply_transition(state, target_location.as_deref());
                    state.add_message("assistant", &narrative, None);
                    state.clear_react_state();
                    state.set_phase(GamePhase::WaitingInput);
                    let _ = channel.send(ServerMessage::Phase { phase: GamePhase::WaitingInput }).await;
                    let _ = channel
                        .send(ServerMessage::Complete {
                            content: narrative,
                            metadata: serde_json::json!({ "iterations": iteration }),
                            success: true,
                        })
                        .await;
                    return Ok(());
                }
                LoopAction::CallAgent { agent_name, agent_context, .. } => {
                    let _ = channel
                        .send(ServerMessage::Status { phase: agent_name.clone(), message: None })
                        .await;

                    match self
                        .dispatch(&agent_name, state, &agent_context, &player_input, dice_result.as_ref(), rng)
                        .await
                    {
                        Ok(DispatchOutcome::Result(result)) => {
                            agent_results.push(serde_json::to_value(&result).unwrap_or(serde_json::Value::Null));
                        }
                        Ok(DispatchOutcome::DiceCheck(check_request)) => {
                            state.save_react_state(player_input.clone(), iteration + 1, agent_results.clone());
                            state.set_phase(GamePhase::DiceCheck);
                            let _ = channel.send(ServerMessage::Phase { phase: GamePhase::DiceCheck }).await;

                            let pre_check_narrative = check_request.instructions.get(state.language).to_string();
                            state.add_message("assistant", &pre_check_narrative, None);
                            let _ = channel.send(ServerMessage::DiceCheck { check_request }).await;
                            return Ok(());
                        }
                        Err(AstinusError::AgentNotFound(name)) => {
                            tracing::warn!(agent = %name, "coordinator: skipping unknown agent for this iteration");
                        }
                        Err(e) if e.is_recoverable() => {
                            agent_results.push(serde_json::json!({
                                "agent": agent_name,
                                "content": "",
                                "metadata": {},
                                "success": false,
                            }));
                            tracing::warn!(agent = %agent_name, error = %e, "coordinator: agent failed, continuing turn");
                        }
                        Err(e) => {
                            state.clear_react_state();
                            state.set_phase(GamePhase::WaitingInput);
                            let _ = channel.send(ServerMessage::Error { error: e.to_string() }).await;
                            let _ = channel
                                .send(ServerMessage::Complete {
                                    content: String::new(),
                                    metadata: serde_json::json!({}),
                                    success: false,
                                })
                                .await;
                            return Err(e);
                        }
                    }
                }
            }

            dice_result = None;
            iteration += 1;
            if iteration >= max {
                state.clear_react_state();
                state.set_phase(GamePhase::WaitingInput);
                let err = AstinusError::LoopExceeded(max as usize);
                let _ = channel.send(ServerMessage::Error { error: err.to_string() }).await;
                let _ = channel
                    .send(ServerMessage::Complete {
                        content: apology(state.language),
                        metadata: serde_json::json!({}),
                        success: false,
                    })
                    .await;
                return Err(err);
            }
        }
    }

    /// Scene transition gating: only apply `target_location` if it is an
    /// element of the current location's `connected_locations`; otherwise
    /// log and keep the current location.
    fn apply_transition(&self, state: &mut GameState, target_location: Option<&str>) {
        let Some(target) = target_location else { return };
        let Some(current) = self.world_pack.get_location(&state.current_location) else { return };
        if !current.is_connected_to(target) {
            tracing::warn!(from = %state.current_location, to = %target, "coordinator: transition refused, not connected");
            return;
        }
        let npc_ids = self
            .world_pack
            .get_location(target)
            .map(|loc| loc.present_npc_ids.clone());
        state.update_location(target, npc_ids);
    }

    #[allow(clippy::too_many_arguments)]
    fn build_react_prompt(
        &self,
        state: &GameState,
        scene: &SceneBundle,
        player_input: &str,
        agent_results: &[serde_json::Value],
        dice_result: Option<&DiceResult>,
        force_output: bool,
    ) -> String {
        let active_npcs: Vec<String> = state
            .active_npc_ids
            .iter()
            .filter_map(|id| self.world_pack.get_npc(id))
            .map(|npc| format!("{} ({})", npc.soul.name, npc.id))
            .collect();

        let world_background = self
            .world_pack
            .constant_entries()
            .iter()
            .map(|e| e.content.get(state.language))
            .collect::<Vec<_>>()
            .join(" ");

        let recent: Vec<String> = state
            .get_recent_messages(self.config.history_length)
            .iter()
            .map(|m| {
                let mut content = m.content.clone();
                content.truncate(200);
                format!("{}: {}", m.role, content)
            })
            .collect();

        let mut prompt = format!(
            "Location: {} ({})\nAtmosphere: {}\nActive NPCs: {}\nWorld background: {}\n\nRecent history:\n{}\n\nPlayer input: {player_input}\n",
            scene.location.name,
            scene.region.name,
            scene.atmosphere_guidance,
            active_npcs.join(", "),
            world_background,
            recent.join("\n"),
        );

        if !agent_results.is_empty() {
            prompt.push_str(&format!(
                "\nPrior agent results this turn: {}\n",
                serde_json::to_string(agent_results).unwrap_or_default()
            ));
        }

        if let Some(result) = dice_result {
            prompt.push_str(&format!(
                "\nDice result: outcome={:?}, total={}, kept={:?}\n",
                result.outcome, result.total, result.kept_rolls
            ));
        }

        if force_output {
            prompt.push_str("\nYou must RESPOND now; do not call another agent.\n");
        }

        prompt
    }

    #[allow(clippy::too_many_arguments)]
    async fn dispatch<R: Rng>(
        &self,
        agent_name: &str,
        state: &GameState,
        agent_context: &serde_json::Value,
        player_input: &str,
        dice_result: Option<&DiceResult>,
        rng: &mut R,
    ) -> Result<DispatchOutcome, AstinusError> {
        match agent_name {
            "rule" => self.dispatch_rule(state, agent_context, player_input, dice_result, rng).await,
            "lore" => self.dispatch_lore(state, agent_context, player_input).await,
            name if name.starts_with("npc_") => {
                self.dispatch_npc(&name["npc_".len()..], state, player_input, dice_result).await
            }
            other => Err(AstinusError::AgentNotFound(other.to_string())),
        }
    }

    async fn dispatch_rule<R: Rng>(
        &self,
        state: &GameState,
        agent_context: &serde_json::Value,
        player_input: &str,
        dice_result: Option<&DiceResult>,
        rng: &mut R,
    ) -> Result<DispatchOutcome, AstinusError> {
        // Context slicing (§4.7 "rule"): only the player action, character
        // summary, tags, and language. No NPCs, flags, history, or location.
        if let Some(result) = dice_result {
            let narration = adjudicator::narrate(self.llm.as_ref(), result, player_input, state.language).await;
            return Ok(DispatchOutcome::Result(AgentResult {
                agent: "rule".to_string(),
                content: narration.narrative,
                metadata: narration.metadata,
                success: true,
            }));
        }

        let argument = agent_context.get("argument").and_then(|v| v.as_str());
        let verdict = adjudicator::adjudicate(
            self.llm.as_ref(),
            player_input,
            &state.player,
            state.player.tags(),
            argument,
            state.language,
        )
        .await?;

        if verdict.needs_check {
            let check_request = verdict.check_request.expect("needs_check implies check_request");
            // The pool is resolved against the actual RNG here so the
            // Coordinator could roll server-side dice too; transports that
            // delegate rolling to the client only use `check_request`.
            let _ = dice::roll(&check_request.pool, rng);
            return Ok(DispatchOutcome::DiceCheck(check_request));
        }

        Ok(DispatchOutcome::Result(AgentResult {
            agent: "rule".to_string(),
            content: verdict.reasoning,
            metadata: serde_json::json!({}),
            success: true,
        }))
    }

    async fn dispatch_lore(
        &self,
        state: &GameState,
        agent_context: &serde_json::Value,
        player_input: &str,
    ) -> Result<DispatchOutcome, AstinusError> {
        // Context slicing (§4.7 "lore"): query, current location/region,
        // discovered items, world_pack_id, lang. No character data.
        let query = agent_context
            .get("query")
            .and_then(|v| v.as_str())
            .unwrap_or(player_input);

        let current_region = self
            .world_pack
            .get_location_region(&state.current_location)
            .map(|r| r.id.as_str());

        let weights = LoreWeights {
            kw_primary_weight: self.config.kw_primary_weight,
            kw_secondary_weight: self.config.kw_secondary_weight,
            vector_weight: self.config.vector_weight,
            dual_match_boost: self.config.dual_match_boost,
            lore_top_k: self.config.lore_top_k,
        };

        let text = lore::search(
            &self.world_pack,
            query,
            Some(&state.current_location),
            current_region,
            state.language,
            Some(self.vector_store.as_ref()),
            None,
            weights,
        )
        .await;

        Ok(DispatchOutcome::Result(AgentResult {
            agent: "lore".to_string(),
            content: text,
            metadata: serde_json::json!({ "query": query }),
            success: true,
        }))
    }

    async fn dispatch_npc(
        &self,
        npc_id: &str,
        state: &GameState,
        player_input: &str,
        dice_result: Option<&DiceResult>,
    ) -> Result<DispatchOutcome, AstinusError> {
        let npc = self
            .world_pack
            .get_npc(npc_id)
            .ok_or_else(|| AstinusError::AgentNotFound(format!("npc_{npc_id}")))?;

        let recent_turns: Vec<(u64, Option<&str>)> = state
            .messages
            .iter()
            .map(|m| (m.turn, m.metadata.get("npc_id").and_then(|v| v.as_str())))
            .collect();
        let narrative_style = npc::compute_narrative_style(npc_id, &recent_turns, state.turn_count);

        let recent_messages: Vec<crate::game_state::Message> = state
            .messages
            .iter()
            .filter(|m| m.metadata.get("npc_id").and_then(|v| v.as_str()) == Some(npc_id))
            .cloned()
            .collect();

        let roleplay_direction = dice_result.map(|r| npc::roleplay_direction_for(r, state.language));

        let location_name = self
            .world_pack
            .get_location(&state.current_location)
            .map(|l| l.name.get(state.language))
            .unwrap_or("");

        let ctx = NpcContext {
            npc,
            player_input,
            recent_messages: &recent_messages,
            narrative_style,
            roleplay_direction,
            location_name,
            world_pack_id: &self.world_pack.info.name.cn,
            lang: state.language,
        };

        let reply = npc::roleplay(self.llm.as_ref(), self.vector_store.as_ref(), &ctx, None, self.config.memory_top_k).await?;

        Ok(DispatchOutcome::Result(AgentResult {
            agent: format!("npc_{npc_id}"),
            content: reply.response,
            metadata: serde_json::json!({
                "npc_id": npc_id,
                "emotion": reply.emotion,
                "action": reply.action,
                "relation_change": reply.relation_change,
                "new_memory": reply.new_memory,
            }),
            success: true,
        }))
    }
}

fn apology(lang: Lang) -> String {
    crate::i18n::LocalizedString::new(
        "抱歉，这个回合未能得出结果。",
        "Sorry, this turn couldn't reach a conclusion.",
    )
    .get(lang)
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::LocalizedString;
    use crate::model::{Location, PlayerCharacter, Trait};
    use crate::vector_store::InMemoryVectorStore;
    use crate::world_pack::WorldPackInfo;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

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
        let mut locations = HashMap::new();
        locations.insert(
            "study".to_string(),
            Location {
                id: "study".into(),
                name: LocalizedString::new("书房", "Study"),
                description: LocalizedString::new("一个安静的书房", "A quiet study"),
                atmosphere: None,
                region_id: None,
                connected_locations: vec!["hall".to_string()],
                present_npc_ids: vec![],
                visible_items: vec![],
                hidden_items: vec![],
                items: vec![],
                lore_tags: vec![],
            },
        );
        locations.insert(
            "hall".to_string(),
            Location {
                id: "hall".into(),
                name: LocalizedString::new("大厅", "Hall"),
                description: LocalizedString::new("宽敞的大厅", "A spacious hall"),
                atmosphere: None,
                region_id: None,
                connected_locations: vec!["study".to_string()],
                present_npc_ids: vec![],
                visible_items: vec![],
                hidden_items: vec![],
                items: vec![],
                lore_tags: vec![],
            },
        );

        WorldPack {
            info: WorldPackInfo {
                id: "test-pack".into(),
                name: LocalizedString::new("测试世界", "Test World"),
                description: LocalizedString::default(),
                starting_location_id: "study".into(),
                version: "1.0.0".into(),
                author: "Unknown".into(),
                setting: None,
                player_hook: None,
            },
            entries: HashMap::new(),
            npcs: HashMap::new(),
            locations,
            preset_characters: vec![],
            regions: HashMap::new(),
        }
    }

    struct ScriptedLlm {
        responses: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn complete(
            &self,
            _request: agentic::llm::CompletionRequest,
        ) -> Result<agentic::llm::CompletionResponse, agentic::error::LlmError> {
            let mut responses = self.responses.lock().unwrap();
            let text = if responses.is_empty() {
                "{}".to_string()
            } else {
                responses.remove(0)
            };
            Ok(agentic::llm::CompletionResponse {
                id: "test".into(),
                model: "test".into(),
                message: LlmMessage::assistant(text),
                stop_reason: agentic::llm::StopReason::EndTurn,
                usage: agentic::llm::TokenUsage {
                    input_tokens: 0,
                    output_tokens: 0,
                    cache_read_tokens: None,
                    cache_write_tokens: None,
                },
            })
        }

        async fn complete_stream(
            &self,
            _request: agentic::llm::CompletionRequest,
        ) -> Result<
            std::pin::Pin<Box<dyn tokio_stream::Stream<Item = Result<agentic::llm::StreamEvent, agentic::error::LlmError>> + Send>>,
            agentic::error::LlmError,
        > {
            unimplemented!("not exercised by these tests")
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn supported_models(&self) -> &[&str] {
            &["scripted"]
        }

        fn is_ready(&self) -> bool {
            true
        }
    }

    struct RecordingChannel {
        sent: Mutex<Vec<ServerMessage>>,
    }

    #[async_trait]
    impl SessionChannel for RecordingChannel {
        async fn send(&self, message: ServerMessage) -> Result<(), crate::channel::ChannelError> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
        async fn recv(&mut self) -> Option<crate::channel::ClientMessage> {
            None
        }
    }

    fn coordinator(responses: Vec<&str>) -> (Coordinator, RecordingChannel) {
        let llm = Arc::new(ScriptedLlm {
            responses: Mutex::new(responses.into_iter().map(|s| s.to_string()).collect()),
        });
        let coordinator = Coordinator::new(
            Arc::new(fixture_pack()),
            llm,
            Arc::new(InMemoryVectorStore::new()),
            Config::default(),
        );
        (coordinator, RecordingChannel { sent: Mutex::new(vec![]) })
    }

    #[tokio::test]
    async fn respond_action_completes_the_turn() {
        let (coordinator, channel) = coordinator(vec![
            r#"{"action": "RESPOND", "narrative": "You glance around the study.", "reasoning": "simple look"}"#,
        ]);
        let mut state = GameState::new("s1", "pack1", Lang::En, fixture_player(), "study");
        let mut rng = rand::rngs::mock::StepRng::new(1, 1);

        coordinator.run_turn(&mut state, &channel, "look around", &mut rng).await.unwrap();

        assert_eq!(state.game_phase, GamePhase::WaitingInput);
        assert_eq!(state.messages.last().unwrap().content, "You glance around the study.");
        let sent = channel.sent.lock().unwrap();
        assert!(sent.iter().any(|m| matches!(m, ServerMessage::Complete { success: true, .. })));
    }

    #[tokio::test]
    async fn respond_with_connected_target_location_transitions_scene() {
        let (coordinator, channel) = coordinator(vec![
            r#"{"action": "RESPOND", "narrative": "You walk into the hall.", "target_location": "hall", "reasoning": "move"}"#,
        ]);
        let mut state = GameState::new("s1", "pack1", Lang::En, fixture_player(), "study");
        let mut rng = rand::rngs::mock::StepRng::new(1, 1);

        coordinator.run_turn(&mut state, &channel, "go to the hall", &mut rng).await.unwrap();
        assert_eq!(state.current_location, "hall");
    }

    #[tokio::test]
    async fn respond_with_unconnected_target_location_is_refused() {
        let (coordinator, channel) = coordinator(vec![
            r#"{"action": "RESPOND", "narrative": "You try to leave.", "target_location": "dungeon", "reasoning": "move"}"#,
        ]);
        let mut state = GameState::new("s1", "pack1", Lang::En, fixture_player(), "study");
        let mut rng = rand::rngs::mock::StepRng::new(1, 1);

        coordinator.run_turn(&mut state, &channel, "go to the dungeon", &mut rng).await.unwrap();
        assert_eq!(state.current_location, "study");
    }

    #[tokio::test]
    async fn unknown_agent_is_skipped_then_loop_continues_to_respond() {
        let (coordinator, channel) = coordinator(vec![
            r#"{"action": "CALL_AGENT", "agent_name": "mystery", "agent_context": {}, "reasoning": "try something"}"#,
            r#"{"action": "RESPOND", "narrative": "Nothing happens.", "reasoning": "done"}"#,
        ]);
        let mut state = GameState::new("s1", "pack1", Lang::En, fixture_player(), "study");
        let mut rng = rand::rngs::mock::StepRng::new(1, 1);

        coordinator.run_turn(&mut state, &channel, "do a mystery thing", &mut rng).await.unwrap();
        assert_eq!(state.messages.last().unwrap().content, "Nothing happens.");
    }

    #[tokio::test]
    async fn non_json_text_is_treated_as_respond_narrative() {
        let (coordinator, channel) = coordinator(vec!["Just a plain narrative reply, no JSON here."]);
        let mut state = GameState::new("s1", "pack1", Lang::En, fixture_player(), "study");
        let mut rng = rand::rngs::mock::StepRng::new(1, 1);

        coordinator.run_turn(&mut state, &channel, "look", &mut rng).await.unwrap();
        assert_eq!(state.messages.last().unwrap().content, "Just a plain narrative reply, no JSON here.");
    }

    #[tokio::test]
    async fn loop_exceeded_surfaces_as_error_and_failed_complete() {
        let mut config = Config::default();
        config.max_iterations = 2;
        let llm = Arc::new(ScriptedLlm {
            responses: Mutex::new(vec![
                r#"{"action": "CALL_AGENT", "agent_name": "lore", "agent_context": {}, "reasoning": "r"}"#.to_string(),
                r#"{"action": "CALL_AGENT", "agent_name": "lore", "agent_context": {}, "reasoning": "r"}"#.to_string(),
            ]),
        });
        let coordinator = Coordinator::new(
            Arc::new(fixture_pack()),
            llm,
            Arc::new(InMemoryVectorStore::new()),
            config,
        );
        let channel = RecordingChannel { sent: Mutex::new(vec![]) };
        let mut state = GameState::new("s1", "pack1", Lang::En, fixture_player(), "study");
        let mut rng = rand::rngs::mock::StepRng::new(1, 1);

        let result = coordinator.run_turn(&mut state, &channel, "keep looking up lore", &mut rng).await;
        assert!(matches!(result, Err(AstinusError::LoopExceeded(2))));
        let sent = channel.sent.lock().unwrap();
        assert!(sent.iter().any(|m| matches!(m, ServerMessage::Complete { success: false, .. })));
    }

    /// A plain observation with no NPCs present needs no dice check: one
    /// RESPOND action, one player/assistant message pair, turn_count up by
    /// one, and the session ends back at `waiting_input`.
    #[tokio::test]
    async fn trivial_observation_completes_without_a_dice_check() {
        let (coordinator, channel) = coordinator(vec![
            r#"{"action": "RESPOND", "narrative": "A quiet study, books stacked on every shelf.", "reasoning": "look"}"#,
        ]);
        let mut state = GameState::new("s1", "pack1", Lang::Cn, fixture_player(), "study");
        let mut rng = rand::rngs::mock::StepRng::new(1, 1);

        coordinator.run_turn(&mut state, &channel, "我查看房间", &mut rng).await.unwrap();

        assert_eq!(state.turn_count, 1);
        assert_eq!(state.game_phase, GamePhase::WaitingInput);
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[0].role, "player");
        assert_eq!(state.messages[1].role, "assistant");
        let sent = channel.sent.lock().unwrap();
        assert!(!sent.iter().any(|m| matches!(m, ServerMessage::DiceCheck { .. })));
        assert!(sent.iter().any(|m| matches!(m, ServerMessage::Complete { success: true, .. })));
    }

    /// Searching something risky routes through the Rule Adjudicator, which
    /// decides a check is needed: the turn suspends at `dice_check` with no
    /// `complete` yet, and `pending_resume` is populated for later resume.
    #[tokio::test]
    async fn risky_search_suspends_at_a_dice_check() {
        let (coordinator, channel) = coordinator(vec![
            r#"{"action": "CALL_AGENT", "agent_name": "rule", "agent_context": {}, "reasoning": "searching the shelves may reveal something"}"#,
            r#"{"needs_check": true, "intention": "翻找书架寻找线索", "contributing_traits": [], "contributing_tags": [], "opposing_traits": [], "opposing_tags": [], "argument_accepted": false, "reasoning": "an uncertain search"}"#,
        ]);
        let mut state = GameState::new("s1", "pack1", Lang::Cn, fixture_player(), "study");
        let mut rng = rand::rngs::mock::StepRng::new(1, 1);

        coordinator.run_turn(&mut state, &channel, "我要翻找书架", &mut rng).await.unwrap();

        assert_eq!(state.game_phase, GamePhase::DiceCheck);
        assert!(state.pending_resume.is_some());
        let sent = channel.sent.lock().unwrap();
        assert!(!sent.iter().any(|m| matches!(m, ServerMessage::Complete { .. })));
        assert!(sent.iter().any(|m| matches!(m, ServerMessage::Status { phase, .. } if phase == "gm")));
        assert!(sent.iter().any(|m| matches!(m, ServerMessage::Status { phase, .. } if phase == "rule")));
        let check = sent.iter().find_map(|m| match m {
            ServerMessage::DiceCheck { check_request } => Some(check_request),
            _ => None,
        });
        assert!(check.is_some());
        assert!(check.unwrap().intention.contains("翻找书架"));
    }

    /// Resuming the suspended turn above with a successful roll clears
    /// `pending_resume`, records the outcome, and finishes with a `complete`
    /// whose narrative reflects the success.
    #[tokio::test]
    async fn resume_after_success_completes_the_turn() {
        // Five scripted LLM calls across the two Coordinator entry points:
        // run_turn's ReAct decision (call "rule"), the adjudicator's
        // needs-check verdict, resume_turn's ReAct decision (call "rule"
        // again now that a result is in), the adjudicator's narration of
        // that result, and a final ReAct decision to respond.
        let (coordinator, channel) = coordinator(vec![
            r#"{"action": "CALL_AGENT", "agent_name": "rule", "agent_context": {}, "reasoning": "search"}"#,
            r#"{"needs_check": true, "intention": "翻找书架", "contributing_traits": [], "contributing_tags": [], "opposing_traits": [], "opposing_tags": [], "argument_accepted": false, "reasoning": "uncertain"}"#,
            r#"{"action": "CALL_AGENT", "agent_name": "rule", "agent_context": {}, "reasoning": "narrate the result"}"#,
            "A narrow drawer slides open, revealing a folded letter.",
            r#"{"action": "RESPOND", "narrative": "You find a hidden letter tucked behind the books.", "reasoning": "success"}"#,
        ]);
        let mut state = GameState::new("s1", "pack1", Lang::Cn, fixture_player(), "study");
        let mut rng = rand::rngs::mock::StepRng::new(1, 1);
        coordinator.run_turn(&mut state, &channel, "我要翻找书架", &mut rng).await.unwrap();
        assert!(state.pending_resume.is_some());

        let result = DiceResult {
            all_rolls: vec![6, 4],
            kept_rolls: vec![6, 4],
            dropped_rolls: vec![],
            modifier: 0,
            total: 10,
            outcome: dice::Outcome::Success,
            is_bonus: false,
            is_penalty: false,
        };

        coordinator.resume_turn(&mut state, &channel, result, &mut rng).await.unwrap();

        assert!(state.pending_resume.is_none());
        assert_eq!(state.last_check_result.as_ref().unwrap().outcome, dice::Outcome::Success);
        let sent = channel.sent.lock().unwrap();
        let complete = sent.iter().find_map(|m| match m {
            ServerMessage::Complete { content, success: true, .. } => Some(content.as_str()),
            _ => None,
        });
        assert!(complete.is_some());
        assert!(complete.unwrap().contains("hidden letter"));
    }

    #[tokio::test]
    async fn resume_without_pending_state_errors() {
        let (coordinator, channel) = coordinator(vec![]);
        let mut state = GameState::new("s1", "pack1", Lang::En, fixture_player(), "study");
        let mut rng = rand::rngs::mock::StepRng::new(1, 1);
        let result = coordinator
            .resume_turn(
                &mut state,
                &channel,
                dice::roll(&dice::PoolSpec::default(), &mut rng),
                &mut rng,
            )
            .await;
        assert!(matches!(result, Err(AstinusError::NoPendingState)));
    }
}
