//! NPC Roleplayer: turns a resolved NPC (soul + body) and a player
//! utterance into structured in-character dialogue.

use crate::dice::{DiceResult, Outcome};
use crate::error::AstinusError;
use crate::i18n::{Lang, LocalizedString};
use crate::model::Npc;
use crate::vector_store::VectorStore;
use agentic::llm::LlmProvider;
use agentic::message::Message;
use serde::{Deserialize, Serialize};

/// Everything the Roleplayer is allowed to see for one call. Never carries
/// raw dice totals, game flags, other NPCs, or lore outside this NPC's
/// `location_knowledge`.
pub struct NpcContext<'a> {
    pub npc: &'a Npc,
    pub player_input: &'a str,
    pub recent_messages: &'a [crate::game_state::Message],
    pub narrative_style: NarrativeStyle,
    pub roleplay_direction: Option<String>,
    pub location_name: &'a str,
    pub world_pack_id: &'a str,
    pub lang: Lang,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrativeStyle {
    Brief,
    Detailed,
}

/// `brief` if this NPC responded within the last 2 turns, or in at least 3
/// of the last 5; `detailed` otherwise.
pub fn compute_narrative_style(npc_id: &str, recent_turns: &[(u64, Option<&str>)], current_turn: u64) -> NarrativeStyle {
    let active_in_last_two = recent_turns
        .iter()
        .filter(|(turn, id)| *turn + 2 >= current_turn && *id == Some(npc_id))
        .count()
        > 0;

    let active_count_in_last_five = recent_turns
        .iter()
        .filter(|(turn, id)| *turn + 5 >= current_turn && *id == Some(npc_id))
        .count();

    if active_in_last_two || active_count_in_last_five >= 3 {
        NarrativeStyle::Brief
    } else {
        NarrativeStyle::Detailed
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewMemory {
    pub event: String,
    pub keywords: Vec<String>,
}

/// Structured reply produced by the NPC Roleplayer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NpcReply {
    pub response: String,
    pub emotion: String,
    pub action: String,
    pub relation_change: i32,
    #[serde(default)]
    pub new_memory: Option<NewMemory>,
}

/// The five-level mapping from a dice outcome to narrative guidance for the
/// next NPC reply. `critical_failure` is detected as `Failure` whose kept
/// dice are both the minimum (`1`); this refines the four-bucket
/// [`Outcome`] used by the dice engine itself without adding a fifth
/// dice-engine-level bucket.
pub fn roleplay_direction_for(result: &DiceResult, lang: Lang) -> String {
    let is_critical_failure = result.outcome == Outcome::Failure && result.kept_rolls.iter().all(|&r| r == 1);

    let (cn, en) = if is_critical_failure {
        ("NPC 应该强烈拒绝，态度恶化", "…strongly refuse… worsened attitude")
    } else {
        match result.outcome {
            Outcome::Critical => ("NPC 应该非常积极地回应…主动提供帮助", "…very positively… proactively offer help"),
            Outcome::Success => ("NPC 应该积极回应，态度有所软化", "…positively… softened attitude"),
            Outcome::Partial => ("NPC 的态度应有所松动，但仍保持警惕", "…soften somewhat, but remain guarded"),
            Outcome::Failure => ("NPC 应该拒绝请求", "…refuse the request"),
        }
    };
    LocalizedString::new(cn, en).get(lang).to_string()
}

/// Fetch up to `top_k` past-event summaries for `npc_id`, trying the
/// `npc_memories_{npc_id}` vector collection first (given a precomputed
/// embedding of the player input; embedding generation is outside this
/// crate's scope) and falling back to the `top_k` most recent raw memory
/// keys when no embedding is available or the store query fails.
async fn gather_memories(
    npc: &Npc,
    player_input_embedding: Option<&[f32]>,
    store: &dyn VectorStore,
    top_k: usize,
) -> Vec<String> {
    let collection = format!("npc_memories_{}", npc.id);
    let hits = match player_input_embedding {
        Some(embedding) => store.query(&collection, embedding, top_k).await.ok(),
        None => None,
    };

    match hits {
        Some(matches) if !matches.is_empty() => matches.into_iter().map(|m| m.record.document).collect(),
        _ => npc.body.memory.keys().rev().take(top_k).cloned().collect(),
    }
}

const ROLEPLAYER_SYSTEM_PROMPT: &str = "You roleplay a single NPC. Stay fully in character. \
Respond with a single JSON object only: \
{\"response\": string, \"emotion\": string, \"action\": string, \"relation_change\": int in [-10,10], \
\"new_memory\": {\"event\": string, \"keywords\": [string]} | null}.";

/// Produce an in-character reply for one NPC turn.
pub async fn roleplay(
    provider: &dyn LlmProvider,
    store: &dyn VectorStore,
    ctx: &NpcContext<'_>,
    player_input_embedding: Option<&[f32]>,
    memory_top_k: usize,
) -> Result<NpcReply, AstinusError> {
    let memories = gather_memories(ctx.npc, player_input_embedding, store, memory_top_k).await;
    let prompt = build_prompt(ctx, &memories);

    let text = crate::llm::chat(provider, Some(ROLEPLAYER_SYSTEM_PROMPT), vec![Message::user(prompt)])
        .await
        .map_err(|e| AstinusError::Llm(e.to_string()))?;

    let mut reply: NpcReply =
        crate::llm_json::extract_json_as(&text).map_err(|e| AstinusError::ParseFailure(e.to_string()))?;
    reply.relation_change = reply.relation_change.clamp(-10, 10);
    Ok(reply)
}

fn build_prompt(ctx: &NpcContext<'_>, memories: &[String]) -> String {
    let soul = &ctx.npc.soul;
    let mut prompt = format!(
        "You are {}. {}\nPersonality: {}\nSpeech style: {}\n",
        soul.name,
        soul.description.get(ctx.lang),
        soul.personality.join(", "),
        soul.speech_style.get(ctx.lang),
    );

    if !soul.example_dialogue.is_empty() {
        prompt.push_str("Example exchanges:\n");
        for ex in &soul.example_dialogue {
            prompt.push_str(&format!("Player: {}\n{}: {}\n", ex.user, soul.name, ex.npc));
        }
    }

    if !memories.is_empty() {
        prompt.push_str(&format!("Relevant past events: {}\n", memories.join("; ")));
    }

    if !ctx.recent_messages.is_empty() {
        prompt.push_str("Recent conversation with this NPC:\n");
        for m in ctx.recent_messages {
            prompt.push_str(&format!("{}: {}\n", m.role, m.content));
        }
    }

    if let Some(direction) = &ctx.roleplay_direction {
        prompt.push_str(&format!("Narrative direction: {direction}\n"));
    }

    let style = match ctx.narrative_style {
        NarrativeStyle::Brief => "Keep the reply brief, a sentence or two.",
        NarrativeStyle::Detailed => "A fuller, more descriptive reply is appropriate.",
    };
    prompt.push_str(&format!(
        "Location: {}\nPlayer says: {}\n{}\n",
        ctx.location_name, ctx.player_input, style
    ));
    prompt
}
