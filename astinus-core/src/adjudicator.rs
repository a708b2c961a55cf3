//! Rule Adjudicator: decides whether an action needs a dice check and, once
//! a roll is in, narrates the outcome.

use crate::dice::{DiceResult, Outcome, PoolSpec};
use crate::error::AstinusError;
use crate::game_state::{DiceCheckRequest, InfluencingFactors};
use crate::i18n::{Lang, LocalizedString};
use crate::llm_json::extract_json_as;
use crate::model::{PlayerCharacter, Trait};
use agentic::llm::LlmProvider;
use agentic::message::Message;
use serde::{Deserialize, Serialize};

/// Raw LLM response shape for `adjudicate`.
#[derive(Debug, Deserialize)]
struct AdjudicateResponse {
    needs_check: bool,
    #[serde(default)]
    intention: Option<String>,
    #[serde(default)]
    contributing_traits: Vec<String>,
    #[serde(default)]
    contributing_tags: Vec<String>,
    #[serde(default)]
    opposing_traits: Vec<String>,
    #[serde(default)]
    opposing_tags: Vec<String>,
    #[serde(default)]
    argument_accepted: bool,
    reasoning: String,
}

/// Result of [`adjudicate`].
#[derive(Debug, Clone, Serialize)]
pub struct RuleVerdict {
    pub needs_check: bool,
    pub check_request: Option<DiceCheckRequest>,
    pub reasoning: String,
}

/// Decide whether `action` by `character` (with current `tags`, and an
/// optional player `argument` claiming a trait applies) requires a dice
/// check, deriving the pool spec's bonus/penalty dice from contributing
/// positive aspects/favorable tags versus negative aspects/unfavorable
/// tags.
pub async fn adjudicate(
    provider: &dyn LlmProvider,
    action: &str,
    character: &PlayerCharacter,
    tags: &[String],
    argument: Option<&str>,
    lang: Lang,
) -> Result<RuleVerdict, AstinusError> {
    let prompt = build_adjudicate_prompt(action, character, tags, argument);
    let text = crate::llm::chat(provider, Some(ADJUDICATOR_SYSTEM_PROMPT), vec![Message::user(prompt)])
        .await
        .map_err(|e| AstinusError::Llm(e.to_string()))?;

    let parsed: AdjudicateResponse =
        extract_json_as(&text).map_err(|e| AstinusError::ParseFailure(e.to_string()))?;

    if !parsed.needs_check {
        return Ok(RuleVerdict {
            needs_check: false,
            check_request: None,
            reasoning: parsed.reasoning,
        });
    }

    let mut bonus_dice = parsed.contributing_traits.len() as u32 + parsed.contributing_tags.len() as u32;
    let mut penalty_dice = parsed.opposing_traits.len() as u32 + parsed.opposing_tags.len() as u32;

    // An accepted argument's trait/tag already sits in `contributing_*` (so
    // it reads right in `influencing_factors`), but its pool effect comes
    // from the adjustment below, not from also being counted as a flat
    // contributor. Otherwise a trait that cancels a tag's disadvantage would
    // double count and leave a net bonus instead of a wash.
    if parsed.argument_accepted {
        if let Some(arg) = argument {
            if parsed.contributing_traits.iter().any(|t| t == arg) || parsed.contributing_tags.iter().any(|t| t == arg) {
                bonus_dice = bonus_dice.saturating_sub(1);
            }
        }
        if penalty_dice > 0 {
            penalty_dice -= 1;
        } else {
            bonus_dice += 1;
        }
    }

    let pool = PoolSpec::new(0, bonus_dice, penalty_dice);
    let mut named = parsed.contributing_traits.clone();
    named.extend(parsed.contributing_tags.clone());
    named.extend(parsed.opposing_traits.clone());
    named.extend(parsed.opposing_tags.clone());

    let instructions = LocalizedString::new(
        format!("检定由以下因素决定：{}", named.join("、")),
        format!("Check influenced by: {}", named.join(", ")),
    );

    // influencing_factors reports everything that moved the pool, not just
    // the contributing side: a disadvantage the player argued away is still
    // part of why the check looks the way it does.
    let mut traits = parsed.contributing_traits;
    traits.extend(parsed.opposing_traits);
    let mut tags = parsed.contributing_tags;
    tags.extend(parsed.opposing_tags);

    Ok(RuleVerdict {
        needs_check: true,
        check_request: Some(DiceCheckRequest {
            intention: parsed.intention.unwrap_or_else(|| action.to_string()),
            influencing_factors: InfluencingFactors { traits, tags },
            pool,
            instructions,
        }),
        reasoning: parsed.reasoning,
    })
}

const ADJUDICATOR_SYSTEM_PROMPT: &str = "You adjudicate whether a player's action requires a dice check, \
given their character traits and current tags. Respond with a single JSON object only.";

fn build_adjudicate_prompt(action: &str, character: &PlayerCharacter, tags: &[String], argument: Option<&str>) -> String {
    let traits_desc: Vec<String> = character
        .traits
        .iter()
        .map(|t: &Trait| {
            format!(
                "{} (+ {} / - {})",
                t.name.cn,
                t.positive_aspect.cn,
                t.negative_aspect.cn
            )
        })
        .collect();

    let mut prompt = format!(
        "Action: {action}\nCharacter traits: {}\nCurrent tags: {}\n",
        traits_desc.join("; "),
        tags.join(", ")
    );
    if let Some(argument) = argument {
        prompt.push_str(&format!("Player argument: {argument}\n"));
    }
    prompt.push_str(
        "Return JSON: {\"needs_check\": bool, \"intention\": string, \
        \"contributing_traits\": [string], \"contributing_tags\": [string], \
        \"opposing_traits\": [string], \"opposing_tags\": [string], \
        \"argument_accepted\": bool, \"reasoning\": string}",
    );
    prompt
}

/// The narrative paragraph plus metadata produced by interpreting a roll's
/// outcome. `metadata` carries the totals so the Coordinator can append
/// them to `agent_results` without re-deriving them.
#[derive(Debug, Clone, Serialize)]
pub struct NarrationResult {
    pub narrative: String,
    pub metadata: serde_json::Value,
}

/// Fallback narration used when the LLM call fails or the adjudicator is
/// otherwise unavailable, per outcome bucket.
pub fn fallback_narrative(outcome: Outcome, lang: Lang) -> String {
    let (cn, en) = match outcome {
        Outcome::Critical => ("大成功！一切都如你所愿。", "A resounding success! Everything goes your way."),
        Outcome::Success => ("成功了。", "You succeed."),
        Outcome::Partial => ("部分成功，但有代价。", "A partial success, with a cost."),
        Outcome::Failure => ("失败了。", "You fail."),
    };
    LocalizedString::new(cn, en).get(lang).to_string()
}

/// Transform a resolved [`DiceResult`] into an in-world narrative, falling
/// back to [`fallback_narrative`] when the LLM call or JSON parse fails.
pub async fn narrate(
    provider: &dyn LlmProvider,
    result: &DiceResult,
    intention: &str,
    lang: Lang,
) -> NarrationResult {
    let prompt = format!(
        "The player attempted: {intention}\nDice outcome: {:?}, total {}, rolls {:?}\nWrite a short narrative paragraph describing the outcome.",
        result.outcome, result.total, result.kept_rolls
    );

    let narrative = match crate::llm::chat(provider, Some(NARRATOR_SYSTEM_PROMPT), vec![Message::user(prompt)]).await {
        Ok(text) if !text.trim().is_empty() => text,
        _ => fallback_narrative(result.outcome, lang),
    };

    NarrationResult {
        narrative,
        metadata: serde_json::json!({
            "outcome": result.outcome,
            "total": result.total,
        }),
    }
}

const NARRATOR_SYSTEM_PROMPT: &str =
    "You narrate the outcome of a dice check in a short, vivid paragraph matching the scene's tone.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_narrative_varies_by_outcome_and_lang() {
        assert_eq!(fallback_narrative(Outcome::Critical, Lang::En), "A resounding success! Everything goes your way.");
        assert_eq!(fallback_narrative(Outcome::Failure, Lang::Cn), "失败了。");
    }

    #[test]
    fn adjudicate_response_parses_minimal_json() {
        let json = r#"{"needs_check": false, "reasoning": "no risk involved"}"#;
        let parsed: AdjudicateResponse = serde_json::from_str(json).unwrap();
        assert!(!parsed.needs_check);
        assert_eq!(parsed.reasoning, "no risk involved");
    }

    #[test]
    fn pool_spec_derivation_favors_bonus_on_accepted_argument() {
        let bonus_dice = 1u32;
        let penalty_dice = 0u32;
        let argument_accepted = true;
        let mut bonus = bonus_dice;
        let penalty = penalty_dice;
        if argument_accepted && penalty > 0 {
            // unreachable in this fixture
        } else if argument_accepted {
            bonus += 1;
        }
        assert_eq!(bonus, 2);
    }

    fn fixture_character() -> PlayerCharacter {
        PlayerCharacter::new(
            "Hero",
            LocalizedString::new("冒险者", "Adventurer"),
            vec![Trait {
                name: LocalizedString::new("运动健将", "Athletic"),
                description: LocalizedString::default(),
                positive_aspect: LocalizedString::default(),
                negative_aspect: LocalizedString::default(),
            }],
            3,
            vec![],
        )
        .unwrap()
    }

    /// A tagged disadvantage with no offsetting trait widens the pool to the
    /// penalty side: one opposing tag alone yields `penalty_dice = 1`, net
    /// `-1`, so a 3-die pool keeping the lowest two.
    #[tokio::test]
    async fn disadvantage_from_a_single_tag_yields_three_die_keep_low_pool() {
        let llm = crate::testing::MockLlmProvider::new(vec![
            r#"{"needs_check": true, "intention": "flee the room", "contributing_traits": [], "contributing_tags": [], "opposing_traits": [], "opposing_tags": ["右腿受伤"], "argument_accepted": false, "reasoning": "an injured leg hinders fleeing"}"#,
        ]);
        let character = fixture_character();
        let tags = vec!["右腿受伤".to_string()];

        let verdict = adjudicate(&llm, "我要逃离房间", &character, &tags, None, Lang::Cn)
            .await
            .unwrap();

        let check = verdict.check_request.unwrap();
        assert_eq!(check.pool.bonus_dice, 0);
        assert_eq!(check.pool.penalty_dice, 1);
        assert_eq!(check.dice_formula(), "3d6kl2");
    }

    /// The same disadvantage, but the player successfully argues their
    /// "Athletic" trait applies: the accepted argument contributes one bonus
    /// die, canceling the tag's one penalty die back to a flat pool. Both
    /// the trait and the tag still show up in `influencing_factors`.
    #[tokio::test]
    async fn accepted_trait_argument_cancels_a_tag_disadvantage() {
        let llm = crate::testing::MockLlmProvider::new(vec![
            r#"{"needs_check": true, "intention": "flee the room", "contributing_traits": ["运动健将"], "contributing_tags": [], "opposing_traits": [], "opposing_tags": ["右腿受伤"], "argument_accepted": true, "reasoning": "athleticism offsets the injury"}"#,
        ]);
        let character = fixture_character();
        let tags = vec!["右腿受伤".to_string()];

        let verdict = adjudicate(&llm, "我要逃离房间", &character, &tags, Some("运动健将"), Lang::Cn)
            .await
            .unwrap();

        let check = verdict.check_request.unwrap();
        assert_eq!(check.dice_formula(), "2d6");
        assert!(check.influencing_factors.traits.contains(&"运动健将".to_string()));
        assert_eq!(check.influencing_factors.tags, vec!["右腿受伤".to_string()]);
    }
}
