//! Engine configuration: the tunables named in the external-interfaces
//! table, loaded from environment variables (optionally via a `.env` file).

use serde::{Deserialize, Serialize};

/// All engine tunables, with the defaults given in the external-interfaces
/// configuration table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Loop iteration cap per turn.
    pub max_iterations: usize,
    /// Messages provided to the Loop prompt.
    pub history_length: usize,
    /// Per-LLM-call timeout, in seconds.
    pub llm_timeout_sec: u64,
    /// Wall-clock budget per turn, in seconds.
    pub turn_budget_sec: u64,
    /// Primary-key keyword match weight (lore retrieval).
    pub kw_primary_weight: f32,
    /// Secondary-key keyword match weight (lore retrieval).
    pub kw_secondary_weight: f32,
    /// Vector similarity weight (lore retrieval).
    pub vector_weight: f32,
    /// Multiplier applied when a uid scores on both keyword and vector.
    pub dual_match_boost: f32,
    /// Final lore entries returned per query.
    pub lore_top_k: usize,
    /// NPC memories retrieved per roleplay turn.
    pub memory_top_k: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            history_length: 10,
            llm_timeout_sec: 60,
            turn_budget_sec: 300,
            kw_primary_weight: 2.0,
            kw_secondary_weight: 1.0,
            vector_weight: 0.8,
            dual_match_boost: 1.5,
            lore_top_k: 5,
            memory_top_k: 3,
        }
    }
}

impl Config {
    /// Load from `ASTINUS_*`-prefixed environment variables, falling back
    /// to defaults for anything unset. Reads a `.env` file first if
    /// present, in the same spirit as the rest of the ecosystem's
    /// dotenvy-based startup.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Config::default();
        macro_rules! env_override {
            ($field:ident, $key:literal) => {
                if let Ok(raw) = std::env::var(concat!("ASTINUS_", $key)) {
                    if let Ok(parsed) = raw.parse() {
                        config.$field = parsed;
                    } else {
                        tracing::warn!(
                            key = concat!("ASTINUS_", $key),
                            value = %raw,
                            "ignoring unparsable config override"
                        );
                    }
                }
            };
        }

        env_override!(max_iterations, "MAX_ITERATIONS");
        env_override!(history_length, "HISTORY_LENGTH");
        env_override!(llm_timeout_sec, "LLM_TIMEOUT_SEC");
        env_override!(turn_budget_sec, "TURN_BUDGET_SEC");
        env_override!(kw_primary_weight, "KW_PRIMARY_WEIGHT");
        env_override!(kw_secondary_weight, "KW_SECONDARY_WEIGHT");
        env_override!(vector_weight, "VECTOR_WEIGHT");
        env_override!(dual_match_boost, "DUAL_MATCH_BOOST");
        env_override!(lore_top_k, "LORE_TOP_K");
        env_override!(memory_top_k, "MEMORY_TOP_K");

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let config = Config::default();
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.history_length, 10);
        assert_eq!(config.llm_timeout_sec, 60);
        assert_eq!(config.turn_budget_sec, 300);
        assert_eq!(config.kw_primary_weight, 2.0);
        assert_eq!(config.kw_secondary_weight, 1.0);
        assert_eq!(config.vector_weight, 0.8);
        assert_eq!(config.dual_match_boost, 1.5);
        assert_eq!(config.lore_top_k, 5);
        assert_eq!(config.memory_top_k, 3);
    }

    #[test]
    fn env_override_parses_and_applies() {
        std::env::set_var("ASTINUS_MAX_ITERATIONS", "20");
        let config = Config::from_env();
        assert_eq!(config.max_iterations, 20);
        std::env::remove_var("ASTINUS_MAX_ITERATIONS");
    }

    #[test]
    fn unparsable_override_is_ignored() {
        std::env::set_var("ASTINUS_MAX_ITERATIONS", "not-a-number");
        let config = Config::from_env();
        assert_eq!(config.max_iterations, 10);
        std::env::remove_var("ASTINUS_MAX_ITERATIONS");
    }
}
