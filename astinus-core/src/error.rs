//! Error taxonomy for the engine: recoverable kinds the Coordinator papers
//! over mid-turn, and surfaced kinds that terminate a turn.

use thiserror::Error;

/// Top-level error type. Most call sites match on `kind()` rather than the
/// variant directly, since recoverability is a property of the kind, not
/// the call site.
#[derive(Debug, Error)]
pub enum AstinusError {
    /// LLM output was not recognizable JSON after one repair attempt.
    /// Recovered by substituting a default narrative.
    #[error("failed to parse LLM output as JSON: {0}")]
    ParseFailure(String),

    /// A sub-agent call returned `success=false`. Recovered by the Loop:
    /// appended to `agent_results` with empty content, turn continues.
    #[error("agent '{agent}' failed: {reason}")]
    AgentFailure { agent: String, reason: String },

    /// Coordinator dispatched to an agent name with no handler. Recovered
    /// by skipping the iteration.
    #[error("unknown agent: {0}")]
    AgentNotFound(String),

    /// Loop iterations exhausted without a RESPOND action. Surfaced as
    /// `complete(success=false)`.
    #[error("exceeded {0} loop iterations without a response")]
    LoopExceeded(usize),

    /// Per-LLM-call or per-turn wall-clock budget exceeded. Surfaced as
    /// `error` + `complete(success=false)`; clears `pending_resume`.
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// A `dice_result` arrived with no matching `pending_resume`.
    #[error("no pending state to resume")]
    NoPendingState,

    /// A session rejected an inbound message because a turn is mid-flight.
    #[error("session busy")]
    Busy,

    /// World-pack file failed to parse or validate.
    #[error("world pack error in {path}: {source}")]
    WorldPack {
        path: String,
        #[source]
        source: WorldPackLoadError,
    },

    /// A character, game-state, or dice-pool invariant was violated.
    #[error("invariant violation: {0}")]
    Invariant(String),

    #[error(transparent)]
    VectorStore(#[from] crate::vector_store::VectorStoreError),

    #[error("llm provider error: {0}")]
    Llm(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AstinusError {
    /// Whether the Loop can paper over this error and continue the current
    /// turn, versus having to terminate it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AstinusError::ParseFailure(_)
                | AstinusError::AgentFailure { .. }
                | AstinusError::AgentNotFound(_)
        )
    }
}

/// Failure parsing or validating a world-pack JSON file. Carries the JSON
/// Pointer path to the offending field, per §6's "report the JSON Pointer
/// path and the failing file with absolute path" requirement; the absolute
/// path itself is attached by the caller via [`AstinusError::WorldPack`].
#[derive(Debug, Error)]
pub enum WorldPackLoadError {
    #[error("invalid JSON at {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("read error: {0}")]
    Read(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_failure_and_agent_errors_are_recoverable() {
        assert!(AstinusError::ParseFailure("bad".into()).is_recoverable());
        assert!(AstinusError::AgentFailure {
            agent: "rule".into(),
            reason: "boom".into()
        }
        .is_recoverable());
        assert!(AstinusError::AgentNotFound("ghost".into()).is_recoverable());
    }

    #[test]
    fn loop_exceeded_and_timeout_are_surfaced() {
        assert!(!AstinusError::LoopExceeded(10).is_recoverable());
        assert!(!AstinusError::Timeout(std::time::Duration::from_secs(60)).is_recoverable());
        assert!(!AstinusError::NoPendingState.is_recoverable());
        assert!(!AstinusError::Busy.is_recoverable());
    }
}
