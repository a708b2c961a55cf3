//! Multi-agent text-adventure engine: a ReAct-style Coordinator dispatches to
//! a Rule Adjudicator, a Lore Retriever, and per-NPC Roleplayers, suspending
//! at dice checks and resuming once a client-rolled result arrives.
//!
//! # Quick Start
//!
//! ```ignore
//! use astinus_core::coordinator::Coordinator;
//! use astinus_core::game_state::GameState;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let coordinator = Coordinator::new(world_pack, llm, vector_store, config);
//!     let mut state = GameState::new(session_id, pack_id, lang, player, start_location);
//!     coordinator.run_turn(&mut state, &channel, "look around", &mut rng).await?;
//!     Ok(())
//! }
//! ```

pub mod adjudicator;
pub mod channel;
pub mod config;
pub mod coordinator;
pub mod dice;
pub mod error;
pub mod game_state;
pub mod i18n;
pub mod llm;
pub mod llm_json;
pub mod location_context;
pub mod lore;
pub mod model;
pub mod npc;
pub mod persist;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod vector_store;
pub mod world_pack;

pub use coordinator::{AgentResult, Coordinator};
pub use error::AstinusError;
pub use game_state::{GamePhase, GameState};
pub use i18n::{Lang, LocalizedString};
pub use world_pack::WorldPack;
