//! Line-delimited-JSON session driver over stdin/stdout.
//!
//! Not a game client: a development/integration harness that exercises the
//! Session Channel contract end-to-end against a real LLM provider. One
//! `ClientMessage` per input line, one `ServerMessage` per output line.
//!
//! ```bash
//! astinus-cli --world-pack pack.json --player-name Thorin
//! ```

use astinus_core::channel::{ClientMessage, ServerMessage, SessionChannel};
use astinus_core::coordinator::Coordinator;
use astinus_core::dice::{DiceResult, Outcome};
use astinus_core::error::AstinusError;
use astinus_core::game_state::GameState;
use astinus_core::i18n::{Lang, LocalizedString};
use astinus_core::model::{PlayerCharacter, Trait};
use astinus_core::persist::SavedSession;
use astinus_core::vector_store::{InMemoryVectorStore, VectorStore};
use astinus_core::world_pack::{self, WorldPack};
use astinus_core::config::Config;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex as AsyncMutex;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    if std::env::var("ANTHROPIC_API_KEY").is_err() {
        eprintln!("Error: ANTHROPIC_API_KEY environment variable not set.");
        eprintln!("Set it in a .env file or with: export ANTHROPIC_API_KEY=your_key_here");
        std::process::exit(1);
    }

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let cli_args = match CliArgs::parse(&args) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {e}");
            print_help();
            std::process::exit(1);
        }
    };

    let pack = world_pack::load(&cli_args.world_pack).await?;

    let mut state = match &cli_args.resume {
        Some(resume_path) => SavedSession::load_json(resume_path).await?.state,
        None => new_session_state(&pack, &cli_args)?,
    };
    state.language = cli_args.lang;

    let llm = agentic::llm::anthropic::AnthropicProvider::new(
        std::env::var("ANTHROPIC_API_KEY").expect("checked above"),
    );
    let coordinator = Coordinator::new(
        Arc::new(pack),
        Arc::new(llm),
        Arc::new(InMemoryVectorStore::default()) as Arc<dyn VectorStore>,
        Config::default(),
    );

    let channel = StdioChannel::new();
    let mut rng = rand::thread_rng();

    loop {
        let Some(message) = channel.recv_line().await else {
            break;
        };

        let result = match message {
            ClientMessage::PlayerInput { content, .. } => {
                coordinator.run_turn(&mut state, &channel, &content, &mut rng).await
            }
            ClientMessage::DiceResult {
                result,
                all_rolls,
                kept_rolls,
                outcome,
            } => {
                let dice_result = reconstruct_dice_result(result, all_rolls, kept_rolls, outcome);
                coordinator.resume_turn(&mut state, &channel, dice_result, &mut rng).await
            }
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, recoverable = e.is_recoverable(), "turn ended with an error");
        }
    }

    if let Some(save_path) = &cli_args.save {
        SavedSession::new(state).save_json(save_path).await?;
        eprintln!("Session saved to {}", save_path.display());
    }

    Ok(())
}

/// Rebuild a [`DiceResult`] from what the client reported. The client only
/// rolls and reports totals; `modifier` and bonus/penalty provenance aren't
/// recoverable from the wire shape, so they're approximated from the
/// all-rolls/kept-rolls size difference. Fine for a development harness;
/// the Coordinator only reads `outcome` and `kept_rolls` downstream.
fn reconstruct_dice_result(total: i32, all_rolls: Vec<u32>, kept_rolls: Vec<u32>, outcome: Outcome) -> DiceResult {
    let mut remaining = all_rolls.clone();
    let mut dropped_rolls = Vec::new();
    for &k in &kept_rolls {
        if let Some(pos) = remaining.iter().position(|&r| r == k) {
            remaining.remove(pos);
        }
    }
    dropped_rolls.append(&mut remaining);

    DiceResult {
        is_bonus: all_rolls.len() > kept_rolls.len() && !dropped_rolls.is_empty(),
        is_penalty: false,
        all_rolls,
        kept_rolls,
        dropped_rolls,
        modifier: 0,
        total,
        outcome,
    }
}

fn new_session_state(pack: &WorldPack, args: &CliArgs) -> Result<GameState, AstinusError> {
    let player = match pack.preset_characters.first() {
        Some(preset) => PlayerCharacter::new(
            args.player_name.clone().unwrap_or_else(|| preset.name.clone()),
            preset.concept.clone(),
            preset.traits.clone(),
            PlayerCharacter::STARTING_FATE_POINTS,
            Vec::new(),
        ),
        None => PlayerCharacter::new(
            args.player_name.clone().unwrap_or_else(|| "Adventurer".to_string()),
            LocalizedString::new("冒险者", "Adventurer"),
            vec![Trait {
                name: LocalizedString::new("坚韧", "Resolute"),
                description: LocalizedString::default(),
                positive_aspect: LocalizedString::new("不轻言放弃", "Never gives up"),
                negative_aspect: LocalizedString::new("固执己见", "Stubborn"),
            }],
            PlayerCharacter::STARTING_FATE_POINTS,
            Vec::new(),
        ),
    }
    .map_err(|e| AstinusError::Invariant(e.to_string()))?;

    Ok(GameState::new(
        args.session_id.clone(),
        pack.info.id.clone(),
        args.lang,
        player,
        pack.info.starting_location_id.clone(),
    ))
}

struct CliArgs {
    world_pack: std::path::PathBuf,
    session_id: String,
    player_name: Option<String>,
    lang: Lang,
    save: Option<std::path::PathBuf>,
    resume: Option<std::path::PathBuf>,
}

impl CliArgs {
    fn parse(args: &[String]) -> Result<Self, String> {
        let mut world_pack = None;
        let mut session_id = uuid::Uuid::new_v4().to_string();
        let mut player_name = None;
        let mut lang = Lang::En;
        let mut save = None;
        let mut resume = None;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--world-pack" => {
                    world_pack = Some(std::path::PathBuf::from(next_value(args, &mut i)?));
                }
                "--session-id" => session_id = next_value(args, &mut i)?,
                "--player-name" => player_name = Some(next_value(args, &mut i)?),
                "--lang" => {
                    lang = match next_value(args, &mut i)?.as_str() {
                        "cn" => Lang::Cn,
                        "en" => Lang::En,
                        other => return Err(format!("unknown --lang value: {other}")),
                    }
                }
                "--save" => save = Some(std::path::PathBuf::from(next_value(args, &mut i)?)),
                "--resume" => resume = Some(std::path::PathBuf::from(next_value(args, &mut i)?)),
                other => return Err(format!("unrecognized argument: {other}")),
            }
            i += 1;
        }

        let world_pack = world_pack.ok_or("--world-pack is required")?;

        Ok(Self {
            world_pack,
            session_id,
            player_name,
            lang,
            save,
            resume,
        })
    }
}

fn next_value(args: &[String], i: &mut usize) -> Result<String, String> {
    *i += 1;
    args.get(*i).cloned().ok_or_else(|| format!("missing value for {}", args[*i - 1]))
}

/// A [`SessionChannel`] over stdin/stdout: one JSON object per line in each
/// direction. `recv_line` is the driver-side read loop; `SessionChannel`
/// itself only needs `send`, since the Coordinator never calls `recv`
/// directly (the driver reads client messages and decides which
/// Coordinator method to call).
struct StdioChannel {
    stdout: AsyncMutex<tokio::io::Stdout>,
    stdin: AsyncMutex<BufReader<tokio::io::Stdin>>,
}

impl StdioChannel {
    fn new() -> Self {
        Self {
            stdout: AsyncMutex::new(tokio::io::stdout()),
            stdin: AsyncMutex::new(BufReader::new(tokio::io::stdin())),
        }
    }

    async fn recv_line(&self) -> Option<ClientMessage> {
        let mut line = String::new();
        let mut stdin = self.stdin.lock().await;
        loop {
            line.clear();
            match stdin.read_line(&mut line).await {
                Ok(0) => return None,
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<ClientMessage>(trimmed) {
                        Ok(msg) => return Some(msg),
                        Err(e) => {
                            tracing::warn!(error = %e, "dropping malformed input line");
                            continue;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "stdin read error");
                    return None;
                }
            }
        }
    }
}

#[async_trait]
impl SessionChannel for StdioChannel {
    async fn send(&self, message: ServerMessage) -> Result<(), astinus_core::channel::ChannelError> {
        let line = serde_json::to_string(&message).expect("ServerMessage always serializes");
        let mut stdout = self.stdout.lock().await;
        let _ = stdout.write_all(line.as_bytes()).await;
        let _ = stdout.write_all(b"\n").await;
        let _ = stdout.flush().await;
        Ok(())
    }

    async fn recv(&mut self) -> Option<ClientMessage> {
        self.recv_line().await
    }
}

fn print_help() {
    println!("astinus-cli - line-delimited-JSON session driver");
    println!();
    println!("USAGE:");
    println!("  astinus-cli --world-pack <FILE> [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help               Show this help message");
    println!("  --world-pack <FILE>      Path to a world-pack JSON file (required)");
    println!("  --session-id <ID>        Session id (default: a random uuid)");
    println!("  --player-name <NAME>     Player character name (default: the pack's first preset, or \"Adventurer\")");
    println!("  --lang <cn|en>           Session language (default: en)");
    println!("  --save <FILE>            Save the session to this JSON file on exit");
    println!("  --resume <FILE>          Resume a session previously written by --save");
    println!();
    println!("Reads one JSON `ClientMessage` per line on stdin, writes one JSON");
    println!("`ServerMessage` per line on stdout.");
}
