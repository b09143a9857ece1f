use std::path::PathBuf;

use bytes::Bytes;
use clap::Parser;
use serde::Deserialize;

use entity_rewrite::{BackendInfo, Direction, EntityId, ProxySession, SessionConfig};

#[derive(Parser)]
#[command(name = "rewrite-trace")]
#[command(about = "Replay a scripted session through the entity rewriter and print every payload")]
struct Args {
    /// JSON script of spawns, despawns, switches and packets
    script: PathBuf,

    /// Session config (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the buffered debug records at the end
    #[arg(long)]
    records: bool,

    /// Print the rewrite strategy table and exit
    #[arg(long)]
    list: bool,
}

#[derive(Debug, Deserialize)]
struct Script {
    backend: BackendInfo,
    own_client_id: EntityId,
    own_backend_id: EntityId,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    Spawn { backend_id: EntityId },
    Despawn { backend_id: EntityId },
    Switch { backend: BackendInfo, own_backend_id: EntityId },
    Packet { direction: ScriptDirection, tag: u8, hex: String },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ScriptDirection {
    Clientbound,
    Serverbound,
}

impl From<ScriptDirection> for Direction {
    fn from(d: ScriptDirection) -> Self {
        match d {
            ScriptDirection::Clientbound => Direction::Clientbound,
            ScriptDirection::Serverbound => Direction::Serverbound,
        }
    }
}

fn hex_to_bytes(s: &str) -> Result<Vec<u8>, String> {
    let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if s.len() % 2 != 0 {
        return Err(format!("odd number of hex digits: {s}"));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| format!("{e} in {s}")))
        .collect()
}

fn bytes_to_hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SessionConfig::from_json_file(path)?,
        None => SessionConfig::default(),
    };

    let script: Script = serde_json::from_str(&std::fs::read_to_string(&args.script)?)?;
    let session = ProxySession::new(config, script.backend, script.own_client_id, script.own_backend_id)?;

    if args.list {
        for direction in [Direction::Clientbound, Direction::Serverbound] {
            for (id, strategy) in session.rewriter().strategies().iter(direction) {
                println!("{direction} 0x{:02x} {id:?}: {strategy:?}", id.tag());
            }
        }
        return Ok(());
    }

    for step in script.steps {
        match step {
            Step::Spawn { backend_id } => {
                let client_id = session.entity_spawned(backend_id);
                println!("spawn   {backend_id} -> {client_id}");
            }
            Step::Despawn { backend_id } => match session.entity_despawned(backend_id) {
                Some(client_id) => println!("despawn {backend_id} (was {client_id})"),
                None => println!("despawn {backend_id} (unknown)"),
            },
            Step::Switch { backend, own_backend_id } => {
                let name = backend.name.clone();
                let removed = session.switch_backend(backend, own_backend_id);
                println!("switch  -> {name} (own {own_backend_id}, dropped {removed})");
            }
            Step::Packet { direction, tag, hex } => {
                let payload = Bytes::from(hex_to_bytes(&hex)?);
                let direction = Direction::from(direction);
                let out = match direction {
                    Direction::Clientbound => session.rewrite_outbound(tag, payload.clone()),
                    Direction::Serverbound => session.rewrite_inbound(tag, payload.clone()),
                };
                let marker = if out == payload { "=" } else { "*" };
                println!(
                    "{marker} {direction} 0x{tag:02x} {} -> {}",
                    bytes_to_hex(&payload),
                    bytes_to_hex(&out)
                );
            }
        }
    }

    if args.records {
        for record in session.debugger().records() {
            println!("{record:?}");
        }
    }

    Ok(())
}
