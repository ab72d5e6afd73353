use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::prelude::*;

use emote_relay::config::load_config;
use emote_relay::{
    Connection, Entity, FileConfig, FormResponse, LoggingServices, PlatformType, Relay,
    RelayConfig, SessionInit, UpstreamPacket, WorkaroundMode,
};

#[derive(Parser)]
#[command(name = "emote-relay")]
#[command(about = "Emote workaround and fan-out core for a Bedrock client bridge")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to emote_relay.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved configuration as TOML
    Config,

    /// Run an in-process relay, emote once and show what each client got
    Simulate(SimulateArgs),
}

#[derive(Parser)]
struct SimulateArgs {
    /// Number of connected sessions (the first one emotes)
    #[arg(short, long, default_value = "3")]
    sessions: usize,

    /// Emote id to perform
    #[arg(short, long, default_value = "wave")]
    emote: String,

    /// Disconnect the K-th session (1-based) before emoting
    #[arg(long)]
    close: Option<usize>,

    /// Override the configured offhand workaround
    #[arg(short, long)]
    workaround: Option<WorkaroundMode>,

    /// Override the configured deployment platform
    #[arg(long)]
    platform: Option<PlatformType>,

    /// Button to press if the emote menu is shown
    #[arg(long, default_value = "0")]
    choose: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_directive = if cli.debug {
        "emote_relay=debug,info"
    } else {
        "emote_relay=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();

    let file_config: FileConfig = load_config(cli.config.as_deref())
        .extract()
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Config => {
            let text =
                toml::to_string_pretty(&file_config).context("Failed to render configuration")?;
            print!("{}", text);
            Ok(())
        }
        Commands::Simulate(args) => simulate(RelayConfig::from_file(&file_config), args).await,
    }
}

async fn simulate(mut config: RelayConfig, args: SimulateArgs) -> Result<()> {
    check_session_args(args.sessions, args.close)?;
    if let Some(workaround) = args.workaround {
        config.workaround = workaround;
    }
    if let Some(platform) = args.platform {
        config.platform = platform;
    }

    info!(
        sessions = args.sessions,
        workaround = %config.workaround,
        "Starting simulation"
    );
    let relay = Relay::new(config, Arc::new(LoggingServices));

    let mut connections: Vec<Connection> = Vec::with_capacity(args.sessions);
    for i in 0..args.sessions {
        let java_id = i32::try_from(i + 1).context("too many sessions")?;
        let conn = relay
            .connect(SessionInit::new(format!("xuid-{}", i + 1), java_id, 1))
            .await;
        connections.push(conn);
    }

    // Every client sees every other player.
    for (i, conn) in connections.iter().enumerate() {
        for j in 0..args.sessions {
            if i != j {
                let java_id = i32::try_from(j + 1)?;
                conn.handle
                    .spawn_entity(Entity::player(java_id, 100 + j as u64))
                    .await?;
            }
        }
    }

    if let Some(k) = args.close {
        relay.disconnect(connections[k - 1].handle.id()).await;
    }

    let emitter = connections[0].handle.clone();
    emitter
        .emote(args.emote.as_str())
        .await
        .context("Emitter cannot emote")?;
    emitter.info().await?;

    // Answer the menu, if one came up.
    let mut emitter_packets = drain(&mut connections[0]);
    if let Some(form_id) = emitter_packets.iter().find_map(|p| match p {
        UpstreamPacket::ModalForm { form_id, .. } => Some(*form_id),
        _ => None,
    }) {
        emitter
            .form_response(form_id, FormResponse::Button(args.choose))
            .await?;
        emitter.info().await?;
        emitter_packets.extend(drain(&mut connections[0]));
    }

    let mut received = vec![emitter_packets];
    for conn in connections.iter_mut().skip(1) {
        if !conn.handle.is_closed() {
            conn.handle.info().await?;
        }
        received.push(drain(conn));
    }

    for (conn, packets) in connections.iter().zip(&received) {
        println!("{} ({} packets)", conn.handle.id(), packets.len());
        for packet in packets {
            println!("  {}", serde_json::to_string(packet)?);
        }
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&relay.metrics().snapshot())?
    );

    relay.shutdown().await;
    Ok(())
}

/// The first session emotes, so only a later one may be closed.
fn check_session_args(sessions: usize, close: Option<usize>) -> Result<()> {
    if sessions == 0 {
        bail!("--sessions must be at least 1");
    }
    if let Some(k) = close {
        if k < 2 || k > sessions {
            bail!(
                "--close {} must name a session other than the emitter (2..={})",
                k,
                sessions
            );
        }
    }
    Ok(())
}

fn drain(conn: &mut Connection) -> Vec<UpstreamPacket> {
    let mut packets = Vec::new();
    while let Ok(packet) = conn.upstream.try_recv() {
        packets.push(packet);
    }
    packets
}
