use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use server::config::ServerConfig;
use server::map::MapBounds;
use server::network::Server;
use shared::DEFAULT_SERVER_PORT;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Authoritative UDP server for the seed-fight game
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Port to listen on
    #[arg(default_value_t = DEFAULT_SERVER_PORT)]
    port: u16,
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: IpAddr,
    /// Maximum number of concurrent players
    #[arg(short, long, default_value_t = 8)]
    max_players: usize,
    /// Seconds of silence before a client is dropped
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,
    /// Simulation steps per second
    #[arg(long, default_value_t = 60)]
    step_rate: u32,
    /// Broadcast ticks per second
    #[arg(long, default_value_t = 20)]
    tick_rate: u32,
    /// Map asset (JSON) defining the playable area
    #[arg(long)]
    map: Option<PathBuf>,
    /// Refuse joins from this address (repeatable)
    #[arg(long = "blacklist", value_name = "IP")]
    blacklist: Vec<IpAddr>,
    /// Seed for spawn positions and loot, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

/// Parses the command line, sets up logging and runs the server until Ctrl-C.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let map = match &args.map {
        Some(path) => MapBounds::load(path).unwrap_or_else(|e| {
            warn!("{}, falling back to the default map", e);
            MapBounds::default()
        }),
        None => MapBounds::default(),
    };

    let config = ServerConfig {
        max_players: args.max_players,
        timeout: Duration::from_secs(args.timeout_secs),
        blacklist: args.blacklist,
        rng_seed: args.seed,
        ..ServerConfig::default()
    }
    .with_rates(args.step_rate, args.tick_rate);

    info!(
        "Starting server: {} players max, {}Hz steps, {}Hz ticks, map {}x{}",
        config.max_players, args.step_rate, args.tick_rate, map.size.x, map.size.y
    );

    let mut server = Server::bind((args.host, args.port), config, map).await?;
    server.run().await?;

    info!("Server stopped");
    Ok(())
}
