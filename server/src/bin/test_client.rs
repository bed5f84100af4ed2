//! Headless bot that joins a server, follows its own chicken with seeds and leaves.

use clap::Parser;
use env_logger::Env;
use log::{debug, info, warn};
use rand::Rng;
use shared::{ClientPacket, ServerPacket, Vector2, DEFAULT_SERVER_PORT, MAX_PACKET_SIZE};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, sleep, timeout, Instant};

#[derive(Parser, Debug)]
#[command(about = "Seed-fight test client")]
struct Args {
    /// Server address
    #[arg(default_value_t = SocketAddr::from(([127, 0, 0, 1], DEFAULT_SERVER_PORT)))]
    server: SocketAddr,
    /// How long to stay connected, in seconds
    #[arg(short, long, default_value_t = 30)]
    duration: u64,
    /// Milliseconds between two dropped seeds
    #[arg(long, default_value_t = 1500)]
    seed_interval: u64,
}

async fn send(socket: &UdpSocket, server: SocketAddr, packet: &ClientPacket) -> std::io::Result<()> {
    match packet.encode() {
        Ok(data) => {
            socket.send_to(&data, server).await?;
        }
        Err(e) => warn!("Failed to encode {:?}: {}", packet.id(), e),
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    info!("Client socket bound to {}", socket.local_addr()?);

    send(&socket, args.server, &ClientPacket::Join).await?;
    info!("Sent join to {}", args.server);

    let mut buf = [0u8; MAX_PACKET_SIZE];
    let (len, _) = timeout(Duration::from_secs(5), socket.recv_from(&mut buf)).await??;
    let client_id = match ServerPacket::decode(&buf[..len])? {
        ServerPacket::ConnectionAccepted { client_id } => client_id,
        ServerPacket::ConnectionRejected { reason } => {
            warn!("Join rejected: {:?}", reason);
            return Ok(());
        }
        other => {
            warn!("Expected ConnectionAccepted but got {:?}", other);
            return Ok(());
        }
    };
    info!("Joined as client {}", client_id);

    let mut rng = rand::thread_rng();
    let mut map_size = Vector2::new(shared::DEFAULT_MAP_SIZE, shared::DEFAULT_MAP_SIZE);
    let mut position = None;
    let mut seed_timer = interval(Duration::from_millis(args.seed_interval));
    let deadline = Instant::now() + Duration::from_secs(args.duration);

    loop {
        tokio::select! {
            _ = sleep(deadline.saturating_duration_since(Instant::now())) => break,
            _ = seed_timer.tick() => {
                // Drop the seed a little ahead of wherever the chicken is
                let center = position.unwrap_or_else(|| map_size.scale(0.5));
                let offset = Vector2::polar(rng.gen_range(0.0..360.0)).scale(rng.gen_range(40.0..120.0));
                let target = center.add(&offset);
                let target = Vector2::new(
                    target.x.clamp(0.0, map_size.x),
                    target.y.clamp(0.0, map_size.y),
                );
                send(&socket, args.server, &ClientPacket::DropSeed { client_id, position: target }).await?;
                debug!("Dropped seed at ({:.0}, {:.0})", target.x, target.y);
            }
            received = socket.recv_from(&mut buf) => {
                let (len, _) = received?;
                match ServerPacket::decode(&buf[..len]) {
                    Ok(ServerPacket::Ping) => send(&socket, args.server, &ClientPacket::Pong).await?,
                    Ok(ServerPacket::ServerInfo { map_size: size }) => map_size = size,
                    Ok(ServerPacket::UpdateChicken { client_id: id, chicken }) if id == client_id => {
                        position = Some(chicken.position);
                    }
                    Ok(ServerPacket::RespawnChicken { client_id: id, position: spawn }) if id == client_id => {
                        info!("Respawned at ({:.0}, {:.0})", spawn.x, spawn.y);
                        position = Some(spawn);
                    }
                    Ok(ServerPacket::KillChicken { client_id: id, killer_client_id }) if id == client_id => {
                        info!("Killed by {}", killer_client_id);
                    }
                    Ok(ServerPacket::ConnectionRejected { reason }) => {
                        warn!("Dropped by server: {:?}", reason);
                        return Ok(());
                    }
                    Ok(ServerPacket::Stopping) => {
                        info!("Server is stopping");
                        return Ok(());
                    }
                    Ok(other) => debug!("{:?}", other),
                    Err(e) => warn!("Failed to decode server packet: {}", e),
                }
            }
        }
    }

    send(&socket, args.server, &ClientPacket::Leave).await?;
    info!("Test client finished");
    Ok(())
}
