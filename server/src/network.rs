//! Server network layer: UDP socket, frame loop and shutdown

use crate::config::ServerConfig;
use crate::game::GameServer;
use crate::map::MapBounds;
use crate::outbox::Outgoing;
use log::{debug, error, info, warn};
use shared::MAX_PACKET_SIZE;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::net::{ToSocketAddrs, UdpSocket};

/// Owns the socket and drives a [`GameServer`] from wall-clock time
pub struct Server {
    socket: UdpSocket,
    game: GameServer,
    buffer: Vec<u8>,
}

impl Server {
    pub async fn bind<A: ToSocketAddrs>(
        addr: A,
        config: ServerConfig,
        map: MapBounds,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind(addr).await?;
        info!("Server listening on {}", socket.local_addr()?);

        Ok(Server {
            socket,
            game: GameServer::new(config, map),
            // Larger than any valid packet so oversized datagrams are seen and rejected
            buffer: vec![0u8; MAX_PACKET_SIZE * 2],
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn game(&self) -> &GameServer {
        &self.game
    }

    /// Reads every datagram currently queued on the socket without blocking.
    fn drain_socket(&mut self) -> usize {
        let mut received = 0;
        loop {
            match self.socket.try_recv_from(&mut self.buffer) {
                Ok((len, addr)) => {
                    received += 1;
                    self.game.handle_datagram(&self.buffer[..len], addr);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    // ICMP port-unreachable from a departed client surfaces here on some platforms
                    debug!("Error receiving packet: {}", e);
                    break;
                }
            }
        }
        received
    }

    /// Encodes and sends everything the game queued. Never blocks.
    fn flush(&mut self) {
        for Outgoing { addr, packet } in self.game.drain_outgoing() {
            let data = match packet.encode() {
                Ok(data) => data,
                Err(e) => {
                    error!("Failed to encode {:?}: {}", packet.id(), e);
                    continue;
                }
            };

            match self.socket.try_send_to(&data, addr) {
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    warn!("Send buffer full, dropped {:?} to {}", packet.id(), addr);
                }
                Err(e) => error!("Failed to send {:?} to {}: {}", packet.id(), addr, e),
            }
        }
    }

    /// Runs the frame loop until `shutdown` resolves, then notifies every session.
    pub async fn run_until<F: Future<Output = ()>>(&mut self, shutdown: F) -> io::Result<()> {
        tokio::pin!(shutdown);
        let sleep_time = self.game.config().sleep_time;
        let mut last_frame = Instant::now();

        info!("Server started on {}", self.socket.local_addr()?);

        loop {
            let received = self.drain_socket();

            let now = Instant::now();
            self.game.advance(now.duration_since(last_frame));
            last_frame = now;

            self.flush();

            if received > 0 {
                // More datagrams may have arrived while processing
                continue;
            }

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Server shutting down");
                    break;
                }
                readable = self.socket.readable() => {
                    if let Err(e) = readable {
                        error!("Socket error: {}", e);
                    }
                }
                _ = tokio::time::sleep(sleep_time) => {}
            }
        }

        self.stop().await;
        Ok(())
    }

    /// Runs until Ctrl-C.
    pub async fn run(&mut self) -> io::Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
            }
        })
        .await
    }

    /// Flushes pending packets and sends `Stopping` to every session.
    async fn stop(&mut self) {
        self.flush();

        let stopping = self.game.stopping_packets();
        let count = stopping.len();
        for Outgoing { addr, packet } in stopping {
            let data = match packet.encode() {
                Ok(data) => data,
                Err(e) => {
                    error!("Failed to encode {:?}: {}", packet.id(), e);
                    continue;
                }
            };
            if let Err(e) = self.socket.send_to(&data, addr).await {
                error!("Failed to notify {} of shutdown: {}", addr, e);
            }
        }
        info!("Notified {} clients of shutdown", count);
    }
}
