//! Authoritative game context: sessions, world, simulation and scheduling in one place.
//!
//! [`GameServer`] never touches a socket. Datagrams go in through
//! [`GameServer::handle_datagram`], time goes in through [`GameServer::advance`],
//! and every reply or broadcast is queued until the network layer drains it
//! with [`GameServer::drain_outgoing`].

use crate::config::ServerConfig;
use crate::map::MapBounds;
use crate::outbox::{Outbox, Outgoing};
use crate::scheduler::Scheduler;
use crate::session::{is_client_id_assigned_to_origin, Session, SessionRegistry};
use crate::simulation::Simulation;
use crate::world::World;
use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{Chicken, ClientPacket, ServerPacket, Vector2, NO_CLIENT};
use std::net::SocketAddr;
use std::time::Duration;

pub struct GameServer {
    config: ServerConfig,
    sessions: SessionRegistry,
    world: World,
    simulation: Simulation,
    scheduler: Scheduler,
    outbox: Outbox,
    rng: StdRng,
    steps: u64,
    ticks: u64,
}

impl GameServer {
    pub fn new(config: ServerConfig, map: MapBounds) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            sessions: SessionRegistry::new(config.max_players, config.timeout, &config.blacklist),
            world: World::new(map),
            simulation: Simulation::new(config.gameplay.clone()),
            scheduler: Scheduler::new(
                config.step_interval,
                config.tick_interval,
                config.max_frame_time,
            ),
            outbox: Outbox::new(),
            rng,
            steps: 0,
            ticks: 0,
            config,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn sessions_mut(&mut self) -> &mut SessionRegistry {
        &mut self.sessions
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Number of simulation steps and broadcast ticks run so far
    pub fn counters(&self) -> (u64, u64) {
        (self.steps, self.ticks)
    }

    /// Entry point for one raw datagram.
    pub fn handle_datagram(&mut self, bytes: &[u8], addr: SocketAddr) {
        // Any traffic from a known origin keeps its session alive, even garbage
        self.sessions.touch(&addr);

        match ClientPacket::decode(bytes) {
            Ok(packet) => {
                trace!("Received {:?} from {}", packet.id(), addr);
                self.handle_packet(packet, addr);
            }
            Err(e) => warn!("Discarding datagram from {}: {}", addr, e),
        }
    }

    /// Processes one decoded client packet
    pub fn handle_packet(&mut self, packet: ClientPacket, addr: SocketAddr) {
        match packet {
            ClientPacket::Ping => self.outbox.send(addr, ServerPacket::Pong),
            ClientPacket::Pong => debug!("Pong from {}", addr),
            ClientPacket::Join => self.handle_join(addr),
            ClientPacket::Leave => self.handle_leave(addr),
            ClientPacket::DropSeed {
                client_id,
                position,
            } => self.handle_drop_seed(client_id, position, addr),
        }
    }

    fn handle_join(&mut self, addr: SocketAddr) {
        let client_id = match self.sessions.check_join(&addr) {
            Ok(client_id) => client_id,
            Err(reason) => {
                info!("Rejected join from {}: {:?}", addr, reason);
                self.outbox
                    .send(addr, ServerPacket::ConnectionRejected { reason });
                return;
            }
        };

        let chicken = Chicken::new(self.world.random_position(&mut self.rng));
        let session = Session::new(client_id, addr, chicken);

        self.outbox
            .send(addr, ServerPacket::ConnectionAccepted { client_id });
        self.outbox.send(
            addr,
            ServerPacket::ServerInfo {
                map_size: self.world.map.size,
            },
        );
        for other in self.sessions.sessions() {
            self.outbox.send(
                addr,
                ServerPacket::PlayerInfo {
                    client_id: other.client_id,
                    nickname: other.nickname.clone(),
                    chicken: other.chicken,
                },
            );
        }
        for item in &self.world.items {
            self.outbox.send(addr, ServerPacket::ItemInfo { item: *item });
        }
        for live in &self.world.seeds {
            self.outbox.send(addr, ServerPacket::AddSeed { seed: live.seed });
        }

        let joined = ServerPacket::ClientJoined {
            client_id,
            nickname: session.nickname.clone(),
            chicken,
        };
        self.sessions.insert(session);
        self.sessions.broadcast(&mut self.outbox, joined);
    }

    fn handle_leave(&mut self, addr: SocketAddr) {
        match self.sessions.remove_by_addr(&addr) {
            Some(session) => {
                self.sessions.broadcast(
                    &mut self.outbox,
                    ServerPacket::ClientLeft {
                        client_id: session.client_id,
                    },
                );
            }
            None => warn!("Leave from unknown origin {}", addr),
        }
    }

    fn handle_drop_seed(&mut self, client_id: u32, position: Vector2, addr: SocketAddr) {
        if !is_client_id_assigned_to_origin(client_id, &addr) {
            warn!("Client id {} does not belong to {}, dropping seed", client_id, addr);
            return;
        }
        if self.sessions.get(client_id).is_none() {
            warn!("Seed from {} without a session", addr);
            return;
        }
        if !self.world.map.contains(position) {
            warn!(
                "Seed from {} outside the map at ({}, {})",
                client_id, position.x, position.y
            );
            return;
        }

        let (evicted, seed) = self.world.drop_seed(client_id, position);
        if let Some(old) = evicted {
            self.sessions.broadcast(
                &mut self.outbox,
                ServerPacket::RemoveSeed {
                    seed_uid: old.uid,
                    eaten: false,
                    eater_client_id: NO_CLIENT,
                },
            );
        }
        self.sessions
            .broadcast(&mut self.outbox, ServerPacket::AddSeed { seed });
    }

    /// Feeds wall-clock time and runs every step and tick that became due.
    pub fn advance(&mut self, dt: Duration) {
        self.scheduler.accumulate(dt);
        while self.scheduler.step.consume() {
            self.step();
        }
        while self.scheduler.tick.consume() {
            self.tick();
        }
    }

    /// One simulation step. Skipped while nobody is connected.
    pub fn step(&mut self) {
        self.steps += 1;
        if self.sessions.is_empty() {
            return;
        }
        self.simulation.step(
            &mut self.sessions,
            &mut self.world,
            &mut self.outbox,
            &mut self.rng,
            self.config.step_interval,
        );
    }

    /// One broadcast tick: dirty chickens go out, silent sessions are evicted.
    pub fn tick(&mut self) {
        self.ticks += 1;

        let updates: Vec<ServerPacket> = self
            .sessions
            .sessions_mut()
            .iter_mut()
            .filter(|session| session.dirty)
            .map(|session| {
                session.dirty = false;
                ServerPacket::UpdateChicken {
                    client_id: session.client_id,
                    chicken: session.chicken,
                }
            })
            .collect();
        for packet in updates {
            self.sessions.broadcast(&mut self.outbox, packet);
        }

        let evicted = self
            .sessions
            .evict_timed_out(self.config.tick_interval, &mut self.outbox);
        if !evicted.is_empty() {
            debug!("Tick {}: evicted {:?}", self.ticks, evicted);
        }
    }

    /// Everything queued since the last call, in queue order.
    pub fn drain_outgoing(&mut self) -> Vec<Outgoing> {
        self.outbox.drain()
    }

    /// One `Stopping` per live session.
    pub fn stopping_packets(&self) -> Vec<Outgoing> {
        self.sessions
            .sessions()
            .iter()
            .map(|session| Outgoing {
                addr: session.addr,
                packet: ServerPacket::Stopping,
            })
            .collect()
    }
}
