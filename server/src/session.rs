//! Session registry: who is connected, from where, and for how long they have been silent
//!
//! A session is keyed by its network origin. The public client id is derived
//! from that origin with [`generate_client_id`], which lets the server
//! re-identify a sender without any handshake token and reject packets that
//! claim somebody else's id.

use crate::outbox::Outbox;
use log::{debug, info};
use shared::{Chicken, RejectReason, ServerPacket};
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Derives the public client id from a network origin.
///
/// CRC32 of the textual IP address, hash-combined with the port.
pub fn generate_client_id(addr: &SocketAddr) -> u32 {
    let address_hash = crc32fast::hash(addr.ip().to_string().as_bytes());
    combine_hash(address_hash, u32::from(addr.port()))
}

fn combine_hash(seed: u32, value: u32) -> u32 {
    seed ^ value
        .wrapping_add(0x9e37_79b9)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

/// Lightweight anti-spoofing check run on every game-affecting packet.
pub fn is_client_id_assigned_to_origin(client_id: u32, addr: &SocketAddr) -> bool {
    client_id == generate_client_id(addr)
}

/// Server-side record of one connected client
#[derive(Debug, Clone)]
pub struct Session {
    pub client_id: u32,
    pub addr: SocketAddr,
    /// Time since the last datagram from `addr`
    pub last_packet_time: Duration,
    pub nickname: String,
    pub chicken: Chicken,
    /// Time since this chicken last fired
    pub attack_cooldown: Duration,
    /// Chicken changed since the last broadcast
    pub dirty: bool,
    /// A keep-alive ping went out during the current silence
    pub pinged: bool,
}

impl Session {
    /// Creates a session for a freshly admitted client.
    ///
    /// # Arguments
    /// * `client_id` - Id derived from `addr`
    /// * `addr` - The client's socket address
    /// * `chicken` - The spawned avatar
    ///
    /// The chicken starts dirty so its first state goes out on the next tick.
    pub fn new(client_id: u32, addr: SocketAddr, chicken: Chicken) -> Self {
        Self {
            client_id,
            addr,
            last_packet_time: Duration::ZERO,
            nickname: format!("Player{}", client_id),
            chicken,
            attack_cooldown: Duration::ZERO,
            dirty: true,
            pinged: false,
        }
    }

    /// Returns true if the client has been silent for longer than `timeout`
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_packet_time > timeout
    }
}

/// All live sessions, in join order
pub struct SessionRegistry {
    sessions: Vec<Session>,
    max_players: usize,
    timeout: Duration,
    blacklist: HashSet<IpAddr>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    ///
    /// # Arguments
    /// * `max_players` - Sessions admitted at most
    /// * `timeout` - Silence after which a session is evicted
    /// * `blacklist` - Addresses that are always rejected
    pub fn new(max_players: usize, timeout: Duration, blacklist: &[IpAddr]) -> Self {
        Self {
            sessions: Vec::new(),
            max_players,
            timeout,
            blacklist: blacklist.iter().copied().collect(),
        }
    }

    /// Decides whether `addr` may join, returning the client id it would get.
    ///
    /// Capacity is checked before the denylist, and both before duplicates,
    /// so a full server answers `TooManyPlayers` even to a known origin.
    pub fn check_join(&self, addr: &SocketAddr) -> Result<u32, RejectReason> {
        if self.sessions.len() >= self.max_players {
            return Err(RejectReason::TooManyPlayers);
        }
        if self.blacklist.contains(&addr.ip()) {
            return Err(RejectReason::Blacklisted);
        }
        let client_id = generate_client_id(addr);
        if self.find_by_addr(addr).is_some() || self.get(client_id).is_some() {
            return Err(RejectReason::UnknownError);
        }
        Ok(client_id)
    }

    /// Adds a session previously admitted by [`check_join`](Self::check_join).
    pub fn insert(&mut self, session: Session) {
        info!(
            "Client {} joined from {} as {}",
            session.client_id, session.addr, session.nickname
        );
        self.sessions.push(session);
    }

    /// Removes the session owned by `addr`, if any.
    pub fn remove_by_addr(&mut self, addr: &SocketAddr) -> Option<Session> {
        let index = self.sessions.iter().position(|s| s.addr == *addr)?;
        let session = self.sessions.remove(index);
        info!("Client {} left from {}", session.client_id, session.addr);
        Some(session)
    }

    /// Resets the silence timer of the session owned by `addr`.
    ///
    /// Returns false for unknown origins.
    pub fn touch(&mut self, addr: &SocketAddr) -> bool {
        match self.find_by_addr_mut(addr) {
            Some(session) => {
                session.last_packet_time = Duration::ZERO;
                session.pinged = false;
                true
            }
            None => false,
        }
    }

    /// Ages every session by `dt` and evicts the ones silent for too long.
    ///
    /// Each evicted origin is told `ConnectionRejected{Timeout}` and the
    /// remaining sessions get `ClientLeft`. Sessions silent for more than
    /// half the timeout receive a single keep-alive `Ping`.
    pub fn evict_timed_out(&mut self, dt: Duration, outbox: &mut Outbox) -> Vec<u32> {
        for session in &mut self.sessions {
            session.last_packet_time += dt;
        }

        let timeout = self.timeout;
        let (expired, alive): (Vec<Session>, Vec<Session>) = std::mem::take(&mut self.sessions)
            .into_iter()
            .partition(|s| s.is_timed_out(timeout));
        self.sessions = alive;

        for session in &expired {
            info!(
                "Client {} from {} timed out after {:?}",
                session.client_id, session.addr, session.last_packet_time
            );
            outbox.send(
                session.addr,
                ServerPacket::ConnectionRejected {
                    reason: RejectReason::Timeout,
                },
            );
            self.broadcast(
                outbox,
                ServerPacket::ClientLeft {
                    client_id: session.client_id,
                },
            );
        }

        let keep_alive_after = timeout / 2;
        for session in &mut self.sessions {
            if !session.pinged && session.last_packet_time > keep_alive_after {
                debug!("Pinging silent client {}", session.client_id);
                outbox.send(session.addr, ServerPacket::Ping);
                session.pinged = true;
            }
        }

        expired.into_iter().map(|s| s.client_id).collect()
    }

    /// Queues `packet` for every live session.
    pub fn broadcast(&self, outbox: &mut Outbox, packet: ServerPacket) {
        for session in &self.sessions {
            outbox.send(session.addr, packet.clone());
        }
    }

    /// Finds the session bound to a socket address.
    ///
    /// # Arguments
    /// * `addr` - The origin a datagram came from
    pub fn find_by_addr(&self, addr: &SocketAddr) -> Option<&Session> {
        self.sessions.iter().find(|s| s.addr == *addr)
    }

    /// Mutable counterpart of [`find_by_addr`](Self::find_by_addr).
    pub fn find_by_addr_mut(&mut self, addr: &SocketAddr) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.addr == *addr)
    }

    /// Finds a session by client id.
    ///
    /// # Arguments
    /// * `client_id` - Id derived from the session's origin
    pub fn get(&self, client_id: u32) -> Option<&Session> {
        self.sessions.iter().find(|s| s.client_id == client_id)
    }

    /// Mutable counterpart of [`get`](Self::get).
    pub fn get_mut(&mut self, client_id: u32) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.client_id == client_id)
    }

    /// Returns all live sessions in join order.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Returns all live sessions in join order, mutably.
    ///
    /// The slice cannot grow or shrink, so admission stays with
    /// [`insert`](Self::insert) and the removal methods.
    pub fn sessions_mut(&mut self) -> &mut [Session] {
        &mut self.sessions
    }

    /// Returns the number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true when nobody is connected
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
