//! Queue of packets produced by one loop iteration, flushed by the network layer.

use shared::ServerPacket;
use std::net::SocketAddr;

/// A packet addressed to a single origin
#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub addr: SocketAddr,
    pub packet: ServerPacket,
}

/// Broadcasts are resolved to per-origin entries when queued, so the
/// recipients are the sessions alive at the moment the event happened.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: Vec<Outgoing>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, addr: SocketAddr, packet: ServerPacket) {
        self.queue.push(Outgoing { addr, packet });
    }

    pub fn drain(&mut self) -> Vec<Outgoing> {
        std::mem::take(&mut self.queue)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_queue() {
        let mut outbox = Outbox::new();
        let addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        outbox.send(addr, ServerPacket::Pong);
        outbox.send(addr, ServerPacket::Ping);
        assert_eq!(outbox.len(), 2);

        let drained = outbox.drain();
        assert_eq!(drained[0].packet, ServerPacket::Pong);
        assert_eq!(drained[1].packet, ServerPacket::Ping);
        assert!(outbox.is_empty());
    }
}
