//! Datagram layout shared by client and server.
//!
//! Every datagram is `[packet id: u8][body]`. The body is the packet's fields in
//! declaration order, fixed-width little-endian: `u32`/`f32` take 4 bytes, `bool`
//! one byte, strings a `u64` length followed by UTF-8 bytes, and enums their
//! `u32` index.

use crate::item::ItemId;
use crate::math::Vector2;
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on a datagram, applied to both encode and decode.
pub const MAX_PACKET_SIZE: usize = 1024;

/// Placed in `eater_client_id` / `picker_client_id` when nobody ate or picked.
pub const NO_CLIENT: u32 = 0;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("empty datagram")]
    Empty,
    #[error("unknown packet id {0}")]
    UnknownPacketId(u8),
    #[error("malformed body for packet id {id}: {source}")]
    Malformed { id: u8, source: bincode::Error },
}

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_PACKET_SIZE as u64)
        .reject_trailing_bytes()
}

fn body<T: DeserializeOwned>(id: u8, bytes: &[u8]) -> Result<T, DecodeError> {
    options()
        .deserialize(bytes)
        .map_err(|source| DecodeError::Malformed { id, source })
}

fn split_id(bytes: &[u8]) -> Result<(u8, &[u8]), DecodeError> {
    bytes
        .split_first()
        .map(|(id, rest)| (*id, rest))
        .ok_or(DecodeError::Empty)
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientPacketId {
    Ping = 0,
    Pong,
    Join,
    Leave,
    DropSeed,
}

impl ClientPacketId {
    const ALL: [ClientPacketId; 5] = [
        ClientPacketId::Ping,
        ClientPacketId::Pong,
        ClientPacketId::Join,
        ClientPacketId::Leave,
        ClientPacketId::DropSeed,
    ];

    /// Every valid id is strictly below this.
    pub const COUNT: u8 = Self::ALL.len() as u8;
}

impl TryFrom<u8> for ClientPacketId {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(DecodeError::UnknownPacketId(value))
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerPacketId {
    Ping = 0,
    Pong,
    ConnectionAccepted,
    ConnectionRejected,
    ClientJoined,
    ClientLeft,
    Stopping,
    ServerInfo,
    PlayerInfo,
    ItemInfo,
    UpdateChicken,
    AddSeed,
    RemoveSeed,
    AddItem,
    RemoveItem,
    ShootBullet,
    HitChicken,
    KillChicken,
    RespawnChicken,
}

impl ServerPacketId {
    const ALL: [ServerPacketId; 19] = [
        ServerPacketId::Ping,
        ServerPacketId::Pong,
        ServerPacketId::ConnectionAccepted,
        ServerPacketId::ConnectionRejected,
        ServerPacketId::ClientJoined,
        ServerPacketId::ClientLeft,
        ServerPacketId::Stopping,
        ServerPacketId::ServerInfo,
        ServerPacketId::PlayerInfo,
        ServerPacketId::ItemInfo,
        ServerPacketId::UpdateChicken,
        ServerPacketId::AddSeed,
        ServerPacketId::RemoveSeed,
        ServerPacketId::AddItem,
        ServerPacketId::RemoveItem,
        ServerPacketId::ShootBullet,
        ServerPacketId::HitChicken,
        ServerPacketId::KillChicken,
        ServerPacketId::RespawnChicken,
    ];

    /// Every valid id is strictly below this.
    pub const COUNT: u8 = Self::ALL.len() as u8;
}

impl TryFrom<u8> for ServerPacketId {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(DecodeError::UnknownPacketId(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    UnknownError,
    TooManyPlayers,
    Blacklisted,
    Kicked,
    Timeout,
    Banned,
}

/// Authoritative avatar state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Chicken {
    pub position: Vector2,
    /// Facing in degrees, kept in `[0, 360)`.
    pub rotation: f32,
    pub item_id: ItemId,
    pub life_max: f32,
    pub life: f32,
    pub speed: f32,
    pub attack: f32,
}

impl Chicken {
    /// A fresh chicken with default stats and no weapon.
    pub fn new(position: Vector2) -> Self {
        Self {
            position,
            rotation: 0.0,
            item_id: ItemId::None,
            life_max: crate::DEFAULT_CHICKEN_LIFE,
            life: crate::DEFAULT_CHICKEN_LIFE,
            speed: crate::DEFAULT_CHICKEN_SPEED,
            attack: crate::DEFAULT_CHICKEN_ATTACK,
        }
    }

    pub fn forward(&self) -> Vector2 {
        Vector2::polar(self.rotation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Seed {
    pub uid: u32,
    pub position: Vector2,
    pub owner_client_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub uid: u32,
    pub item_id: ItemId,
    pub position: Vector2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub uid: u32,
    pub position: Vector2,
    pub rotation: f32,
    pub owner_client_id: u32,
    pub item_id: ItemId,
    pub remaining_distance: f32,
}

/// Client -> Server
#[derive(Debug, Clone, PartialEq)]
pub enum ClientPacket {
    /// "Send me back a Pong"
    Ping,
    /// Answer to a server Ping
    Pong,
    Join,
    Leave,
    /// `client_id` must match the id derived from the sender's origin.
    DropSeed { client_id: u32, position: Vector2 },
}

impl ClientPacket {
    pub fn id(&self) -> ClientPacketId {
        match self {
            ClientPacket::Ping => ClientPacketId::Ping,
            ClientPacket::Pong => ClientPacketId::Pong,
            ClientPacket::Join => ClientPacketId::Join,
            ClientPacket::Leave => ClientPacketId::Leave,
            ClientPacket::DropSeed { .. } => ClientPacketId::DropSeed,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        let mut buf = vec![self.id() as u8];
        match self {
            ClientPacket::Ping | ClientPacket::Pong | ClientPacket::Join | ClientPacket::Leave => {}
            ClientPacket::DropSeed {
                client_id,
                position,
            } => options().serialize_into(&mut buf, &(client_id, position))?,
        }
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let (raw, rest) = split_id(bytes)?;
        let packet = match ClientPacketId::try_from(raw)? {
            ClientPacketId::Ping => body::<()>(raw, rest).map(|_| ClientPacket::Ping)?,
            ClientPacketId::Pong => body::<()>(raw, rest).map(|_| ClientPacket::Pong)?,
            ClientPacketId::Join => body::<()>(raw, rest).map(|_| ClientPacket::Join)?,
            ClientPacketId::Leave => body::<()>(raw, rest).map(|_| ClientPacket::Leave)?,
            ClientPacketId::DropSeed => {
                let (client_id, position) = body(raw, rest)?;
                ClientPacket::DropSeed {
                    client_id,
                    position,
                }
            }
        };
        Ok(packet)
    }
}

/// Server -> Client
#[derive(Debug, Clone, PartialEq)]
pub enum ServerPacket {
    Ping,
    Pong,
    ConnectionAccepted {
        client_id: u32,
    },
    ConnectionRejected {
        reason: RejectReason,
    },
    ClientJoined {
        client_id: u32,
        nickname: String,
        chicken: Chicken,
    },
    ClientLeft {
        client_id: u32,
    },
    Stopping,
    ServerInfo {
        map_size: Vector2,
    },
    PlayerInfo {
        client_id: u32,
        nickname: String,
        chicken: Chicken,
    },
    ItemInfo {
        item: Item,
    },
    UpdateChicken {
        client_id: u32,
        chicken: Chicken,
    },
    AddSeed {
        seed: Seed,
    },
    RemoveSeed {
        seed_uid: u32,
        eaten: bool,
        eater_client_id: u32,
    },
    AddItem {
        item: Item,
    },
    RemoveItem {
        item_uid: u32,
        picked_up: bool,
        picker_client_id: u32,
    },
    ShootBullet {
        bullet: Bullet,
    },
    HitChicken {
        client_id: u32,
        killer_client_id: u32,
    },
    KillChicken {
        client_id: u32,
        killer_client_id: u32,
    },
    RespawnChicken {
        client_id: u32,
        position: Vector2,
    },
}

impl ServerPacket {
    pub fn id(&self) -> ServerPacketId {
        match self {
            ServerPacket::Ping => ServerPacketId::Ping,
            ServerPacket::Pong => ServerPacketId::Pong,
            ServerPacket::ConnectionAccepted { .. } => ServerPacketId::ConnectionAccepted,
            ServerPacket::ConnectionRejected { .. } => ServerPacketId::ConnectionRejected,
            ServerPacket::ClientJoined { .. } => ServerPacketId::ClientJoined,
            ServerPacket::ClientLeft { .. } => ServerPacketId::ClientLeft,
            ServerPacket::Stopping => ServerPacketId::Stopping,
            ServerPacket::ServerInfo { .. } => ServerPacketId::ServerInfo,
            ServerPacket::PlayerInfo { .. } => ServerPacketId::PlayerInfo,
            ServerPacket::ItemInfo { .. } => ServerPacketId::ItemInfo,
            ServerPacket::UpdateChicken { .. } => ServerPacketId::UpdateChicken,
            ServerPacket::AddSeed { .. } => ServerPacketId::AddSeed,
            ServerPacket::RemoveSeed { .. } => ServerPacketId::RemoveSeed,
            ServerPacket::AddItem { .. } => ServerPacketId::AddItem,
            ServerPacket::RemoveItem { .. } => ServerPacketId::RemoveItem,
            ServerPacket::ShootBullet { .. } => ServerPacketId::ShootBullet,
            ServerPacket::HitChicken { .. } => ServerPacketId::HitChicken,
            ServerPacket::KillChicken { .. } => ServerPacketId::KillChicken,
            ServerPacket::RespawnChicken { .. } => ServerPacketId::RespawnChicken,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        let mut buf = vec![self.id() as u8];
        let o = options();
        match self {
            ServerPacket::Ping | ServerPacket::Pong | ServerPacket::Stopping => {}
            ServerPacket::ConnectionAccepted { client_id }
            | ServerPacket::ClientLeft { client_id } => o.serialize_into(&mut buf, client_id)?,
            ServerPacket::ConnectionRejected { reason } => o.serialize_into(&mut buf, reason)?,
            ServerPacket::ClientJoined {
                client_id,
                nickname,
                chicken,
            }
            | ServerPacket::PlayerInfo {
                client_id,
                nickname,
                chicken,
            } => o.serialize_into(&mut buf, &(client_id, nickname, chicken))?,
            ServerPacket::ServerInfo { map_size } => o.serialize_into(&mut buf, map_size)?,
            ServerPacket::ItemInfo { item } | ServerPacket::AddItem { item } => {
                o.serialize_into(&mut buf, item)?
            }
            ServerPacket::UpdateChicken { client_id, chicken } => {
                o.serialize_into(&mut buf, &(client_id, chicken))?
            }
            ServerPacket::AddSeed { seed } => o.serialize_into(&mut buf, seed)?,
            ServerPacket::RemoveSeed {
                seed_uid,
                eaten,
                eater_client_id,
            } => o.serialize_into(&mut buf, &(seed_uid, eaten, eater_client_id))?,
            ServerPacket::RemoveItem {
                item_uid,
                picked_up,
                picker_client_id,
            } => o.serialize_into(&mut buf, &(item_uid, picked_up, picker_client_id))?,
            ServerPacket::ShootBullet { bullet } => o.serialize_into(&mut buf, bullet)?,
            ServerPacket::HitChicken {
                client_id,
                killer_client_id,
            }
            | ServerPacket::KillChicken {
                client_id,
                killer_client_id,
            } => o.serialize_into(&mut buf, &(client_id, killer_client_id))?,
            ServerPacket::RespawnChicken {
                client_id,
                position,
            } => o.serialize_into(&mut buf, &(client_id, position))?,
        }
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let (raw, rest) = split_id(bytes)?;
        let packet = match ServerPacketId::try_from(raw)? {
            ServerPacketId::Ping => body::<()>(raw, rest).map(|_| ServerPacket::Ping)?,
            ServerPacketId::Pong => body::<()>(raw, rest).map(|_| ServerPacket::Pong)?,
            ServerPacketId::Stopping => body::<()>(raw, rest).map(|_| ServerPacket::Stopping)?,
            ServerPacketId::ConnectionAccepted => ServerPacket::ConnectionAccepted {
                client_id: body(raw, rest)?,
            },
            ServerPacketId::ConnectionRejected => ServerPacket::ConnectionRejected {
                reason: body(raw, rest)?,
            },
            ServerPacketId::ClientJoined => {
                let (client_id, nickname, chicken) = body(raw, rest)?;
                ServerPacket::ClientJoined {
                    client_id,
                    nickname,
                    chicken,
                }
            }
            ServerPacketId::ClientLeft => ServerPacket::ClientLeft {
                client_id: body(raw, rest)?,
            },
            ServerPacketId::ServerInfo => ServerPacket::ServerInfo {
                map_size: body(raw, rest)?,
            },
            ServerPacketId::PlayerInfo => {
                let (client_id, nickname, chicken) = body(raw, rest)?;
                ServerPacket::PlayerInfo {
                    client_id,
                    nickname,
                    chicken,
                }
            }
            ServerPacketId::ItemInfo => ServerPacket::ItemInfo {
                item: body(raw, rest)?,
            },
            ServerPacketId::UpdateChicken => {
                let (client_id, chicken) = body(raw, rest)?;
                ServerPacket::UpdateChicken { client_id, chicken }
            }
            ServerPacketId::AddSeed => ServerPacket::AddSeed {
                seed: body(raw, rest)?,
            },
            ServerPacketId::RemoveSeed => {
                let (seed_uid, eaten, eater_client_id) = body(raw, rest)?;
                ServerPacket::RemoveSeed {
                    seed_uid,
                    eaten,
                    eater_client_id,
                }
            }
            ServerPacketId::AddItem => ServerPacket::AddItem {
                item: body(raw, rest)?,
            },
            ServerPacketId::RemoveItem => {
                let (item_uid, picked_up, picker_client_id) = body(raw, rest)?;
                ServerPacket::RemoveItem {
                    item_uid,
                    picked_up,
                    picker_client_id,
                }
            }
            ServerPacketId::ShootBullet => ServerPacket::ShootBullet {
                bullet: body(raw, rest)?,
            },
            ServerPacketId::HitChicken => {
                let (client_id, killer_client_id) = body(raw, rest)?;
                ServerPacket::HitChicken {
                    client_id,
                    killer_client_id,
                }
            }
            ServerPacketId::KillChicken => {
                let (client_id, killer_client_id) = body(raw, rest)?;
                ServerPacket::KillChicken {
                    client_id,
                    killer_client_id,
                }
            }
            ServerPacketId::RespawnChicken => {
                let (client_id, position) = body(raw, rest)?;
                ServerPacket::RespawnChicken {
                    client_id,
                    position,
                }
            }
        };
        Ok(packet)
    }
}
