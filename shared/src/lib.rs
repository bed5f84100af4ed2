//! Types and constants shared by the seed-fight server and its clients.
//!
//! The protocol is symmetric: whatever the server encodes with
//! [`ServerPacket::encode`] a client decodes with [`ServerPacket::decode`], and the
//! other way around for [`ClientPacket`].

pub mod item;
pub mod math;
pub mod protocol;

pub use item::ItemId;
pub use math::{angle_between, wrap_degrees, Vector2};
pub use protocol::{
    Bullet, Chicken, ClientPacket, ClientPacketId, DecodeError, Item, RejectReason, Seed,
    ServerPacket, ServerPacketId, MAX_PACKET_SIZE, NO_CLIENT,
};

pub const DEFAULT_SERVER_PORT: u16 = 3457;
/// Map edge length used when no map asset is supplied (10 tiles of 64px).
pub const DEFAULT_MAP_SIZE: f32 = 64.0 * 10.0;

pub const DEFAULT_CHICKEN_LIFE: f32 = 100.0;
pub const DEFAULT_CHICKEN_SPEED: f32 = 100.0;
pub const DEFAULT_CHICKEN_ATTACK: f32 = 10.0;
pub const DEFAULT_ITEM_RANGE: f32 = 200.0;
