use crate::DEFAULT_ITEM_RANGE;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Weapon a chicken can hold. Encoded on the wire as its `u32` index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ItemId {
    #[default]
    None,
    Shuriken,
    Laser,
    Crossbow,
    Uzi,
    M16,
}

impl ItemId {
    pub const ATTACK_ITEMS: [ItemId; 5] = [
        ItemId::Shuriken,
        ItemId::Laser,
        ItemId::Crossbow,
        ItemId::Uzi,
        ItemId::M16,
    ];

    /// Returns true for every item that can fire.
    pub fn is_attack_capable(self) -> bool {
        self != ItemId::None
    }

    /// Minimum time between two shots.
    pub fn cooldown(self) -> Duration {
        match self {
            ItemId::None => Duration::from_secs(3600),
            ItemId::Shuriken => Duration::from_secs_f32(1.0),
            ItemId::Laser => Duration::from_secs_f32(0.5),
            ItemId::Crossbow => Duration::from_secs_f32(2.0),
            ItemId::Uzi => Duration::from_secs_f32(0.33),
            ItemId::M16 => Duration::from_secs_f32(0.5),
        }
    }

    /// Firing range, also the travel budget of the bullets it shoots.
    pub fn range(self) -> f32 {
        match self {
            ItemId::None => 0.0,
            ItemId::Shuriken => DEFAULT_ITEM_RANGE * 0.7,
            ItemId::Laser => DEFAULT_ITEM_RANGE * 1.25,
            ItemId::Crossbow => DEFAULT_ITEM_RANGE * 1.15,
            ItemId::Uzi => DEFAULT_ITEM_RANGE * 0.9,
            ItemId::M16 => DEFAULT_ITEM_RANGE * 1.1,
        }
    }

    /// Movement speed multiplier while holding the item.
    pub fn weight(self) -> f32 {
        match self {
            ItemId::None => 1.0,
            ItemId::Shuriken => 1.25,
            ItemId::Laser => 0.5,
            ItemId::Crossbow => 0.8,
            ItemId::Uzi => 0.9,
            ItemId::M16 => 0.75,
        }
    }

    /// Damage multiplier applied to the shooter's base attack.
    pub fn attack_multiplier(self) -> f32 {
        match self {
            ItemId::None => 0.0,
            ItemId::Shuriken => 1.0,
            ItemId::Laser => 0.6,
            ItemId::Crossbow => 2.5,
            ItemId::Uzi => 0.4,
            ItemId::M16 => 0.8,
        }
    }

    /// Picks one of [`ItemId::ATTACK_ITEMS`] uniformly.
    pub fn random_attack_item<R: Rng + ?Sized>(rng: &mut R) -> ItemId {
        Self::ATTACK_ITEMS[rng.gen_range(0..Self::ATTACK_ITEMS.len())]
    }
}
