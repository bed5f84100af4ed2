//! Authoritative collections of seeds, items and bullets.
//!
//! Entities are only ever referred to by their uid outside of this module.
//! Each collection has its own monotonically increasing uid generator
//! starting at 1.

use crate::map::MapBounds;
use log::debug;
use rand::Rng;
use shared::{Bullet, Item, ItemId, Seed, Vector2};
use std::collections::VecDeque;
use std::time::Duration;

/// A seed plus the time it has been lying on the ground
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveSeed {
    pub seed: Seed,
    pub age: Duration,
}

#[derive(Debug, Default)]
struct UidGenerator {
    last: u32,
}

impl UidGenerator {
    fn next(&mut self) -> u32 {
        self.last = self.last.wrapping_add(1).max(1);
        self.last
    }
}

pub struct World {
    pub map: MapBounds,
    pub seeds: Vec<LiveSeed>,
    /// Oldest first
    pub items: VecDeque<Item>,
    pub bullets: Vec<Bullet>,
    seed_uids: UidGenerator,
    item_uids: UidGenerator,
    bullet_uids: UidGenerator,
}

impl World {
    /// Creates an empty world inside `map`
    pub fn new(map: MapBounds) -> Self {
        Self {
            map,
            seeds: Vec::new(),
            items: VecDeque::new(),
            bullets: Vec::new(),
            seed_uids: UidGenerator::default(),
            item_uids: UidGenerator::default(),
            bullet_uids: UidGenerator::default(),
        }
    }

    /// Returns a uniformly random point inside the map.
    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector2 {
        self.map.random_position(rng)
    }

    /// Drops a seed for `owner`, first taking away the owner's previous one.
    ///
    /// Returns the evicted seed (if any) and the new one.
    pub fn drop_seed(&mut self, owner_client_id: u32, position: Vector2) -> (Option<Seed>, Seed) {
        let evicted = self
            .seeds
            .iter()
            .position(|s| s.seed.owner_client_id == owner_client_id)
            .map(|index| self.seeds.remove(index).seed);

        let seed = Seed {
            uid: self.seed_uids.next(),
            position,
            owner_client_id,
        };
        self.seeds.push(LiveSeed {
            seed,
            age: Duration::ZERO,
        });
        debug!(
            "Seed {} dropped by {} at ({:.1}, {:.1})",
            seed.uid, owner_client_id, position.x, position.y
        );
        (evicted, seed)
    }

    /// Removes the seed with the given uid.
    ///
    /// # Returns
    /// The removed seed, or `None` if it was already gone
    pub fn remove_seed(&mut self, uid: u32) -> Option<Seed> {
        let index = self.seeds.iter().position(|s| s.seed.uid == uid)?;
        Some(self.seeds.remove(index).seed)
    }

    /// Ages every seed by `dt` and removes the ones older than `lifetime`.
    pub fn expire_seeds(&mut self, dt: Duration, lifetime: Duration) -> Vec<Seed> {
        let mut expired = Vec::new();
        self.seeds.retain_mut(|live| {
            live.age += dt;
            if live.age >= lifetime {
                expired.push(live.seed);
                false
            } else {
                true
            }
        });
        expired
    }

    /// Places a new item with a fresh uid at `position`.
    ///
    /// Items are kept oldest first.
    pub fn spawn_item(&mut self, item_id: ItemId, position: Vector2) -> Item {
        let item = Item {
            uid: self.item_uids.next(),
            item_id,
            position,
        };
        self.items.push_back(item);
        item
    }

    /// Removes the item that has been on the ground the longest
    pub fn evict_oldest_item(&mut self) -> Option<Item> {
        self.items.pop_front()
    }

    /// Removes the item with the given uid, keeping the age order of the rest.
    ///
    /// # Returns
    /// The picked item, or `None` if someone else got it first
    pub fn take_item(&mut self, uid: u32) -> Option<Item> {
        let index = self.items.iter().position(|i| i.uid == uid)?;
        self.items.remove(index)
    }

    /// Fires a bullet from `position` heading `rotation` degrees.
    ///
    /// The bullet flies for the range of the item that fired it.
    pub fn spawn_bullet(
        &mut self,
        position: Vector2,
        rotation: f32,
        owner_client_id: u32,
        item_id: ItemId,
    ) -> Bullet {
        let bullet = Bullet {
            uid: self.bullet_uids.next(),
            position,
            rotation,
            owner_client_id,
            item_id,
            remaining_distance: item_id.range(),
        };
        self.bullets.push(bullet);
        bullet
    }
}
