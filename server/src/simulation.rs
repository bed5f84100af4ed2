//! Fixed-step simulation: chicken steering, shooting, bullets, loot and seed decay.
//!
//! One [`Simulation::step`] updates every player, then runs exactly one of the
//! three maintenance tasks. The tasks take turns so that their cost is spread
//! over consecutive steps; each one is handed the time accumulated since it
//! last ran.

use crate::config::GameplayConfig;
use crate::map::MapBounds;
use crate::outbox::Outbox;
use crate::session::{Session, SessionRegistry};
use crate::world::{LiveSeed, World};
use log::{debug, info};
use rand::rngs::StdRng;
use shared::{
    angle_between, wrap_degrees, Bullet, Chicken, ItemId, ServerPacket, Vector2,
    DEFAULT_CHICKEN_ATTACK, NO_CLIENT,
};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedTarget {
    pub uid: u32,
    pub position: Vector2,
    pub distance_sqr: f32,
    /// `distance_sqr` scaled by the owner / non-owner priority
    pub weighted_distance_sqr: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyTarget {
    pub client_id: u32,
    pub position: Vector2,
    pub distance_sqr: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Seed,
    Enemy,
}

/// Best seed and best enemy as seen by one chicken
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Targets {
    pub seed: Option<SeedTarget>,
    pub enemy: Option<EnemyTarget>,
}

impl Targets {
    pub fn focus(&self, config: &GameplayConfig) -> Option<Focus> {
        match (self.seed, self.enemy) {
            (Some(seed), Some(enemy)) => {
                if seed.weighted_distance_sqr * config.seed_preference_factor < enemy.distance_sqr {
                    Some(Focus::Seed)
                } else {
                    Some(Focus::Enemy)
                }
            }
            (Some(_), None) => Some(Focus::Seed),
            (None, Some(_)) => Some(Focus::Enemy),
            (None, None) => None,
        }
    }
}

/// Picks the most attractive seed and the nearest enemy for `sessions[index]`.
pub fn select_targets(
    sessions: &[Session],
    index: usize,
    seeds: &[LiveSeed],
    config: &GameplayConfig,
) -> Targets {
    let me = &sessions[index];
    let position = me.chicken.position;

    let impact_sqr = config.seed_impact_distance * config.seed_impact_distance;
    let seed = seeds
        .iter()
        .filter_map(|live| {
            let distance_sqr = live.seed.position.sub(&position).squared_magnitude();
            if distance_sqr > impact_sqr {
                return None;
            }
            let priority = if live.seed.owner_client_id == me.client_id {
                config.owner_seed_priority
            } else {
                config.other_seed_priority
            };
            Some(SeedTarget {
                uid: live.seed.uid,
                position: live.seed.position,
                distance_sqr,
                weighted_distance_sqr: distance_sqr * priority,
            })
        })
        .min_by(|a, b| a.weighted_distance_sqr.total_cmp(&b.weighted_distance_sqr));

    let detection_sqr = config.target_detection_distance * config.target_detection_distance;
    let enemy = sessions
        .iter()
        .filter(|other| other.client_id != me.client_id)
        .map(|other| EnemyTarget {
            client_id: other.client_id,
            position: other.chicken.position,
            distance_sqr: other.chicken.position.sub(&position).squared_magnitude(),
        })
        .filter(|enemy| enemy.distance_sqr < detection_sqr)
        .min_by(|a, b| a.distance_sqr.total_cmp(&b.distance_sqr));

    Targets { seed, enemy }
}

/// Turns `chicken` toward `target` by at most `degrees_per_second * dt`.
///
/// Returns true when the rotation changed.
pub fn rotate_towards(
    chicken: &mut Chicken,
    target: Vector2,
    degrees_per_second: f32,
    deadzone: f32,
    dt: f32,
) -> bool {
    let delta = target.sub(&chicken.position);
    if delta.squared_magnitude() == 0.0 {
        return false;
    }
    let target_angle = delta.polar_angle();
    let current = wrap_degrees(chicken.rotation);
    let error = angle_between(current, target_angle);
    if error <= deadzone {
        return false;
    }

    let increasing = wrap_degrees(target_angle - current);
    let decreasing = wrap_degrees(current - target_angle);
    let sign = if increasing <= decreasing { 1.0 } else { -1.0 };
    let turn = (degrees_per_second * dt).min(error);
    chicken.rotation = wrap_degrees(current + sign * turn);
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceTask {
    Bullets,
    Loot,
    Seeds,
}

pub struct Simulation {
    config: GameplayConfig,
    next_task: MaintenanceTask,
    since_bullets: Duration,
    since_loot: Duration,
    since_seeds: Duration,
    item_spawn_timer: Duration,
}

impl Simulation {
    pub fn new(config: GameplayConfig) -> Self {
        Self {
            config,
            next_task: MaintenanceTask::Bullets,
            since_bullets: Duration::ZERO,
            since_loot: Duration::ZERO,
            since_seeds: Duration::ZERO,
            item_spawn_timer: Duration::ZERO,
        }
    }

    pub fn config(&self) -> &GameplayConfig {
        &self.config
    }

    /// The maintenance task the next step will run
    pub fn next_task(&self) -> MaintenanceTask {
        self.next_task
    }

    /// Advances the world by one fixed step of length `dt`.
    pub fn step(
        &mut self,
        sessions: &mut SessionRegistry,
        world: &mut World,
        outbox: &mut Outbox,
        rng: &mut StdRng,
        dt: Duration,
    ) {
        for index in 0..sessions.len() {
            self.update_player(index, sessions, world, outbox, dt);
        }
        self.run_maintenance(sessions, world, outbox, rng, dt);
    }

    fn update_player(
        &self,
        index: usize,
        sessions: &mut SessionRegistry,
        world: &mut World,
        outbox: &mut Outbox,
        dt: Duration,
    ) {
        let config = &self.config;
        let dt_secs = dt.as_secs_f32();
        let targets = select_targets(sessions.sessions(), index, &world.seeds, config);
        let focus = targets.focus(config);

        let session = &mut sessions.sessions_mut()[index];
        let client_id = session.client_id;
        let mut eaten = None;

        match (focus, targets.seed, targets.enemy) {
            (Some(Focus::Seed), Some(seed), _) => {
                let close = config.close_turn_distance;
                let rate = if seed.distance_sqr < close * close {
                    config.rotation_speed * config.close_turn_multiplier
                } else {
                    config.rotation_speed
                };
                rotate_towards(
                    &mut session.chicken,
                    seed.position,
                    rate,
                    config.rotation_deadzone,
                    dt_secs,
                );

                let chicken = &mut session.chicken;
                let travel = chicken.speed * dt_secs * chicken.item_id.weight();
                chicken.position = world
                    .map
                    .clamp(chicken.position.add(&chicken.forward().scale(travel)));
                session.dirty = true;

                let pickup_sqr = config.seed_pickup_distance * config.seed_pickup_distance;
                if seed.position.sub(&session.chicken.position).squared_magnitude() < pickup_sqr {
                    eaten = world.remove_seed(seed.uid);
                }
            }
            (Some(Focus::Enemy), _, Some(enemy)) => {
                if rotate_towards(
                    &mut session.chicken,
                    enemy.position,
                    config.rotation_speed,
                    config.rotation_deadzone,
                    dt_secs,
                ) {
                    session.dirty = true;
                }
            }
            _ => {}
        }

        session.attack_cooldown += dt;
        let shot = targets
            .enemy
            .and_then(|enemy| self.aim(session, enemy.position));
        if shot.is_some() {
            session.attack_cooldown = Duration::ZERO;
        }
        let item_id = session.chicken.item_id;

        if let Some(seed) = eaten {
            debug!("Client {} ate seed {}", client_id, seed.uid);
            sessions.broadcast(
                outbox,
                ServerPacket::RemoveSeed {
                    seed_uid: seed.uid,
                    eaten: true,
                    eater_client_id: client_id,
                },
            );
        }

        if let Some((muzzle, rotation)) = shot {
            let bullet = world.spawn_bullet(muzzle, rotation, client_id, item_id);
            sessions.broadcast(outbox, ServerPacket::ShootBullet { bullet });
        }
    }

    /// Returns the muzzle position and bullet heading if `session` may fire at `target` now.
    fn aim(&self, session: &Session, target: Vector2) -> Option<(Vector2, f32)> {
        let chicken = &session.chicken;
        let item = chicken.item_id;
        if !item.is_attack_capable() || session.attack_cooldown < item.cooldown() {
            return None;
        }

        let delta = target.sub(&chicken.position);
        let distance_sqr = delta.squared_magnitude();
        if distance_sqr <= 0.0 || distance_sqr > item.range() * item.range() {
            return None;
        }
        if chicken.forward().dot(&delta.normalize()) <= self.config.firing_cone_cos {
            return None;
        }

        let muzzle = chicken
            .position
            .add(&self.config.weapon_offset.rotated(chicken.rotation));
        let aim = target.sub(&muzzle);
        let rotation = if aim.squared_magnitude() > 0.0 {
            aim.polar_angle()
        } else {
            chicken.rotation
        };
        Some((muzzle, rotation))
    }

    fn run_maintenance(
        &mut self,
        sessions: &mut SessionRegistry,
        world: &mut World,
        outbox: &mut Outbox,
        rng: &mut StdRng,
        dt: Duration,
    ) {
        self.since_bullets += dt;
        self.since_loot += dt;
        self.since_seeds += dt;

        match self.next_task {
            MaintenanceTask::Bullets => {
                let elapsed = std::mem::take(&mut self.since_bullets);
                self.update_bullets(sessions, world, outbox, rng, elapsed);
                self.next_task = MaintenanceTask::Loot;
            }
            MaintenanceTask::Loot => {
                let elapsed = std::mem::take(&mut self.since_loot);
                self.update_loot(sessions, world, outbox, rng, elapsed);
                self.next_task = MaintenanceTask::Seeds;
            }
            MaintenanceTask::Seeds => {
                let elapsed = std::mem::take(&mut self.since_seeds);
                for seed in world.expire_seeds(elapsed, self.config.seed_lifetime) {
                    debug!("Seed {} of {} decayed", seed.uid, seed.owner_client_id);
                    sessions.broadcast(
                        outbox,
                        ServerPacket::RemoveSeed {
                            seed_uid: seed.uid,
                            eaten: false,
                            eater_client_id: NO_CLIENT,
                        },
                    );
                }
                self.next_task = MaintenanceTask::Bullets;
            }
        }
    }

    /// Moves bullets, drops the spent ones and resolves collisions.
    ///
    /// A bullet sweeps the whole segment it travels during `elapsed`, so a
    /// long pass cannot skip over a chicken. The first non-owner chicken along
    /// the segment is hit.
    pub fn update_bullets(
        &self,
        sessions: &mut SessionRegistry,
        world: &mut World,
        outbox: &mut Outbox,
        rng: &mut StdRng,
        elapsed: Duration,
    ) {
        let travel = self.config.bullet_speed * elapsed.as_secs_f32();
        let hit_radius_sqr = self.config.bullet_hit_radius * self.config.bullet_hit_radius;

        let mut index = 0;
        while index < world.bullets.len() {
            let bullet = world.bullets[index];
            let start = bullet.position;
            let reach = travel.min(bullet.remaining_distance.max(0.0));
            let end = start.add(&Vector2::polar(bullet.rotation).scale(reach));

            let victim = sessions
                .sessions()
                .iter()
                .filter(|s| s.client_id != bullet.owner_client_id)
                .filter_map(|s| {
                    let (closest, fraction) = s.chicken.position.closest_on_segment(&start, &end);
                    let distance_sqr = s.chicken.position.sub(&closest).squared_magnitude();
                    (distance_sqr < hit_radius_sqr).then_some((fraction, s.client_id))
                })
                .min_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(_, client_id)| client_id);

            if let Some(victim) = victim {
                world.bullets.remove(index);
                self.resolve_hit(sessions, &world.map, outbox, rng, &bullet, victim);
                continue;
            }

            let flying = &mut world.bullets[index];
            flying.position = end;
            flying.remaining_distance -= travel;
            if flying.remaining_distance <= 0.0 {
                world.bullets.remove(index);
            } else {
                index += 1;
            }
        }
    }

    fn resolve_hit(
        &self,
        sessions: &mut SessionRegistry,
        map: &MapBounds,
        outbox: &mut Outbox,
        rng: &mut StdRng,
        bullet: &Bullet,
        victim_id: u32,
    ) {
        let killer_client_id = bullet.owner_client_id;
        // The shooter may have left while the bullet was flying
        let base_attack = sessions
            .get(killer_client_id)
            .map_or(DEFAULT_CHICKEN_ATTACK, |s| s.chicken.attack);
        let damage = base_attack * bullet.item_id.attack_multiplier();

        sessions.broadcast(
            outbox,
            ServerPacket::HitChicken {
                client_id: victim_id,
                killer_client_id,
            },
        );

        let Some(victim) = sessions.get_mut(victim_id) else {
            return;
        };
        let chicken = &mut victim.chicken;
        chicken.life = (chicken.life - damage).clamp(0.0, chicken.life_max);
        victim.dirty = true;
        if chicken.life > 0.0 {
            return;
        }

        chicken.life = chicken.life_max;
        chicken.position = map.random_position(rng);
        let position = chicken.position;
        info!("Client {} killed by {}", victim_id, killer_client_id);

        sessions.broadcast(
            outbox,
            ServerPacket::KillChicken {
                client_id: victim_id,
                killer_client_id,
            },
        );
        sessions.broadcast(
            outbox,
            ServerPacket::RespawnChicken {
                client_id: victim_id,
                position,
            },
        );
    }

    /// Spawns or evicts items on a timer and hands items to chickens standing on them.
    pub fn update_loot(
        &mut self,
        sessions: &mut SessionRegistry,
        world: &mut World,
        outbox: &mut Outbox,
        rng: &mut StdRng,
        elapsed: Duration,
    ) {
        self.item_spawn_timer += elapsed;
        if self.item_spawn_timer >= self.config.item_spawn_interval {
            if world.items.len() >= self.config.max_items {
                // Timer keeps running, the next pass spawns
                if let Some(item) = world.evict_oldest_item() {
                    sessions.broadcast(
                        outbox,
                        ServerPacket::RemoveItem {
                            item_uid: item.uid,
                            picked_up: false,
                            picker_client_id: NO_CLIENT,
                        },
                    );
                }
            } else {
                self.item_spawn_timer = Duration::ZERO;
                let position = world.random_position(rng);
                let item = world.spawn_item(ItemId::random_attack_item(rng), position);
                debug!("Spawned item {} ({:?})", item.uid, item.item_id);
                sessions.broadcast(outbox, ServerPacket::AddItem { item });
            }
        }

        let pickup_sqr = self.config.item_pickup_distance * self.config.item_pickup_distance;
        for index in 0..sessions.len() {
            let position = sessions.sessions()[index].chicken.position;
            let reachable: Vec<u32> = world
                .items
                .iter()
                .filter(|item| item.position.sub(&position).squared_magnitude() < pickup_sqr)
                .map(|item| item.uid)
                .collect();

            for uid in reachable {
                let Some(item) = world.take_item(uid) else {
                    continue;
                };
                let session = &mut sessions.sessions_mut()[index];
                session.chicken.item_id = item.item_id;
                session.dirty = true;
                let picker_client_id = session.client_id;
                debug!("Client {} picked up {:?}", picker_client_id, item.item_id);
                sessions.broadcast(
                    outbox,
                    ServerPacket::RemoveItem {
                        item_uid: item.uid,
                        picked_up: true,
                        picker_client_id,
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbox::Outgoing;
    use assert_approx_eq::assert_approx_eq;
    use rand::SeedableRng;
    use std::net::SocketAddr;

    const DT: Duration = Duration::from_millis(10);

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn registry_with(positions: &[Vector2]) -> (SessionRegistry, Vec<u32>) {
        let mut registry = SessionRegistry::new(8, Duration::from_secs(5), &[]);
        let ids = positions
            .iter()
            .enumerate()
            .map(|(i, position)| {
                let origin = addr(5000 + i as u16);
                let id = registry.check_join(&origin).unwrap();
                registry.insert(Session::new(id, origin, Chicken::new(*position)));
                id
            })
            .collect();
        (registry, ids)
    }

    fn packets(outbox: &mut Outbox) -> Vec<ServerPacket> {
        outbox.drain().into_iter().map(|Outgoing { packet, .. }| packet).collect()
    }

    #[test]
    fn test_own_seed_beats_closer_foreign_seed() {
        let config = GameplayConfig::default();
        let (registry, ids) = registry_with(&[Vector2::new(100.0, 100.0)]);
        let mut world = World::new(MapBounds::default());
        world.drop_seed(999, Vector2::new(160.0, 100.0));
        let (_, own) = world.drop_seed(ids[0], Vector2::new(100.0, 180.0));

        let targets = select_targets(registry.sessions(), 0, &world.seeds, &config);
        assert_eq!(targets.seed.map(|s| s.uid), Some(own.uid));
        assert_eq!(targets.focus(&config), Some(Focus::Seed));
    }

    #[test]
    fn test_far_seeds_and_enemies_are_ignored() {
        let config = GameplayConfig::default();
        let (registry, _) = registry_with(&[Vector2::new(0.0, 0.0), Vector2::new(600.0, 600.0)]);
        let mut world = World::new(MapBounds::default());
        world.drop_seed(1, Vector2::new(500.0, 0.0));

        let targets = select_targets(registry.sessions(), 0, &world.seeds, &config);
        assert_eq!(targets, Targets::default());
        assert_eq!(targets.focus(&config), None);
    }

    #[test]
    fn test_close_enemy_wins_focus() {
        let config = GameplayConfig::default();
        let (registry, ids) =
            registry_with(&[Vector2::new(100.0, 100.0), Vector2::new(110.0, 100.0)]);
        let mut world = World::new(MapBounds::default());
        world.drop_seed(ids[0], Vector2::new(100.0, 250.0));

        let targets = select_targets(registry.sessions(), 0, &world.seeds, &config);
        assert_eq!(targets.enemy.map(|e| e.client_id), Some(ids[1]));
        assert_eq!(targets.focus(&config), Some(Focus::Enemy));
    }

    #[test]
    fn test_rotation_takes_shortest_way_and_respects_deadzone() {
        let mut chicken = Chicken::new(Vector2::default());
        chicken.rotation = 10.0;
        // Target at 350° is 20° away clockwise
        let target = Vector2::polar(350.0).scale(50.0);
        assert!(rotate_towards(&mut chicken, target, 100.0, 2.0, 0.1));
        assert_approx_eq!(chicken.rotation, 0.0, 1e-3);

        chicken.rotation = 349.0;
        assert!(!rotate_towards(&mut chicken, target, 100.0, 2.0, 0.1));
        assert_eq!(chicken.rotation, 349.0);
    }

    #[test]
    fn test_rotation_does_not_overshoot() {
        let mut chicken = Chicken::new(Vector2::default());
        let target = Vector2::polar(30.0).scale(10.0);
        rotate_towards(&mut chicken, target, 1000.0, 1.0, 1.0);
        assert_approx_eq!(chicken.rotation, 30.0, 1e-3);
    }

    #[test]
    fn test_chicken_walks_to_and_eats_seed() {
        let mut simulation = Simulation::new(GameplayConfig::default());
        let (mut registry, ids) = registry_with(&[Vector2::new(100.0, 100.0)]);
        let mut world = World::new(MapBounds::default());
        let mut outbox = Outbox::new();
        let mut rng = StdRng::seed_from_u64(3);
        let (_, seed) = world.drop_seed(ids[0], Vector2::new(100.0, 160.0));

        for _ in 0..300 {
            simulation.step(&mut registry, &mut world, &mut outbox, &mut rng, DT);
            if world.seeds.is_empty() {
                break;
            }
        }

        assert!(world.seeds.is_empty());
        let eaten: Vec<_> = packets(&mut outbox)
            .into_iter()
            .filter(|p| matches!(p, ServerPacket::RemoveSeed { .. }))
            .collect();
        assert_eq!(
            eaten,
            vec![ServerPacket::RemoveSeed {
                seed_uid: seed.uid,
                eaten: true,
                eater_client_id: ids[0],
            }]
        );
        assert!(registry.get(ids[0]).unwrap().dirty);
    }

    #[test]
    fn test_unarmed_chicken_never_fires() {
        let mut simulation = Simulation::new(GameplayConfig::default());
        let (mut registry, _) =
            registry_with(&[Vector2::new(100.0, 100.0), Vector2::new(150.0, 100.0)]);
        let mut world = World::new(MapBounds::default());
        let mut outbox = Outbox::new();
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..200 {
            simulation.step(&mut registry, &mut world, &mut outbox, &mut rng, DT);
        }
        assert!(world.bullets.is_empty());
        assert!(!packets(&mut outbox)
            .iter()
            .any(|p| matches!(p, ServerPacket::ShootBullet { .. })));
    }

    #[test]
    fn test_armed_chicken_fires_inside_cone_after_cooldown() {
        let simulation = Simulation::new(GameplayConfig::default());
        let (mut registry, ids) =
            registry_with(&[Vector2::new(100.0, 100.0), Vector2::new(200.0, 100.0)]);
        let shooter = registry.get_mut(ids[0]).unwrap();
        shooter.chicken.item_id = ItemId::Laser;
        shooter.attack_cooldown = ItemId::Laser.cooldown();

        let target = Vector2::new(200.0, 100.0);
        assert!(simulation.aim(registry.get(ids[0]).unwrap(), target).is_some());

        // Behind the shooter
        assert!(simulation
            .aim(registry.get(ids[0]).unwrap(), Vector2::new(0.0, 100.0))
            .is_none());

        // Out of range
        assert!(simulation
            .aim(registry.get(ids[0]).unwrap(), Vector2::new(500.0, 100.0))
            .is_none());

        registry.get_mut(ids[0]).unwrap().attack_cooldown = Duration::ZERO;
        assert!(simulation.aim(registry.get(ids[0]).unwrap(), target).is_none());
    }

    #[test]
    fn test_spent_bullet_vanishes_without_hit() {
        let simulation = Simulation::new(GameplayConfig::default());
        let (mut registry, ids) = registry_with(&[Vector2::new(100.0, 100.0)]);
        let mut world = World::new(MapBounds::default());
        let mut outbox = Outbox::new();
        let mut rng = StdRng::seed_from_u64(3);
        world.spawn_bullet(Vector2::new(300.0, 300.0), 0.0, ids[0] ^ 1, ItemId::Shuriken);

        for _ in 0..100 {
            simulation.update_bullets(&mut registry, &mut world, &mut outbox, &mut rng, DT);
        }
        assert!(world.bullets.is_empty());
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_bullet_hit_damages_once() {
        let simulation = Simulation::new(GameplayConfig::default());
        let (mut registry, ids) =
            registry_with(&[Vector2::new(100.0, 100.0), Vector2::new(150.0, 100.0)]);
        registry.get_mut(ids[1]).unwrap().dirty = false;
        let mut world = World::new(MapBounds::default());
        let mut outbox = Outbox::new();
        let mut rng = StdRng::seed_from_u64(3);
        world.spawn_bullet(Vector2::new(120.0, 100.0), 0.0, ids[0], ItemId::Crossbow);

        for _ in 0..20 {
            simulation.update_bullets(&mut registry, &mut world, &mut outbox, &mut rng, DT);
        }

        let hits: Vec<_> = packets(&mut outbox)
            .into_iter()
            .filter(|p| matches!(p, ServerPacket::HitChicken { .. }))
            .collect();
        // One copy per session
        assert_eq!(
            hits,
            vec![
                ServerPacket::HitChicken {
                    client_id: ids[1],
                    killer_client_id: ids[0],
                };
                2
            ]
        );
        let victim = registry.get(ids[1]).unwrap();
        let expected = shared::DEFAULT_CHICKEN_LIFE
            - shared::DEFAULT_CHICKEN_ATTACK * ItemId::Crossbow.attack_multiplier();
        assert_approx_eq!(victim.chicken.life, expected, 1e-4);
        assert!(victim.dirty);
        assert!(world.bullets.is_empty());
        // The owner is never hit by its own bullet
        assert_eq!(
            registry.get(ids[0]).unwrap().chicken.life,
            shared::DEFAULT_CHICKEN_LIFE
        );
    }

    #[test]
    fn test_long_pass_does_not_tunnel_through_chickens() {
        let simulation = Simulation::new(GameplayConfig::default());
        let (mut registry, ids) = registry_with(&[
            Vector2::new(100.0, 100.0),
            Vector2::new(170.0, 100.0),
            Vector2::new(230.0, 100.0),
        ]);
        let mut world = World::new(MapBounds::default());
        let mut outbox = Outbox::new();
        let mut rng = StdRng::seed_from_u64(3);
        world.spawn_bullet(Vector2::new(120.0, 100.0), 0.0, ids[0], ItemId::Crossbow);

        // 120 units in one pass, past both chickens
        let elapsed = Duration::from_millis(300);
        simulation.update_bullets(&mut registry, &mut world, &mut outbox, &mut rng, elapsed);

        assert!(world.bullets.is_empty());
        let hits: Vec<_> = packets(&mut outbox)
            .into_iter()
            .filter(|p| matches!(p, ServerPacket::HitChicken { .. }))
            .collect();
        // Only the nearer chicken, one copy per session
        assert_eq!(
            hits,
            vec![
                ServerPacket::HitChicken {
                    client_id: ids[1],
                    killer_client_id: ids[0],
                };
                3
            ]
        );
        assert_eq!(
            registry.get(ids[2]).unwrap().chicken.life,
            shared::DEFAULT_CHICKEN_LIFE
        );
    }

    #[test]
    fn test_spent_bullet_stops_short_of_chicken() {
        let simulation = Simulation::new(GameplayConfig::default());
        let (mut registry, ids) =
            registry_with(&[Vector2::new(100.0, 100.0), Vector2::new(400.0, 100.0)]);
        let mut world = World::new(MapBounds::default());
        let mut outbox = Outbox::new();
        let mut rng = StdRng::seed_from_u64(3);
        let bullet = world.spawn_bullet(Vector2::new(120.0, 100.0), 0.0, ids[0], ItemId::Shuriken);
        assert!(bullet.remaining_distance < 250.0);

        // The pass could reach the chicken but the shuriken's range ends first
        simulation.update_bullets(
            &mut registry,
            &mut world,
            &mut outbox,
            &mut rng,
            Duration::from_secs(1),
        );
        assert!(world.bullets.is_empty());
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_lethal_hit_kills_and_respawns() {
        let simulation = Simulation::new(GameplayConfig::default());
        let (mut registry, ids) =
            registry_with(&[Vector2::new(100.0, 100.0), Vector2::new(150.0, 100.0)]);
        registry.get_mut(ids[1]).unwrap().chicken.life = 1.0;
        let map = MapBounds::default();
        let mut world = World::new(map);
        let mut outbox = Outbox::new();
        let mut rng = StdRng::seed_from_u64(11);
        world.spawn_bullet(Vector2::new(140.0, 100.0), 0.0, ids[0], ItemId::Uzi);

        simulation.update_bullets(&mut registry, &mut world, &mut outbox, &mut rng, DT);

        let victim = registry.get(ids[1]).unwrap();
        assert_eq!(victim.chicken.life, victim.chicken.life_max);
        assert!(map.contains(victim.chicken.position));

        let sent = packets(&mut outbox);
        // Each event reaches both sessions
        assert_eq!(sent.len(), 6);
        let kills = sent
            .iter()
            .filter(|p| matches!(p, ServerPacket::KillChicken { .. }))
            .count();
        assert_eq!(kills, 2);
        assert!(sent.contains(&ServerPacket::RespawnChicken {
            client_id: ids[1],
            position: victim.chicken.position,
        }));
    }

    #[test]
    fn test_loot_spawns_evicts_and_is_picked_up() {
        let config = GameplayConfig {
            max_items: 1,
            ..GameplayConfig::default()
        };
        let interval = config.item_spawn_interval;
        let mut simulation = Simulation::new(config);
        let (mut registry, ids) = registry_with(&[Vector2::new(-1000.0, -1000.0)]);
        let mut world = World::new(MapBounds::default());
        let mut outbox = Outbox::new();
        let mut rng = StdRng::seed_from_u64(5);

        simulation.update_loot(&mut registry, &mut world, &mut outbox, &mut rng, interval);
        assert_eq!(world.items.len(), 1);
        let first = world.items[0];
        assert_eq!(packets(&mut outbox), vec![ServerPacket::AddItem { item: first }]);

        // At capacity: the oldest goes first
        simulation.update_loot(&mut registry, &mut world, &mut outbox, &mut rng, interval);
        assert!(world.items.is_empty());
        assert_eq!(
            packets(&mut outbox),
            vec![ServerPacket::RemoveItem {
                item_uid: first.uid,
                picked_up: false,
                picker_client_id: NO_CLIENT,
            }]
        );

        simulation.update_loot(&mut registry, &mut world, &mut outbox, &mut rng, Duration::ZERO);
        let second = world.items[0];
        outbox.drain();

        registry.get_mut(ids[0]).unwrap().chicken.position = second.position;
        simulation.update_loot(&mut registry, &mut world, &mut outbox, &mut rng, Duration::ZERO);
        assert!(world.items.is_empty());
        assert_eq!(registry.get(ids[0]).unwrap().chicken.item_id, second.item_id);
        assert_eq!(
            packets(&mut outbox),
            vec![ServerPacket::RemoveItem {
                item_uid: second.uid,
                picked_up: true,
                picker_client_id: ids[0],
            }]
        );
    }

    #[test]
    fn test_maintenance_round_robin() {
        let mut simulation = Simulation::new(GameplayConfig::default());
        let (mut registry, _) = registry_with(&[]);
        let mut world = World::new(MapBounds::default());
        let mut outbox = Outbox::new();
        let mut rng = StdRng::seed_from_u64(5);

        let mut order = Vec::new();
        for _ in 0..6 {
            order.push(simulation.next_task());
            simulation.step(&mut registry, &mut world, &mut outbox, &mut rng, DT);
        }
        assert_eq!(
            order,
            vec![
                MaintenanceTask::Bullets,
                MaintenanceTask::Loot,
                MaintenanceTask::Seeds,
                MaintenanceTask::Bullets,
                MaintenanceTask::Loot,
                MaintenanceTask::Seeds,
            ]
        );
    }

    #[test]
    fn test_seed_decays_exactly_once_on_wall_clock() {
        let config = GameplayConfig {
            seed_lifetime: Duration::from_millis(90),
            ..GameplayConfig::default()
        };
        let mut simulation = Simulation::new(config);
        let (mut registry, _) = registry_with(&[Vector2::new(600.0, 600.0)]);
        let mut world = World::new(MapBounds::default());
        let mut outbox = Outbox::new();
        let mut rng = StdRng::seed_from_u64(5);
        let (_, seed) = world.drop_seed(77, Vector2::new(10.0, 10.0));

        for _ in 0..8 {
            simulation.step(&mut registry, &mut world, &mut outbox, &mut rng, DT);
        }
        assert_eq!(world.seeds.len(), 1);

        for _ in 0..10 {
            simulation.step(&mut registry, &mut world, &mut outbox, &mut rng, DT);
        }
        assert!(world.seeds.is_empty());
        let removals: Vec<_> = packets(&mut outbox)
            .into_iter()
            .filter(|p| matches!(p, ServerPacket::RemoveSeed { .. }))
            .collect();
        assert_eq!(
            removals,
            vec![ServerPacket::RemoveSeed {
                seed_uid: seed.uid,
                eaten: false,
                eater_client_id: NO_CLIENT,
            }]
        );
    }
}
