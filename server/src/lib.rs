//! # Seed Fight Server Library
//!
//! This library provides the authoritative server for the seed-fight arcade
//! game. Players never steer their chicken directly: they drop seeds, and the
//! server decides where every chicken walks, what it eats, which weapon it
//! picks up and whom it shoots. Clients only render what the server tells them.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Every gameplay decision is made here. Chickens steer toward the most
//! attractive seed or the nearest enemy, eat seeds they reach, pick up items
//! lying on the ground and fire bullets when an enemy is inside their weapon's
//! range and firing cone.
//!
//! ### Session Management
//! Handles the lifecycle of client sessions:
//! - Admission control (capacity, denylist, duplicate origins)
//! - Client ids derived from the network origin, used for anti-spoofing
//! - Keep-alive pings and timeout eviction
//! - Join and leave notifications for everyone else
//!
//! ### State Broadcasting
//! Every world event (seed dropped or eaten, item spawned or picked up, bullet
//! fired, chicken hit, killed or respawned) is broadcast as it happens.
//! Chicken state is sent on a separate, slower tick, and only for chickens
//! that changed since the previous one.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Frame Loop
//! One task drains the socket, feeds the elapsed time to two fixed-rate
//! accumulators (simulation step and broadcast tick), flushes the queued
//! packets and then sleeps briefly. Nothing is shared between threads, so no
//! locking is needed.
//!
//! ### Sans-IO Game Core
//! [`game::GameServer`] owns all game state but never touches a socket.
//! Packets go in as bytes and come out of an outbox, which keeps the whole
//! game logic testable without a network.
//!
//! ## Module Organization
//!
//! ### Session Module (`session`)
//! Client ids, admission, per-session timers and broadcast fan-out.
//!
//! ### World Module (`world`)
//! Seeds, items and bullets with their uid generators.
//!
//! ### Simulation Module (`simulation`)
//! Target selection, steering, shooting and the round-robin maintenance tasks
//! (bullets, loot, seed decay).
//!
//! ### Scheduler Module (`scheduler`)
//! Fixed-step accumulators for the simulation step and broadcast tick.
//!
//! ### Game Module (`game`)
//! Packet handling and the glue between all of the above.
//!
//! ### Network Module (`network`)
//! UDP socket, frame loop and graceful shutdown.
//!
//! ### Support Modules
//! `config` holds every tunable, `map` loads the playable area and `outbox`
//! queues outgoing packets.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::map::MapBounds;
//! use server::network::Server;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::bind(
//!         "0.0.0.0:3457",
//!         ServerConfig::default(),
//!         MapBounds::default(),
//!     )
//!     .await?;
//!
//!     // Runs until Ctrl-C, then tells every client the server is stopping
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Security Considerations
//!
//! ### Origin Binding
//! Client ids are a hash of the sender's address, so a packet claiming an id
//! that does not belong to its origin is discarded.
//!
//! ### Input Validation
//! Datagrams that fail to decode, carry trailing bytes or exceed the packet
//! size limit are logged and dropped. Seeds outside the map are ignored.

pub mod config;
pub mod game;
pub mod map;
pub mod network;
pub mod outbox;
pub mod scheduler;
pub mod session;
pub mod simulation;
pub mod world;
