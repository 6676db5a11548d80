//! # Blindclock
//!
//! A tournament clock and blind-level progression engine for poker venues.
//!
//! Blindclock owns the one piece of a venue platform with real state-machine
//! semantics: the tournament clock. It decides which staff actions are legal,
//! keeps the persisted tournament record and the volatile per-level timing
//! record consistent, and derives what spectators see on the clock screen.
//!
//! ## Core Concepts
//!
//! - **BlindStructure**: The immutable, ordered list of levels a tournament plays.
//! - **ClockState**: The volatile timing record for the current level. It is never
//!   advanced by a timer; elapsed time is always derived from timestamps on read.
//! - **ClockStore**: Keyed storage for clock states with per-tournament locking,
//!   so concurrent staff actions on one tournament never interleave while
//!   unrelated tournaments never wait on each other.
//! - **ClockEngine**: The state machine. Every call takes `now` explicitly, writes
//!   the tournament record first and only then commits the clock state.
//! - **Projection**: A pure function of `(record, clock, now)` producing the
//!   display payload (current/next blind, time remaining, level listing).
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use blindclock::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. Load configuration (an optional TOML file plus env overrides).
//!     let config = BlindClockConfig::load(Some("blindclock.toml"))?;
//!
//!     // 2. Seed the persistence collaborator and create the engine.
//!     let repository = Arc::new(InMemoryTournaments::from_records(config.tournaments.clone()));
//!     let engine = ClockEngine::new(repository);
//!
//!     // 3. Apply a staff action and read the projection back.
//!     let id = TournamentId::from("friday-deepstack");
//!     let payload = engine.apply(&id, ClockAction::Start, SystemClock.now()).await?;
//!     println!("{} ms left in level {}", payload.clock.time_remaining_ms, payload.tournament.current_level);
//!
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Blind Clock";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Declare all the modules in the crate.
pub mod access;
pub mod common;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod persistence;
pub mod projector;
pub mod server;
pub mod structure;
pub mod time;
pub mod tournament;

/// A prelude module for easy importing of the most common Blindclock types.
pub mod prelude {
    pub use crate::access::{StaffAuthorizer, StaffMember, StaticStaffDirectory};
    pub use crate::common::{StaffId, TournamentId, VenueId};
    pub use crate::components::state::ClockState;
    pub use crate::components::store::ClockStore;
    pub use crate::config::BlindClockConfig;
    pub use crate::engine::{ClockAction, ClockEngine};
    pub use crate::error::{ClockError, Rejection};
    pub use crate::events::ClockEvent;
    pub use crate::persistence::{InMemoryTournaments, TournamentRepository};
    pub use crate::projector::{project, DisplayPayload};
    pub use crate::structure::{BlindLevel, BlindStructure};
    pub use crate::time::{Clock, ManualClock, SystemClock};
    pub use crate::tournament::{TournamentRecord, TournamentStatus};
}
