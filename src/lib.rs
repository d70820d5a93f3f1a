//! Clash Arena - a rock-paper-scissors particle battle engine
//!
//! A population of circular entities, each tagged rock, paper or scissors,
//! drifts around a rectangular arena. Same-kind contacts bounce elastically;
//! cross-kind contacts eliminate or convert the loser per the classic cycle.
//! The run ends when a single kind remains.
//!
//! The engine is headless and pull-based: embedders call
//! [`sim::Engine::tick`] at whatever cadence they like and render the
//! returned snapshot. Rendering, input wiring and viewport management are
//! entirely the caller's business.

pub mod sim;

pub use sim::{
    Arena, ConfigError, Engine, EntityKind, OutcomeMode, RunConfig, RunPhase, Snapshot,
};

/// Simulation tuning constants
pub mod consts {
    /// Radius of every entity, in arena units
    pub const ENTITY_RADIUS: f32 = 12.0;
    /// Spawn placement keeps entity centers at least this far from every wall
    pub const SPAWN_MARGIN: f32 = ENTITY_RADIUS * 2.0;

    /// Spawn speed range (arena units per tick at speed scale 1)
    pub const SPAWN_SPEED_MIN: f32 = 0.5;
    pub const SPAWN_SPEED_MAX: f32 = 2.0;

    /// Speed scale ceiling; cycling past this wraps back to 1
    pub const MAX_SPEED_SCALE: f32 = 8.0;
}
