//! Deterministic simulation module
//!
//! All battle logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only, and only at spawn time
//! - Stable iteration order (by registry index within a tick)
//! - No rendering, timing or platform dependencies

pub mod collision;
pub mod motion;
pub mod resolve;
pub mod state;
pub mod tick;

pub use collision::{Contact, detect_overlaps};
pub use state::{
    Arena, ConfigError, Entity, EntityKind, KindCounts, OutcomeMode, Registry, RunConfig,
    RunPhase, dominance_is_cycle,
};
pub use tick::{Engine, Snapshot};
