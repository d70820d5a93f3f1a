//! Core simulation types: entity kinds, the dominance cycle, the arena and
//! the entity registry with its population bookkeeping.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The three entity kinds, locked in cyclic dominance:
/// rock beats scissors, scissors beats paper, paper beats rock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Rock,
    Paper,
    Scissors,
}

impl EntityKind {
    /// All kinds, in count-index order
    pub const ALL: [EntityKind; 3] = [EntityKind::Rock, EntityKind::Paper, EntityKind::Scissors];

    /// The kind this kind defeats
    #[inline]
    pub fn prey(self) -> EntityKind {
        match self {
            EntityKind::Rock => EntityKind::Scissors,
            EntityKind::Paper => EntityKind::Rock,
            EntityKind::Scissors => EntityKind::Paper,
        }
    }

    /// Whether this kind defeats `other`
    #[inline]
    pub fn beats(self, other: EntityKind) -> bool {
        self.prey() == other
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Rock => "rock",
            EntityKind::Paper => "paper",
            EntityKind::Scissors => "scissors",
        }
    }

    /// Index into [`KindCounts`]
    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            EntityKind::Rock => 0,
            EntityKind::Paper => 1,
            EntityKind::Scissors => 2,
        }
    }
}

/// Check the dominance table forms a proper 3-cycle: every kind beats
/// exactly one other kind, loses to exactly one other kind, and never
/// relates to itself. Verified at engine start.
pub fn dominance_is_cycle() -> bool {
    for kind in EntityKind::ALL {
        if kind.prey() == kind {
            return false;
        }
        // Antisymmetry: beating a kind and losing to it are exclusive
        if kind.beats(kind.prey()) == kind.prey().beats(kind) {
            return false;
        }
        let beaten = EntityKind::ALL.iter().filter(|k| kind.beats(**k)).count();
        let beaten_by = EntityKind::ALL.iter().filter(|k| k.beats(kind)).count();
        if beaten != 1 || beaten_by != 1 {
            return false;
        }
    }
    // A 3-cycle visits every kind before returning to the start
    let start = EntityKind::Rock;
    start.prey() != start && start.prey().prey() != start && start.prey().prey().prey() == start
}

/// A single mobile entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl Entity {
    pub fn new(kind: EntityKind, pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self {
            kind,
            pos,
            vel,
            radius,
        }
    }
}

/// Arena bounds. Mutable only between ticks; a running tick sees a fixed
/// snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Live population count per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KindCounts([usize; 3]);

impl KindCounts {
    #[inline]
    pub fn get(&self, kind: EntityKind) -> usize {
        self.0[kind.index()]
    }

    #[inline]
    pub(crate) fn inc(&mut self, kind: EntityKind) {
        self.0[kind.index()] += 1;
    }

    #[inline]
    pub(crate) fn dec(&mut self, kind: EntityKind) {
        debug_assert!(self.0[kind.index()] > 0, "{} count underflow", kind.as_str());
        self.0[kind.index()] -= 1;
    }

    /// Total live entities across all kinds
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// How many kinds still have a live population
    pub fn kinds_alive(&self) -> usize {
        self.0.iter().filter(|&&c| c > 0).count()
    }

    /// The single surviving kind, if exactly one remains
    pub fn sole_survivor(&self) -> Option<EntityKind> {
        let mut survivor = None;
        for kind in EntityKind::ALL {
            if self.get(kind) > 0 {
                if survivor.is_some() {
                    return None;
                }
                survivor = Some(kind);
            }
        }
        survivor
    }
}

/// Owns the live entities and keeps the per-kind counts in lockstep.
///
/// Indices are stable within a tick: removals happen only in the deferred
/// apply pass, in descending index order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry {
    entities: Vec<Entity>,
    counts: KindCounts,
}

impl Registry {
    pub fn new(entities: Vec<Entity>) -> Self {
        let mut counts = KindCounts::default();
        for e in &entities {
            counts.inc(e.kind);
        }
        Self { entities, counts }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub(crate) fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn counts(&self) -> KindCounts {
        self.counts
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Mutable access to both ends of a collision pair. Requires `i < j`.
    pub(crate) fn pair_mut(&mut self, i: usize, j: usize) -> (&mut Entity, &mut Entity) {
        debug_assert!(i < j && j < self.entities.len());
        let (head, tail) = self.entities.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    }

    /// Remove the entity at `index`, decrementing its kind count
    pub(crate) fn remove(&mut self, index: usize) {
        let removed = self.entities.remove(index);
        self.counts.dec(removed.kind);
    }

    /// Overwrite the kind of the entity at `index`, adjusting both counts
    pub(crate) fn convert(&mut self, index: usize, new_kind: EntityKind) {
        let old_kind = self.entities[index].kind;
        if old_kind == new_kind {
            return;
        }
        self.entities[index].kind = new_kind;
        self.counts.dec(old_kind);
        self.counts.inc(new_kind);
    }

    /// Debug-build check that the count mapping matches the live entities
    pub(crate) fn debug_assert_consistent(&self) {
        #[cfg(debug_assertions)]
        {
            let mut actual = KindCounts::default();
            for e in &self.entities {
                actual.inc(e.kind);
            }
            debug_assert_eq!(
                actual, self.counts,
                "kind counts drifted from live entities"
            );
        }
    }
}

/// What happens to the loser of a cross-kind encounter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutcomeMode {
    /// Loser is removed from the arena
    #[default]
    Eliminate,
    /// Loser switches allegiance to the winner's kind
    Convert,
}

/// Phase of a simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Stopped; registry retained so a final frame can still be rendered
    Idle,
    /// Ticks advance the simulation
    Running,
    /// One kind conquered the arena, or `None` for the mutual-annihilation
    /// draw where the last survivors eliminate each other in the same tick
    Ended(Option<EntityKind>),
}

/// Parameters for starting a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Entities spawned per kind
    pub population_per_kind: usize,
    /// Run-wide loser policy
    pub mode: OutcomeMode,
    /// Kind the player is rooting for, if any
    pub favored: Option<EntityKind>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            population_per_kind: 20,
            mode: OutcomeMode::Eliminate,
            favored: None,
        }
    }
}

/// Rejected configuration at engine start
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("population per kind must be positive")]
    EmptyPopulation,
    #[error("arena dimensions must be positive and finite, got {width}x{height}")]
    InvalidArena { width: f32, height: f32 },
    #[error("arena {width}x{height} leaves no spawn area inside margin {margin}")]
    ArenaTooSmall { width: f32, height: f32, margin: f32 },
}
