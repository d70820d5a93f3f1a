//! Motion integration and wall reflection
//!
//! Each tick every entity translates by `vel * speed_scale`, then each axis
//! is checked against the arena independently so corner contacts reflect
//! both components. A crossed wall negates that axis and clamps the entity
//! edge back onto the boundary; entities never rest outside bounds.

use super::state::{Arena, Entity};

/// Advance all entities by one tick and wall them back inside the arena.
pub fn integrate(entities: &mut [Entity], arena: Arena, speed_scale: f32) {
    for entity in entities {
        entity.pos += entity.vel * speed_scale;

        if entity.pos.x - entity.radius < 0.0 || entity.pos.x + entity.radius > arena.width {
            entity.vel.x = -entity.vel.x;
            entity.pos.x = entity.pos.x.min(arena.width - entity.radius).max(entity.radius);
        }

        if entity.pos.y - entity.radius < 0.0 || entity.pos.y + entity.radius > arena.height {
            entity.vel.y = -entity.vel.y;
            entity.pos.y = entity.pos.y.min(arena.height - entity.radius).max(entity.radius);
        }
    }
}
