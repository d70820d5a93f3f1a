//! Pairwise collision detection
//!
//! Exhaustive O(n²) scan over the post-motion positions. Populations stay in
//! the tens to low hundreds, so no broad phase is warranted. Contact
//! geometry (normal and overlap) is captured at detection time; resolution
//! later in the tick uses this snapshot rather than re-deriving it from
//! mutated state.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::Entity;

/// An overlapping entity pair, `i < j`, with detection-time geometry
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Contact {
    pub i: usize,
    pub j: usize,
    /// Unit collision normal, pointing from entity `i` toward entity `j`
    pub normal: Vec2,
    /// Penetration depth along the normal
    pub overlap: f32,
}

/// Enumerate all overlapping pairs in ascending `(i, j)` order.
///
/// Overlap is strict: centers exactly `r_i + r_j` apart do not collide.
pub fn detect_overlaps(entities: &[Entity]) -> Vec<Contact> {
    let mut contacts = Vec::new();

    for i in 0..entities.len() {
        for j in (i + 1)..entities.len() {
            let delta = entities[j].pos - entities[i].pos;
            let dist = delta.length();
            let reach = entities[i].radius + entities[j].radius;

            if dist < reach {
                // Coincident centers give no usable direction; separate
                // along a fixed axis
                let normal = if dist > f32::EPSILON {
                    delta / dist
                } else {
                    Vec2::X
                };
                contacts.push(Contact {
                    i,
                    j,
                    normal,
                    overlap: reach - dist,
                });
            }
        }
    }

    contacts
}
