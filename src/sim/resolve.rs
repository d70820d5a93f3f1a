//! Contact resolution
//!
//! Same-kind contacts get an equal-mass elastic response: velocities are
//! decomposed into the collision-normal frame, the normal components are
//! swapped wholesale, and the pair is pushed apart by half the overlap each
//! so it does not re-collide next tick.
//!
//! Cross-kind contacts queue one pending outcome per losing entity,
//! first-write-wins within the tick, and the queue is applied only after
//! the whole contact list has been scanned. Eliminations run in descending
//! index order so earlier removals cannot shift later victims.

use super::collision::Contact;
use super::state::{EntityKind, OutcomeMode, Registry};

/// A loser flagged during the contact scan, applied in the deferred pass
#[derive(Debug, Clone, Copy)]
struct PendingOutcome {
    loser: usize,
    winner_kind: EntityKind,
}

/// Resolve every detected contact against the registry, then apply the
/// queued cross-kind outcomes for this tick.
pub fn resolve_contacts(registry: &mut Registry, contacts: &[Contact], mode: OutcomeMode) {
    let mut pending: Vec<PendingOutcome> = Vec::new();

    for contact in contacts {
        let (a, b) = registry.pair_mut(contact.i, contact.j);

        if a.kind == b.kind {
            // Swap normal velocity components (equal-mass elastic exchange)
            let normal = contact.normal;
            let tangent = normal.perp();

            let a_n = a.vel.dot(normal);
            let a_t = a.vel.dot(tangent);
            let b_n = b.vel.dot(normal);
            let b_t = b.vel.dot(tangent);

            a.vel = normal * b_n + tangent * a_t;
            b.vel = normal * a_n + tangent * b_t;

            // Separate along the normal to prevent sticking
            let push = normal * (contact.overlap * 0.5);
            a.pos -= push;
            b.pos += push;
        } else {
            let (loser, winner_kind) = if a.kind.beats(b.kind) {
                (contact.j, a.kind)
            } else {
                debug_assert!(b.kind.beats(a.kind), "dominance table is not total");
                (contact.i, b.kind)
            };

            // First outcome recorded for an entity wins the tick
            if !pending.iter().any(|p| p.loser == loser) {
                pending.push(PendingOutcome { loser, winner_kind });
            }
        }
    }

    if pending.is_empty() {
        return;
    }
    log::debug!(
        "applying {} {} outcome(s)",
        pending.len(),
        match mode {
            OutcomeMode::Eliminate => "elimination",
            OutcomeMode::Convert => "conversion",
        }
    );

    match mode {
        OutcomeMode::Convert => {
            for p in &pending {
                registry.convert(p.loser, p.winner_kind);
            }
        }
        OutcomeMode::Eliminate => {
            // Losers are unique; descending order keeps lower indices valid
            let mut doomed: Vec<usize> = pending.iter().map(|p| p.loser).collect();
            doomed.sort_unstable_by(|a, b| b.cmp(a));
            for index in doomed {
                registry.remove(index);
            }
        }
    }
}
