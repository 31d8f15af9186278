//! Forward chaining over the conditional dependency map.
//!
//! Repeatedly discharges the unconditional entry: its nodes become used,
//! the entry is dropped, and every remaining condition is re-keyed with
//! the newly used nodes removed (unioning values when keys collide).
//! Conditions emptied by the re-keying are picked up on the next round.
//!
//! Termination: every round either removes a key or strictly shrinks the
//! aggregate size of the conditions, and nodes form a finite set.

use crate::node::{Cond, DepSet, Deps};

/// Discharge satisfied conditions until the least fixed point.
///
/// Returns the residual map, whose conditions never fully discharged
/// (kept for debugging), and the minimal set of nodes implied by the
/// empty condition.
#[must_use]
pub fn forward_chain(mut deps: Deps) -> (Deps, DepSet) {
    let mut used = DepSet::default();

    while let Some(newly) = deps.remove(&Cond::new()) {
        used.extend(newly.iter().cloned());

        let mut next = Deps::default();
        for (cond, nodes) in deps {
            let cond: Cond = cond
                .into_iter()
                .filter(|node| !newly.contains(node))
                .collect();
            next.entry(cond).or_default().extend(nodes);
        }
        deps = next;
    }

    (deps, used)
}
