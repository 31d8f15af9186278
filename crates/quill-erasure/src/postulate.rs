//! Seed edges that cannot be derived from program text.
//!
//! Traversal only sees what bodies reference; the runtime's own demands
//! are injected here as unconditional edges: the entry point's result,
//! the I/O runner, the builtin pair constructor, and the primitives.
//! Primitives are strict in every position, with two exceptions:
//! `prim_fork` runs only its thunk, and `prim__believe_me` passes its
//! coerced value through while both type witnesses are erasable.

use crate::node::{insert_edge, Cond, Deps, Node};
use quill_intern::well_known;
use quill_ir::{Name, PrimTable};
use rustc_hash::FxHashSet;

/// Inject the unconditional edges into `deps`.
///
/// `referenced` is the set of names the traversal saw; runtime support
/// and primitives are only seeded when the program actually mentions
/// them, so unused builtins do not show up as reachable.
pub fn seed(deps: &mut Deps, entry: &Name, prims: &PrimTable, referenced: &FxHashSet<Name>) {
    let always = Cond::new();

    // The runtime demands the entry point's result.
    insert_edge(deps, always.clone(), [Node::result(entry.clone())]);

    let run_io = Name::user(*well_known::RUN_IO);
    let mk_pair = Name::user(*well_known::MK_PAIR);
    let fork = Name::user(*well_known::PRIM_FORK);
    let believe_me = Name::user(*well_known::BELIEVE_ME);

    if referenced.contains(&run_io) {
        insert_edge(
            deps,
            always.clone(),
            [Node::result(run_io.clone()), Node::pos(run_io.clone(), 0)],
        );
    }
    if referenced.contains(&mk_pair) {
        insert_edge(
            deps,
            always.clone(),
            [Node::pos(mk_pair.clone(), 0), Node::pos(mk_pair.clone(), 1)],
        );
    }
    if referenced.contains(&fork) {
        insert_edge(deps, always.clone(), [Node::pos(fork.clone(), 0)]);
    }
    if referenced.contains(&believe_me) {
        // Only the coerced value; the type witnesses stay erasable.
        insert_edge(deps, always.clone(), [Node::pos(believe_me.clone(), 2)]);
    }

    // Every other primitive the program references is strict in all
    // positions.
    for (name, arity) in prims.iter() {
        if *name == fork || *name == believe_me || !referenced.contains(name) {
            continue;
        }
        insert_edge(
            deps,
            always.clone(),
            (0..arity).map(|i| Node::pos(name.clone(), i)),
        );
    }
}

/// Names the traversal accepts without a symbol-table entry.
pub(crate) fn is_postulated_builtin(name: &Name) -> bool {
    match name {
        Name::User { ns, ident } if ns.is_empty() => [
            *well_known::RUN_IO,
            *well_known::MK_PAIR,
            *well_known::PRIM_FORK,
            *well_known::BELIEVE_ME,
            *well_known::MK_FOREIGN,
            *well_known::MK_FOREIGN_PRIM,
            *well_known::MK_LAZY_FOREIGN_PRIM,
        ]
        .contains(ident),
        _ => name.is_globally_visible(),
    }
}
