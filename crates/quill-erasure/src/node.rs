//! Nodes, conditions, and the conditional dependency map.

use quill_ir::Name;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An argument position of a symbol, or its result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Arg {
    /// Argument position `i`, counted from zero.
    Pos(u32),
    /// The symbol's result.
    Result,
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pos(i) => write!(f, "{i}"),
            Self::Result => f.write_str("ret"),
        }
    }
}

/// An elementary usage fact: "this argument position (or the result) of
/// this symbol is used at runtime".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Node {
    /// The symbol.
    pub name: Name,
    /// Which part of it.
    pub arg: Arg,
}

impl Node {
    /// The node for argument `i` of `name`.
    #[must_use]
    pub fn pos(name: Name, i: u32) -> Self {
        Self {
            name,
            arg: Arg::Pos(i),
        }
    }

    /// The node for the result of `name`.
    #[must_use]
    pub fn result(name: Name) -> Self {
        Self {
            name,
            arg: Arg::Result,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.arg)
    }
}

/// A conjunction of usage assumptions; empty means "always".
///
/// Backed by an ordered set so that equality and hashing are set-based,
/// which lets conditions key the dependency map regardless of the order
/// assumptions were collected in.
pub type Cond = BTreeSet<Node>;

/// A set of nodes concluded used.
pub type DepSet = FxHashSet<Node>;

/// The conditional dependency map. An entry `C ↦ N` reads: if every
/// assumption in `C` holds, then every node in `N` is used. Entries with
/// equal keys combine by set union.
pub type Deps = FxHashMap<Cond, DepSet>;

/// Record an edge, unioning with any existing entry for `cond`.
pub fn insert_edge(deps: &mut Deps, cond: Cond, nodes: impl IntoIterator<Item = Node>) {
    deps.entry(cond).or_default().extend(nodes);
}

/// Merge `other` into `target`, unioning values on key collisions.
pub fn merge_deps(target: &mut Deps, other: Deps) {
    for (cond, nodes) in other {
        target.entry(cond).or_default().extend(nodes);
    }
}

/// `cond` extended with one extra assumption.
#[must_use]
pub fn cond_with(cond: &Cond, extra: Node) -> Cond {
    let mut out = cond.clone();
    out.insert(extra);
    out
}
