//! Whole-program usage (erasure) analysis.
//!
//! Given a fully elaborated program whose definitions are case trees
//! over the `quill-ir` term calculus, this pass decides which argument
//! positions of every function and data constructor are used at runtime,
//! and which top-level symbols are reachable from the entry point. The
//! code generator then omits what this pass proves unused.
//!
//! ## Pipeline
//!
//! 1. [`DepBuilder`] walks every definition reachable from `Main.main`
//!    and emits conditional dependency edges: each conclusion holds only
//!    under a conjunction of "position `i` of `f` is used" assumptions.
//! 2. Postulated edges cover what traversal cannot see: the entry
//!    point, the I/O runner, and the primitives.
//! 3. [`forward_chain`] discharges satisfied conditions down to the
//!    least fixed point, yielding the minimal used-node set.
//! 4. The node set is projected into a reachable-symbol list plus
//!    per-symbol used argument indices, validated against inaccessible
//!    annotations from earlier passes, and written into the call graph.
//!
//! The analyzer never rewrites programs, holds no global state, and may
//! be invoked repeatedly with different symbol tables. Analysis is
//! single-threaded; the only side effect is log emission.

#![warn(missing_docs)]

mod build;
mod node;
pub mod postulate;
mod solve;

pub use build::DepBuilder;
pub use node::{cond_with, insert_edge, merge_deps, Arg, Cond, DepSet, Deps, Node};
pub use solve::forward_chain;

use quill_ir::{CallGraph, ClassTable, Context, Name, OptTable, PrimTable, Resolution};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors that abort the usage analysis.
///
/// All of them are fatal to the pass; there is no local recovery.
#[derive(Debug, Error)]
pub enum UsageError {
    /// A name appearing in a case tree has no definition.
    #[error("unknown reference: {name}")]
    UnknownReference {
        /// The missing name.
        name: Name,
    },

    /// A name resolves to more than one definition.
    #[error("ambiguous reference {name}: candidates {candidates:?}")]
    AmbiguousReference {
        /// The name as written.
        name: Name,
        /// Every definition it could mean.
        candidates: Vec<Name>,
    },

    /// A function body was never compiled to a case tree.
    #[error("{name} has no case tree; compile pattern matches first")]
    NotCaseCompiled {
        /// The offending definition.
        name: Name,
    },

    /// A construct the analyzer does not handle.
    #[error("unsupported construct: {0}")]
    Unsupported(String),

    /// A compiler-internal name escaped its binder in an earlier pass.
    #[error("stray compiler-generated variable: {name}")]
    StrayMachineName {
        /// The escaped name.
        name: Name,
    },

    /// Runtime uses of arguments an earlier pass proved inaccessible.
    #[error("{name} uses inaccessible arguments {indices:?}")]
    InaccessibleUsed {
        /// The offending symbol.
        name: Name,
        /// The used-but-inaccessible positions, ascending.
        indices: Vec<u32>,
    },

    /// An internal invariant was violated.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for the usage analyzer.
pub type UsageResult<T> = Result<T, UsageError>;

/// Borrowed views of the compiler tables the analyzer reads.
#[derive(Clone, Copy)]
pub struct ErasureInput<'a> {
    /// The symbol table.
    pub context: &'a Context,
    /// Interface classes, for dictionary method projection.
    pub classes: &'a ClassTable,
    /// Builtin primitives.
    pub prims: &'a PrimTable,
    /// Optimization annotations from earlier passes.
    pub opts: &'a OptTable,
}

/// The outcome of the analysis.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageAnalysis {
    /// Symbols used at runtime, ascending.
    pub reachable: Vec<Name>,
    /// Used argument positions per symbol. A reachable symbol with no
    /// entry uses no argument positions at all.
    pub used_args: FxHashMap<Name, BTreeSet<u32>>,
}

/// Run the analysis without writing results back.
///
/// Returns an empty result when the program has no `Main.main` (the
/// translation unit is not being linked).
///
/// # Errors
///
/// See [`UsageError`] for the failure surface.
pub fn analyze(input: &ErasureInput<'_>) -> UsageResult<UsageAnalysis> {
    let entry = Name::entry_point();
    if matches!(input.context.resolve(&entry), Resolution::NotFound) {
        debug!("no entry point; skipping usage analysis");
        return Ok(UsageAnalysis::default());
    }

    let (mut deps, referenced) = DepBuilder::new(input.context, input.classes).build(&entry)?;
    postulate::seed(&mut deps, &entry, input.prims, &referenced);

    let (residual, used) = forward_chain(deps);

    let mut reachable = Vec::new();
    let mut used_args: FxHashMap<Name, BTreeSet<u32>> = FxHashMap::default();
    for node in &used {
        match node.arg {
            Arg::Result => reachable.push(node.name.clone()),
            Arg::Pos(i) => {
                used_args.entry(node.name.clone()).or_default().insert(i);
            }
        }
    }
    reachable.sort();

    debug!(count = reachable.len(), "reachable symbols");
    for name in &reachable {
        debug!(name = %name, "reachable");
    }
    trace!(?used_args, "minimal usage map");
    for (cond, nodes) in &residual {
        trace!(?cond, ?nodes, "residual edge");
    }

    check_accessibility(&used_args, input.opts)?;

    Ok(UsageAnalysis {
        reachable,
        used_args,
    })
}

/// Run the analysis and write used argument positions into the call
/// graph.
///
/// Every reachable symbol receives an entry; pure data constructors
/// that had none get a fresh record with empty call and SCC
/// information. Returns the reachable symbols, ascending.
///
/// # Errors
///
/// See [`UsageError`] for the failure surface.
pub fn perform_usage_analysis(
    input: &ErasureInput<'_>,
    call_graph: &mut CallGraph,
) -> UsageResult<Vec<Name>> {
    let analysis = analyze(input)?;
    for name in &analysis.reachable {
        let indices: Vec<u32> = analysis
            .used_args
            .get(name)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        call_graph.entry(name.clone()).or_default().used_args = indices;
    }
    Ok(analysis.reachable)
}

/// Reject runtime uses of argument positions an earlier pass proved
/// statically inaccessible.
fn check_accessibility(
    used_args: &FxHashMap<Name, BTreeSet<u32>>,
    opts: &OptTable,
) -> UsageResult<()> {
    for (name, used) in used_args {
        let Some(info) = opts.get(name) else { continue };
        let mut clash: Vec<u32> = info
            .inaccessible
            .iter()
            .copied()
            .filter(|i| used.contains(i))
            .collect();
        if !clash.is_empty() {
            clash.sort_unstable();
            return Err(UsageError::InaccessibleUsed {
                name: name.clone(),
                indices: clash,
            });
        }
    }
    Ok(())
}
