//! # Quill IR
//!
//! The elaborated intermediate representation consumed by Quill's backend
//! passes: names, terms, case trees, top-level definitions, and the
//! compiler tables that surround them.
//!
//! By the time a program reaches this representation, elaboration and
//! type checking are done. Pattern-matching definitions have been
//! compiled to *case trees* ([`CaseTree`]): nested scrutiny of one
//! variable at a time, one alternative per constructor or constant plus a
//! default, with nested case blocks lifted to top-level functions. The
//! backend passes consume all of it read-only.
//!
//! ## Core types
//!
//! - [`Name`]: a resolved top-level or local name
//! - [`Term`]: the small term calculus bodies are written in
//! - [`CaseTree`] / [`CaseAlt`]: compiled pattern matching
//! - [`Def`] / [`Context`]: definitions and the symbol table
//! - [`ClassTable`], [`OptTable`], [`CallGraph`], [`PrimTable`]: the
//!   auxiliary tables analyses read and write

#![warn(missing_docs)]

mod def;
mod name;
mod tables;
mod term;

pub use def::{CaseDef, CaseFun, Context, Def, Resolution};
pub use name::{Name, NsPath};
pub use tables::{CallGraph, CgInfo, ClassInfo, ClassTable, OptInfo, OptTable, PrimTable};
pub use term::{Binder, CaseAlt, CaseTree, Const, RefKind, Term};
