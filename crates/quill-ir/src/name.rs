//! Resolved names.

use quill_intern::{well_known, Symbol};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Namespace segments of a qualified name, outermost first.
pub type NsPath = SmallVec<[Symbol; 2]>;

/// A resolved name.
///
/// Names are totally ordered and hashable so they can key the backend's
/// maps and sets. Two kinds exist: *user* names written in source
/// (possibly namespaced), and *machine* names synthesized by the
/// compiler, which carry a numeric tag plus a human-readable hint.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Name {
    /// A source-level name such as `Main.main`.
    User {
        /// Namespace path, outermost segment first; empty for plain names.
        ns: NsPath,
        /// The identifier itself.
        ident: Symbol,
    },
    /// A compiler-generated name.
    Machine {
        /// Disambiguating tag.
        tag: u32,
        /// Human-readable hint, e.g. `eta`.
        hint: Symbol,
    },
}

impl Name {
    /// A plain (un-namespaced) user name.
    #[must_use]
    pub fn user(ident: impl Into<Symbol>) -> Self {
        Self::User {
            ns: NsPath::new(),
            ident: ident.into(),
        }
    }

    /// A namespaced user name; `ns` is outermost-first.
    #[must_use]
    pub fn qualified(ns: &[&str], ident: &str) -> Self {
        Self::User {
            ns: ns.iter().map(|s| Symbol::intern(s)).collect(),
            ident: Symbol::intern(ident),
        }
    }

    /// A machine-generated name.
    #[must_use]
    pub fn machine(tag: u32, hint: impl Into<Symbol>) -> Self {
        Self::Machine {
            tag,
            hint: hint.into(),
        }
    }

    /// The entry point of a linked program, `Main.main`.
    #[must_use]
    pub fn entry_point() -> Self {
        Self::User {
            ns: std::iter::once(*well_known::MAIN_NS).collect(),
            ident: *well_known::MAIN,
        }
    }

    /// The identifier component, ignoring namespaces and tags.
    #[must_use]
    pub fn ident(&self) -> Symbol {
        match self {
            Self::User { ident, .. } => *ident,
            Self::Machine { hint, .. } => *hint,
        }
    }

    /// Whether this is a compiler-generated name.
    #[must_use]
    pub fn is_machine(&self) -> bool {
        matches!(self, Self::Machine { .. })
    }

    /// Machine-generated names that nevertheless behave like ordinary
    /// globals.
    ///
    /// Elaboration synthesizes `__Unit`, `__True` and `__False`; any
    /// other machine name appearing free in a body is a bug in an
    /// earlier pass.
    #[must_use]
    pub fn is_globally_visible(&self) -> bool {
        match self {
            Self::Machine { hint, .. } => {
                *hint == *well_known::UNIT
                    || *hint == *well_known::TRUE
                    || *hint == *well_known::FALSE
            }
            Self::User { .. } => false,
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User { ns, ident } => {
                for seg in ns {
                    write!(f, "{seg}.")?;
                }
                write!(f, "{ident}")
            }
            Self::Machine { tag, hint } => write!(f, "{{{hint}_{tag}}}"),
        }
    }
}
