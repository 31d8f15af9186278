//! String interning for symbol-heavy compiler passes.
//!
//! Interned strings (symbols) give O(1) equality and hashing, which keeps
//! the name-keyed maps of the backend analyses compact and fast. The
//! interner is global and append-only; symbols stay valid for the lifetime
//! of the process.

#![warn(missing_docs)]

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// The global interner.
static INTERNER: LazyLock<Interner> = LazyLock::new(Interner::default);

/// An interned string.
///
/// `Symbol` is a cheap copyable handle; the string data lives in the
/// global interner. Ordering is by string contents, not interning order,
/// so symbol-keyed ordered collections sort the way a reader expects.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Symbol(u32);

impl Symbol {
    /// Intern a string and return its symbol.
    #[must_use]
    pub fn intern(s: &str) -> Self {
        INTERNER.intern(s)
    }

    /// The string this symbol stands for.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        INTERNER.get(self)
    }

    /// The raw interner index.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::intern(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::intern(&s)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

/// The store behind [`Symbol`].
#[derive(Default)]
struct Interner {
    map: RwLock<FxHashMap<&'static str, Symbol>>,
    strings: RwLock<Vec<&'static str>>,
}

impl Interner {
    fn intern(&self, s: &str) -> Symbol {
        // Fast path: already interned
        {
            let map = self.map.read();
            if let Some(&sym) = map.get(s) {
                return sym;
            }
        }

        let mut map = self.map.write();
        let mut strings = self.strings.write();

        // Double-check after acquiring the write lock
        if let Some(&sym) = map.get(s) {
            return sym;
        }

        // Leak to obtain a 'static str; the interner lives for the
        // whole process anyway.
        let interned: &'static str = Box::leak(s.to_string().into_boxed_str());
        let sym = Symbol(strings.len() as u32);

        strings.push(interned);
        map.insert(interned, sym);

        sym
    }

    fn get(&self, sym: Symbol) -> &'static str {
        let strings = self.strings.read();
        strings[sym.0 as usize]
    }
}

/// Pre-interned names with special meaning to the backend analyses.
pub mod well_known {
    use super::Symbol;
    use std::sync::LazyLock;

    macro_rules! define_names {
        ($($name:ident => $string:literal),* $(,)?) => {
            $(
                #[doc = concat!("The `", $string, "` name.")]
                pub static $name: LazyLock<Symbol> = LazyLock::new(|| Symbol::intern($string));
            )*

            /// Intern every well-known name. Called once at startup by
            /// the driver so later lookups never take the slow path.
            pub fn intern_all() {
                $(
                    let _ = *$name;
                )*
            }
        };
    }

    define_names! {
        // Entry point
        MAIN_NS => "Main",
        MAIN => "main",

        // Runtime support seeded by the usage analyzer
        RUN_IO => "run__IO",
        MK_PAIR => "__MkPair",

        // Variadic foreign-call builtins, handled at call sites
        MK_FOREIGN => "mkForeign",
        MK_FOREIGN_PRIM => "mkForeignPrim",
        MK_LAZY_FOREIGN_PRIM => "mkLazyForeignPrim",

        // Primitives with non-uniform argument usage
        PRIM_FORK => "prim_fork",
        BELIEVE_ME => "prim__believe_me",

        // Machine-generated names that are visible as globals
        UNIT => "__Unit",
        TRUE => "__True",
        FALSE => "__False",

        // Hint used for synthesized eta-expansion binders
        ETA => "eta",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_is_idempotent() {
        let a = Symbol::intern("fold");
        let b = Symbol::intern("fold");
        let c = Symbol::intern("unfold");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str(), "fold");
    }

    #[test]
    fn test_ordering_is_by_contents() {
        // Intern in reverse lexicographic order; comparison must still
        // follow the strings.
        let z = Symbol::intern("zeta");
        let a = Symbol::intern("alpha");

        assert!(a < z);
        assert_eq!(a, *"alpha");
    }

    #[test]
    fn test_well_known_names() {
        well_known::intern_all();
        assert_eq!(well_known::BELIEVE_ME.as_str(), "prim__believe_me");
        assert_eq!(*well_known::MAIN, Symbol::intern("main"));
    }
}
