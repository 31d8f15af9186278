//! Top-level definitions and the symbol table.

use crate::{CaseTree, Name, Term};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A case function: the parameters bound by a tree plus the tree itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaseFun {
    /// Parameters bound by the tree, left to right.
    pub params: Vec<Name>,
    /// The decision tree.
    pub tree: CaseTree,
}

/// A pattern-matching definition compiled to case trees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaseDef {
    /// Declared parameter types.
    pub arg_tys: Vec<Term>,
    /// The runtime-compiled variant of the tree. Nested case blocks have
    /// already been lifted to top-level functions.
    pub runtime: CaseFun,
}

impl CaseDef {
    /// Declared arity. The runtime tree may bind fewer parameters than
    /// this (partial eta form).
    #[must_use]
    pub fn arity(&self) -> usize {
        self.arg_tys.len()
    }
}

/// A top-level definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Def {
    /// A type declaration or type constructor.
    TyDecl {
        /// Declared arity.
        arity: u32,
    },
    /// A data constructor.
    DataCon {
        /// Runtime tag.
        tag: u32,
        /// Number of fields.
        arity: u32,
    },
    /// A primitive operator.
    Operator {
        /// Number of operands.
        arity: u32,
    },
    /// An elaborated function body that has not been compiled to a case
    /// tree yet. Backend passes reject it.
    Function {
        /// The body term.
        body: Term,
    },
    /// A function compiled to case trees.
    CaseOp(CaseDef),
}

/// Outcome of resolving a name in the [`Context`].
#[derive(Debug)]
pub enum Resolution<'a> {
    /// Exactly one definition.
    Found(&'a Def),
    /// No definition.
    NotFound,
    /// More than one candidate definition; carries the candidate names.
    Ambiguous(Vec<Name>),
}

/// The symbol table: every top-level name the program defines.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Context {
    defs: FxHashMap<Name, Def>,
}

impl Context {
    /// An empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, replacing any previous one for `name`.
    pub fn define(&mut self, name: Name, def: Def) {
        self.defs.insert(name, def);
    }

    /// Exact lookup.
    #[must_use]
    pub fn get(&self, name: &Name) -> Option<&Def> {
        self.defs.get(name)
    }

    /// Resolve a reference.
    ///
    /// Exact hits win. An unqualified user name additionally matches a
    /// definition with the same identifier in any namespace, provided
    /// that match is unique; several such matches are reported as
    /// ambiguous rather than picking one.
    #[must_use]
    pub fn resolve(&self, name: &Name) -> Resolution<'_> {
        if let Some(def) = self.defs.get(name) {
            return Resolution::Found(def);
        }

        let Name::User { ns, ident } = name else {
            return Resolution::NotFound;
        };
        if !ns.is_empty() {
            return Resolution::NotFound;
        }

        let mut hits = self.defs.iter().filter(|(candidate, _)| {
            matches!(candidate, Name::User { ident: i, .. } if i == ident)
        });
        match (hits.next(), hits.next()) {
            (None, _) => Resolution::NotFound,
            (Some((_, def)), None) => Resolution::Found(def),
            (Some((a, _)), Some((b, _))) => {
                let mut candidates = vec![a.clone(), b.clone()];
                candidates.extend(hits.map(|(n, _)| n.clone()));
                candidates.sort();
                Resolution::Ambiguous(candidates)
            }
        }
    }

    /// Iterate over all definitions.
    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Def)> {
        self.defs.iter()
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether the context holds no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
