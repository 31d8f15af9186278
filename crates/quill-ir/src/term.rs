//! The term calculus and case trees.

use crate::Name;
use serde::{Deserialize, Serialize};

/// How elaboration resolved a [`Term::Ref`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefKind {
    /// A locally bound variable (parameter or pattern variable).
    Bound,
    /// A top-level function or postulate.
    Ref,
    /// A data constructor.
    DataCon {
        /// Runtime constructor tag.
        tag: u32,
    },
    /// A type constructor.
    TypeCon,
}

/// A literal constant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Const {
    /// Machine integer.
    Int(i64),
    /// Double-precision float.
    Float(f64),
    /// String literal.
    Str(String),
    /// Character literal.
    Char(char),
}

/// The binder of a [`Term::Bind`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Binder {
    /// Lambda abstraction.
    Lam {
        /// Domain type.
        ty: Term,
    },
    /// Dependent function space.
    Pi {
        /// Domain type.
        ty: Term,
    },
    /// Strict let binding.
    Let {
        /// Declared type of the binding.
        ty: Term,
        /// The bound value.
        val: Term,
    },
    /// Lazy let binding.
    LazyLet {
        /// Declared type of the binding.
        ty: Term,
        /// The bound value.
        val: Term,
    },
}

impl Binder {
    /// The bound value of a let binder, if any.
    #[must_use]
    pub fn let_value(&self) -> Option<&Term> {
        match self {
            Self::Let { val, .. } | Self::LazyLet { val, .. } => Some(val),
            Self::Lam { .. } | Self::Pi { .. } => None,
        }
    }
}

/// A term of the elaborated calculus.
///
/// Binders introduced inside a term are referenced by de Bruijn index
/// ([`Term::V`], innermost = 0); parameters and pattern variables
/// introduced by the enclosing case tree are referenced by name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Term {
    /// A reference to a named thing.
    Ref(RefKind, Name),
    /// De Bruijn variable.
    V(usize),
    /// A binder around a body.
    Bind(Name, Box<Binder>, Box<Term>),
    /// Application of a function to one argument.
    App(Box<Term>, Box<Term>),
    /// Projection of field `i` out of a record or dictionary value.
    Proj(Box<Term>, u32),
    /// A literal.
    Const(Const),
    /// The type universe.
    Type,
    /// A subterm erased by a previous pass.
    Erased,
    /// A branch proven unreachable.
    Impossible,
}

impl Term {
    /// Build an application.
    #[must_use]
    pub fn app(f: Term, x: Term) -> Self {
        Self::App(Box::new(f), Box::new(x))
    }

    /// Apply `f` to each argument in turn.
    #[must_use]
    pub fn apply(f: Term, args: impl IntoIterator<Item = Term>) -> Self {
        args.into_iter().fold(f, Self::app)
    }

    /// A reference to a top-level function.
    #[must_use]
    pub fn global(name: Name) -> Self {
        Self::Ref(RefKind::Ref, name)
    }

    /// A reference to a locally bound variable.
    #[must_use]
    pub fn local(name: Name) -> Self {
        Self::Ref(RefKind::Bound, name)
    }

    /// Strip applications, returning the head and the argument spine in
    /// left-to-right order.
    #[must_use]
    pub fn unapply(&self) -> (&Term, Vec<&Term>) {
        let mut head = self;
        let mut args = Vec::new();
        while let Term::App(f, x) = head {
            args.push(x.as_ref());
            head = f.as_ref();
        }
        args.reverse();
        (head, args)
    }
}

/// A decision tree compiled from pattern-matching equations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CaseTree {
    /// Scrutinize the named variable.
    Case(Name, Vec<CaseAlt>),
    /// Scrutinize a projection. Produced only by record desugaring;
    /// backend analyses reject it.
    ProjCase(Term, Vec<CaseAlt>),
    /// A leaf: evaluate the term.
    Leaf(Term),
    /// A missing case, with a diagnostic message.
    Unmatched(String),
    /// A branch proven impossible by coverage checking.
    Impossible,
}

/// One alternative of a [`CaseTree::Case`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CaseAlt {
    /// Constructor pattern `C(a, b, ...)`.
    Con {
        /// The constructor.
        name: Name,
        /// Pattern variables bound to the constructor fields.
        binders: Vec<Name>,
        /// Sub-tree taken on a match.
        tree: CaseTree,
    },
    /// Function-header pattern. Backend analyses reject it.
    FnCase {
        /// The matched function.
        name: Name,
        /// Bound argument variables.
        binders: Vec<Name>,
        /// Sub-tree taken on a match.
        tree: CaseTree,
    },
    /// Constant pattern.
    Const {
        /// The matched constant.
        value: Const,
        /// Sub-tree taken on a match.
        tree: CaseTree,
    },
    /// Successor pattern `S n` on machine naturals.
    Suc {
        /// Binds the predecessor.
        binder: Name,
        /// Sub-tree taken on a match.
        tree: CaseTree,
    },
    /// Catch-all.
    Default {
        /// Sub-tree taken when nothing else matches.
        tree: CaseTree,
    },
}
