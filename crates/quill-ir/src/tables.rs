//! Auxiliary compiler tables read and written by backend analyses.

use crate::Name;
use quill_intern::well_known;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Interface-class metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassInfo {
    /// The dictionary constructor.
    pub ctor: Name,
    /// Method names, in dictionary field order.
    pub methods: Vec<Name>,
    /// Known instances of the class.
    pub instances: Vec<Name>,
}

/// Class table: class name → [`ClassInfo`], with reverse resolution from
/// an instance to its class's dictionary constructor.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClassTable {
    classes: FxHashMap<Name, ClassInfo>,
    instance_class: FxHashMap<Name, Name>,
}

impl ClassTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class.
    pub fn define(&mut self, class: Name, info: ClassInfo) {
        for inst in &info.instances {
            self.instance_class.insert(inst.clone(), class.clone());
        }
        self.classes.insert(class, info);
    }

    /// Info for a class.
    #[must_use]
    pub fn get(&self, class: &Name) -> Option<&ClassInfo> {
        self.classes.get(class)
    }

    /// The dictionary constructor of the class `instance` implements.
    #[must_use]
    pub fn dictionary_ctor(&self, instance: &Name) -> Option<&Name> {
        let class = self.instance_class.get(instance)?;
        Some(&self.classes.get(class)?.ctor)
    }
}

/// Per-symbol optimization annotations produced by earlier passes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptInfo {
    /// Argument positions proven statically inaccessible.
    pub inaccessible: Vec<u32>,
}

/// Optimization-annotation table.
pub type OptTable = FxHashMap<Name, OptInfo>;

/// Per-symbol call-graph record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CgInfo {
    /// Direct callees.
    pub calls: Vec<Name>,
    /// Members of this symbol's strongly connected component.
    pub scc: Vec<Name>,
    /// Argument positions used at runtime, ascending. Written by the
    /// usage analyzer.
    pub used_args: Vec<u32>,
}

/// The call-graph table.
pub type CallGraph = FxHashMap<Name, CgInfo>;

/// The table of builtin primitives and their arities.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PrimTable {
    arities: FxHashMap<Name, u32>,
}

impl PrimTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard Quill primitive set.
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::default();
        for (name, arity) in [
            ("prim__addInt", 2),
            ("prim__subInt", 2),
            ("prim__mulInt", 2),
            ("prim__divInt", 2),
            ("prim__modInt", 2),
            ("prim__negInt", 1),
            ("prim__eqInt", 2),
            ("prim__ltInt", 2),
            ("prim__lteInt", 2),
            ("prim__addFloat", 2),
            ("prim__subFloat", 2),
            ("prim__mulFloat", 2),
            ("prim__divFloat", 2),
            ("prim__eqFloat", 2),
            ("prim__floatToInt", 1),
            ("prim__intToFloat", 1),
            ("prim__concat", 2),
            ("prim__eqString", 2),
            ("prim__strLen", 1),
            ("prim__strHead", 1),
            ("prim__strTail", 1),
            ("prim__strCons", 2),
            ("prim__strIndex", 2),
            ("prim__intToStr", 1),
            ("prim__strToInt", 1),
            ("prim__intToChar", 1),
            ("prim__charToInt", 1),
            ("prim__writeStr", 1),
            ("prim__readStr", 1),
        ] {
            table.define(Name::user(name), arity);
        }
        table.define(Name::user(*well_known::PRIM_FORK), 1);
        table.define(Name::user(*well_known::BELIEVE_ME), 3);
        table
    }

    /// Register a primitive.
    pub fn define(&mut self, name: Name, arity: u32) {
        self.arities.insert(name, arity);
    }

    /// Arity of `name`, if it is a primitive.
    #[must_use]
    pub fn arity(&self, name: &Name) -> Option<u32> {
        self.arities.get(name).copied()
    }

    /// Whether `name` is a primitive.
    #[must_use]
    pub fn contains(&self, name: &Name) -> bool {
        self.arities.contains_key(name)
    }

    /// Iterate over all primitives.
    pub fn iter(&self) -> impl Iterator<Item = (&Name, u32)> {
        self.arities.iter().map(|(name, arity)| (name, *arity))
    }
}
