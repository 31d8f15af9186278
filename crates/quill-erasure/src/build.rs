//! Conditional dependency graph construction.
//!
//! Starting from the entry symbol, walks every reachable definition's
//! case tree and emits *conditional* dependency edges: each conclusion
//! holds only under a conjunction of "argument position `i` of `f` is
//! used" assumptions. All edges accumulate into one global map, which
//! the solver later discharges to a fixed point.
//!
//! The central ideas:
//!
//! - Everything inside a function body is gated on the function's
//!   *result* being demanded.
//! - A call argument is analyzed under the extra assumption that its
//!   position in the callee is used, so the argument's dependencies
//!   fire only if the callee actually consumes that position.
//! - A constructor pattern variable inherits the scrutinee's
//!   dependencies plus "field `j` of constructor `C` is used", which is
//!   what lets the solver erase never-projected constructor fields.

use crate::node::{cond_with, insert_edge, merge_deps, Cond, DepSet, Deps, Node};
use crate::postulate;
use crate::{UsageError, UsageResult};
use quill_intern::well_known;
use quill_ir::{
    Binder, CaseAlt, CaseDef, CaseFun, CaseTree, ClassTable, Context, Def, Name, RefKind,
    Resolution, Term,
};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

/// Node set a locally bound variable carries.
type Var = DepSet;

/// Variable environment: locally bound name → the nodes its value
/// depends on. A parameter of `f` at position `i` starts as
/// `{(f, Arg i)}`; pattern variables extend this during tree descent.
type Vars = FxHashMap<Name, Var>;

/// One enclosing binder on the de Bruijn stack.
///
/// A let entry stores the bound term; a reference to it re-analyzes
/// the term against the stack prefix below the binder, under whatever
/// condition is in force at the reference site. Lambda and Pi binders
/// carry no dependencies of their own.
#[derive(Clone, Copy)]
enum BinderDep<'t> {
    Opaque,
    Bound(&'t Term),
}

/// Builds the whole-program conditional dependency map.
pub struct DepBuilder<'a> {
    context: &'a Context,
    classes: &'a ClassTable,
    visited: FxHashSet<Name>,
    deps: Deps,
}

impl<'a> DepBuilder<'a> {
    /// A builder over the given program.
    #[must_use]
    pub fn new(context: &'a Context, classes: &'a ClassTable) -> Self {
        Self {
            context,
            classes,
            visited: FxHashSet::default(),
            deps: Deps::default(),
        }
    }

    /// Depth-first traversal of names reachable from `entry`.
    ///
    /// Each definition is analyzed once; every name appearing in a new
    /// edge (condition or conclusion) joins the frontier. Returns the
    /// accumulated map together with the set of names visited.
    ///
    /// # Errors
    ///
    /// Fails on unknown or ambiguous references, on definitions that
    /// were never compiled to case trees, and on the unsupported
    /// constructs listed in [`UsageError`].
    pub fn build(mut self, entry: &Name) -> UsageResult<(Deps, FxHashSet<Name>)> {
        let mut frontier = vec![entry.clone()];
        while let Some(name) = frontier.pop() {
            if !self.visited.insert(name.clone()) {
                continue;
            }
            let new = self.def_deps(&name)?;
            for (cond, nodes) in &new {
                for node in cond.iter().chain(nodes.iter()) {
                    if !self.visited.contains(&node.name) {
                        frontier.push(node.name.clone());
                    }
                }
            }
            merge_deps(&mut self.deps, new);
        }
        Ok((self.deps, self.visited))
    }

    /// Dependencies contributed by a single definition.
    fn def_deps(&self, name: &Name) -> UsageResult<Deps> {
        match self.context.resolve(name) {
            Resolution::Found(Def::TyDecl { .. } | Def::DataCon { .. } | Def::Operator { .. }) => {
                Ok(Deps::default())
            }
            Resolution::Found(Def::Function { .. }) => Err(UsageError::NotCaseCompiled {
                name: name.clone(),
            }),
            Resolution::Found(Def::CaseOp(def)) => {
                debug!(name = %name, "analyzing case tree");
                self.case_op_deps(name, def)
            }
            Resolution::NotFound if postulate::is_postulated_builtin(name) => Ok(Deps::default()),
            Resolution::NotFound => Err(UsageError::UnknownReference { name: name.clone() }),
            Resolution::Ambiguous(candidates) => Err(UsageError::AmbiguousReference {
                name: name.clone(),
                candidates,
            }),
        }
    }

    fn case_op_deps(&self, fn_name: &Name, def: &CaseDef) -> UsageResult<Deps> {
        let CaseFun { params, tree } = &def.runtime;

        let mut vars = Vars::default();
        for (i, param) in params.iter().enumerate() {
            vars.insert(
                param.clone(),
                DepSet::from_iter([Node::pos(fn_name.clone(), i as u32)]),
            );
        }

        // Partial eta form: the tree may bind fewer variables than the
        // declared arity. Synthesize the missing parameters and apply
        // them at every leaf.
        let mut etas = Vec::new();
        for i in params.len()..def.arity() {
            let eta = Name::machine(i as u32, *well_known::ETA);
            vars.insert(
                eta.clone(),
                DepSet::from_iter([Node::pos(fn_name.clone(), i as u32)]),
            );
            etas.push(eta);
        }

        self.tree_deps(fn_name, &etas, &vars, tree)
    }

    fn tree_deps(
        &self,
        fn_name: &Name,
        etas: &[Name],
        vars: &Vars,
        tree: &CaseTree,
    ) -> UsageResult<Deps> {
        match tree {
            CaseTree::Impossible | CaseTree::Unmatched(_) => Ok(Deps::default()),

            // Everything a leaf references is gated on the function's
            // result being demanded.
            CaseTree::Leaf(term) => {
                let cond = Cond::from_iter([Node::result(fn_name.clone())]);
                if etas.is_empty() {
                    self.term_deps(vars, &[], &cond, term)
                } else {
                    let expanded = eta_expand(etas, term);
                    self.term_deps(vars, &[], &cond, &expanded)
                }
            }

            CaseTree::Case(scrut, alts) => {
                let cased = vars.get(scrut).ok_or_else(|| {
                    UsageError::Internal(format!(
                        "case on non-pattern variable {scrut} in {fn_name}"
                    ))
                })?;

                // Scrutinizing the variable uses it, but only when the
                // function's result is used.
                let mut deps = Deps::default();
                insert_edge(
                    &mut deps,
                    Cond::from_iter([Node::result(fn_name.clone())]),
                    cased.iter().cloned(),
                );

                for alt in alts {
                    let alt_deps = self.alt_deps(fn_name, etas, vars, cased, alt)?;
                    merge_deps(&mut deps, alt_deps);
                }
                Ok(deps)
            }

            CaseTree::ProjCase(..) => Err(UsageError::Unsupported(format!(
                "projection case in {fn_name}"
            ))),
        }
    }

    fn alt_deps(
        &self,
        fn_name: &Name,
        etas: &[Name],
        vars: &Vars,
        cased: &Var,
        alt: &CaseAlt,
    ) -> UsageResult<Deps> {
        match alt {
            // A pattern variable inherits the scrutinee's dependencies
            // plus the fact that its field must be present.
            CaseAlt::Con {
                name,
                binders,
                tree,
            } => {
                let mut vars = vars.clone();
                for (j, binder) in binders.iter().enumerate() {
                    let mut var = cased.clone();
                    var.insert(Node::pos(name.clone(), j as u32));
                    vars.insert(binder.clone(), var);
                }
                self.tree_deps(fn_name, etas, &vars, tree)
            }

            CaseAlt::FnCase { name, .. } => Err(UsageError::Unsupported(format!(
                "function-header case alternative {name} in {fn_name}"
            ))),

            CaseAlt::Const { tree, .. } | CaseAlt::Default { tree } => {
                self.tree_deps(fn_name, etas, vars, tree)
            }

            // Successor matching is transparent: the predecessor
            // inherits the scrutinee's dependencies verbatim.
            CaseAlt::Suc { binder, tree } => {
                let mut vars = vars.clone();
                vars.insert(binder.clone(), cased.clone());
                self.tree_deps(fn_name, etas, &vars, tree)
            }
        }
    }

    fn term_deps<'t>(
        &self,
        vars: &Vars,
        stack: &[BinderDep<'t>],
        cond: &Cond,
        term: &'t Term,
    ) -> UsageResult<Deps> {
        match term {
            Term::App(..) => {
                let (head, args) = term.unapply();
                self.app_deps(vars, stack, cond, head, &args)
            }

            Term::Ref(_, name) => self.ref_deps(vars, cond, name),

            Term::V(index) => self.debruijn_deps(vars, stack, cond, *index),

            Term::Bind(_, binder, body) => {
                let entry = match binder.let_value() {
                    Some(val) => BinderDep::Bound(val),
                    None => BinderDep::Opaque,
                };
                let mut inner = stack.to_vec();
                inner.push(entry);
                self.term_deps(vars, &inner, cond, body)
            }

            Term::Proj(inner, _) => self.term_deps(vars, stack, cond, inner),

            Term::Const(_) | Term::Type | Term::Erased | Term::Impossible => Ok(Deps::default()),
        }
    }

    /// A bare reference: a bound variable yields its carried node set; a
    /// global yields a demand on its result.
    fn ref_deps(&self, vars: &Vars, cond: &Cond, name: &Name) -> UsageResult<Deps> {
        let mut deps = Deps::default();
        if let Some(var) = vars.get(name) {
            insert_edge(&mut deps, cond.clone(), var.iter().cloned());
            return Ok(deps);
        }
        if name.is_machine() && !name.is_globally_visible() {
            return Err(UsageError::StrayMachineName { name: name.clone() });
        }
        insert_edge(&mut deps, cond.clone(), [Node::result(name.clone())]);
        Ok(deps)
    }

    fn debruijn_deps<'t>(
        &self,
        vars: &Vars,
        stack: &[BinderDep<'t>],
        cond: &Cond,
        index: usize,
    ) -> UsageResult<Deps> {
        let slot = stack.len().checked_sub(index + 1).ok_or_else(|| {
            UsageError::Internal(format!(
                "de Bruijn index {index} exceeds binder depth {}",
                stack.len()
            ))
        })?;
        match stack[slot] {
            BinderDep::Opaque => Ok(Deps::default()),
            // The let-bound term contributes only at reference sites,
            // under the condition in force there.
            BinderDep::Bound(val) => self.term_deps(vars, &stack[..slot], cond, val),
        }
    }

    fn app_deps<'t>(
        &self,
        vars: &Vars,
        stack: &[BinderDep<'t>],
        cond: &Cond,
        head: &'t Term,
        args: &[&'t Term],
    ) -> UsageResult<Deps> {
        if args.is_empty() {
            return self.term_deps(vars, stack, cond, head);
        }
        match head {
            // Type constructors carry no runtime data: arguments only.
            Term::Ref(RefKind::TypeCon, _) => self.spine_deps(vars, stack, cond, args),

            Term::Ref(_, name) => {
                // Foreign-call wrappers: the leading type spec exists
                // only at compile time.
                if is_foreign_wrapper(name) {
                    return self.spine_deps(vars, stack, cond, &args[1..]);
                }
                // A bound variable may itself be applied; its arguments
                // are then opaque to erasure.
                if let Some(var) = vars.get(name) {
                    let mut deps = Deps::default();
                    insert_edge(&mut deps, cond.clone(), var.iter().cloned());
                    merge_deps(&mut deps, self.spine_deps(vars, stack, cond, args)?);
                    return Ok(deps);
                }
                self.node_deps(vars, stack, cond, name, args)
            }

            Term::V(index) => {
                let mut deps = self.debruijn_deps(vars, stack, cond, *index)?;
                merge_deps(&mut deps, self.spine_deps(vars, stack, cond, args)?);
                Ok(deps)
            }

            Term::Bind(_, binder, body) => match &**binder {
                // (\x. body) a bs  ~  let x = a in (body bs)
                Binder::Lam { .. } => {
                    let mut inner = stack.to_vec();
                    inner.push(BinderDep::Bound(args[0]));
                    let (body_head, mut body_args) = body.unapply();
                    body_args.extend_from_slice(&args[1..]);
                    self.app_deps(vars, &inner, cond, body_head, &body_args)
                }

                // (let x = v in body) as  ~  let x = v in (body as)
                Binder::Let { val, .. } | Binder::LazyLet { val, .. } => {
                    let mut inner = stack.to_vec();
                    inner.push(BinderDep::Bound(val));
                    let (body_head, mut body_args) = body.unapply();
                    body_args.extend_from_slice(args);
                    self.app_deps(vars, &inner, cond, body_head, &body_args)
                }

                Binder::Pi { .. } => {
                    Err(UsageError::Unsupported("application of a Pi binder".into()))
                }
            },

            // Method projection out of an interface dictionary: demand
            // the projected field of the dictionary constructor. Coarse
            // but sound.
            Term::Proj(dict, field) => {
                let (dict_head, _) = dict.unapply();
                if let Term::Ref(_, instance) = dict_head {
                    if let Some(ctor) = self.classes.dictionary_ctor(instance) {
                        let mut deps = Deps::default();
                        insert_edge(
                            &mut deps,
                            cond.clone(),
                            [Node::pos(ctor.clone(), *field), Node::result(instance.clone())],
                        );
                        merge_deps(&mut deps, self.spine_deps(vars, stack, cond, args)?);
                        return Ok(deps);
                    }
                }
                Err(UsageError::Unsupported(format!(
                    "applied projection of {dict_head:?}"
                )))
            }

            Term::Erased | Term::Type => self.spine_deps(vars, stack, cond, args),

            other => Err(UsageError::Unsupported(format!(
                "application head {other:?}"
            ))),
        }
    }

    /// The rule for a call to a global symbol: the callee's result is
    /// demanded under the current condition, and each in-arity argument
    /// is analyzed under the extra assumption that its position is used.
    /// Over-saturated arguments cannot be erased here and stay
    /// unconditional.
    fn node_deps<'t>(
        &self,
        vars: &Vars,
        stack: &[BinderDep<'t>],
        cond: &Cond,
        name: &Name,
        args: &[&'t Term],
    ) -> UsageResult<Deps> {
        let arity = self.node_arity(name);
        let mut deps = Deps::default();
        insert_edge(&mut deps, cond.clone(), [Node::result(name.clone())]);
        for (i, arg) in args.iter().enumerate() {
            let arg_cond = if i < arity {
                cond_with(cond, Node::pos(name.clone(), i as u32))
            } else {
                cond.clone()
            };
            merge_deps(&mut deps, self.term_deps(vars, stack, &arg_cond, arg)?);
        }
        Ok(deps)
    }

    /// Number of erasable argument positions of `name` seen from a call
    /// site. Unknown and opaque symbols have none.
    fn node_arity(&self, name: &Name) -> usize {
        match self.context.resolve(name) {
            Resolution::Found(Def::CaseOp(def)) => def.arity(),
            Resolution::Found(Def::DataCon { arity, .. } | Def::Operator { arity }) => {
                *arity as usize
            }
            _ => 0,
        }
    }

    /// Analyze arguments under the current condition, without gating.
    fn spine_deps<'t>(
        &self,
        vars: &Vars,
        stack: &[BinderDep<'t>],
        cond: &Cond,
        args: &[&'t Term],
    ) -> UsageResult<Deps> {
        let mut deps = Deps::default();
        for arg in args {
            merge_deps(&mut deps, self.term_deps(vars, stack, cond, arg)?);
        }
        Ok(deps)
    }
}

/// The variadic foreign-call builtins, whose first argument is a
/// compile-time type spec.
fn is_foreign_wrapper(name: &Name) -> bool {
    match name {
        Name::User { ns, ident } if ns.is_empty() => {
            *ident == *well_known::MK_FOREIGN
                || *ident == *well_known::MK_FOREIGN_PRIM
                || *ident == *well_known::MK_LAZY_FOREIGN_PRIM
        }
        _ => false,
    }
}

/// Apply a leaf term to each synthesized eta variable.
fn eta_expand(etas: &[Name], term: &Term) -> Term {
    let mut out = term.clone();
    for eta in etas {
        out = Term::app(out, Term::local(eta.clone()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_ir::Const;

    fn case_op(params: &[&str], arity: usize, tree: CaseTree) -> Def {
        Def::CaseOp(CaseDef {
            arg_tys: vec![Term::Erased; arity],
            runtime: CaseFun {
                params: params.iter().map(|p| Name::user(*p)).collect(),
                tree,
            },
        })
    }

    fn build(ctx: &Context, entry: &Name) -> UsageResult<Deps> {
        let classes = ClassTable::new();
        DepBuilder::new(ctx, &classes)
            .build(entry)
            .map(|(deps, _)| deps)
    }

    fn result_cond(name: &Name) -> Cond {
        Cond::from_iter([Node::result(name.clone())])
    }

    // --------------------------------------------------------
    // Pattern-variable law: matching C(a, b) against a scrutinee
    // that carries (f, Arg 0) and using `a` records
    // {(f, Result)} ↦ {(f, Arg 0), (C, Arg 0)}.
    // --------------------------------------------------------
    #[test]
    fn test_pattern_variable_inherits_scrutinee_and_field() {
        let f = Name::user("f");
        let con = Name::user("C");

        let mut ctx = Context::new();
        ctx.define(con.clone(), Def::DataCon { tag: 0, arity: 2 });
        ctx.define(
            f.clone(),
            case_op(
                &["x"],
                1,
                CaseTree::Case(
                    Name::user("x"),
                    vec![CaseAlt::Con {
                        name: con.clone(),
                        binders: vec![Name::user("a"), Name::user("b")],
                        tree: CaseTree::Leaf(Term::local(Name::user("a"))),
                    }],
                ),
            ),
        );

        let deps = build(&ctx, &f).unwrap();
        let leaf = &deps[&result_cond(&f)];
        assert!(leaf.contains(&Node::pos(f.clone(), 0)));
        assert!(leaf.contains(&Node::pos(con.clone(), 0)));
        // Field 1 is never projected, so no conclusion mentions it.
        let all: Vec<&Node> = deps.values().flatten().collect();
        assert!(!all.contains(&&Node::pos(con, 1)));
    }

    // --------------------------------------------------------
    // Scrutinizing a variable uses it under the function's
    // result, even if no alternative references anything.
    // --------------------------------------------------------
    #[test]
    fn test_scrutinee_is_used_under_result() {
        let f = Name::user("f");
        let mut ctx = Context::new();
        ctx.define(
            f.clone(),
            case_op(
                &["x"],
                1,
                CaseTree::Case(
                    Name::user("x"),
                    vec![CaseAlt::Default {
                        tree: CaseTree::Leaf(Term::Const(Const::Int(0))),
                    }],
                ),
            ),
        );

        let deps = build(&ctx, &f).unwrap();
        assert!(deps[&result_cond(&f)].contains(&Node::pos(f.clone(), 0)));
    }

    // --------------------------------------------------------
    // A dead let contributes nothing; a referenced let carries
    // its dependencies to the reference site.
    // --------------------------------------------------------
    #[test]
    fn test_let_is_analyzed_lazily() {
        let f = Name::user("f");
        let dead = |body: Term| {
            case_op(
                &["x"],
                1,
                CaseTree::Leaf(Term::Bind(
                    Name::user("y"),
                    Box::new(Binder::Let {
                        ty: Term::Erased,
                        val: Term::local(Name::user("x")),
                    }),
                    Box::new(body),
                )),
            )
        };

        // let y = x in 42: x never demanded.
        let mut ctx = Context::new();
        ctx.define(f.clone(), dead(Term::Const(Const::Int(42))));
        let deps = build(&ctx, &f).unwrap();
        let all: Vec<&Node> = deps.values().flatten().collect();
        assert!(!all.contains(&&Node::pos(f.clone(), 0)));

        // let y = x in y: the reference triggers the binding.
        let mut ctx = Context::new();
        ctx.define(f.clone(), dead(Term::V(0)));
        let deps = build(&ctx, &f).unwrap();
        assert!(deps[&result_cond(&f)].contains(&Node::pos(f, 0)));
    }

    // --------------------------------------------------------
    // Eta expansion: a tree binding fewer variables than the
    // declared arity passes the synthesized parameters along.
    // --------------------------------------------------------
    #[test]
    fn test_eta_expansion_forwards_missing_params() {
        let f = Name::user("f");
        let g = Name::user("g");

        let mut ctx = Context::new();
        ctx.define(
            g.clone(),
            case_op(&["a", "b"], 2, CaseTree::Leaf(Term::local(Name::user("b")))),
        );
        // f binds one of its two parameters and returns `g x` applied
        // to the eta-expanded remainder.
        ctx.define(
            f.clone(),
            case_op(
                &["x"],
                2,
                CaseTree::Leaf(Term::app(
                    Term::global(g.clone()),
                    Term::local(Name::user("x")),
                )),
            ),
        );

        let deps = build(&ctx, &f).unwrap();
        // The eta argument lands in g's second position: its
        // dependency (f, Arg 1) is gated on (g, Arg 1).
        let mut cond = result_cond(&f);
        cond.insert(Node::pos(g, 1));
        assert!(deps[&cond].contains(&Node::pos(f, 1)));
    }

    // --------------------------------------------------------
    // Call arguments are gated per position; extra arguments
    // beyond the callee's arity stay unconditional.
    // --------------------------------------------------------
    #[test]
    fn test_over_saturated_arguments_are_unconditional() {
        let f = Name::user("f");
        let id = Name::user("id");
        let k = Name::user("k");

        let mut ctx = Context::new();
        ctx.define(k.clone(), Def::TyDecl { arity: 0 });
        ctx.define(
            id.clone(),
            case_op(&["x"], 1, CaseTree::Leaf(Term::local(Name::user("x")))),
        );
        // f = id id k: the second application is over-saturated from
        // this call site's point of view.
        ctx.define(
            f.clone(),
            case_op(
                &[],
                0,
                CaseTree::Leaf(Term::apply(
                    Term::global(id.clone()),
                    [Term::global(id.clone()), Term::global(k.clone())],
                )),
            ),
        );

        let deps = build(&ctx, &f).unwrap();
        // Arg 0 is gated on (id, Arg 0)...
        let gated = cond_with(&result_cond(&f), Node::pos(id.clone(), 0));
        assert!(deps[&gated].contains(&Node::result(id)));
        // ...while the extra argument is demanded unconditionally.
        assert!(deps[&result_cond(&f)].contains(&Node::result(k)));
    }

    // --------------------------------------------------------
    // Foreign-call wrappers drop the compile-time type spec.
    // --------------------------------------------------------
    #[test]
    fn test_foreign_wrapper_drops_type_spec() {
        let f = Name::user("f");
        let callee = Name::user("c_putchar");

        let mut ctx = Context::new();
        ctx.define(callee.clone(), Def::TyDecl { arity: 0 });
        // The spec head is deliberately undefined: if it were
        // analyzed, the traversal would fail with UnknownReference.
        ctx.define(
            f.clone(),
            case_op(
                &[],
                0,
                CaseTree::Leaf(Term::apply(
                    Term::global(Name::user("mkForeign")),
                    [
                        Term::global(Name::user("ffiSpec")),
                        Term::global(callee.clone()),
                        Term::Const(Const::Int(7)),
                    ],
                )),
            ),
        );

        let deps = build(&ctx, &f).unwrap();
        assert!(deps[&result_cond(&f)].contains(&Node::result(callee)));
        let all: Vec<&Node> = deps.values().flatten().collect();
        assert!(!all.iter().any(|n| n.name == Name::user("ffiSpec")));
    }

    // --------------------------------------------------------
    // Error cases.
    // --------------------------------------------------------
    #[test]
    fn test_unknown_reference_is_fatal() {
        let f = Name::user("f");
        let mut ctx = Context::new();
        ctx.define(
            f.clone(),
            case_op(&[], 0, CaseTree::Leaf(Term::global(Name::user("ghost")))),
        );

        match build(&ctx, &f) {
            Err(UsageError::UnknownReference { name }) => assert_eq!(name, Name::user("ghost")),
            other => panic!("expected unknown reference, got {other:?}"),
        }
    }

    #[test]
    fn test_stray_machine_variable_is_fatal() {
        let f = Name::user("f");
        let mut ctx = Context::new();
        ctx.define(
            f.clone(),
            case_op(
                &[],
                0,
                CaseTree::Leaf(Term::local(Name::machine(3, "pv"))),
            ),
        );

        assert!(matches!(
            build(&ctx, &f),
            Err(UsageError::StrayMachineName { .. })
        ));
    }

    #[test]
    fn test_whitelisted_machine_name_is_a_global() {
        let f = Name::user("f");
        let unit = Name::machine(0, "__Unit");
        let mut ctx = Context::new();
        ctx.define(unit.clone(), Def::DataCon { tag: 0, arity: 0 });
        ctx.define(f.clone(), case_op(&[], 0, CaseTree::Leaf(Term::local(unit.clone()))));

        let deps = build(&ctx, &f).unwrap();
        assert!(deps[&result_cond(&f)].contains(&Node::result(unit)));
    }

    #[test]
    fn test_projection_case_is_unsupported() {
        let f = Name::user("f");
        let mut ctx = Context::new();
        ctx.define(
            f.clone(),
            case_op(&[], 0, CaseTree::ProjCase(Term::Erased, vec![])),
        );

        assert!(matches!(build(&ctx, &f), Err(UsageError::Unsupported(_))));
    }

    #[test]
    fn test_uncompiled_function_is_fatal() {
        let f = Name::user("f");
        let g = Name::user("g");
        let mut ctx = Context::new();
        ctx.define(g.clone(), Def::Function { body: Term::Erased });
        ctx.define(f.clone(), case_op(&[], 0, CaseTree::Leaf(Term::global(g))));

        assert!(matches!(
            build(&ctx, &f),
            Err(UsageError::NotCaseCompiled { .. })
        ));
    }

    // --------------------------------------------------------
    // Applied lambda rewrites to a let on the fly: the argument
    // contributes only where the binder is referenced.
    // --------------------------------------------------------
    #[test]
    fn test_applied_lambda_becomes_let() {
        let f = Name::user("f");
        let lam = |body: Term| {
            Term::Bind(
                Name::user("v"),
                Box::new(Binder::Lam { ty: Term::Erased }),
                Box::new(body),
            )
        };

        // (\v -> 42) x: x is dropped.
        let mut ctx = Context::new();
        ctx.define(
            f.clone(),
            case_op(
                &["x"],
                1,
                CaseTree::Leaf(Term::app(
                    lam(Term::Const(Const::Int(42))),
                    Term::local(Name::user("x")),
                )),
            ),
        );
        let deps = build(&ctx, &f).unwrap();
        let all: Vec<&Node> = deps.values().flatten().collect();
        assert!(!all.contains(&&Node::pos(f.clone(), 0)));

        // (\v -> v) x: x flows through.
        let mut ctx = Context::new();
        ctx.define(
            f.clone(),
            case_op(
                &["x"],
                1,
                CaseTree::Leaf(Term::app(lam(Term::V(0)), Term::local(Name::user("x")))),
            ),
        );
        let deps = build(&ctx, &f).unwrap();
        assert!(deps[&result_cond(&f)].contains(&Node::pos(f, 0)));
    }

    // --------------------------------------------------------
    // Dictionary method projection demands the constructor field.
    // --------------------------------------------------------
    #[test]
    fn test_dictionary_projection() {
        let f = Name::user("f");
        let instance = Name::user("instShowInt");
        let ctor = Name::user("MkShow");

        let mut classes = ClassTable::new();
        classes.define(
            Name::user("Show"),
            quill_ir::ClassInfo {
                ctor: ctor.clone(),
                methods: vec![Name::user("show")],
                instances: vec![instance.clone()],
            },
        );

        let mut ctx = Context::new();
        ctx.define(instance.clone(), Def::TyDecl { arity: 0 });
        ctx.define(ctor.clone(), Def::DataCon { tag: 0, arity: 1 });
        ctx.define(
            f.clone(),
            case_op(
                &["x"],
                1,
                CaseTree::Leaf(Term::app(
                    Term::Proj(Box::new(Term::global(instance.clone())), 0),
                    Term::local(Name::user("x")),
                )),
            ),
        );

        let deps = DepBuilder::new(&ctx, &classes)
            .build(&f)
            .map(|(deps, _)| deps)
            .unwrap();
        let leaf = &deps[&result_cond(&f)];
        assert!(leaf.contains(&Node::pos(ctor, 0)));
        assert!(leaf.contains(&Node::result(instance)));
        // The method argument is analyzed unconditionally.
        assert!(leaf.contains(&Node::pos(f.clone(), 0)));
    }

    // --------------------------------------------------------
    // Traversal reaches callees and analyzes their trees too.
    // --------------------------------------------------------
    #[test]
    fn test_traversal_reaches_callees() {
        let f = Name::user("f");
        let g = Name::user("g");

        let mut ctx = Context::new();
        ctx.define(
            g.clone(),
            case_op(&["a"], 1, CaseTree::Leaf(Term::Const(Const::Int(0)))),
        );
        ctx.define(
            f.clone(),
            case_op(
                &["x"],
                1,
                CaseTree::Leaf(Term::app(
                    Term::global(g.clone()),
                    Term::local(Name::user("x")),
                )),
            ),
        );

        let classes = ClassTable::new();
        let (_, visited) = DepBuilder::new(&ctx, &classes).build(&f).unwrap();
        assert!(visited.contains(&g));
        assert!(deps_contains_arg(&ctx, &f, &g));
    }

    /// `f x = g x` gates x's dependency on (g, Arg 0).
    fn deps_contains_arg(ctx: &Context, f: &Name, g: &Name) -> bool {
        let deps = build(ctx, f).unwrap();
        let cond = cond_with(&result_cond(f), Node::pos(g.clone(), 0));
        deps.get(&cond)
            .is_some_and(|nodes| nodes.contains(&Node::pos(f.clone(), 0)))
    }
}
