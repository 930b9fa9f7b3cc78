//! Pass 3: solve constraints by rewriting the scope graph's type table.
//!
//! The type table doubles as the substitution store: a table of rewrite
//! slots plus a path-compressing `resolve`. Constraints are processed in a
//! fixed-point loop over the ordered constraint list rather than a single
//! pass, because the call-type and enum-pattern rules need a constraint to
//! be revisited after an earlier one resolves one of its variables; the loop
//! runs until a full pass makes no further progress.

use crate::constraint::{Constraint, ConstraintKind};
use crate::scope::{ScopeGraph, ScopeId};
use crate::{SemError, SemResult};
use tarnc_ast::{ParameterType, Type};
use tarnc_util::Span;

/// Bounds the fixed-point loop. Each successful rewrite permanently resolves
/// one variable slot, so the loop cannot make progress more times than there
/// are variables plus one pass to confirm quiescence.
fn max_iterations(scopes: &ScopeGraph, constraints: &[Constraint]) -> usize {
    scopes.var_count() + constraints.len() + 1
}

pub fn unify_program(scopes: &mut ScopeGraph, constraints: &[Constraint]) -> SemResult<()> {
    let bound = max_iterations(scopes, constraints);
    let mut ordered: Vec<&Constraint> = constraints.iter().collect();
    ordered.sort_by_key(|c| c.id);
    for _ in 0..bound {
        let mut changed = false;
        for c in &ordered {
            let left = resolve(scopes, c.scope, &c.left);
            let right = resolve(scopes, c.scope, &c.right);
            if unify_one(scopes, c.scope, &left, &right, c.kind, c.span)? {
                changed = true;
            }
        }
        if !changed {
            apply_substitutions(scopes);
            return Ok(());
        }
    }
    apply_substitutions(scopes);
    Ok(())
}

/// Follows `Var`/`Ident` chains to a non-reference type (or a self-reference,
/// which terminates the walk rather than looping forever), compressing the
/// path as it goes. Composite internals (`TypeRef` arguments, `Object`
/// properties, `Fn` parameters) are left untouched here — they are rewritten
/// once, recursively, by [`apply_substitutions`] after unification reaches a
/// fixed point.
fn resolve(scopes: &mut ScopeGraph, scope: ScopeId, ty: &Type) -> Type {
    match ty {
        Type::Var { prefix, id } => match scopes.var_slot(*prefix, *id).cloned() {
            Some(bound) => {
                if matches!(&bound, Type::Var{prefix: p2, id: i2} if *p2 == *prefix && *i2 == *id) {
                    return ty.clone();
                }
                let resolved = resolve(scopes, scope, &bound);
                scopes.set_var_slot(*prefix, *id, resolved.clone());
                resolved
            }
            None => ty.clone(),
        },
        Type::Ident(name) => match scopes.resolve_type(scope, *name) {
            Some(tid) => {
                let inner = scopes.type_symbol(tid).ty.clone();
                if matches!(&inner, Type::Ident(n) if *n == *name) {
                    inner
                } else {
                    resolve(scopes, scope, &inner)
                }
            }
            None => ty.clone(),
        },
        // A trivial reference (no type arguments) is a transparent alias.
        Type::TypeRef { base, args } if args.is_empty() => resolve(scopes, scope, base),
        _ => ty.clone(),
    }
}

fn set_slot(scopes: &mut ScopeGraph, target: &Type, value: Type) -> bool {
    match target {
        Type::Var { prefix, id } => {
            scopes.set_var_slot(*prefix, *id, value);
            true
        }
        // An unresolved `Ident` has nowhere of its own to record a rewrite —
        // the identifier's own declaration site is authoritative, so nothing
        // to do here except avoid looping (rule 1 only ever targets a bare
        // `Var`/`Ident` left unresolved by `resolve`, and `Ident`s resolve
        // through the scope graph rather than a substitution slot).
        Type::Ident(_) => false,
        _ => false,
    }
}

/// Applies the unification rules in order, returning whether a variable
/// slot was rewritten.
fn unify_one(
    scopes: &mut ScopeGraph,
    scope: ScopeId,
    left: &Type,
    right: &Type,
    kind: ConstraintKind,
    span: Span,
) -> SemResult<bool> {
    // A variable (or self-referential identifier) unifying with itself is a
    // no-op, not a rewrite — checked before rule 1 so a lone `Var`/`Var` or
    // `Ident`/`Ident` match never falls through to the "no rule applies"
    // catch-all.
    if left == right {
        return Ok(false);
    }

    // Rule 1: variable on either side.
    if left.is_unresolved_var() {
        return Ok(set_slot(scopes, left, right.clone()));
    }
    if right.is_unresolved_var() {
        return Ok(set_slot(scopes, right, left.clone()));
    }

    match (left, right) {
        // Rule 2.
        (Type::Native(a), Type::Native(b)) => {
            if a == b {
                Ok(false)
            } else {
                Err(SemError::TypeMismatch {
                    expected: a.to_string(),
                    found: b.to_string(),
                    span,
                })
            }
        }

        // Rule 3.
        (Type::Fn { params: lp, ret: lr, .. }, Type::Fn { params: rp, ret: rr, .. }) => {
            if lp.len() != rp.len() {
                return Err(SemError::TypeMismatch {
                    expected: format!("{} parameters", lp.len()),
                    found: format!("{} parameters", rp.len()),
                    span,
                });
            }
            let mut changed = false;
            for (a, b) in lp.iter().zip(rp.iter()) {
                changed |= unify_pair(scopes, scope, &a.annotation, &b.annotation, ConstraintKind::Equality, span)?;
            }
            changed |= unify_pair(scopes, scope, lr, rr, ConstraintKind::Equality, span)?;
            Ok(changed)
        }

        // Rule 4 (both orientations).
        (Type::Call { arguments, ret: call_ret, .. }, Type::Fn { params, ret: fn_ret, .. })
        | (Type::Fn { params, ret: fn_ret, .. }, Type::Call { arguments, ret: call_ret, .. }) => {
            unify_call_and_fn(scopes, scope, arguments, params, call_ret, fn_ret, span)
        }

        // Rule 5.
        (Type::Enum { id: lid, .. }, Type::EnumCall { id: rid, .. })
        | (Type::EnumCall { id: lid, .. }, Type::Enum { id: rid, .. }) => {
            if lid == rid {
                Ok(false)
            } else {
                Err(enum_mismatch(left, right, span))
            }
        }

        // Rule 6.
        (Type::Enum { id: lid, .. }, Type::Enum { id: rid, .. }) => {
            if lid == rid {
                Ok(false)
            } else {
                Err(enum_mismatch(left, right, span))
            }
        }
        (Type::EnumCall { id: lid, arguments: la, .. }, Type::EnumCall { id: rid, arguments: ra, .. }) => {
            if lid != rid {
                return Err(enum_mismatch(left, right, span));
            }
            let mut changed = false;
            for (a, b) in la.iter().zip(ra.iter()) {
                changed |= unify_pair(scopes, scope, a, b, ConstraintKind::Equality, span)?;
            }
            Ok(changed)
        }

        // Rule 7.
        (Type::Object { properties: lp, .. }, Type::Object { properties: rp, .. }) => {
            let mut changed = false;
            for (name, ty) in lp {
                match rp.iter().find(|(n, _)| n == name) {
                    Some((_, other)) => {
                        changed |= unify_pair(scopes, scope, ty, other, ConstraintKind::Equality, span)?;
                    }
                    None => {
                        return Err(SemError::TypeMismatch {
                            expected: format!("field `{name}`"),
                            found: "missing".to_string(),
                            span,
                        })
                    }
                }
            }
            if kind == ConstraintKind::Equality {
                for (name, _) in rp {
                    if !lp.iter().any(|(n, _)| n == name) {
                        return Err(SemError::TypeMismatch {
                            expected: format!("field `{name}`"),
                            found: "missing".to_string(),
                            span,
                        });
                    }
                }
            }
            Ok(changed)
        }

        // Rule 8.
        (
            Type::Pattern { pattern, var },
            Type::EnumCall {
                id: call_id,
                arguments,
                member: call_member,
                enum_name,
                ..
            },
        ) => {
            let Type::EnumPattern {
                id: pat_id,
                member: pat_member,
                ..
            } = pattern.as_ref()
            else {
                return Err(SemError::CouldNotUnify {
                    left: left.to_string(),
                    right: right.to_string(),
                    span,
                });
            };
            if pat_id != call_id {
                return Err(enum_mismatch(left, right, span));
            }
            if pat_member != call_member {
                return Err(SemError::UnknownEnumMember {
                    enum_name: *enum_name,
                    member: *pat_member,
                    span,
                });
            }
            match find_member_argument(scopes, *pat_id, *pat_member, arguments) {
                Some(arg) => unify_pair(scopes, scope, var, &arg, ConstraintKind::Equality, span),
                None => Ok(false),
            }
        }

        // Rule 9.
        (Type::TypeRef { base: lb, args: la }, Type::TypeRef { base: rb, args: ra }) => {
            if la.len() != ra.len() {
                return Err(SemError::TypeMismatch {
                    expected: format!("{} type arguments", la.len()),
                    found: format!("{} type arguments", ra.len()),
                    span,
                });
            }
            let mut changed = unify_pair(scopes, scope, lb, rb, ConstraintKind::Equality, span)?;
            for (a, b) in la.iter().zip(ra.iter()) {
                changed |= unify_pair(scopes, scope, a, b, ConstraintKind::Equality, span)?;
            }
            Ok(changed)
        }

        // Rule 10.
        _ => Err(SemError::CouldNotUnify {
            left: left.to_string(),
            right: right.to_string(),
            span,
        }),
    }
}

fn enum_mismatch(left: &Type, right: &Type, span: Span) -> SemError {
    let name_of = |t: &Type| match t {
        Type::Enum { name, .. } | Type::EnumCall { enum_name: name, .. } => *name,
        _ => tarnc_util::Symbol::intern("<unknown>"),
    };
    SemError::EnumMismatch {
        left: name_of(left),
        right: name_of(right),
        span,
    }
}

/// Resolves both sides before delegating to [`unify_one`] — used for the
/// recursive sub-unifications rules 3/4/6/7/9 perform on nested fields.
fn unify_pair(
    scopes: &mut ScopeGraph,
    scope: ScopeId,
    left: &Type,
    right: &Type,
    kind: ConstraintKind,
    span: Span,
) -> SemResult<bool> {
    let left = resolve(scopes, scope, left);
    let right = resolve(scopes, scope, right);
    unify_one(scopes, scope, &left, &right, kind, span)
}

/// Rule 4: a call site's arguments against a declaration's parameters. An
/// un-annotated (still-a-variable) parameter is unified by equality — the
/// function's own body drives its inference, a call site must not impose a
/// type on it structurally. An annotated parameter is checked by Subset,
/// since the function was declared polymorphic over a wider shape.
fn unify_call_and_fn(
    scopes: &mut ScopeGraph,
    scope: ScopeId,
    arguments: &[Type],
    params: &[ParameterType],
    call_ret: &Type,
    fn_ret: &Type,
    span: Span,
) -> SemResult<bool> {
    if arguments.len() != params.len() {
        return Err(SemError::TypeMismatch {
            expected: format!("{} arguments", params.len()),
            found: format!("{} arguments", arguments.len()),
            span,
        });
    }
    let mut changed = false;
    for (arg, param) in arguments.iter().zip(params.iter()) {
        let kind = if param.annotation.is_unresolved_var() {
            ConstraintKind::Equality
        } else {
            ConstraintKind::Subset
        };
        changed |= unify_pair(scopes, scope, arg, &param.annotation, kind, span)?;
    }
    changed |= unify_pair(scopes, scope, call_ret, fn_ret, ConstraintKind::Equality, span)?;
    Ok(changed)
}

/// Rule 8's lookup: find the enum declaration by identity, locate the named
/// member, and return the concrete argument its first payload parameter
/// corresponds to. Members with more than one payload parameter only ever
/// recover the first; that's an accepted limitation, not an error.
fn find_member_argument(
    scopes: &ScopeGraph,
    id: tarnc_ast::EnumId,
    member: tarnc_util::Symbol,
    call_arguments: &[Type],
) -> Option<Type> {
    let decl = scopes.iter_types().find_map(|(_, sym)| match &sym.ty {
        Type::Enum { id: decl_id, type_params, members, .. } if *decl_id == id => {
            Some((type_params.clone(), members.clone()))
        }
        _ => None,
    })?;
    let (type_params, members) = decl;
    let member_decl = members.into_iter().find(|m| m.name == member)?;
    let first_param = member_decl.params.first()?;
    match first_param {
        Type::Ident(param_name) => {
            let index = type_params.iter().position(|p| p == param_name)?;
            call_arguments.get(index).cloned()
        }
        concrete => Some(concrete.clone()),
    }
}

/// Post-pass: rewrite every value and type symbol's stored type in place so
/// every reference in the table is in canonical form. Idempotent — a second
/// run leaves the table unchanged, since `resolve` only ever walks forward
/// to a fixed point and composite rewriting only replaces already-resolved
/// children with themselves.
pub fn apply_substitutions(scopes: &mut ScopeGraph) {
    let value_ids: Vec<_> = scopes.iter_values().map(|(id, _)| id).collect();
    for id in value_ids {
        let (scope, ty) = {
            let sym = scopes.value(id);
            (sym.scope, sym.ty.clone())
        };
        let resolved = resolve(scopes, scope, &ty);
        scopes.value_mut(id).ty = resolved;
    }

    let type_ids: Vec<_> = scopes.iter_types().map(|(id, _)| id).collect();
    for id in type_ids {
        let (scope, ty) = {
            let sym = scopes.type_symbol(id);
            (sym.scope, sym.ty.clone())
        };
        let resolved = resolve(scopes, scope, &ty);
        let rewritten = rewrite_composite(scopes, scope, resolved);
        scopes.type_symbol_mut(id).ty = rewritten;
    }
}

fn rewrite_composite(scopes: &mut ScopeGraph, scope: ScopeId, ty: Type) -> Type {
    match ty {
        Type::Fn { params, ret, name } => {
            let params = params
                .into_iter()
                .map(|p| ParameterType {
                    name: p.name,
                    annotation: Box::new(resolve(scopes, scope, &p.annotation)),
                    is_spread: p.is_spread,
                })
                .collect();
            let ret = Box::new(resolve(scopes, scope, &ret));
            Type::Fn { params, ret, name }
        }
        Type::Object { properties, name } => {
            let properties = properties
                .into_iter()
                .map(|(n, t)| (n, resolve(scopes, scope, &t)))
                .collect();
            Type::Object { properties, name }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{ConstraintId, ScopeKind};
    use tarnc_ast::VarPrefix;
    use tarnc_util::{Idx, Symbol};

    #[test]
    fn variable_unifies_with_a_concrete_type() {
        let mut scopes = ScopeGraph::new();
        let root = scopes.root();
        let var = scopes.fresh_var(VarPrefix::Anon);
        let constraints = vec![Constraint {
            id: ConstraintId::from_usize(0),
            left: var.clone(),
            right: Type::NUMBER,
            scope: root,
            kind: ConstraintKind::Equality,
            span: Span::DUMMY,
        }];
        unify_program(&mut scopes, &constraints).unwrap();
        let resolved = resolve(&mut scopes, root, &var);
        assert_eq!(resolved, Type::NUMBER);
    }

    #[test]
    fn mismatched_natives_fail() {
        let mut scopes = ScopeGraph::new();
        let root = scopes.root();
        let constraints = vec![Constraint {
            id: ConstraintId::from_usize(0),
            left: Type::NUMBER,
            right: Type::STRING,
            scope: root,
            kind: ConstraintKind::Equality,
            span: Span::DUMMY,
        }];
        assert!(matches!(
            unify_program(&mut scopes, &constraints),
            Err(SemError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn apply_substitutions_is_idempotent() {
        let mut scopes = ScopeGraph::new();
        let root = scopes.root();
        let var = scopes.fresh_var(VarPrefix::Anon);
        scopes
            .declare_value(root, Symbol::intern("x"), var.clone())
            .unwrap();
        let constraints = vec![Constraint {
            id: ConstraintId::from_usize(0),
            left: var,
            right: Type::NUMBER,
            scope: root,
            kind: ConstraintKind::Equality,
            span: Span::DUMMY,
        }];
        unify_program(&mut scopes, &constraints).unwrap();
        let id = scopes.resolve_value(root, Symbol::intern("x")).unwrap();
        let first = scopes.value(id).ty.clone();
        apply_substitutions(&mut scopes);
        let second = scopes.value(id).ty.clone();
        assert_eq!(first, second);
    }

    #[test]
    fn distinct_enum_identities_do_not_unify() {
        let mut scopes = ScopeGraph::new();
        let root = scopes.root();
        let a = scopes.next_enum_id();
        let b = scopes.next_enum_id();
        let _ = ScopeKind::EnumParams;
        let left = Type::Enum {
            id: a,
            name: Symbol::intern("A"),
            type_params: vec![],
            members: vec![],
        };
        let right = Type::Enum {
            id: b,
            name: Symbol::intern("B"),
            type_params: vec![],
            members: vec![],
        };
        let constraints = vec![Constraint {
            id: ConstraintId::from_usize(0),
            left,
            right,
            scope: root,
            kind: ConstraintKind::Equality,
            span: Span::DUMMY,
        }];
        assert!(matches!(
            unify_program(&mut scopes, &constraints),
            Err(SemError::EnumMismatch { .. })
        ));
    }
}
