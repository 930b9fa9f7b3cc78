//! Pass 2: walk the bound tree and emit typing constraints.
//!
//! The binder already created every scope the collector needs; this pass
//! never calls `enter_scope` itself. Instead it walks `scope.children` in
//! the same left-to-right order the binder produced them in, consuming one
//! child per nested `Function`/`IfElse`/`Match`/`Block` node it encounters —
//! that shared traversal order is what lets two separate passes agree on
//! which scope belongs to which node without the AST carrying back-pointers
//! (see the note on `tarnc_ast::ast` for why the surface tree stays
//! immutable).

use crate::constraint::{Constraint, ConstraintKind};
use crate::scope::{ScopeGraph, ScopeId};
use crate::{SemError, SemResult};
use tarnc_ast::{self as ast, NativeKind, Type, VarPrefix};
use tarnc_util::{Idx, Span, Symbol};

use crate::scope::ConstraintId;

fn emit(
    scopes: &mut ScopeGraph,
    constraints: &mut Vec<Constraint>,
    scope: ScopeId,
    left: Type,
    right: Type,
    kind: ConstraintKind,
    span: Span,
) {
    let id = ConstraintId::from_usize(constraints.len());
    constraints.push(Constraint {
        id,
        left,
        right,
        scope,
        kind,
        span,
    });
    scopes.record_constraint(scope, id);
}

fn next_child(scopes: &ScopeGraph, scope: ScopeId, cursor: &mut usize) -> ScopeId {
    let child = scopes.scope(scope).children[*cursor];
    *cursor += 1;
    child
}

pub fn collect_program(
    scopes: &mut ScopeGraph,
    constraints: &mut Vec<Constraint>,
    program: &ast::Program,
) -> SemResult<()> {
    let root = scopes.root();
    let mut cursor = 0;
    collect_body(scopes, constraints, root, &mut cursor, &program.body)?;
    Ok(())
}

fn collect_body(
    scopes: &mut ScopeGraph,
    constraints: &mut Vec<Constraint>,
    scope: ScopeId,
    cursor: &mut usize,
    items: &[ast::BodyItem],
) -> SemResult<Type> {
    let mut last = Type::VOID;
    for item in items {
        last = collect_body_item(scopes, constraints, scope, cursor, item)?;
    }
    Ok(last)
}

fn collect_body_item(
    scopes: &mut ScopeGraph,
    constraints: &mut Vec<Constraint>,
    scope: ScopeId,
    cursor: &mut usize,
    item: &ast::BodyItem,
) -> SemResult<Type> {
    match item {
        ast::BodyItem::Const(decl) => {
            collect_const(scopes, constraints, scope, cursor, decl)?;
            Ok(Type::VOID)
        }
        ast::BodyItem::Enum(_) | ast::BodyItem::Type(_) => Ok(Type::VOID),
        ast::BodyItem::Expr(expr) => collect_expr(scopes, constraints, scope, cursor, expr),
    }
}

fn collect_const(
    scopes: &mut ScopeGraph,
    constraints: &mut Vec<Constraint>,
    scope: ScopeId,
    cursor: &mut usize,
    decl: &ast::ConstDecl,
) -> SemResult<()> {
    let pattern_ty = collect_pattern(scopes, constraints, scope, &decl.pattern)?;
    let init_ty = collect_expr(scopes, constraints, scope, cursor, &decl.init)?;
    emit(
        scopes,
        constraints,
        scope,
        pattern_ty,
        init_ty,
        ConstraintKind::Equality,
        decl.span,
    );
    Ok(())
}

/// Pattern collection shares the expression grammar: each pattern form
/// yields a `Type` the way the matching expression form
/// would, so a const declaration's generic "pattern equals init" rule
/// covers flat bindings, destructuring, and enum patterns alike.
fn collect_pattern(
    scopes: &mut ScopeGraph,
    constraints: &mut Vec<Constraint>,
    scope: ScopeId,
    pattern: &ast::Pattern,
) -> SemResult<Type> {
    match pattern {
        ast::Pattern::Ident { name, span } => {
            let id = scopes
                .resolve_value(scope, *name)
                .ok_or(SemError::UnknownReference {
                    name: *name,
                    span: *span,
                })?;
            Ok(scopes.value(id).ty.clone())
        }
        ast::Pattern::Array { elements, .. } => {
            let mut elem_tys = Vec::with_capacity(elements.len());
            for el in elements {
                elem_tys.push(collect_pattern(scopes, constraints, scope, el)?);
            }
            let elem_ty = match elem_tys.split_first() {
                Some((first, rest)) => {
                    for t in rest {
                        emit(
                            scopes,
                            constraints,
                            scope,
                            t.clone(),
                            first.clone(),
                            ConstraintKind::Equality,
                            pattern.span(),
                        );
                    }
                    first.clone()
                }
                None => scopes.fresh_var(VarPrefix::Anon),
            };
            Ok(Type::TypeRef {
                base: Box::new(Type::Native(NativeKind::Array)),
                args: vec![elem_ty],
            })
        }
        ast::Pattern::Object { fields, .. } => {
            let mut properties = Vec::with_capacity(fields.len());
            for (name, sub) in fields {
                properties.push((*name, collect_pattern(scopes, constraints, scope, sub)?));
            }
            Ok(Type::Object {
                properties,
                name: None,
            })
        }
        ast::Pattern::EnumDestructure {
            enum_name,
            member,
            bindings,
            span,
        } => {
            let enum_tid =
                scopes
                    .resolve_type(scope, *enum_name)
                    .ok_or(SemError::UnknownReference {
                        name: *enum_name,
                        span: *span,
                    })?;
            let enum_ty = scopes.type_symbol(enum_tid).ty.clone();
            let Type::Enum { id, members, .. } = &enum_ty else {
                return Err(SemError::UnknownReference {
                    name: *enum_name,
                    span: *span,
                });
            };
            if !members.iter().any(|m| m.name == *member) {
                return Err(SemError::UnknownEnumMember {
                    enum_name: *enum_name,
                    member: *member,
                    span: *span,
                });
            }
            let binding_ty = match bindings.first() {
                Some(name) => {
                    let vid =
                        scopes
                            .resolve_value(scope, *name)
                            .ok_or(SemError::UnknownReference {
                                name: *name,
                                span: *span,
                            })?;
                    scopes.value(vid).ty.clone()
                }
                None => scopes.fresh_var(VarPrefix::Anon),
            };
            Ok(Type::Pattern {
                pattern: Box::new(Type::EnumPattern {
                    id: *id,
                    enum_name: *enum_name,
                    member: *member,
                }),
                var: Box::new(binding_ty),
            })
        }
    }
}

fn collect_expr(
    scopes: &mut ScopeGraph,
    constraints: &mut Vec<Constraint>,
    scope: ScopeId,
    cursor: &mut usize,
    expr: &ast::Expr,
) -> SemResult<Type> {
    match expr {
        ast::Expr::Identifier { name, span } => {
            let id = scopes
                .resolve_value(scope, *name)
                .ok_or(SemError::UnknownReference {
                    name: *name,
                    span: *span,
                })?;
            Ok(scopes.value(id).ty.clone())
        }
        ast::Expr::Primitive { value, .. } => Ok(match value {
            ast::Literal::Number(_) => Type::NUMBER,
            ast::Literal::String(_) => Type::STRING,
            ast::Literal::Boolean(_) => Type::BOOLEAN,
        }),
        ast::Expr::Template { chunks, span } => {
            for chunk in chunks {
                if let ast::TemplateChunk::Expr(inner) = chunk {
                    let ty = collect_expr(scopes, constraints, scope, cursor, inner)?;
                    emit(
                        scopes,
                        constraints,
                        scope,
                        ty,
                        Type::STRING,
                        ConstraintKind::Equality,
                        *span,
                    );
                }
            }
            Ok(Type::STRING)
        }
        ast::Expr::ObjectLiteral { properties, .. } => {
            let mut collected = Vec::with_capacity(properties.len());
            for (name, value) in properties {
                let ty = collect_expr(scopes, constraints, scope, cursor, value)?;
                collected.push((*name, ty));
            }
            Ok(Type::Object {
                properties: collected,
                name: None,
            })
        }
        ast::Expr::ArrayLiteral { elements, span } => {
            let mut elem_tys = Vec::with_capacity(elements.len());
            for el in elements {
                elem_tys.push(collect_expr(scopes, constraints, scope, cursor, el)?);
            }
            let elem_ty = match elem_tys.split_first() {
                Some((first, rest)) => {
                    for t in rest {
                        emit(
                            scopes,
                            constraints,
                            scope,
                            t.clone(),
                            first.clone(),
                            ConstraintKind::Equality,
                            *span,
                        );
                    }
                    first.clone()
                }
                None => scopes.fresh_var(VarPrefix::Anon),
            };
            Ok(Type::TypeRef {
                base: Box::new(Type::Native(NativeKind::Array)),
                args: vec![elem_ty],
            })
        }
        ast::Expr::Binary {
            op, left, right, span,
        } => {
            let left_ty = collect_expr(scopes, constraints, scope, cursor, left)?;
            let right_ty = collect_expr(scopes, constraints, scope, cursor, right)?;
            if op.is_arithmetic() {
                emit(scopes, constraints, scope, left_ty, Type::NUMBER, ConstraintKind::Equality, *span);
                emit(scopes, constraints, scope, right_ty, Type::NUMBER, ConstraintKind::Equality, *span);
                Ok(Type::NUMBER)
            } else if op.is_comparison() {
                emit(scopes, constraints, scope, left_ty, Type::NUMBER, ConstraintKind::Equality, *span);
                emit(scopes, constraints, scope, right_ty, Type::NUMBER, ConstraintKind::Equality, *span);
                Ok(Type::BOOLEAN)
            } else if op.is_logical() {
                emit(scopes, constraints, scope, left_ty, Type::BOOLEAN, ConstraintKind::Equality, *span);
                emit(scopes, constraints, scope, right_ty, Type::BOOLEAN, ConstraintKind::Equality, *span);
                Ok(Type::BOOLEAN)
            } else {
                debug_assert!(op.is_equality());
                emit(scopes, constraints, scope, left_ty, right_ty, ConstraintKind::Equality, *span);
                Ok(Type::BOOLEAN)
            }
        }
        ast::Expr::Unary { op, operand, span } => {
            let ty = collect_expr(scopes, constraints, scope, cursor, operand)?;
            match op {
                ast::UnOp::Neg => {
                    emit(scopes, constraints, scope, ty, Type::NUMBER, ConstraintKind::Equality, *span);
                    Ok(Type::NUMBER)
                }
                ast::UnOp::Not => {
                    emit(scopes, constraints, scope, ty, Type::BOOLEAN, ConstraintKind::Equality, *span);
                    Ok(Type::BOOLEAN)
                }
            }
        }
        ast::Expr::Function { body, span, .. } => {
            let fn_scope = next_child(scopes, scope, cursor);
            let name = scopes
                .scope(fn_scope)
                .owner
                .expect("a Function scope always has its owner name set by the binder");
            let fn_tid = scopes
                .resolve_type(scope, name)
                .expect("the binder installs the function's type symbol in the enclosing scope");
            let fn_ty = scopes.type_symbol(fn_tid).ty.clone();
            let Type::Fn { ret, .. } = &fn_ty else {
                unreachable!("a Function scope's owner always names a FunctionType")
            };
            // The body is bound directly in `fn_scope` with no wrapper
            // `Block` scope, so it is walked here without consuming a
            // child via `next_child`.
            let mut body_cursor = 0;
            let body_ty = collect_body(scopes, constraints, fn_scope, &mut body_cursor, &body.items)?;
            emit(
                scopes,
                constraints,
                scope,
                body_ty,
                (**ret).clone(),
                ConstraintKind::Equality,
                *span,
            );
            Ok(fn_ty)
        }
        ast::Expr::Call {
            callee, arguments, span,
        } => {
            let callee_ty = collect_expr(scopes, constraints, scope, cursor, callee)?;
            let mut arg_tys = Vec::with_capacity(arguments.len());
            for arg in arguments {
                arg_tys.push(collect_expr(scopes, constraints, scope, cursor, arg)?);
            }
            match &callee_ty {
                Type::EnumCall {
                    id, enum_name, member, ..
                } => Ok(Type::EnumCall {
                    id: *id,
                    enum_name: *enum_name,
                    member: *member,
                    arguments: arg_tys,
                }),
                Type::Fn { .. } => {
                    let ret_var = scopes.fresh_var(VarPrefix::Anon);
                    let call_ty = Type::Call {
                        callee: Box::new(callee_ty.clone()),
                        arguments: arg_tys,
                        ret: Box::new(ret_var.clone()),
                    };
                    emit(scopes, constraints, scope, callee_ty, call_ty, ConstraintKind::Equality, *span);
                    Ok(ret_var)
                }
                t if t.is_unresolved_var() => {
                    let ret_var = scopes.fresh_var(VarPrefix::Anon);
                    let call_ty = Type::Call {
                        callee: Box::new(t.clone()),
                        arguments: arg_tys,
                        ret: Box::new(ret_var.clone()),
                    };
                    emit(scopes, constraints, scope, call_ty, t.clone(), ConstraintKind::Equality, *span);
                    Ok(ret_var)
                }
                other => Err(SemError::NotCallable {
                    found: other.to_string(),
                    span: *span,
                }),
            }
        }
        ast::Expr::Dot { left, right, span } => {
            let left_ty = collect_expr(scopes, constraints, scope, cursor, left)?;
            match &left_ty {
                Type::Enum { id, name, members, .. } => {
                    if !members.iter().any(|m| m.name == *right) {
                        return Err(SemError::UnknownEnumMember {
                            enum_name: *name,
                            member: *right,
                            span: *span,
                        });
                    }
                    Ok(Type::EnumCall {
                        id: *id,
                        enum_name: *name,
                        member: *right,
                        arguments: vec![],
                    })
                }
                Type::Object { properties, .. } => properties
                    .iter()
                    .find(|(name, _)| *name == *right)
                    .map(|(_, ty)| ty.clone())
                    .ok_or(SemError::UnknownReference {
                        name: *right,
                        span: *span,
                    }),
                t if t.is_unresolved_var() => {
                    let field_ty = scopes.fresh_var(VarPrefix::Anon);
                    emit(
                        scopes,
                        constraints,
                        scope,
                        t.clone(),
                        Type::Object {
                            properties: vec![(*right, field_ty.clone())],
                            name: None,
                        },
                        ConstraintKind::Equality,
                        *span,
                    );
                    Ok(field_ty)
                }
                other => Err(SemError::TypeMismatch {
                    expected: "object or enum".to_string(),
                    found: other.to_string(),
                    span: *span,
                }),
            }
        }
        ast::Expr::Index { object, index, span } => {
            let obj_ty = collect_expr(scopes, constraints, scope, cursor, object)?;
            let idx_ty = collect_expr(scopes, constraints, scope, cursor, index)?;
            emit(scopes, constraints, scope, idx_ty, Type::NUMBER, ConstraintKind::Equality, *span);
            let elem_ty = scopes.fresh_var(VarPrefix::Anon);
            emit(
                scopes,
                constraints,
                scope,
                obj_ty,
                Type::TypeRef {
                    base: Box::new(Type::Native(NativeKind::Array)),
                    args: vec![elem_ty.clone()],
                },
                ConstraintKind::Equality,
                *span,
            );
            Ok(elem_ty)
        }
        ast::Expr::IfElse {
            condition,
            then_branch,
            else_branch,
            span,
        } => {
            let cond_ty = collect_expr(scopes, constraints, scope, cursor, condition)?;
            emit(scopes, constraints, scope, cond_ty, Type::BOOLEAN, ConstraintKind::Equality, *span);

            let then_scope = next_child(scopes, scope, cursor);
            let mut then_cursor = 0;
            let then_ty = collect_body(scopes, constraints, then_scope, &mut then_cursor, &then_branch.items)?;

            let else_ty = if let Some(else_branch) = else_branch {
                let else_scope = next_child(scopes, scope, cursor);
                let mut else_cursor = 0;
                collect_body(scopes, constraints, else_scope, &mut else_cursor, &else_branch.items)?
            } else {
                Type::VOID
            };
            emit(scopes, constraints, scope, then_ty.clone(), else_ty, ConstraintKind::Equality, *span);
            Ok(then_ty)
        }
        ast::Expr::Match {
            subject, clauses, span,
        } => {
            let subject_ty = collect_expr(scopes, constraints, scope, cursor, subject)?;
            let mut result_ty: Option<Type> = None;
            for (i, clause) in clauses.iter().enumerate() {
                let clause_scope = next_child(scopes, scope, cursor);
                let pattern_ty = collect_pattern(scopes, constraints, clause_scope, &clause.pattern)?;
                let kind = if i == 0 {
                    ConstraintKind::Equality
                } else {
                    ConstraintKind::Subset
                };
                emit(scopes, constraints, clause_scope, pattern_ty, subject_ty.clone(), kind, clause.span);

                let mut clause_cursor = 0;
                let body_ty = collect_body(scopes, constraints, clause_scope, &mut clause_cursor, &clause.body.items)?;
                match &result_ty {
                    None => result_ty = Some(body_ty),
                    Some(first) => emit(
                        scopes,
                        constraints,
                        clause_scope,
                        body_ty,
                        first.clone(),
                        ConstraintKind::Equality,
                        clause.span,
                    ),
                }
            }
            let _ = span;
            Ok(result_ty.unwrap_or(Type::VOID))
        }
        ast::Expr::Block(block) => {
            let block_scope = next_child(scopes, scope, cursor);
            let mut block_cursor = 0;
            collect_body(scopes, constraints, block_scope, &mut block_cursor, &block.items)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::bind_program;
    use tarnc_ast::{BodyItem, ConstDecl, Literal, ModuleDecl, Pattern, Program};
    use tarnc_util::Span;

    fn analyze(body: Vec<BodyItem>) -> SemResult<(ScopeGraph, Vec<Constraint>)> {
        let mut scopes = ScopeGraph::new();
        let program = Program {
            module: Some(ModuleDecl {
                path: vec![Symbol::intern("main")],
                span: Span::DUMMY,
            }),
            opens: vec![],
            imports: vec![],
            body,
            span: Span::DUMMY,
        };
        bind_program(&mut scopes, &program)?;
        let mut constraints = Vec::new();
        collect_program(&mut scopes, &mut constraints, &program)?;
        Ok((scopes, constraints))
    }

    fn num_const(name: &str, value: f64) -> BodyItem {
        BodyItem::Const(ConstDecl {
            pattern: Pattern::Ident {
                name: Symbol::intern(name),
                span: Span::DUMMY,
            },
            annotation: None,
            init: ast::Expr::Primitive {
                value: Literal::Number(value),
                span: Span::DUMMY,
            },
            span: Span::DUMMY,
        })
    }

    #[test]
    fn numeric_const_emits_an_equality_constraint_with_number() {
        let (_scopes, constraints) = analyze(vec![num_const("x", 4.0)]).unwrap();
        assert!(constraints
            .iter()
            .any(|c| c.right == Type::NUMBER && c.kind == ConstraintKind::Equality));
    }

    #[test]
    fn unknown_identifier_reference_fails() {
        let body = vec![BodyItem::Expr(ast::Expr::Identifier {
            name: Symbol::intern("nope"),
            span: Span::DUMMY,
        })];
        assert!(matches!(
            analyze(body),
            Err(SemError::UnknownReference { .. })
        ));
    }

    #[test]
    fn arithmetic_binary_expression_yields_number() {
        let expr = ast::Expr::Binary {
            op: ast::BinOp::Add,
            left: Box::new(ast::Expr::Primitive {
                value: Literal::Number(1.0),
                span: Span::DUMMY,
            }),
            right: Box::new(ast::Expr::Primitive {
                value: Literal::Number(2.0),
                span: Span::DUMMY,
            }),
            span: Span::DUMMY,
        };
        let body = vec![BodyItem::Const(ConstDecl {
            pattern: Pattern::Ident {
                name: Symbol::intern("sum"),
                span: Span::DUMMY,
            },
            annotation: None,
            init: expr,
            span: Span::DUMMY,
        })];
        let (scopes, _) = analyze(body).unwrap();
        let root = scopes.root();
        let id = scopes.resolve_value(root, Symbol::intern("sum")).unwrap();
        assert!(matches!(scopes.value(id).ty, Type::Var { .. }));
    }
}
