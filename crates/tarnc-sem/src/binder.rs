//! Pass 1: walk the surface tree and build the scope graph.
//!
//! A single recursive descent both creates scopes and installs bindings,
//! passing the target [`ScopeId`] explicitly into every call rather than
//! pushing/popping a cursor — see the note on `tarnc_sem::scope` for why a
//! cursor can't represent sibling branch scopes cleanly.

use crate::scope::{ScopeGraph, ScopeId, ScopeKind};
use crate::{SemError, SemResult};
use tarnc_ast::{self as ast, ParameterType, Type, VarPrefix};
use tarnc_util::Symbol;

/// Binds an entire program, returning the root scope. Fails immediately if
/// the program has no module declaration — a hard prerequisite of binding,
/// not a style lint.
pub fn bind_program(scopes: &mut ScopeGraph, program: &ast::Program) -> SemResult<ScopeId> {
    let Some(module) = &program.module else {
        return Err(SemError::MissingModule {
            span: program.span,
        });
    };
    let _ = module;
    let root = scopes.root();
    bind_body(scopes, root, &program.body)?;
    Ok(root)
}

fn bind_body(scopes: &mut ScopeGraph, scope: ScopeId, items: &[ast::BodyItem]) -> SemResult<()> {
    for item in items {
        bind_body_item(scopes, scope, item)?;
    }
    Ok(())
}

fn bind_body_item(scopes: &mut ScopeGraph, scope: ScopeId, item: &ast::BodyItem) -> SemResult<()> {
    match item {
        ast::BodyItem::Const(decl) => bind_const(scopes, scope, decl),
        ast::BodyItem::Enum(decl) => bind_enum(scopes, scope, decl),
        ast::BodyItem::Type(decl) => bind_type_decl(scopes, scope, decl),
        ast::BodyItem::Expr(expr) => bind_expr(scopes, scope, expr),
    }
}

fn bind_const(scopes: &mut ScopeGraph, scope: ScopeId, decl: &ast::ConstDecl) -> SemResult<()> {
    let declared_ty = decl
        .annotation
        .clone()
        .unwrap_or_else(|| scopes.fresh_var(VarPrefix::Anon));

    // If the initializer is an unnamed function expression and the pattern
    // is a single identifier, that identifier becomes the function's
    // display name. The surface tree itself is never mutated for this —
    // only the `Type::Fn` we construct while binding the initializer.
    let name_hint = match (&decl.pattern, &decl.init) {
        (ast::Pattern::Ident { name, .. }, ast::Expr::Function { name: None, .. }) => Some(*name),
        _ => None,
    };

    bind_pattern(scopes, scope, &decl.pattern, declared_ty)?;
    bind_expr_with_name_hint(scopes, scope, &decl.init, name_hint)
}

fn bind_pattern(
    scopes: &mut ScopeGraph,
    scope: ScopeId,
    pattern: &ast::Pattern,
    ty: Type,
) -> SemResult<()> {
    match pattern {
        ast::Pattern::Ident { name, span } => {
            scopes
                .declare_value(scope, *name, ty)
                .map_err(|_| SemError::Redeclaration {
                    name: *name,
                    span: *span,
                })?;
        }
        ast::Pattern::Array { elements, .. } => {
            for element in elements {
                let var = scopes.fresh_var(VarPrefix::Anon);
                bind_pattern(scopes, scope, element, var)?;
            }
        }
        ast::Pattern::Object { fields, .. } => {
            for (_, sub) in fields {
                let var = scopes.fresh_var(VarPrefix::Anon);
                bind_pattern(scopes, scope, sub, var)?;
            }
        }
        ast::Pattern::EnumDestructure { bindings, span, .. } => {
            for name in bindings {
                let var = scopes.fresh_var(VarPrefix::Anon);
                scopes
                    .declare_value(scope, *name, var)
                    .map_err(|_| SemError::Redeclaration {
                        name: *name,
                        span: *span,
                    })?;
            }
        }
    }
    Ok(())
}

fn bind_enum(scopes: &mut ScopeGraph, scope: ScopeId, decl: &ast::EnumDecl) -> SemResult<()> {
    let mut seen = std::collections::HashSet::new();
    for member in &decl.members {
        if !seen.insert(member.name) {
            return Err(SemError::DuplicateEnumMember {
                enum_name: decl.name,
                member: member.name,
                span: member.span,
            });
        }
    }

    let param_scope = scopes.enter_scope(scope, ScopeKind::EnumParams);
    for param in &decl.type_params {
        scopes
            .declare_type(param_scope, *param, Type::Ident(*param))
            .map_err(|_| SemError::DuplicateTypeParameter {
                decl_name: decl.name,
                param: *param,
                span: decl.span,
            })?;
    }

    let id = scopes.next_enum_id();
    let enum_ty = Type::Enum {
        id,
        name: decl.name,
        type_params: decl.type_params.clone(),
        members: decl
            .members
            .iter()
            .map(|m| tarnc_ast::EnumMemberType {
                name: m.name,
                params: m.payload.clone(),
            })
            .collect(),
    };

    scopes
        .declare_type(scope, decl.name, enum_ty.clone())
        .map_err(|_| SemError::Redeclaration {
            name: decl.name,
            span: decl.span,
        })?;
    scopes
        .declare_value(scope, decl.name, enum_ty)
        .map_err(|_| SemError::Redeclaration {
            name: decl.name,
            span: decl.span,
        })?;
    Ok(())
}

fn bind_type_decl(scopes: &mut ScopeGraph, scope: ScopeId, decl: &ast::TypeDecl) -> SemResult<()> {
    let param_scope = scopes.enter_scope(scope, ScopeKind::TypeDeclParams);
    let mut seen = std::collections::HashSet::new();
    for param in &decl.type_params {
        if !seen.insert(*param) {
            return Err(SemError::DuplicateTypeParameter {
                decl_name: decl.name,
                param: *param,
                span: decl.span,
            });
        }
        scopes
            .declare_type(param_scope, *param, Type::Ident(*param))
            .map_err(|_| SemError::DuplicateTypeParameter {
                decl_name: decl.name,
                param: *param,
                span: decl.span,
            })?;
    }

    scopes
        .declare_type(scope, decl.name, decl.value.clone())
        .map_err(|_| SemError::Redeclaration {
            name: decl.name,
            span: decl.span,
        })
        .map(|_| ())
}

fn bind_expr(scopes: &mut ScopeGraph, scope: ScopeId, expr: &ast::Expr) -> SemResult<()> {
    bind_expr_with_name_hint(scopes, scope, expr, None)
}

fn bind_expr_with_name_hint(
    scopes: &mut ScopeGraph,
    scope: ScopeId,
    expr: &ast::Expr,
    name_hint: Option<Symbol>,
) -> SemResult<()> {
    match expr {
        ast::Expr::Identifier { .. } | ast::Expr::Primitive { .. } => Ok(()),
        ast::Expr::Template { chunks, .. } => {
            for chunk in chunks {
                if let ast::TemplateChunk::Expr(inner) = chunk {
                    bind_expr(scopes, scope, inner)?;
                }
            }
            Ok(())
        }
        ast::Expr::ObjectLiteral { properties, .. } => {
            for (_, value) in properties {
                bind_expr(scopes, scope, value)?;
            }
            Ok(())
        }
        ast::Expr::ArrayLiteral { elements, .. } => {
            for element in elements {
                bind_expr(scopes, scope, element)?;
            }
            Ok(())
        }
        ast::Expr::Binary { left, right, .. } => {
            bind_expr(scopes, scope, left)?;
            bind_expr(scopes, scope, right)
        }
        ast::Expr::Unary { operand, .. } => bind_expr(scopes, scope, operand),
        ast::Expr::Function {
            params,
            return_annotation,
            body,
            span,
            ..
        } => bind_function(scopes, scope, params, return_annotation, body, *span, name_hint)
            .map(|_| ()),
        ast::Expr::Call {
            callee, arguments, ..
        } => {
            bind_expr(scopes, scope, callee)?;
            for arg in arguments {
                bind_expr(scopes, scope, arg)?;
            }
            Ok(())
        }
        ast::Expr::Dot { left, .. } => bind_expr(scopes, scope, left),
        ast::Expr::Index { object, index, .. } => {
            bind_expr(scopes, scope, object)?;
            bind_expr(scopes, scope, index)
        }
        ast::Expr::IfElse {
            condition,
            then_branch,
            else_branch,
            ..
        } => {
            bind_expr(scopes, scope, condition)?;
            let then_scope = scopes.enter_scope(scope, ScopeKind::IfBranch);
            bind_body(scopes, then_scope, &then_branch.items)?;
            if let Some(else_branch) = else_branch {
                let else_scope = scopes.enter_scope(scope, ScopeKind::IfBranch);
                bind_body(scopes, else_scope, &else_branch.items)?;
            }
            Ok(())
        }
        ast::Expr::Match {
            subject, clauses, ..
        } => {
            bind_expr(scopes, scope, subject)?;
            for clause in clauses {
                let clause_scope = scopes.enter_scope(scope, ScopeKind::MatchClause);
                let var = scopes.fresh_var(VarPrefix::Anon);
                bind_pattern(scopes, clause_scope, &clause.pattern, var)?;
                bind_body(scopes, clause_scope, &clause.body.items)?;
            }
            Ok(())
        }
        ast::Expr::Block(block) => {
            let block_scope = scopes.enter_scope(scope, ScopeKind::Block);
            bind_body(scopes, block_scope, &block.items)
        }
    }
}

/// Binds a function's parameter/body scope and installs its `FunctionType`
/// as a type symbol in `scope` (the scope the expression occurs in, not the
/// function's own body scope). Returns the constructed type so callers that
/// need it (the collector) don't have to re-derive it.
pub fn bind_function(
    scopes: &mut ScopeGraph,
    scope: ScopeId,
    params: &[ast::Parameter],
    return_annotation: &Option<Type>,
    body: &ast::Block,
    span: tarnc_util::Span,
    name_hint: Option<Symbol>,
) -> SemResult<Type> {
    let fn_scope = scopes.enter_scope(scope, ScopeKind::Function);
    let mut param_types = Vec::with_capacity(params.len());
    for param in params {
        let annotation = param
            .annotation
            .clone()
            .unwrap_or_else(|| scopes.fresh_var(VarPrefix::Anon));
        scopes
            .declare_value(fn_scope, param.name, annotation.clone())
            .map_err(|_| SemError::Redeclaration {
                name: param.name,
                span: param.span,
            })?;
        param_types.push(ParameterType {
            name: param.name,
            annotation: Box::new(annotation),
            is_spread: param.is_spread,
        });
    }
    let ret_ty = return_annotation
        .clone()
        .unwrap_or_else(|| scopes.fresh_var(VarPrefix::Anon));

    let name = name_hint.unwrap_or_else(|| generate_fn_name(scopes));
    let fn_ty = Type::Fn {
        params: param_types,
        ret: Box::new(ret_ty),
        name: Some(name),
    };
    scopes
        .declare_type(scope, name, fn_ty.clone())
        .map_err(|_| SemError::Redeclaration { name, span })?;
    scopes.scope_mut(fn_scope).owner = Some(name);

    bind_body(scopes, fn_scope, &body.items)?;
    Ok(fn_ty)
}

/// Allocates the next `fn{n}` identifier from the same counter that numbers
/// function-related type variables, reused as a display name when a
/// function has none of its own.
fn generate_fn_name(scopes: &mut ScopeGraph) -> Symbol {
    let var = scopes.fresh_var(VarPrefix::Fn);
    Symbol::intern(&var.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarnc_ast::{BodyItem, ConstDecl, ModuleDecl, Pattern, Program};
    use tarnc_util::Span;

    fn program(body: Vec<BodyItem>) -> Program {
        Program {
            module: Some(ModuleDecl {
                path: vec![Symbol::intern("main")],
                span: Span::DUMMY,
            }),
            opens: vec![],
            imports: vec![],
            body,
            span: Span::DUMMY,
        }
    }

    #[test]
    fn missing_module_declaration_is_rejected() {
        let mut scopes = ScopeGraph::new();
        let prog = Program {
            module: None,
            opens: vec![],
            imports: vec![],
            body: vec![],
            span: Span::DUMMY,
        };
        assert!(matches!(
            bind_program(&mut scopes, &prog),
            Err(SemError::MissingModule { .. })
        ));
    }

    #[test]
    fn const_declaration_installs_a_value_symbol() {
        let mut scopes = ScopeGraph::new();
        let prog = program(vec![BodyItem::Const(ConstDecl {
            pattern: Pattern::Ident {
                name: Symbol::intern("x"),
                span: Span::DUMMY,
            },
            annotation: None,
            init: ast::Expr::Primitive {
                value: ast::Literal::Number(1.0),
                span: Span::DUMMY,
            },
            span: Span::DUMMY,
        })]);
        let root = bind_program(&mut scopes, &prog).unwrap();
        assert!(scopes.resolve_value(root, Symbol::intern("x")).is_some());
    }

    #[test]
    fn duplicate_const_names_fail_with_redeclaration() {
        let mut scopes = ScopeGraph::new();
        let decl = || ConstDecl {
            pattern: Pattern::Ident {
                name: Symbol::intern("dup"),
                span: Span::DUMMY,
            },
            annotation: None,
            init: ast::Expr::Primitive {
                value: ast::Literal::Number(1.0),
                span: Span::DUMMY,
            },
            span: Span::DUMMY,
        };
        let prog = program(vec![BodyItem::Const(decl()), BodyItem::Const(decl())]);
        assert!(matches!(
            bind_program(&mut scopes, &prog),
            Err(SemError::Redeclaration { .. })
        ));
    }

    #[test]
    fn unnamed_function_gets_a_generated_name_outside_a_const() {
        let mut scopes = ScopeGraph::new();
        let func = ast::Expr::Function {
            name: None,
            params: vec![],
            return_annotation: None,
            body: Box::new(ast::Block {
                items: vec![],
                span: Span::DUMMY,
            }),
            span: Span::DUMMY,
        };
        let prog = program(vec![BodyItem::Expr(func)]);
        let root = bind_program(&mut scopes, &prog).unwrap();
        assert!(scopes.resolve_type(root, Symbol::intern("fn0")).is_some());
    }

    #[test]
    fn const_bound_function_is_named_after_the_binding() {
        let mut scopes = ScopeGraph::new();
        let func = ast::Expr::Function {
            name: None,
            params: vec![],
            return_annotation: None,
            body: Box::new(ast::Block {
                items: vec![],
                span: Span::DUMMY,
            }),
            span: Span::DUMMY,
        };
        let prog = program(vec![BodyItem::Const(ConstDecl {
            pattern: Pattern::Ident {
                name: Symbol::intern("double"),
                span: Span::DUMMY,
            },
            annotation: None,
            init: func,
            span: Span::DUMMY,
        })]);
        let root = bind_program(&mut scopes, &prog).unwrap();
        assert!(scopes
            .resolve_type(root, Symbol::intern("double"))
            .is_some());
        assert!(scopes.resolve_type(root, Symbol::intern("fn0")).is_none());
    }
}
