//! The semantic analysis core: binder, collector, and unifier over a shared
//! scope graph.
//!
//! One struct, [`Compilation`], owns the pipeline end to end, running three
//! sequential phases: [`binder::bind_program`] builds the scope graph,
//! [`collector::collect_program`] emits constraints against it, and
//! [`unify::unify_program`] solves them.

pub mod binder;
pub mod collector;
pub mod constraint;
pub mod error;
pub mod scope;
pub mod unify;

pub use constraint::{Constraint, ConstraintKind};
pub use error::{SemError, SemResult};
pub use scope::{Scope, ScopeGraph, ScopeId, ScopeKind, TypeId, TypeSymbol, ValueId, ValueSymbol};

use tarnc_ast::Program;
use tarnc_util::Handler;

/// Owns everything one program's analysis needs: the scope graph the three
/// phases share, the ordered constraint list the collector fills in and the
/// unifier drains, and a [`Handler`] callers can inspect afterward. A fresh
/// `Compilation` is cheap and holds no state beyond one program's analysis —
/// two concurrent compilations never share anything except the process-wide
/// `Symbol` interner.
pub struct Compilation {
    pub scopes: ScopeGraph,
    pub constraints: Vec<Constraint>,
    pub handler: Handler,
}

impl Compilation {
    pub fn new() -> Self {
        Self {
            scopes: ScopeGraph::new(),
            constraints: Vec::new(),
            handler: Handler::new(),
        }
    }

    /// Runs the three phases over `program` in order, stopping at the first
    /// hard failure. On success, `self.scopes`'s value/type tables hold the
    /// fully resolved types, ready for a back end to read.
    pub fn analyze(&mut self, program: &Program) -> SemResult<()> {
        tracing::debug!("binding program");
        binder::bind_program(&mut self.scopes, program)?;

        tracing::debug!("collecting constraints");
        collector::collect_program(&mut self.scopes, &mut self.constraints, program)?;
        tracing::debug!(count = self.constraints.len(), "constraints emitted");

        tracing::debug!("unifying constraints");
        unify::unify_program(&mut self.scopes, &self.constraints)?;

        Ok(())
    }
}

impl Default for Compilation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarnc_ast::{BodyItem, ConstDecl, EnumDecl, Expr, Literal, ModuleDecl, Pattern, Type, TypeDecl};
    use tarnc_util::{Span, Symbol};

    fn module_program(body: Vec<BodyItem>) -> Program {
        Program {
            module: Some(ModuleDecl {
                path: vec![Symbol::intern("A"), Symbol::intern("B")],
                span: Span::DUMMY,
            }),
            opens: vec![],
            imports: vec![],
            body,
            span: Span::DUMMY,
        }
    }

    #[test]
    fn annotated_numeric_const_has_no_errors_and_resolves_to_number() {
        let program = module_program(vec![BodyItem::Const(ConstDecl {
            pattern: Pattern::Ident {
                name: Symbol::intern("foo"),
                span: Span::DUMMY,
            },
            annotation: Some(Type::NUMBER),
            init: Expr::Primitive {
                value: Literal::Number(4.0),
                span: Span::DUMMY,
            },
            span: Span::DUMMY,
        })]);

        let mut compilation = Compilation::new();
        compilation.analyze(&program).unwrap();
        let root = compilation.scopes.root();
        let id = compilation
            .scopes
            .resolve_value(root, Symbol::intern("foo"))
            .unwrap();
        assert_eq!(compilation.scopes.value(id).ty, Type::NUMBER);
    }

    #[test]
    fn annotated_const_with_mismatched_initializer_fails() {
        let program = module_program(vec![BodyItem::Const(ConstDecl {
            pattern: Pattern::Ident {
                name: Symbol::intern("foo"),
                span: Span::DUMMY,
            },
            annotation: Some(Type::NUMBER),
            init: Expr::Primitive {
                value: Literal::String("bar".into()),
                span: Span::DUMMY,
            },
            span: Span::DUMMY,
        })]);

        let mut compilation = Compilation::new();
        assert!(matches!(
            compilation.analyze(&program),
            Err(SemError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn duplicate_const_names_fail_with_redeclaration() {
        let decl = || ConstDecl {
            pattern: Pattern::Ident {
                name: Symbol::intern("foo2"),
                span: Span::DUMMY,
            },
            annotation: None,
            init: Expr::Primitive {
                value: Literal::String("bar".into()),
                span: Span::DUMMY,
            },
            span: Span::DUMMY,
        };
        let program = module_program(vec![BodyItem::Const(decl()), BodyItem::Const(decl())]);
        let mut compilation = Compilation::new();
        assert!(matches!(
            compilation.analyze(&program),
            Err(SemError::Redeclaration { .. })
        ));
    }

    #[test]
    fn duplicate_type_declarations_fail_with_redeclaration() {
        let decl = || TypeDecl {
            name: Symbol::intern("Foo2"),
            type_params: vec![],
            value: Type::STRING,
            span: Span::DUMMY,
        };
        let program = module_program(vec![BodyItem::Type(decl()), BodyItem::Type(decl())]);
        let mut compilation = Compilation::new();
        assert!(matches!(
            compilation.analyze(&program),
            Err(SemError::Redeclaration { .. })
        ));
    }

    #[test]
    fn function_referencing_an_outer_const_infers_a_number_to_number_signature() {
        use tarnc_ast::{BinOp, Parameter};
        let multi_decl = ConstDecl {
            pattern: Pattern::Ident {
                name: Symbol::intern("multi"),
                span: Span::DUMMY,
            },
            annotation: None,
            init: Expr::Primitive {
                value: Literal::Number(4.0),
                span: Span::DUMMY,
            },
            span: Span::DUMMY,
        };
        let calc_decl = ConstDecl {
            pattern: Pattern::Ident {
                name: Symbol::intern("calc"),
                span: Span::DUMMY,
            },
            annotation: None,
            init: Expr::Function {
                name: None,
                params: vec![Parameter {
                    name: Symbol::intern("factor"),
                    annotation: Some(Type::NUMBER),
                    is_spread: false,
                    span: Span::DUMMY,
                }],
                return_annotation: None,
                body: Box::new(tarnc_ast::Block {
                    items: vec![BodyItem::Expr(Expr::Binary {
                        op: BinOp::Mul,
                        left: Box::new(Expr::Identifier {
                            name: Symbol::intern("factor"),
                            span: Span::DUMMY,
                        }),
                        right: Box::new(Expr::Identifier {
                            name: Symbol::intern("multi"),
                            span: Span::DUMMY,
                        }),
                        span: Span::DUMMY,
                    })],
                    span: Span::DUMMY,
                }),
                span: Span::DUMMY,
            },
            span: Span::DUMMY,
        };
        let program = module_program(vec![BodyItem::Const(multi_decl), BodyItem::Const(calc_decl)]);

        let mut compilation = Compilation::new();
        compilation.analyze(&program).unwrap();
        let root = compilation.scopes.root();
        let id = compilation
            .scopes
            .resolve_value(root, Symbol::intern("calc"))
            .unwrap();
        match &compilation.scopes.value(id).ty {
            Type::Fn { params, ret, .. } => {
                assert_eq!(params.len(), 1);
                assert_eq!(*params[0].annotation, Type::NUMBER);
                assert_eq!(**ret, Type::NUMBER);
            }
            other => panic!("expected a function type, got {other:?}"),
        }
    }

    #[test]
    fn value_declared_in_a_nested_block_does_not_escape_it() {
        let inner = ConstDecl {
            pattern: Pattern::Ident {
                name: Symbol::intern("bar"),
                span: Span::DUMMY,
            },
            annotation: None,
            init: Expr::Primitive {
                value: Literal::Number(3.0),
                span: Span::DUMMY,
            },
            span: Span::DUMMY,
        };
        let foo_decl = ConstDecl {
            pattern: Pattern::Ident {
                name: Symbol::intern("foo3"),
                span: Span::DUMMY,
            },
            annotation: None,
            init: Expr::Function {
                name: None,
                params: vec![],
                return_annotation: None,
                body: Box::new(tarnc_ast::Block {
                    items: vec![BodyItem::Const(inner)],
                    span: Span::DUMMY,
                }),
                span: Span::DUMMY,
            },
            span: Span::DUMMY,
        };
        let leak = Expr::Identifier {
            name: Symbol::intern("bar"),
            span: Span::DUMMY,
        };
        let program = module_program(vec![
            BodyItem::Const(foo_decl),
            BodyItem::Expr(leak),
        ]);

        let mut compilation = Compilation::new();
        assert!(matches!(
            compilation.analyze(&program),
            Err(SemError::UnknownReference { .. })
        ));
    }

    #[test]
    fn duplicate_enum_member_fails_with_duplicate_enum_member() {
        use tarnc_ast::EnumMemberDecl;
        let decl = EnumDecl {
            name: Symbol::intern("Foo"),
            type_params: vec![],
            members: vec![
                EnumMemberDecl {
                    name: Symbol::intern("Bar"),
                    payload: vec![],
                    span: Span::DUMMY,
                },
                EnumMemberDecl {
                    name: Symbol::intern("Bar"),
                    payload: vec![],
                    span: Span::DUMMY,
                },
            ],
            span: Span::DUMMY,
        };
        let program = module_program(vec![BodyItem::Enum(decl)]);
        let mut compilation = Compilation::new();
        assert!(matches!(
            compilation.analyze(&program),
            Err(SemError::DuplicateEnumMember { .. })
        ));
    }

    #[test]
    fn duplicate_type_parameter_fails_with_duplicate_type_parameter() {
        let decl = TypeDecl {
            name: Symbol::intern("Pair"),
            type_params: vec![Symbol::intern("T"), Symbol::intern("T")],
            value: Type::STRING,
            span: Span::DUMMY,
        };
        let program = module_program(vec![BodyItem::Type(decl)]);
        let mut compilation = Compilation::new();
        assert!(matches!(
            compilation.analyze(&program),
            Err(SemError::DuplicateTypeParameter { .. })
        ));
    }

    #[test]
    fn program_without_a_module_declaration_fails() {
        let program = Program {
            module: None,
            opens: vec![],
            imports: vec![],
            body: vec![],
            span: Span::DUMMY,
        };
        let mut compilation = Compilation::new();
        assert!(matches!(
            compilation.analyze(&program),
            Err(SemError::MissingModule { .. })
        ));
    }
}
