//! The surface tree the binder and collector walk.
//!
//! Every node carries a [`Span`]; binder/collector attach a `scope`
//! back-pointer and a collected `Type` by storing them alongside the node
//! (in the scope graph and a side table, see `tarnc-sem`), not by mutating
//! these structs. The AST itself stays immutable after parsing.

use crate::ty::Type;
use tarnc_util::{Span, Symbol};

#[derive(Clone, Debug)]
pub struct ModuleDecl {
    pub path: Vec<Symbol>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct OpenStmt {
    pub path: Vec<Symbol>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct ImportStmt {
    pub path: Vec<Symbol>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct Program {
    pub module: Option<ModuleDecl>,
    pub opens: Vec<OpenStmt>,
    pub imports: Vec<ImportStmt>,
    pub body: Vec<BodyItem>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum BodyItem {
    Const(ConstDecl),
    Enum(EnumDecl),
    Type(TypeDecl),
    Expr(Expr),
}

#[derive(Clone, Debug)]
pub struct Block {
    pub items: Vec<BodyItem>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct ConstDecl {
    pub pattern: Pattern,
    pub annotation: Option<Type>,
    pub init: Expr,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct EnumMemberDecl {
    pub name: Symbol,
    pub payload: Vec<Type>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct EnumDecl {
    pub name: Symbol,
    pub type_params: Vec<Symbol>,
    pub members: Vec<EnumMemberDecl>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct TypeDecl {
    pub name: Symbol,
    pub type_params: Vec<Symbol>,
    pub value: Type,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct Parameter {
    pub name: Symbol,
    pub annotation: Option<Type>,
    pub is_spread: bool,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Eq,
    Ne,
}

impl BinOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(self, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Pow)
    }

    pub fn is_comparison(self) -> bool {
        matches!(self, BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Ne)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Clone, Debug)]
pub enum TemplateChunk {
    Text(String),
    Expr(Box<Expr>),
}

#[derive(Clone, Debug)]
pub enum Pattern {
    Ident {
        name: Symbol,
        span: Span,
    },
    Array {
        elements: Vec<Pattern>,
        span: Span,
    },
    Object {
        fields: Vec<(Symbol, Pattern)>,
        span: Span,
    },
    EnumDestructure {
        enum_name: Symbol,
        member: Symbol,
        bindings: Vec<Symbol>,
        span: Span,
    },
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Ident { span, .. }
            | Pattern::Array { span, .. }
            | Pattern::Object { span, .. }
            | Pattern::EnumDestructure { span, .. } => *span,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MatchClause {
    pub pattern: Pattern,
    pub body: Block,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum Expr {
    Identifier {
        name: Symbol,
        span: Span,
    },
    Primitive {
        value: Literal,
        span: Span,
    },
    Template {
        chunks: Vec<TemplateChunk>,
        span: Span,
    },
    ObjectLiteral {
        properties: Vec<(Symbol, Expr)>,
        span: Span,
    },
    ArrayLiteral {
        elements: Vec<Expr>,
        span: Span,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        span: Span,
    },
    Function {
        name: Option<Symbol>,
        params: Vec<Parameter>,
        return_annotation: Option<Type>,
        body: Box<Block>,
        span: Span,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
        span: Span,
    },
    Dot {
        left: Box<Expr>,
        right: Symbol,
        span: Span,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    IfElse {
        condition: Box<Expr>,
        then_branch: Block,
        else_branch: Option<Block>,
        span: Span,
    },
    Match {
        subject: Box<Expr>,
        clauses: Vec<MatchClause>,
        span: Span,
    },
    Block(Block),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Identifier { span, .. }
            | Expr::Primitive { span, .. }
            | Expr::Template { span, .. }
            | Expr::ObjectLiteral { span, .. }
            | Expr::ArrayLiteral { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Function { span, .. }
            | Expr::Call { span, .. }
            | Expr::Dot { span, .. }
            | Expr::Index { span, .. }
            | Expr::IfElse { span, .. }
            | Expr::Match { span, .. } => *span,
            Expr::Block(block) => block.span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binop_classification_is_exhaustive_and_disjoint() {
        let all = [
            BinOp::Add,
            BinOp::Sub,
            BinOp::Mul,
            BinOp::Div,
            BinOp::Pow,
            BinOp::Lt,
            BinOp::Le,
            BinOp::Gt,
            BinOp::Ge,
            BinOp::And,
            BinOp::Or,
            BinOp::Eq,
            BinOp::Ne,
        ];
        for op in all {
            let flags = [
                op.is_arithmetic(),
                op.is_comparison(),
                op.is_logical(),
                op.is_equality(),
            ];
            assert_eq!(flags.iter().filter(|b| **b).count(), 1, "{op:?} miscategorized");
        }
    }

    #[test]
    fn expr_span_reaches_through_block_variant() {
        let block = Block {
            items: vec![],
            span: Span::new(1, 2),
        };
        assert_eq!(Expr::Block(block).span(), Span::new(1, 2));
    }
}
