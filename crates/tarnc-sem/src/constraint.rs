//! Typing constraints.
//!
//! One `Constraint` type covers the whole pipeline: a `(left, right, scope,
//! kind)` tuple, kind restricted to equality or structural subset, plus the
//! constraint's own position in the global emission order so "process in
//! order of emission" is a sort key on stored data rather than an implicit
//! property of whatever order a `Vec` happens to hold them in.

use crate::scope::{ConstraintId, ScopeId};
use tarnc_ast::Type;
use tarnc_util::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintKind {
    /// The two sides must unify exactly.
    Equality,
    /// The left side must be a structural subset of the right.
    Subset,
}

#[derive(Clone, Debug)]
pub struct Constraint {
    pub id: ConstraintId,
    pub left: Type,
    pub right: Type,
    pub scope: ScopeId,
    pub kind: ConstraintKind,
    pub span: Span,
}
