//! The semantic error taxonomy.
//!
//! One variant per failure kind the pipeline can report, so tests can match
//! on *kind* via `matches!` as well as on message text.

use tarnc_util::{Span, Symbol};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum SemError {
    #[error("cannot redeclare `{name}`")]
    Redeclaration { name: Symbol, span: Span },

    #[error("program is missing a module declaration")]
    MissingModule { span: Span },

    #[error("enum `{enum_name}` declares member `{member}` more than once")]
    DuplicateEnumMember {
        enum_name: Symbol,
        member: Symbol,
        span: Span,
    },

    #[error("`{decl_name}` declares type parameter `{param}` more than once")]
    DuplicateTypeParameter {
        decl_name: Symbol,
        param: Symbol,
        span: Span,
    },

    #[error("unknown reference `{name}`")]
    UnknownReference { name: Symbol, span: Span },

    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("`{found}` is not callable")]
    NotCallable { found: String, span: Span },

    #[error("enum `{enum_name}` has no member `{member}`")]
    UnknownEnumMember {
        enum_name: Symbol,
        member: Symbol,
        span: Span,
    },

    #[error("cannot unify enum `{left}` with enum `{right}`")]
    EnumMismatch {
        left: Symbol,
        right: Symbol,
        span: Span,
    },

    #[error("could not unify `{left}` with `{right}`")]
    CouldNotUnify {
        left: String,
        right: String,
        span: Span,
    },
}

impl SemError {
    pub fn span(&self) -> Span {
        match self {
            SemError::Redeclaration { span, .. }
            | SemError::MissingModule { span }
            | SemError::DuplicateEnumMember { span, .. }
            | SemError::DuplicateTypeParameter { span, .. }
            | SemError::UnknownReference { span, .. }
            | SemError::TypeMismatch { span, .. }
            | SemError::NotCallable { span, .. }
            | SemError::UnknownEnumMember { span, .. }
            | SemError::EnumMismatch { span, .. }
            | SemError::CouldNotUnify { span, .. } => *span,
        }
    }
}

pub type SemResult<T> = Result<T, SemError>;
