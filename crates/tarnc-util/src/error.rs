//! Infrastructure-level errors (id overflow, interner poisoning).
//!
//! Kept separate from `tarnc-sem`'s `SemError`: the errors here are about
//! the ambient arena/interning machinery misbehaving, never about the
//! program under analysis, so they get their own small `thiserror` enum
//! rather than polluting the semantic error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpanlessError {
    #[error("id space exhausted: {0}")]
    IdOverflow(&'static str),
}

pub type UtilResult<T> = Result<T, SpanlessError>;
