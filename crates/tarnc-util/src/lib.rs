//! Shared infrastructure for the `tarnc` compiler: typed arena indices,
//! string interning, source spans, and diagnostic reporting.
//!
//! Every id space the binder/collector/unifier pipeline needs (scopes, value
//! symbols, type symbols, type-variable slots, constraints) is a newtype
//! implementing [`Idx`], stored in an [`IndexVec`]. This keeps "an index into
//! the scope arena" and "an index into the type-variable table" from being
//! interchangeable `usize`s that the compiler would happily let you swap.

mod diagnostic;
mod error;
mod ids;
mod index_vec;
mod span;
mod symbol;

pub use diagnostic::{Diagnostic, Handler, Level};
pub use error::{SpanlessError, UtilResult};
pub use ids::IdGen;
pub use index_vec::{Idx, IndexVec};
pub use span::Span;
pub use symbol::Symbol;
