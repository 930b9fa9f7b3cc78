//! AST data definitions for the `tarnc` surface language.
//!
//! This crate owns the *shape* a parser would target — `Program`, `Expr`,
//! `Pattern`, and the shared [`ty::Type`] grammar — but not a parser.
//! Tokenising and grammar parsing are out of scope for this repository;
//! tests build `Program` values directly with the constructors here.

pub mod ast;
pub mod ty;

pub use ast::*;
pub use ty::{EnumId, EnumMemberType, NativeKind, ParameterType, Type, VarPrefix};
