//! The type grammar.
//!
//! One recursive sum type stands for every type in the system: a surface
//! annotation straight out of a parser, an unresolved reference the binder
//! hasn't looked up yet, and the fully-solved type the unifier leaves behind
//! are all the same `Type`, at different stages of having its `Var`/`Ident`
//! slots rewritten in place. There is no separate "surface type" grammar
//! that gets lowered into this one.
//!
//! The variant set covers exactly what this language's constructs need:
//! records, enums, and the two call-shaped types (`Call`/`EnumCall`) that
//! carry a call site's own arity and argument types so the unifier can
//! decompose them against a declared signature.

use tarnc_util::{define_idx, Symbol};

define_idx! {
    /// Identifies one `enum` declaration for the lifetime of a compilation.
    /// Two `Enum`/`EnumCall`/`EnumPattern` types denote "the same enum"
    /// exactly when their `EnumId`s are equal — this is the "enum identity
    /// (pointer identity in the type table)" unification rule expressed as
    /// integer equality instead of a real pointer.
    pub struct EnumId;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NativeKind {
    String,
    Number,
    Boolean,
    Void,
    Array,
    Object,
    Unknown,
}

impl std::fmt::Display for NativeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NativeKind::String => "string",
            NativeKind::Number => "number",
            NativeKind::Boolean => "boolean",
            NativeKind::Void => "void",
            NativeKind::Array => "array",
            NativeKind::Object => "object",
            NativeKind::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Which global counter a type variable's name came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarPrefix {
    /// `t0`, `t1`, ... — an unannotated declaration.
    Anon,
    /// `fn0`, `fn1`, ... — a function expression's own signature identifier.
    Fn,
}

impl std::fmt::Display for VarPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VarPrefix::Anon => write!(f, "t"),
            VarPrefix::Fn => write!(f, "fn"),
        }
    }
}

/// A single parameter: a name, its annotation (possibly a fresh variable),
/// and whether it is a spread (`...rest`) parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterType {
    pub name: Symbol,
    pub annotation: Box<Type>,
    pub is_spread: bool,
}

/// One constructor of an enum: a name plus its (possibly empty) payload
/// types. Only the first payload parameter round-trips through
/// unification; additional parameters are stored but not bound by
/// `PatternType` unification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumMemberType {
    pub name: Symbol,
    pub params: Vec<Type>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type {
    /// A built-in scalar.
    Native(NativeKind),
    /// A type pinned to a specific literal (`:Red`, `"ok"`, ...).
    Literal(String),
    /// An unsolved type awaiting unification. Carries its own unique name
    /// so two variables from different declarations are never confused.
    Var { prefix: VarPrefix, id: u32 },
    /// A named reference not yet resolved through the scope graph.
    Ident(Symbol),
    /// A generic application, e.g. `array<number>`.
    TypeRef { base: Box<Type>, args: Vec<Type> },
    /// A function signature.
    Fn {
        params: Vec<ParameterType>,
        ret: Box<Type>,
        name: Option<Symbol>,
    },
    /// A single parameter, standing alone as a type (mirrors `ParameterType`
    /// when a parameter's annotation is inspected on its own).
    Param(ParameterType),
    /// The shape of a call site: what was called, with what, expecting what
    /// back. Distinct from `Fn` because a call site's argument count can
    /// disagree with a declaration's parameter count — that disagreement is
    /// exactly what unification rule 4 checks.
    Call {
        callee: Box<Type>,
        arguments: Vec<Type>,
        ret: Box<Type>,
    },
    /// A record, in source field order.
    Object {
        properties: Vec<(Symbol, Type)>,
        name: Option<Symbol>,
    },
    /// A sum of unrelated alternatives (not an `enum` declaration — just a
    /// list of possible shapes, used nowhere in the Non-goals-trimmed
    /// surface grammar today but kept as a first-class variant since the
    /// type grammar names it).
    Variant(Vec<Type>),
    /// A named algebraic data type declaration.
    Enum {
        id: EnumId,
        name: Symbol,
        type_params: Vec<Symbol>,
        members: Vec<EnumMemberType>,
    },
    /// An enum value built by applying a variant to arguments.
    EnumCall {
        id: EnumId,
        enum_name: Symbol,
        member: Symbol,
        arguments: Vec<Type>,
    },
    /// The pattern form matching one specific variant.
    EnumPattern {
        id: EnumId,
        enum_name: Symbol,
        member: Symbol,
    },
    /// Binds a destructuring pattern to a fresh type variable standing for
    /// whatever the pattern ends up matching.
    Pattern { pattern: Box<Type>, var: Box<Type> },
}

impl Type {
    pub const STRING: Type = Type::Native(NativeKind::String);
    pub const NUMBER: Type = Type::Native(NativeKind::Number);
    pub const BOOLEAN: Type = Type::Native(NativeKind::Boolean);
    pub const VOID: Type = Type::Native(NativeKind::Void);

    /// Is this an unresolved slot a constraint can rewrite in place?
    pub fn is_unresolved_var(&self) -> bool {
        matches!(self, Type::Var { .. } | Type::Ident(_))
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Native(k) => write!(f, "{k}"),
            Type::Literal(s) => write!(f, "{s:?}"),
            Type::Var { prefix, id } => write!(f, "{prefix}{id}"),
            Type::Ident(name) => write!(f, "{name}"),
            Type::TypeRef { base, args } => {
                write!(f, "{base}<")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ">")
            }
            Type::Fn { params, ret, .. } => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p.annotation)?;
                }
                write!(f, ") -> {ret}")
            }
            Type::Param(p) => write!(f, "{}", p.annotation),
            Type::Call {
                callee, arguments, ..
            } => {
                write!(f, "{callee}(")?;
                for (i, a) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ")")
            }
            Type::Object { properties, .. } => {
                write!(f, "{{ ")?;
                for (i, (name, ty)) in properties.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                write!(f, " }}")
            }
            Type::Variant(alts) => {
                for (i, a) in alts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{a}")?;
                }
                Ok(())
            }
            Type::Enum { name, .. } => write!(f, "{name}"),
            Type::EnumCall {
                enum_name, member, ..
            } => write!(f, "{enum_name}.{member}"),
            Type::EnumPattern {
                enum_name, member, ..
            } => write!(f, "{enum_name}.{member}(..)"),
            Type::Pattern { var, .. } => write!(f, "{var}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_display_matches_surface_keyword() {
        assert_eq!(Type::NUMBER.to_string(), "number");
        assert_eq!(Type::Native(NativeKind::Array).to_string(), "array");
    }

    #[test]
    fn var_display_includes_prefix_and_id() {
        let t = Type::Var {
            prefix: VarPrefix::Fn,
            id: 3,
        };
        assert_eq!(t.to_string(), "fn3");
    }

    #[test]
    fn is_unresolved_var_covers_idents_and_vars() {
        assert!(Type::Ident(Symbol::intern("Foo")).is_unresolved_var());
        assert!(Type::Var {
            prefix: VarPrefix::Anon,
            id: 0
        }
        .is_unresolved_var());
        assert!(!Type::NUMBER.is_unresolved_var());
    }
}
