//! The scope graph: the one mutable structure the binder, collector, and
//! unifier all share.
//!
//! A scope walks its parent chain by plain index rather than pointer
//! (`enter_scope`/`resolve`). Each scope keeps separate value and type
//! tables, records its child scopes explicitly, and records which constraints were
//! emitted while collecting it. Scopes are addressed explicitly by
//! [`ScopeId`] rather than through a single mutable "current scope" cursor —
//! the binder recurses into sibling scopes (`if`/`else` branches, match
//! clauses) that a single cursor stack cannot represent without careful
//! push/pop pairing, so callers pass the scope they mean explicitly.

use std::collections::HashMap;
use tarnc_ast::{EnumId, NativeKind, Type, VarPrefix};
use tarnc_util::{define_idx, IdGen, Span, Symbol};

define_idx! {
    /// One lexical region: the program, a block, a function body, an
    /// if/else branch, a match clause, an enum's type-parameter scope, or a
    /// type declaration's type-parameter scope.
    pub struct ScopeId;
}

define_idx! {
    /// A declared value (a `const`, a function parameter, a pattern
    /// binding).
    pub struct ValueId;
}

define_idx! {
    /// A declared type (a native, a `type` alias, an `enum`, a type
    /// parameter).
    pub struct TypeId;
}

define_idx! {
    /// One emitted constraint, addressed by its position in the global
    /// emission-ordered constraint list.
    pub struct ConstraintId;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Program,
    Block,
    Function,
    IfBranch,
    MatchClause,
    EnumParams,
    TypeDeclParams,
}

#[derive(Clone, Debug)]
pub struct ValueSymbol {
    pub name: Symbol,
    pub ty: Type,
    pub scope: ScopeId,
}

#[derive(Clone, Debug)]
pub struct TypeSymbol {
    pub name: Symbol,
    pub ty: Type,
    pub scope: ScopeId,
}

#[derive(Debug)]
pub struct Scope {
    pub values: HashMap<Symbol, ValueId>,
    pub types: HashMap<Symbol, TypeId>,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub constraints: Vec<ConstraintId>,
    pub kind: ScopeKind,
    /// For a `Function`-kind scope, the name its `FunctionType` was filed
    /// under in the enclosing scope's type table. The collector re-derives
    /// a function's signature from this rather than recomputing the
    /// binder's name-generation decision a second time.
    pub owner: Option<Symbol>,
}

impl Scope {
    fn new(parent: Option<ScopeId>, kind: ScopeKind) -> Self {
        Self {
            values: HashMap::new(),
            types: HashMap::new(),
            parent,
            children: Vec::new(),
            constraints: Vec::new(),
            kind,
            owner: None,
        }
    }
}

/// A redeclaration: the name already denotes a symbol of the same kind in
/// `scope` or one of its ancestors.
#[derive(Debug)]
pub struct Redeclared;

pub struct ScopeGraph {
    scopes: tarnc_util::IndexVec<ScopeId, Scope>,
    values: tarnc_util::IndexVec<ValueId, ValueSymbol>,
    types: tarnc_util::IndexVec<TypeId, TypeSymbol>,
    root: ScopeId,
    anon_slots: Vec<Option<Type>>,
    fn_slots: Vec<Option<Type>>,
    enum_ids: IdGen<EnumId>,
}

impl ScopeGraph {
    /// Builds the scope graph with its root scope, pre-installing the
    /// built-in native types `string`, `number`, `boolean` so every
    /// descendant scope can resolve them.
    pub fn new() -> Self {
        let mut scopes = tarnc_util::IndexVec::new();
        let root = scopes.push(Scope::new(None, ScopeKind::Program));
        let mut graph = Self {
            scopes,
            values: tarnc_util::IndexVec::new(),
            types: tarnc_util::IndexVec::new(),
            root,
            anon_slots: Vec::new(),
            fn_slots: Vec::new(),
            enum_ids: IdGen::new(),
        };
        for (name, kind) in [
            ("string", NativeKind::String),
            ("number", NativeKind::Number),
            ("boolean", NativeKind::Boolean),
        ] {
            let sym = Symbol::intern(name);
            let id = graph.types.push(TypeSymbol {
                name: sym,
                ty: Type::Native(kind),
                scope: root,
            });
            graph.scopes[root].types.insert(sym, id);
        }
        graph
    }

    pub fn root(&self) -> ScopeId {
        self.root
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id]
    }

    pub fn enter_scope(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        let id = self.scopes.push(Scope::new(Some(parent), kind));
        self.scopes[parent].children.push(id);
        id
    }

    pub fn value(&self, id: ValueId) -> &ValueSymbol {
        &self.values[id]
    }

    pub fn value_mut(&mut self, id: ValueId) -> &mut ValueSymbol {
        &mut self.values[id]
    }

    pub fn type_symbol(&self, id: TypeId) -> &TypeSymbol {
        &self.types[id]
    }

    pub fn type_symbol_mut(&mut self, id: TypeId) -> &mut TypeSymbol {
        &mut self.types[id]
    }

    pub fn iter_types(&self) -> impl Iterator<Item = (TypeId, &TypeSymbol)> {
        self.types.iter()
    }

    pub fn iter_types_mut(&mut self) -> impl Iterator<Item = (TypeId, &mut TypeSymbol)> {
        self.types.iter_mut()
    }

    pub fn iter_values(&self) -> impl Iterator<Item = (ValueId, &ValueSymbol)> {
        self.values.iter()
    }

    /// Declares a value symbol in `scope`. Fails if the name already denotes
    /// a value in `scope` or any ancestor: both redeclaration within a scope
    /// and shadowing a parent's symbol are forbidden.
    pub fn declare_value(
        &mut self,
        scope: ScopeId,
        name: Symbol,
        ty: Type,
    ) -> Result<ValueId, Redeclared> {
        if self.resolve_value(scope, name).is_some() {
            return Err(Redeclared);
        }
        let id = self.values.push(ValueSymbol { name, ty, scope });
        self.scopes[scope].values.insert(name, id);
        Ok(id)
    }

    /// Declares a type symbol in `scope`, under the same redeclaration and
    /// anti-shadowing rule as [`Self::declare_value`].
    pub fn declare_type(
        &mut self,
        scope: ScopeId,
        name: Symbol,
        ty: Type,
    ) -> Result<TypeId, Redeclared> {
        if self.resolve_type(scope, name).is_some() {
            return Err(Redeclared);
        }
        let id = self.types.push(TypeSymbol { name, ty, scope });
        self.scopes[scope].types.insert(name, id);
        Ok(id)
    }

    pub fn resolve_value(&self, scope: ScopeId, name: Symbol) -> Option<ValueId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(&found) = self.scopes[id].values.get(&name) {
                return Some(found);
            }
            current = self.scopes[id].parent;
        }
        None
    }

    pub fn resolve_type(&self, scope: ScopeId, name: Symbol) -> Option<TypeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(&found) = self.scopes[id].types.get(&name) {
                return Some(found);
            }
            current = self.scopes[id].parent;
        }
        None
    }

    pub fn record_constraint(&mut self, scope: ScopeId, id: ConstraintId) {
        self.scopes[scope].constraints.push(id);
    }

    /// Allocates a fresh type variable and installs its (initially empty)
    /// slot in the substitution store.
    pub fn fresh_var(&mut self, prefix: VarPrefix) -> Type {
        let slots = match prefix {
            VarPrefix::Anon => &mut self.anon_slots,
            VarPrefix::Fn => &mut self.fn_slots,
        };
        let id = slots.len() as u32;
        slots.push(None);
        Type::Var { prefix, id }
    }

    pub fn var_slot(&self, prefix: VarPrefix, id: u32) -> Option<&Type> {
        let slots = match prefix {
            VarPrefix::Anon => &self.anon_slots,
            VarPrefix::Fn => &self.fn_slots,
        };
        slots[id as usize].as_ref()
    }

    pub fn set_var_slot(&mut self, prefix: VarPrefix, id: u32, ty: Type) {
        let slots = match prefix {
            VarPrefix::Anon => &mut self.anon_slots,
            VarPrefix::Fn => &mut self.fn_slots,
        };
        slots[id as usize] = Some(ty);
    }

    pub fn var_count(&self) -> usize {
        self.anon_slots.len() + self.fn_slots.len()
    }

    /// Allocates identity for a freshly declared enum. Distinct `enum`
    /// declarations that happen to share a name in unrelated scopes still
    /// get distinct ids, so unification can tell them apart.
    pub fn next_enum_id(&mut self) -> EnumId {
        self.enum_ids.next()
    }
}

impl Default for ScopeGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Trivial span helper shared by binder/collector call sites that need
/// *a* span but don't have source text to point at yet.
pub fn no_span() -> Span {
    Span::DUMMY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_scope_has_native_types_preinstalled() {
        let graph = ScopeGraph::new();
        for name in ["string", "number", "boolean"] {
            assert!(graph.resolve_type(graph.root(), Symbol::intern(name)).is_some());
        }
    }

    #[test]
    fn redeclaring_a_value_in_the_same_scope_fails() {
        let mut graph = ScopeGraph::new();
        let root = graph.root();
        graph
            .declare_value(root, Symbol::intern("x"), Type::NUMBER)
            .unwrap();
        assert!(graph
            .declare_value(root, Symbol::intern("x"), Type::STRING)
            .is_err());
    }

    #[test]
    fn shadowing_a_parent_value_fails() {
        let mut graph = ScopeGraph::new();
        let root = graph.root();
        graph
            .declare_value(root, Symbol::intern("x"), Type::NUMBER)
            .unwrap();
        let child = graph.enter_scope(root, ScopeKind::Block);
        assert!(graph
            .declare_value(child, Symbol::intern("x"), Type::STRING)
            .is_err());
    }

    #[test]
    fn sibling_scopes_may_reuse_a_name() {
        let mut graph = ScopeGraph::new();
        let root = graph.root();
        let a = graph.enter_scope(root, ScopeKind::Block);
        let b = graph.enter_scope(root, ScopeKind::Block);
        graph
            .declare_value(a, Symbol::intern("x"), Type::NUMBER)
            .unwrap();
        assert!(graph
            .declare_value(b, Symbol::intern("x"), Type::STRING)
            .is_ok());
    }

    #[test]
    fn resolve_walks_up_to_an_ancestor() {
        let mut graph = ScopeGraph::new();
        let root = graph.root();
        let child = graph.enter_scope(root, ScopeKind::Block);
        let grandchild = graph.enter_scope(child, ScopeKind::Block);
        graph
            .declare_value(root, Symbol::intern("outer"), Type::NUMBER)
            .unwrap();
        assert!(graph.resolve_value(grandchild, Symbol::intern("outer")).is_some());
    }

    #[test]
    fn a_name_declared_in_a_child_is_invisible_to_its_parent() {
        let mut graph = ScopeGraph::new();
        let root = graph.root();
        let child = graph.enter_scope(root, ScopeKind::Block);
        graph
            .declare_value(child, Symbol::intern("inner"), Type::NUMBER)
            .unwrap();
        assert!(graph.resolve_value(root, Symbol::intern("inner")).is_none());
    }

    #[test]
    fn type_variables_get_unique_sequential_names_per_prefix() {
        let mut graph = ScopeGraph::new();
        let a = graph.fresh_var(VarPrefix::Anon);
        let b = graph.fresh_var(VarPrefix::Anon);
        let f = graph.fresh_var(VarPrefix::Fn);
        assert_eq!(a.to_string(), "t0");
        assert_eq!(b.to_string(), "t1");
        assert_eq!(f.to_string(), "fn0");
    }
}
