//! Interned identifiers.
//!
//! Every name the binder sees (`const` names, enum members, field names)
//! passes through here. A [`Symbol`] is a `Copy` `u32` handle, so looking one
//! up in a scope's value/type table is integer hashing, not string hashing,
//! and comparing two identifiers for equality never touches their text.
//!
//! The interner is a sharded concurrent map (`dashmap` + `ahash`) rather than
//! a `Mutex<HashMap>` so the driver can compile multiple programs in
//! parallel; interning is the one piece of state those compilations share.

use dashmap::DashMap;
use std::fmt;
use std::hash::BuildHasherDefault;
use std::sync::{OnceLock, RwLock};

type Interner = DashMap<&'static str, u32, BuildHasherDefault<ahash::AHasher>>;

struct StringTable {
    interner: Interner,
    strings: RwLock<Vec<&'static str>>,
}

impl StringTable {
    fn new() -> Self {
        Self {
            interner: DashMap::default(),
            strings: RwLock::new(Vec::new()),
        }
    }

    fn intern(&self, s: &str) -> u32 {
        if let Some(existing) = self.interner.get(s) {
            return *existing;
        }
        // Leak the string once; symbols live for the process lifetime.
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let mut strings = self.strings.write().unwrap();
        let id = strings.len() as u32;
        strings.push(leaked);
        self.interner.insert(leaked, id);
        id
    }

    fn resolve(&self, id: u32) -> &'static str {
        self.strings.read().unwrap()[id as usize]
    }
}

fn table() -> &'static StringTable {
    static TABLE: OnceLock<StringTable> = OnceLock::new();
    TABLE.get_or_init(StringTable::new)
}

/// An interned identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

static_assertions::assert_impl_all!(Symbol: Send, Sync);

impl Symbol {
    pub fn intern(s: &str) -> Self {
        Symbol(table().intern(s))
    }

    pub fn as_str(self) -> &'static str {
        table().resolve(self.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_same_text_yields_same_symbol() {
        let a = Symbol::intern("foo");
        let b = Symbol::intern("foo");
        assert_eq!(a, b);
    }

    #[test]
    fn interning_different_text_yields_different_symbols() {
        let a = Symbol::intern("foo");
        let b = Symbol::intern("bar");
        assert_ne!(a, b);
    }

    #[test]
    fn as_str_roundtrips() {
        let sym = Symbol::intern("hello_world");
        assert_eq!(sym.as_str(), "hello_world");
    }

    #[test]
    fn concurrent_interning_is_consistent() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| Symbol::intern("shared")))
            .collect();
        let symbols: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(symbols.windows(2).all(|w| w[0] == w[1]));
    }
}
