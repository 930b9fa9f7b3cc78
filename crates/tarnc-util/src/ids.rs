//! A generic id generator, one per arena.
//!
//! This compiler needs several independent id spaces (scopes, value
//! symbols, type symbols, ...) so the counter is generic over [`Idx`] instead
//! of hardcoding one id type; each `Compilation` owns its own generators and
//! none of them are global statics, so two concurrent compilations never
//! collide on a counter.

use crate::Idx;
use std::marker::PhantomData;

pub struct IdGen<I: Idx> {
    next: u32,
    _marker: PhantomData<fn() -> I>,
}

impl<I: Idx> IdGen<I> {
    pub fn new() -> Self {
        Self {
            next: 0,
            _marker: PhantomData,
        }
    }

    pub fn next(&mut self) -> I {
        let id = I::from_usize(self.next as usize);
        self.next = self
            .next
            .checked_add(1)
            .expect("id generator overflowed u32");
        id
    }
}

impl<I: Idx> Default for IdGen<I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define_idx;

    define_idx! { struct GenTestId; }

    #[test]
    fn hands_out_sequential_ids() {
        let mut gen: IdGen<GenTestId> = IdGen::new();
        assert_eq!(gen.next().index(), 0);
        assert_eq!(gen.next().index(), 1);
        assert_eq!(gen.next().index(), 2);
    }
}
