//! Source locations.
//!
//! Trimmed to what a parser-less pipeline still needs: a byte range
//! diagnostics can report. There is no `SourceMap`/line-lookup here because
//! nothing in this repository produces byte offsets against real source
//! text (tokenisation is out of scope).

use std::fmt;

/// A byte range in some (hypothetical, externally-owned) source text.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_spans_the_union() {
        let a = Span::new(0, 5);
        let b = Span::new(10, 15);
        assert_eq!(a.to(b), Span::new(0, 15));
    }
}
