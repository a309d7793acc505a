//! Newline boundary scanning shared by both writers.

use std::iter::FusedIterator;

use memchr::{memchr, memrchr};

/// The only byte treated as a line boundary.
pub(crate) const NEWLINE: u8 = b'\n';

/// Returns the length of the longest prefix of `bytes` that ends in a
/// newline, or `None` when `bytes` holds no newline.
///
/// ```
/// assert_eq!(linebatch::last_newline(b"a\nbc\nd"), Some(5));
/// assert_eq!(linebatch::last_newline(b"abc"), None);
/// ```
#[inline]
#[must_use]
pub fn last_newline(bytes: &[u8]) -> Option<usize> {
    memrchr(NEWLINE, bytes).map(|index| index + 1)
}

/// A piece of input produced by [`LineSegments`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Segment<'a> {
    /// Bytes up to and including a newline.
    Line(&'a [u8]),
    /// Trailing bytes with no newline after them.
    Partial(&'a [u8]),
}

impl<'a> Segment<'a> {
    /// Returns the bytes of the segment.
    #[must_use]
    pub const fn as_bytes(&self) -> &'a [u8] {
        match *self {
            Self::Line(bytes) | Self::Partial(bytes) => bytes,
        }
    }

    /// Returns `true` when the segment ends in a newline.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Line(_))
    }
}

/// Splits a byte slice into newline-terminated lines followed by at most one
/// trailing partial line.
///
/// Unlike [`slice::split`], the newline stays attached to its line and an
/// empty input yields nothing.
///
/// ```
/// use linebatch::{LineSegments, Segment};
///
/// let segments: Vec<_> = LineSegments::new(b"a\n\nbc").collect();
/// assert_eq!(
///     segments,
///     [Segment::Line(b"a\n"), Segment::Line(b"\n"), Segment::Partial(b"bc")]
/// );
/// ```
#[derive(Clone, Debug)]
pub struct LineSegments<'a> {
    remaining: &'a [u8],
}

impl<'a> LineSegments<'a> {
    /// Creates an iterator over the segments of `bytes`.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { remaining: bytes }
    }

    /// Returns the input not yet yielded.
    #[must_use]
    pub const fn remainder(&self) -> &'a [u8] {
        self.remaining
    }
}

impl<'a> Iterator for LineSegments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }

        match memchr(NEWLINE, self.remaining) {
            Some(index) => {
                let (line, rest) = self.remaining.split_at(index + 1);
                self.remaining = rest;
                Some(Segment::Line(line))
            }
            None => {
                let partial = self.remaining;
                self.remaining = &[];
                Some(Segment::Partial(partial))
            }
        }
    }
}

impl FusedIterator for LineSegments<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn last_newline_handles_edges() {
        assert_eq!(last_newline(b""), None);
        assert_eq!(last_newline(b"\n"), Some(1));
        assert_eq!(last_newline(b"\nabc"), Some(1));
        assert_eq!(last_newline(b"abc\n"), Some(4));
    }

    #[test]
    fn carriage_returns_are_not_boundaries() {
        assert_eq!(last_newline(b"a\rb\r"), None);
        let segments: Vec<_> = LineSegments::new(b"a\r\nb\r").collect();
        assert_eq!(
            segments,
            [Segment::Line(b"a\r\n"), Segment::Partial(b"b\r")]
        );
    }

    #[test]
    fn segments_of_empty_input_are_empty() {
        assert_eq!(LineSegments::new(b"").next(), None);
    }

    #[test]
    fn segments_without_trailing_partial() {
        let mut segments = LineSegments::new(b"x\ny\n");
        assert_eq!(segments.next(), Some(Segment::Line(b"x\n")));
        assert_eq!(segments.remainder(), b"y\n");
        assert_eq!(segments.next(), Some(Segment::Line(b"y\n")));
        assert_eq!(segments.next(), None);
        assert_eq!(segments.next(), None);
    }

    #[test]
    fn segment_accessors() {
        assert!(Segment::Line(b"a\n").is_complete());
        assert!(!Segment::Partial(b"a").is_complete());
        assert_eq!(Segment::Partial(b"a").as_bytes(), b"a");
    }

    proptest! {
        #[test]
        fn segments_concatenate_to_input(input in proptest::collection::vec(prop_oneof![Just(b'\n'), any::<u8>()], 0..256)) {
            let segments: Vec<_> = LineSegments::new(&input).collect();
            let joined: Vec<u8> = segments.iter().flat_map(|s| s.as_bytes().iter().copied()).collect();
            prop_assert_eq!(&joined, &input);

            let lines = segments.iter().filter(|s| s.is_complete()).count();
            let newlines = input.iter().filter(|&&b| b == NEWLINE).count();
            prop_assert_eq!(lines, newlines);

            for (index, segment) in segments.iter().enumerate() {
                if !segment.is_complete() {
                    prop_assert_eq!(index, segments.len() - 1);
                }
            }
        }
    }
}
