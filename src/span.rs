// Source spans
//
//  Copyright (C) 2014-2021 Ryan Specialty Group, LLC.
//
//  This file is part of XAMLC.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Mapping to source input byte intervals.
//!
//! A [`Span`] is a byte interval within the single markup document being
//!   compiled,
//!     representing where some AST node originated.
//! Spans underpin the [diagnostic system](crate::diagnose);
//!   they are resolved into line and column numbers only when a
//!   diagnostic is actually rendered.
//!
//! ```
//! use xamlc::span::Span;
//!
//! let span = Span::new(2, 6);
//! assert_eq!(2, span.offset());
//! assert_eq!(6, span.len());
//!
//! // From a half-open byte interval
//! let spani = Span::from_byte_interval((10, 25));
//! assert_eq!(10, spani.offset());
//! assert_eq!(15, spani.len());
//! ```
//!
//! Nodes synthesized by the transformation pipeline may not correspond to
//!   any source text;
//!     those carry [`UNKNOWN_SPAN`] and errors raised against them fall
//!     back to the span of the nearest ancestor whose position is known
//!       (see [`Span::or`]).

use crate::global;
use std::fmt::Display;

/// Size of a [`Span`]'s `offset` field.
pub type SpanOffsetSize = global::SourceFileSize;

/// Size of a [`Span`]'s `len` field.
pub type SpanLenSize = global::SpanLenSize;

/// A byte interval within the source document.
///
/// Spans are ordered first by offset and then by length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    offset: SpanOffsetSize,
    len: SpanLenSize,
}

assert_eq_size!(Span, u64);

/// A span whose position in the source is not known.
///
/// See [`Span::or`].
pub const UNKNOWN_SPAN: Span = Span {
    offset: SpanOffsetSize::MAX,
    len: 0,
};

impl Span {
    pub const fn new(offset: SpanOffsetSize, len: SpanLenSize) -> Self {
        Self { offset, len }
    }

    /// Create a span from a half-open byte interval `[start, end)`.
    ///
    /// Offsets that do not fit within a span saturate rather than panic;
    ///   an oversized document produces imprecise diagnostics,
    ///     not a crash.
    pub fn from_byte_interval((start, end): (usize, usize)) -> Self {
        let offset = start.try_into().unwrap_or(SpanOffsetSize::MAX - 1);
        let len = end
            .saturating_sub(start)
            .try_into()
            .unwrap_or(SpanLenSize::MAX);

        Self { offset, len }
    }

    pub const fn offset(&self) -> SpanOffsetSize {
        self.offset
    }

    pub const fn len(&self) -> SpanLenSize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset of the last byte of the span,
    ///   or the offset itself for zero-length spans.
    pub const fn end_offset(&self) -> SpanOffsetSize {
        self.offset.saturating_add(self.len.saturating_sub(1))
    }

    pub fn is_unknown(&self) -> bool {
        *self == UNKNOWN_SPAN
    }

    /// This span,
    ///   unless it is [`UNKNOWN_SPAN`],
    ///   in which case `fallback`.
    pub fn or(self, fallback: Span) -> Span {
        if self.is_unknown() {
            fallback
        } else {
            self
        }
    }

    /// A span beginning `n` bytes into this one.
    ///
    /// Used to point into attribute values and text without re-scanning
    ///   the document.
    pub fn subspan(self, at: usize, len: usize) -> Span {
        if self.is_unknown() {
            return self;
        }

        Span::from_byte_interval((
            self.offset as usize + at,
            self.offset as usize + at + len,
        ))
    }

    /// Smallest span enclosing both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        match (self.is_unknown(), other.is_unknown()) {
            (true, _) => other,
            (_, true) => self,
            _ => {
                let start = self.offset.min(other.offset);
                let end = (self.offset as usize + self.len as usize)
                    .max(other.offset as usize + other.len as usize);

                Span::from_byte_interval((start as usize, end))
            }
        }
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_unknown() {
            write!(f, "[unknown span]")
        } else {
            write!(f, "[{}, {}]", self.offset, self.end_offset())
        }
    }
}
