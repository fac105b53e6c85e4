// Diagnostic span resolver
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

//! Resolve [`Span`]s into line:column source locations.

use crate::span::Span;
use memchr::{memchr, memchr_iter, memrchr};
use std::{error::Error, fmt::Display, num::NonZeroU32};
use unicode_width::UnicodeWidthChar;

/// Resolves [`Span`]s into line:column source locations.
///
/// A [`Span`] holds only raw byte offsets gathered during parsing.
/// Those offsets are mapped back onto the source text only when a
///   diagnostic is rendered,
///     since line and column information is useless on the happy path.
pub trait SpanResolver {
    /// Resolve the provided [`Span`] into line:column source locations.
    fn resolve(
        &mut self,
        span: Span,
    ) -> Result<ResolvedSpan, SpanResolverError>;

    /// Name of the source being resolved against,
    ///   used as the heading context of a report.
    fn context(&self) -> &str;
}

/// A [`Span`] resolved to its source location.
///
/// Only the first line of a multi-line span is retained;
///   reports point at where a problem begins.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ResolvedSpan {
    span: Span,
    line_num: NonZeroU32,
    column: Column,
    line_span: Span,
    text: String,
}

impl ResolvedSpan {
    /// The original span whose resolution was requested.
    pub fn unresolved_span(&self) -> Span {
        self.span
    }

    /// 1-indexed line on which the span begins.
    pub fn line_num(&self) -> NonZeroU32 {
        self.line_num
    }

    /// Columns of the span relative to the start of its first line.
    pub fn col_num(&self) -> Column {
        self.column
    }

    /// Span covering the entire first line,
    ///   excluding its newline.
    pub fn first_line_span(&self) -> Span {
        self.line_span
    }

    /// Source text of the first line,
    ///   excluding its newline.
    pub fn line_text(&self) -> &str {
        &self.text
    }
}

/// Source column offsets.
///
/// A "column" is a terminal cell;
///   certain unicode characters occupy more than one cell,
///   while others occupy none.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Column {
    /// A range of 1-indexed columns, inclusive.
    Endpoints(NonZeroU32, NonZeroU32),

    /// Immediately before a column,
    ///   as with a zero-length [`Span`].
    Before(NonZeroU32),
}

impl Column {
    pub fn start(&self) -> NonZeroU32 {
        match self {
            Self::Endpoints(at, _) | Self::Before(at) => *at,
        }
    }

    /// Number of cells covered,
    ///   which is at least one so that a marker is always visible.
    pub fn width(&self) -> u32 {
        match self {
            Self::Endpoints(start, end) => end.get() - start.get() + 1,
            Self::Before(_) => 1,
        }
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Coerces to a single column number.
        Display::fmt(&self.start(), f)
    }
}

/// Resolve spans against an in-memory source document.
///
/// The compiler reads the whole document before parsing,
///   so the same buffer serves diagnostics without a second read.
pub struct SourceResolver<'a> {
    name: &'a str,
    src: &'a str,
}

impl<'a> SourceResolver<'a> {
    pub fn new(name: &'a str, src: &'a str) -> Self {
        Self { name, src }
    }

    /// Determine the 1-indexed column endpoints of `span` relative to the
    ///   line starting at `line_start`.
    ///
    /// Spans continuing past the end of the line are clamped to it.
    fn resolve_columns(line: &str, line_start: usize, span: Span) -> Column {
        let rel_start = (span.offset() as usize).saturating_sub(line_start);
        let rel_end = (span.end_offset() as usize).saturating_sub(line_start);

        let (start, end) = line.char_indices().fold(
            (1usize, 0usize),
            |(start, end), (i, c)| {
                let width = c.width().unwrap_or(0);
                (
                    if i < rel_start { start + width } else { start },
                    if i <= rel_end { end + width } else { end },
                )
            },
        );

        // We never want the diagnostic system to panic.
        let to_col = |n: usize| {
            NonZeroU32::new(n.try_into().unwrap_or(0))
                .unwrap_or(NonZeroU32::MIN)
        };

        let (col_start, col_end) = (to_col(start), to_col(end));

        if span.is_empty() {
            Column::Before(col_start)
        } else {
            Column::Endpoints(col_start, col_end.max(col_start))
        }
    }
}

impl<'a> SpanResolver for SourceResolver<'a> {
    fn resolve(
        &mut self,
        span: Span,
    ) -> Result<ResolvedSpan, SpanResolverError> {
        if span.is_unknown() {
            return Err(SpanResolverError::UnknownSpan);
        }

        let bytes = self.src.as_bytes();
        let offset = span.offset() as usize;

        if offset > bytes.len() {
            return Err(SpanResolverError::OutOfRange(bytes.len()));
        }

        let line_start = memrchr(b'\n', &bytes[..offset])
            .map(|i| i + 1)
            .unwrap_or(0);
        let line_end = memchr(b'\n', &bytes[offset..])
            .map(|i| offset + i)
            .unwrap_or(bytes.len());

        // Newlines are always char boundaries,
        //   so this can only fail for spans that begin mid-character on
        //   the first line.
        let text = self
            .src
            .get(line_start..line_end)
            .ok_or(SpanResolverError::OutOfRange(bytes.len()))?
            .trim_end_matches('\r');

        let line_count = memchr_iter(b'\n', &bytes[..line_start]).count() + 1;
        let line_num = NonZeroU32::new(line_count.try_into().unwrap_or(0))
            .unwrap_or(NonZeroU32::MIN);

        Ok(ResolvedSpan {
            span,
            line_num,
            column: Self::resolve_columns(text, line_start, span),
            line_span: Span::from_byte_interval((
                line_start,
                line_start + text.len(),
            )),
            text: text.to_string(),
        })
    }

    fn context(&self) -> &str {
        self.name
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SpanResolverError {
    /// The span does not correspond to any position in the source.
    ///
    /// This happens for nodes synthesized by the compiler when no ancestor
    ///   could provide a fallback position.
    UnknownSpan,

    /// The span begins beyond the end of the source,
    ///   whose length in bytes is provided.
    OutOfRange(usize),
}

impl Display for SpanResolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownSpan => {
                write!(f, "span does not refer to a source location")
            }
            Self::OutOfRange(len) => {
                write!(f, "span exceeds source size of {len} bytes")
            }
        }
    }
}

impl Error for SpanResolverError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}
