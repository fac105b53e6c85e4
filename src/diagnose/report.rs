// Diagnostic system rendering
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

//! Rendering of diagnostic information.

// NB: `write!` together with `\n` is preferred to `writeln!` so that there
//   is only a single sequence of characters to search for while tracking
//   down newlines.

use super::{
    resolver::{Column, ResolvedSpan, SpanResolver, SpanResolverError},
    AnnotatedSpan, Diagnostic, Label, Level,
};
use crate::span::Span;
use std::{
    fmt::{self, Display},
    num::NonZeroU32,
};

pub trait Reporter {
    /// Render diagnostic report.
    ///
    /// The provided [`Report`] implements [`Display`].
    /// Render it to a [`String`] before writing it out so that reports of
    ///   concurrent compiler processes do not interleave.
    ///
    /// This never fails.
    /// Errors encountered while resolving spans are rendered into the
    ///   report itself so that they never mask the diagnostic that was
    ///   actually requested.
    fn render<'d, D: Diagnostic>(&mut self, diagnostic: &'d D)
        -> Report<'d, D>;
}

/// Render diagnostic report in a highly visual way,
///   modeled after Rust's own error reporting:
///     each annotated span is shown with the line of source it occurs on
///     and a marker underlining it.
pub struct VisualReporter<R: SpanResolver> {
    resolver: R,
}

impl<R: SpanResolver> VisualReporter<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }
}

impl<R: SpanResolver> Reporter for VisualReporter<R> {
    fn render<'d, D: Diagnostic>(
        &mut self,
        diagnostic: &'d D,
    ) -> Report<'d, D> {
        let ctx = self.resolver.context().to_string();

        let secs = diagnostic
            .describe()
            .into_iter()
            .map(|AnnotatedSpan(span, level, olabel)| {
                let slabel = olabel.map(|label| SpanLabel(level, label));

                let mspan = match self.resolver.resolve(span) {
                    Ok(rspan) => MaybeResolvedSpan::Resolved(rspan, slabel),
                    Err(e) => MaybeResolvedSpan::Unresolved(span, slabel, e),
                };

                Section::new(ctx.clone(), level, mspan)
            })
            .collect::<Vec<_>>();

        let mut report = Report::empty(diagnostic);
        report.extend(secs);
        report
    }
}

#[derive(Debug)]
pub struct Report<'d, D: Diagnostic> {
    msg: &'d D,
    secs: Vec<Section<'d>>,
    level: Level,
}

impl<'d, D: Diagnostic> Report<'d, D> {
    fn empty(msg: &'d D) -> Self {
        Self {
            msg,
            secs: Vec::new(),
            level: Level::default(),
        }
    }

    /// Most severe level of any section in the report.
    pub fn level(&self) -> Level {
        self.level
    }
}

impl<'d, D: Diagnostic> Extend<Section<'d>> for Report<'d, D> {
    fn extend<T: IntoIterator<Item = Section<'d>>>(&mut self, secs: T) {
        for sec in secs {
            self.level = self.level.min(sec.level);

            // Add the section if it cannot be squashed into the previous.
            let remain = sec.maybe_squash_into(self.secs.last_mut());
            self.secs.extend(remain);
        }
    }
}

impl<'d, D: Diagnostic> Display for Report<'d, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{level}: {msg}\n", level = self.level, msg = self.msg)?;
        self.secs.iter().try_for_each(|sec| sec.fmt(f))
    }
}

/// A section of a [`Report`] describing a single [`Span`].
///
/// Adjacent sections describing the same [`Span`] are squashed
///   (see [`Section::maybe_squash_into`]),
///   but non-adjacent ones are not,
///     since a report may intentionally revisit an earlier span.
#[derive(Debug, PartialEq, Eq)]
struct Section<'d> {
    heading: SpanHeading,
    snippet: Option<Snippet>,
    labels: Vec<SpanLabel<'d>>,
    level: Level,
    span: Span,
}

impl<'d> Section<'d> {
    fn new(ctx: String, level: Level, mspan: MaybeResolvedSpan<'d>) -> Self {
        let heading = SpanHeading(ctx, HeadingLineNum::from(&mspan));
        let mut labels = mspan.system_labels();

        let (span, snippet, olabel) = match mspan {
            MaybeResolvedSpan::Resolved(rspan, olabel) => (
                rspan.unresolved_span(),
                Some(Snippet::from(rspan)),
                olabel,
            ),
            MaybeResolvedSpan::Unresolved(span, olabel, _) => {
                (span, None, olabel)
            }
        };

        labels.extend(olabel);

        Section {
            heading,
            snippet,
            labels,
            level,
            span,
        }
    }

    /// Squash self into the provided [`Section`] if they represent the same
    ///   [`Span`],
    ///     otherwise do nothing.
    ///
    /// If squashed,
    ///   [`None`] is returned.
    /// Otherwise [`Some`] is returned with `self` so that the return value
    ///   can be used with [`Extend`].
    fn maybe_squash_into(
        self,
        extend: Option<&mut Section<'d>>,
    ) -> Option<Self> {
        match extend {
            Some(extend_sec) if self.span == extend_sec.span => {
                extend_sec.level = extend_sec.level.min(self.level);
                extend_sec.labels.extend(self.labels);
                None
            }

            _ => Some(self),
        }
    }

    /// Width of the line number gutter.
    fn gutter(&self) -> usize {
        self.snippet
            .as_ref()
            .map(|snip| snip.line_num.to_string().len())
            .unwrap_or(1)
    }
}

impl<'d> Display for Section<'d> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pad = " ".repeat(self.gutter());

        write!(f, "{pad}--> {heading}\n", heading = self.heading)?;

        if let Some(snip) = &self.snippet {
            write!(f, "{pad} |\n")?;
            let (num, text) = (snip.line_num, &snip.text);
            write!(f, "{num} | {text}\n")?;
            write!(
                f,
                "{pad} | {indent}{marker}\n",
                indent = " ".repeat(snip.column.start().get() as usize - 1),
                marker = "^".repeat(snip.column.width() as usize),
            )?;
        }

        for label in self.labels.iter() {
            write!(f, "{pad} = {label}\n")?;
        }

        Ok(())
    }
}

/// A [`Span`] that may have been resolved.
///
/// The span remains unresolved if an error occurred,
///   in which case the error is retained so that it can be reported
///   alongside the diagnostic rather than in place of it.
#[derive(Debug, PartialEq, Eq)]
enum MaybeResolvedSpan<'d> {
    Resolved(ResolvedSpan, Option<SpanLabel<'d>>),
    Unresolved(Span, Option<SpanLabel<'d>>, SpanResolverError),
}

impl<'d> MaybeResolvedSpan<'d> {
    fn system_labels(&self) -> Vec<SpanLabel<'static>> {
        match self {
            // Synthesized nodes legitimately have no location.
            Self::Unresolved(_, _, SpanResolverError::UnknownSpan) => vec![],

            Self::Unresolved(_, _, e) => {
                vec![SpanLabel(
                    Level::Help,
                    format!(
                        "an error occurred while trying to look up \
                         information about this span: {e}"
                    )
                    .into(),
                )]
            }

            Self::Resolved(..) => vec![],
        }
    }
}

/// Heading describing the context of a (hopefully resolved) span.
#[derive(Debug, PartialEq, Eq)]
struct SpanHeading(String, HeadingLineNum);

impl Display for SpanHeading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(ctx, line) = self;
        write!(f, "{ctx}{line}")
    }
}

/// Span line number or fallback representation.
///
/// If a span could not be resolved,
///   offsets are rendered in place of lines and columns.
#[derive(Debug, PartialEq, Eq)]
enum HeadingLineNum {
    Resolved(NonZeroU32, Column),
    Unresolved(Span),
    Unknown,
}

impl<'s, 'd> From<&'s MaybeResolvedSpan<'d>> for HeadingLineNum {
    fn from(mspan: &'s MaybeResolvedSpan<'d>) -> Self {
        match mspan {
            MaybeResolvedSpan::Resolved(rspan, _) => {
                Self::Resolved(rspan.line_num(), rspan.col_num())
            }
            MaybeResolvedSpan::Unresolved(
                _,
                _,
                SpanResolverError::UnknownSpan,
            ) => Self::Unknown,
            MaybeResolvedSpan::Unresolved(span, _, _) => {
                Self::Unresolved(*span)
            }
        }
    }
}

impl Display for HeadingLineNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(line_num, col) => write!(f, ":{line_num}:{col}"),
            Self::Unresolved(span) => write!(
                f,
                " offset {}--{}",
                span.offset(),
                span.end_offset()
            ),
            Self::Unknown => write!(f, " (unknown location)"),
        }
    }
}

/// Source line shown beneath a section heading.
#[derive(Debug, PartialEq, Eq)]
struct Snippet {
    line_num: NonZeroU32,
    column: Column,
    text: String,
}

impl From<ResolvedSpan> for Snippet {
    fn from(rspan: ResolvedSpan) -> Self {
        Self {
            line_num: rspan.line_num(),
            column: rspan.col_num(),
            text: rspan.line_text().to_string(),
        }
    }
}

/// A label describing a span.
#[derive(Debug, PartialEq, Eq)]
struct SpanLabel<'d>(Level, Label<'d>);

impl<'d> Display for SpanLabel<'d> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(level, label) = self;
        write!(f, "{level}: {label}")
    }
}
