// Tracing for the transformation pipeline
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

//! Tracing for transformation passes.
//!
//! This provides human-readable traces on standard error after each pass
//!   has been applied to the tree.
//! These traces are provided automatically when `cfg(test)`,
//!   which means that they are automatically included in the output of any
//!   test failure.
//!
//! Outside of tests,
//!   this can be enabled at build time using the `pipeline-trace-stderr`
//!   feature flag.
//!
//! _These traces are not meant to be machine-readable!_
//! Do not try to parse them since the format is subject to change without
//!   notice.

use super::TransformError;

pub trait PassTrace: Default {
    /// Output a trace for a pass that has been applied to the entire
    ///   tree.
    ///
    /// `suppressed` contains only those diagnostics that were suppressed
    ///   by this pass.
    ///
    /// There is no means to return an error and a failure to output the
    ///   trace should not interrupt processing.
    fn trace_pass(
        &mut self,
        name: &str,
        nodes_before: usize,
        nodes_after: usize,
        suppressed: &[TransformError],
    );
}

/// Perform no tracing.
///
/// This should be used by default for non-test builds,
///   since counting nodes after every pass is not free.
#[derive(Debug, PartialEq, Default)]
pub struct VoidTrace;

impl PassTrace for VoidTrace {
    fn trace_pass(
        &mut self,
        _name: &str,
        _nodes_before: usize,
        _nodes_after: usize,
        _suppressed: &[TransformError],
    ) {
        // Do nothing at all.
    }
}

/// Human-readable [`PassTrace`].
///
/// See [module-level](super) documentation for more information.
#[derive(Debug, PartialEq, Default)]
pub struct HumanReadableTrace;

impl PassTrace for HumanReadableTrace {
    fn trace_pass(
        &mut self,
        name: &str,
        nodes_before: usize,
        nodes_after: usize,
        suppressed: &[TransformError],
    ) {
        eprint!(
            "\
[Transformer::run] pass `{name}`
| ==> nodes: {nodes_before} -> {nodes_after}\n",
        );

        for err in suppressed {
            eprint!(
                "\
|
| ==> suppressed: {err}.
|  |  {err:?}\n",
            );
        }

        #[allow(unused_variables)]
        let cfg = ""; // so that this compiles without matching cfg
        #[cfg(feature = "pipeline-trace-stderr")]
        #[allow(unused_variables)]
        let cfg = "feature = \"pipeline-trace-stderr\"";
        #[cfg(test)] // takes precedence if both are set
        let cfg = "test";
        eprint!(
            "= note: this trace was output as a debugging aid \
                because `cfg({cfg})`.\n\n",
        );
    }
}
