// Compilation pipeline
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

//! Compilation of a document from source to instructions.
//!
//! A document is compiled in stages:
//!
//!   1. The source is [parsed](crate::frontend::parse) into its raw AST
//!        along with the namespaces declared by its root element;
//!   2. The [language types](LanguageTypeMappings) are looked up in the
//!        type system;
//!   3. The tree is rewritten by each
//!        [transformation pass](crate::transform) in turn;
//!   4. The transformed tree is [emitted](crate::emit) through a
//!        [`VerifyingEmitter`],
//!          which must find exactly one value left on the stack,
//!          being the root instance; and
//!   5. A `ret` is appended to return that instance.
//!
//! Each stage fails with its own error,
//!   all of which are widened into [`CompileError`].
//!
//! A [`Pipeline`] holds only the pass and emitter lists and may be shared
//!   between threads to compile any number of documents concurrently;
//!     each compilation owns all of its remaining state.

use crate::{
    ast::Node,
    diagnose::{AnnotatedSpan, Diagnostic},
    emit::{EmitError, Emitter},
    frontend::{parse, Document, SyntaxError},
    il::{
        verify::{VerifyError, VerifyingEmitter},
        IlError, InstructionBuffer, InstructionSink, OpCode, Operand,
    },
    transform::{Context, NameScope, TransformError, Transformer},
    ts::{mappings::MissingLanguageType, LanguageTypeMappings, TypeSystem},
    xmlns::CompatMap,
};
use std::{error::Error, fmt::Display};

/// Options of a compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Whether resolution errors are fatal.
    ///
    /// In lenient mode unresolvable nodes are omitted and their errors
    ///   are reported in [`CompiledDocument::diagnostics`].
    pub strict: bool,

    /// Namespaces to substitute for those declared by the document.
    pub compat: CompatMap,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strict: true,
            compat: CompatMap::default(),
        }
    }
}

/// Result of a successful compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledDocument {
    /// The transformed tree that was emitted.
    pub root: Node,

    /// Instructions constructing the root instance and returning it.
    pub instructions: InstructionBuffer,

    /// Names declared by `x:Name` in declaration order.
    pub names: Vec<String>,

    /// Resolution errors suppressed in lenient mode.
    pub diagnostics: Vec<TransformError>,
}

/// Transformation passes and emitters applied to each document.
#[derive(Default)]
pub struct Pipeline {
    transformer: Transformer,
    emitter: Emitter,
}

assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    pub fn new(transformer: Transformer, emitter: Emitter) -> Self {
        Self {
            transformer,
            emitter,
        }
    }

    pub fn transformer(&self) -> &Transformer {
        &self.transformer
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    /// Compile the document `src` against the types of `ts`.
    pub fn compile(
        &self,
        ts: &dyn TypeSystem,
        config: &Config,
        src: &str,
    ) -> Result<CompiledDocument, CompileError> {
        let Document { root, namespaces } = parse(src, config.compat.clone())?;
        let mappings = LanguageTypeMappings::resolve(ts)?;

        let mut ctx = Context::new(ts, &mappings, &namespaces, config.strict);
        let root = self.transformer.run(&mut ctx, root)?;

        let mut sink = VerifyingEmitter::new(ts, InstructionBuffer::new());
        self.emitter.emit(ts, &mappings, &mut sink, &root)?;

        // The root instance.
        sink.verify(1)?;

        let mut instructions = sink.into_inner();
        instructions.emit(OpCode::Ret, Operand::None)?;

        let names = ctx
            .item::<NameScope>()
            .map(|scope| scope.names().map(String::from).collect())
            .unwrap_or_default();

        Ok(CompiledDocument {
            root,
            instructions,
            names,
            diagnostics: ctx.take_suppressed(),
        })
    }
}

/// Failure of any stage of compilation.
#[derive(Debug, PartialEq)]
pub enum CompileError {
    Syntax(SyntaxError),
    MissingLanguageType(MissingLanguageType),
    Transform(TransformError),
    Emit(EmitError),
    Il(IlError),
    Verify(VerifyError),
}

impl From<SyntaxError> for CompileError {
    fn from(e: SyntaxError) -> Self {
        Self::Syntax(e)
    }
}

impl From<MissingLanguageType> for CompileError {
    fn from(e: MissingLanguageType) -> Self {
        Self::MissingLanguageType(e)
    }
}

impl From<TransformError> for CompileError {
    fn from(e: TransformError) -> Self {
        Self::Transform(e)
    }
}

impl From<EmitError> for CompileError {
    fn from(e: EmitError) -> Self {
        Self::Emit(e)
    }
}

impl From<IlError> for CompileError {
    fn from(e: IlError) -> Self {
        Self::Il(e)
    }
}

impl From<VerifyError> for CompileError {
    fn from(e: VerifyError) -> Self {
        Self::Verify(e)
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax(e) => Display::fmt(e, f),
            Self::MissingLanguageType(e) => Display::fmt(e, f),
            Self::Transform(e) => Display::fmt(e, f),
            Self::Emit(e) => Display::fmt(e, f),
            Self::Il(e) => Display::fmt(e, f),
            Self::Verify(e) => Display::fmt(e, f),
        }
    }
}

impl Error for CompileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Syntax(e) => Some(e),
            Self::MissingLanguageType(e) => Some(e),
            Self::Transform(e) => Some(e),
            Self::Emit(e) => Some(e),
            Self::Il(e) => Some(e),
            Self::Verify(e) => Some(e),
        }
    }
}

impl Diagnostic for CompileError {
    fn describe(&self) -> Vec<AnnotatedSpan> {
        match self {
            Self::Syntax(e) => e.describe(),
            Self::Transform(e) => e.describe(),
            Self::Emit(e) => e.describe(),
            Self::Il(e) => e.describe(),
            Self::Verify(e) => e.describe(),

            // Not associated with the document
            //   (rendered using only its `Display`).
            Self::MissingLanguageType(_) => vec![],
        }
    }
}
