// XAML compiler (XAMLC)
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

//! A compiler from XAML markup to stack-based instructions.
//!
//! A document is [parsed](frontend) into a raw [AST](ast) whose names
//!   are still XML names,
//!     [transformed](transform) against a [type system](ts) into
//!     construction,
//!       assignment,
//!       and collection manipulation nodes,
//!     and finally [emitted](emit) as [instructions](il) that construct
//!     the object graph and return its root.
//! See [`pipeline`] for the whole of it.

// We build docs for private items.
#![allow(rustdoc::private_intra_doc_links)]

pub mod global;

#[macro_use]
extern crate static_assertions;

pub mod ast;
pub mod diagnose;
pub mod emit;
pub mod frontend;
pub mod il;
pub mod pipeline;
pub mod span;
pub mod tpwrap;
pub mod transform;
pub mod ts;
pub mod xml;
pub mod xmlns;

#[cfg(test)]
pub mod test;
