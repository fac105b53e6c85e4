// Global constants across the entirety of XAMLC
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

//! System-wide static configuration.
//!
//! This module provides a system-wide configuration.
//! Subsystems should reference these values rather than defining their own
//!   and risk incompatibilities or maintenance issues as requirements
//!   change.
//!
//! By convention,
//!   import this entire module rather than individual members and reference
//!   them as `global::foo` to emphasize their nature and risk.

/// A size capable of representing any byte offset within a single source
///   document.
///
/// Markup documents are expected to be well below 4GiB.
pub type SourceFileSize = u32;

/// A size capable of representing the byte length of any single span.
pub type SpanLenSize = u32;

/// A size capable of indexing every type,
///   method,
///   and property known to a type system.
pub type TsHandleSize = u32;

/// Signed operand stack depth tracked during instruction verification.
///
/// Depth is signed so that an unbalanced stream that pops more than it
///   pushes can be reported as a negative balance rather than wrapping.
pub type StackDepth = i32;

/// The XAML 2006 language namespace.
///
/// Directives and intrinsics (`x:Name`, `x:Null`, …) live here.
pub const XAML2006_NS: &str = "http://schemas.microsoft.com/winfx/2006/xaml";

/// The markup-compatibility namespace.
///
/// This namespace is always ignorable.
pub const MARKUP_COMPAT_NS: &str =
    "http://schemas.openxmlformats.org/markup-compatibility/2006";

/// Namespace implicitly bound to the reserved `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// URI prefix mapping an XML namespace directly onto a type-system
///   namespace.
pub const CLR_NAMESPACE_PREFIX: &str = "clr-namespace:";
