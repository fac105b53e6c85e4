// XML namespace resolution
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

//! Resolution of qualified names into namespace URIs.
//!
//! A [`NamespaceContext`] is built once from the attributes of the root
//!   element of a document
//!     (see [`NamespaceContext::declare`] and
//!       [`NamespaceContext::add_ignorable`]).
//! After the root element has been processed the alias map is fixed;
//!   `xmlns` declarations anywhere else are rejected by the front end.
//!
//! Resolution of a name happens in two steps:
//!
//!   1. The prefix is looked up in the alias map,
//!        yielding the namespace as declared in the document,
//!        which is what determines whether the name is ignorable; and
//!   2. The declared namespace is passed through the compatibility map,
//!        yielding the namespace handed to the type system.

use crate::global::{MARKUP_COMPAT_NS, XML_NS};
use fxhash::{FxHashMap, FxHashSet};
use memchr::memchr;
use std::{error::Error, fmt::Display};

/// Namespace compatibility mapping from a source namespace to its
///   replacement.
pub type CompatMap = FxHashMap<String, String>;

/// A qualified name split into its parts and resolved to a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    /// Namespace after compatibility remapping.
    pub uri: String,

    /// Prefix as written in the source,
    ///   empty for unprefixed names.
    pub prefix: String,

    /// Local part of the name,
    ///   which may still contain a `Type.` qualifier.
    pub local: String,

    /// Whether the namespace as declared is ignorable.
    pub ignorable: bool,
}

/// Per-document namespace state.
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceContext {
    aliases: FxHashMap<String, String>,
    ignorable: FxHashSet<String>,
    compat: CompatMap,
}

impl Default for NamespaceContext {
    fn default() -> Self {
        Self::new(CompatMap::default())
    }
}

impl NamespaceContext {
    /// New context with an empty alias map and the markup-compatibility
    ///   namespace as the only ignorable namespace.
    pub fn new(compat: CompatMap) -> Self {
        let mut ignorable = FxHashSet::default();
        ignorable.insert(MARKUP_COMPAT_NS.to_string());

        Self {
            aliases: FxHashMap::default(),
            ignorable,
            compat,
        }
    }

    /// Register `prefix` as an alias of `uri`.
    ///
    /// The empty prefix denotes the default namespace.
    /// Redeclaring a prefix replaces its previous value.
    pub fn declare<P: Into<String>, U: Into<String>>(
        &mut self,
        prefix: P,
        uri: U,
    ) {
        self.aliases.insert(prefix.into(), uri.into());
    }

    /// Process the value of an `mc:Ignorable` attribute,
    ///   marking the namespace of each space-separated prefix as ignorable.
    pub fn add_ignorable(&mut self, prefixes: &str) -> Result<(), XmlnsError> {
        for prefix in prefixes.split(' ').filter(|p| !p.is_empty()) {
            let uri = self
                .aliases
                .get(prefix)
                .ok_or_else(|| XmlnsError::UnknownPrefix(prefix.to_string()))?;

            self.ignorable.insert(uri.clone());
        }

        Ok(())
    }

    /// Declared aliases,
    ///   keyed by prefix.
    pub fn aliases(&self) -> &FxHashMap<String, String> {
        &self.aliases
    }

    /// The default namespace,
    ///   if one was declared,
    ///   after compatibility remapping.
    pub fn default_namespace(&self) -> Option<&str> {
        self.aliases.get("").map(|uri| self.remap(uri))
    }

    pub fn is_ignorable(&self, uri: &str) -> bool {
        self.ignorable.contains(uri)
    }

    /// Apply the compatibility map to a declared namespace.
    pub fn remap<'a>(&'a self, uri: &'a str) -> &'a str {
        self.compat.get(uri).map(String::as_str).unwrap_or(uri)
    }

    /// Resolve an explicit or empty prefix to its namespace,
    ///   after compatibility remapping.
    ///
    /// The reserved `xml` prefix is always bound.
    /// Unprefixed names without a default namespace resolve to the empty
    ///   namespace.
    pub fn resolve_prefix(&self, prefix: &str) -> Result<&str, XmlnsError> {
        self.lookup(prefix).map(|uri| self.remap(uri))
    }

    fn lookup(&self, prefix: &str) -> Result<&str, XmlnsError> {
        match (prefix, self.aliases.get(prefix)) {
            (_, Some(uri)) => Ok(uri),
            ("xml", None) => Ok(XML_NS),
            ("", None) => Ok(""),
            (_, None) => Err(XmlnsError::UnknownPrefix(prefix.to_string())),
        }
    }

    /// Resolve a qualified name `[prefix:]local`.
    ///
    /// An empty explicit prefix (`:Foo`) or a prefix that was never
    ///   declared is an error.
    pub fn resolve(&self, qname: &str) -> Result<ResolvedName, XmlnsError> {
        let (prefix, local) = split_qname(qname)?;
        let declared = self.lookup(prefix)?;

        Ok(ResolvedName {
            uri: self.remap(declared).to_string(),
            prefix: prefix.to_string(),
            local: local.to_string(),
            ignorable: self.is_ignorable(declared),
        })
    }
}

/// Split a qualified name into its prefix and local part.
///
/// Names without a colon have an empty prefix.
pub fn split_qname(qname: &str) -> Result<(&str, &str), XmlnsError> {
    match memchr(b':', qname.as_bytes()) {
        None if qname.is_empty() => Err(XmlnsError::InvalidName(qname.into())),
        None => Ok(("", qname)),
        Some(0) => Err(XmlnsError::EmptyPrefix(qname.into())),
        Some(pos) if pos + 1 == qname.len() => {
            Err(XmlnsError::InvalidName(qname.into()))
        }
        Some(pos) => Ok((&qname[..pos], &qname[pos + 1..])),
    }
}

/// Namespace resolution failure.
///
/// These errors carry no span;
///   callers attach the span of the name being resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlnsError {
    /// A prefix was used that was never declared on the root element.
    UnknownPrefix(String),

    /// A qualified name has a colon but nothing before it.
    EmptyPrefix(String),

    /// A qualified name is empty or has an empty local part.
    InvalidName(String),
}

impl Display for XmlnsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownPrefix(prefix) => {
                write!(f, "namespace prefix `{prefix}` is not declared")
            }
            Self::EmptyPrefix(qname) => {
                write!(f, "empty namespace prefix in `{qname}`")
            }
            Self::InvalidName(qname) => {
                write!(f, "invalid qualified name `{qname}`")
            }
        }
    }
}

impl Error for XmlnsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}
