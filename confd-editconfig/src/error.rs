//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::fmt;

/// Errors raised while parsing or applying an edit-config request (spec
/// §4.J, §7).
#[derive(Debug)]
pub enum Error {
    /// The payload was not well-formed XML.
    Xml(xml::reader::Error),
    /// An `xc:operation` attribute carried a value other than the five
    /// NETCONF operations.
    UnknownOperation(String),
    /// A tree mutation failed (access denied, node missing, schema
    /// mismatch, ...); carries the underlying view error's message since
    /// `confd_view::Error` does not implement `std::error::Error` itself.
    Apply(String),
    /// A top-level element's namespace did not resolve to any loaded
    /// module, and the schema requires one (spec §4.J "elements lacking a
    /// namespace ... is an error").
    UnresolvedNamespace(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Xml(e) => write!(f, "malformed edit-config payload: {e}"),
            Error::UnknownOperation(op) => write!(f, "unknown edit-config operation: {op}"),
            Error::Apply(msg) => write!(f, "{msg}"),
            Error::UnresolvedNamespace(name) => {
                write!(f, "element '{name}' has no namespace and none could be inferred")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<confd_view::Error> for Error {
    fn from(e: confd_view::Error) -> Self {
        Error::Apply(e.to_string())
    }
}
