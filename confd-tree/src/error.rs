//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use confd_utils::Path;

/// Config Tree failures (spec §4.B).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// A create-only operation (`create`, list-entry insertion) targeted
    /// a path that already exists.
    NodeExists(Path),
    /// A read or delete targeted a path that doesn't exist.
    NodeDoesntExist(Path),
    /// The path doesn't correspond to any schema node, or names a kind
    /// the operation can't apply to (e.g. setting a leaf value onto a
    /// container).
    UnknownElement(Path),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NodeExists(path) => write!(f, "node already exists: {path}"),
            Error::NodeDoesntExist(path) => write!(f, "node doesn't exist: {path}"),
            Error::UnknownElement(path) => write!(f, "unknown schema element: {path}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<confd_schema::Error> for Error {
    fn from(err: confd_schema::Error) -> Self {
        match err {
            confd_schema::Error::UnknownElement(path) => Error::UnknownElement(path),
        }
    }
}
