//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use confd_utils::Path;

/// Errors raised by the Union View (spec §4.C, §7).
#[derive(Debug)]
pub enum Error {
    Schema(confd_schema::Error),
    Tree(confd_tree::Error),
    /// The authorizer denied a create/update/delete (spec §7
    /// `AccessDenied`). Denied *reads* aren't an error — the node just
    /// appears absent (spec §4.C).
    AccessDenied(Path),
    /// JSON/Internal marshalling failed (spec §6).
    Json(serde_json::Error),
    /// XML marshalling failed (spec §6).
    Xml(xml::writer::Error),
    /// An XML writer produced non-UTF-8 bytes; unreachable in practice
    /// since `xml-rs` only ever writes UTF-8.
    Utf8(std::string::FromUtf8Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Schema(e) => write!(f, "{e}"),
            Error::Tree(e) => write!(f, "{e}"),
            Error::AccessDenied(path) => write!(f, "access denied: {path}"),
            Error::Json(e) => write!(f, "{e}"),
            Error::Xml(e) => write!(f, "{e}"),
            Error::Utf8(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<confd_schema::Error> for Error {
    fn from(e: confd_schema::Error) -> Self {
        Error::Schema(e)
    }
}

impl From<confd_tree::Error> for Error {
    fn from(e: confd_tree::Error) -> Self {
        Error::Tree(e)
    }
}
