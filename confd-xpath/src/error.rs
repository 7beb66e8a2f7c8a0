//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

/// Failures raised while parsing or evaluating an XPath-subset expression
/// (spec §4.E).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    UnexpectedEnd,
    UnexpectedToken(String),
    UnknownFunction(String),
    WrongArgCount(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnexpectedEnd => write!(f, "unexpected end of expression"),
            Error::UnexpectedToken(t) => write!(f, "unexpected token: {t}"),
            Error::UnknownFunction(name) => write!(f, "unknown function: {name}()"),
            Error::WrongArgCount(name) => write!(f, "wrong argument count for {name}()"),
        }
    }
}

impl std::error::Error for Error {}
