//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use confd_utils::Path;

use crate::plan::HookKind;

/// Action Runner failures (spec §4.G, §7 `OperationFailed`).
#[derive(Debug)]
pub enum Error {
    /// A hook process couldn't even be spawned.
    Io(std::io::Error),
    /// A hook ran but exited non-zero, failing the commit (spec §4.G
    /// "Failure of a create/delete/update hook fails the commit").
    HookFailed {
        path: Path,
        kind: HookKind,
        command: String,
        status: Option<i32>,
        stderr: String,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "{e}"),
            Error::HookFailed { path, kind, command, status, stderr } => {
                write!(
                    f,
                    "{path}: {kind} hook \"{command}\" failed (status {status:?}): {stderr}"
                )
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
