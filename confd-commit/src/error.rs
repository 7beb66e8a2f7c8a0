//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

/// Infrastructure failures of the Commit Mgr itself (spec §4.H). A rejected
/// commit (diff refusal, read-only refusal, validation errors, a failing
/// hook) is reported in the `{out, err, ok}` outcome instead; this type is
/// reserved for conditions commit can't recover from at all.
#[derive(Debug)]
pub enum Error {
    View(confd_view::Error),
    Journal(pickledb::error::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::View(e) => write!(f, "{e}"),
            Error::Journal(e) => write!(f, "journal: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<confd_view::Error> for Error {
    fn from(e: confd_view::Error) -> Self {
        Error::View(e)
    }
}

impl From<pickledb::error::Error> for Error {
    fn from(e: pickledb::error::Error) -> Self {
        Error::Journal(e)
    }
}
