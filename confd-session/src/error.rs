//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::fmt;

/// Errors a Session request can fail with (spec §4.I, §7).
#[derive(Debug)]
pub enum Error {
    View(confd_view::Error),
    EditConfig(confd_editconfig::Error),
    Commit(confd_commit::Error),
    /// `Lock` when `lock_pid` is already held by a different pid, or by
    /// the same pid re-locking (spec §4.I).
    AlreadyLocked(i64),
    /// `Unlock` called by a pid other than the current holder.
    NotLockHolder,
    /// A request arrived after `Kill` closed the term channel (spec §5
    /// "Cancellation").
    Terminated,
    /// A mutating request arrived while a `Commit`/`Validate` was already
    /// in flight on this session (spec §4.I "only services requests
    /// marked safe").
    Busy,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::View(e) => write!(f, "{e}"),
            Error::EditConfig(e) => write!(f, "{e}"),
            Error::Commit(e) => write!(f, "{e}"),
            Error::AlreadyLocked(holder) => write!(f, "candidate is locked by {holder}"),
            Error::NotLockHolder => write!(f, "unlock attempted by a pid that does not hold the lock"),
            Error::Terminated => write!(f, "session terminated"),
            Error::Busy => write!(f, "a commit or validate is already in progress on this session"),
        }
    }
}

impl std::error::Error for Error {}

impl From<confd_view::Error> for Error {
    fn from(e: confd_view::Error) -> Self {
        Error::View(e)
    }
}

impl From<confd_editconfig::Error> for Error {
    fn from(e: confd_editconfig::Error) -> Self {
        Error::EditConfig(e)
    }
}

impl From<confd_commit::Error> for Error {
    fn from(e: confd_commit::Error) -> Self {
        Error::Commit(e)
    }
}
