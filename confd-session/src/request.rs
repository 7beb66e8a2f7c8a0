//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

//! The Session's request enum (spec §4.I, §6 "Tree operation API").

use confd_commit::{CommitOutcome, Transaction};
use confd_editconfig::{DefaultOperation, EditConfigOutcome, ErrorOption, TestOption};
use confd_utils::{Context, Path, Responder};
use confd_view::DiffStatus;

use crate::error::Error;

/// One request on a Session's channel. Every tree-shaped request carries
/// the `Context` it's authorized against; lock/session-bookkeeping
/// requests don't touch the tree and carry none.
///
/// `is_safe` classifies the read-only subset that may still be served
/// while a `Commit`/`Validate` is in flight (spec §4.I, §5).
pub enum Request {
    Get { ctx: Context, path: Path, include_defaults: bool, responder: Responder<Result<Option<String>, Error>> },
    Set { ctx: Context, path: Path, value: Option<String>, responder: Responder<Result<(), Error>> },
    Delete { ctx: Context, path: Path, responder: Responder<Result<(), Error>> },
    Exists { ctx: Context, path: Path, include_defaults: bool, responder: Responder<Result<bool, Error>> },
    GetType { ctx: Context, path: Path, responder: Responder<Result<Option<String>, Error>> },
    GetStatus { ctx: Context, path: Path, responder: Responder<Result<DiffStatus, Error>> },
    IsDefault { ctx: Context, path: Path, responder: Responder<Result<bool, Error>> },
    GetTree { ctx: Context, path: Path, responder: Responder<Result<String, Error>> },
    GetFullTree { ctx: Context, path: Path, responder: Responder<Result<String, Error>> },
    Show { ctx: Context, path: Path, force_show: bool, responder: Responder<Result<String, Error>> },

    Validate { ctx: Context, responder: Responder<CommitOutcome> },
    Commit { ctx: Context, message: String, responder: Responder<Result<CommitOutcome, Error>> },

    /// Journal read-side (spec §4.H step 7, §1 "a commit journal entry").
    ListTransactions { responder: Responder<Vec<Transaction>> },
    GetTransaction { id: u32, responder: Responder<Option<Transaction>> },

    Lock { pid: i64, responder: Responder<Result<(), Error>> },
    Unlock { pid: i64, responder: Responder<Result<(), Error>> },
    Locked { responder: Responder<i64> },

    /// Sets the commit comment used for the next `Commit` when `text` is
    /// `Some`; always replies with the comment in force afterward.
    Comment { text: Option<String>, responder: Responder<Option<String>> },
    Changed { responder: Responder<bool> },
    Saved { responder: Responder<bool> },
    MarkSaved { responder: Responder<()> },
    Discard { responder: Responder<()> },

    /// Replaces the candidate wholesale with the given NETCONF-style XML
    /// (spec §4.I "load"): equivalent to discarding the candidate, then
    /// merging `xml` into it.
    Load { ctx: Context, xml: String, responder: Responder<Result<EditConfigOutcome, Error>> },
    /// Merges `xml` into the existing candidate (spec §4.I "merge").
    Merge { ctx: Context, xml: String, responder: Responder<Result<EditConfigOutcome, Error>> },
    EditConfig {
        ctx: Context,
        xml: String,
        default_operation: DefaultOperation,
        test_option: TestOption,
        error_option: ErrorOption,
        responder: Responder<Result<EditConfigOutcome, Error>>,
    },

    GetHelp { path: Option<Path>, responder: Responder<String> },
}

impl Request {
    /// Whether this request may be serviced while a `Commit`/`Validate`
    /// is in flight (spec §4.I "only services requests marked safe (any
    /// non-mutating read)").
    pub fn is_safe(&self) -> bool {
        matches!(
            self,
            Request::Get { .. }
                | Request::Exists { .. }
                | Request::GetType { .. }
                | Request::GetStatus { .. }
                | Request::IsDefault { .. }
                | Request::GetTree { .. }
                | Request::GetFullTree { .. }
                | Request::Show { .. }
                | Request::Locked { .. }
                | Request::Changed { .. }
                | Request::Saved { .. }
                | Request::GetHelp { .. }
        )
    }
}
