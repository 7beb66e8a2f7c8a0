//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

//! The Commit Mgr (spec §4.H): validates a session's candidate against the
//! shared running configuration, runs the Action Runner over the ordered
//! change set, and atomically promotes the result, journaling every
//! successful commit.

pub mod commit;
pub mod error;
pub mod journal;

pub use commit::{CommitMgr, CommitOutcome};
pub use error::Error;
pub use journal::{Journal, Transaction};
