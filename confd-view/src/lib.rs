//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

//! The Union View (spec §4.C): the read/write facade over candidate and
//! running that every external interface goes through, plus the Diff
//! Engine (§4.D) and the canonical Show/marshal renderers (§6).

pub mod diff;
pub mod error;
pub mod marshal;
pub mod show;
pub mod view;

pub use diff::{diff, Diff, DiffStatus};
pub use error::Error;
pub use marshal::{marshal, Encoding};
pub use show::show;
pub use view::UnionView;
