//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod hook;
pub mod node;
pub mod schema;

#[cfg(any(test, feature = "testing"))]
pub mod fixtures;

pub use node::{Constraint, Hooks, LeafType, Node, NodeKind, Ordering};
pub use schema::{Error, Schema};
