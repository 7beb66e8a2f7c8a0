//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod error;
pub mod node;
pub mod tree;

pub use error::Error;
pub use node::{Container, Node};
pub use tree::Tree;
