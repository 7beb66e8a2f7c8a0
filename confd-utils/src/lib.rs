//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod authorizer;
pub mod context;
pub mod path;
pub mod task;

pub use authorizer::{AllowAllAuthorizer, AuthzOp, Authorizer};
pub use context::Context;
pub use path::{Path, PathAttr, PathAttrs};
pub use task::Task;

/// A one-shot reply channel, matching the teacher's `Responder<T>` used
/// throughout the northbound request/response API.
pub type Responder<T> = tokio::sync::oneshot::Sender<T>;
