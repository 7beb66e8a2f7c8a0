//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use crate::{Context, Path, PathAttrs};

/// Kind of tree operation being authorized, used both to call the right
/// [`Authorizer`] method and to build the accounting command tuple
/// (spec §4.I, §4.J, §8 "Authorization" invariant).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AuthzOp {
    Read,
    Create,
    Update,
    Delete,
}

impl AuthzOp {
    /// The verb used in the `[set, a, b, c, ...]` / `[delete, a, b, c, ...]`
    /// accounting command tuple (spec §4.J).
    pub fn command_verb(&self) -> &'static str {
        match self {
            AuthzOp::Read => "show",
            AuthzOp::Create | AuthzOp::Update => "set",
            AuthzOp::Delete => "delete",
        }
    }
}

/// Capability interface with four authorization methods plus a
/// `read_secrets` capability check, as described in spec §9 design notes.
///
/// A `configd-internal` [`Context`] bypasses this interface entirely (see
/// [`crate::Context::is_internal`]); callers must check that first.
pub trait Authorizer: Send + Sync {
    fn read(&self, ctx: &Context, path: &Path, attrs: &PathAttrs) -> bool;
    fn create(&self, ctx: &Context, path: &Path, attrs: &PathAttrs) -> bool;
    fn update(&self, ctx: &Context, path: &Path, attrs: &PathAttrs) -> bool;
    fn delete(&self, ctx: &Context, path: &Path, attrs: &PathAttrs) -> bool;

    /// Whether `ctx` may see the plaintext value of secret-marked leaves.
    fn read_secrets(&self, ctx: &Context) -> bool;

    fn authorize(
        &self,
        ctx: &Context,
        op: AuthzOp,
        path: &Path,
        attrs: &PathAttrs,
    ) -> bool {
        match op {
            AuthzOp::Read => self.read(ctx, path, attrs),
            AuthzOp::Create => self.create(ctx, path, attrs),
            AuthzOp::Update => self.update(ctx, path, attrs),
            AuthzOp::Delete => self.delete(ctx, path, attrs),
        }
    }
}

/// Bootstrap authorizer used by tests and by deployments that delegate all
/// decisions to an upstream system (spec §9: "bootstrap has an 'allow all'
/// authorizer for tests").
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAllAuthorizer;

impl Authorizer for AllowAllAuthorizer {
    fn read(&self, _ctx: &Context, _path: &Path, _attrs: &PathAttrs) -> bool {
        true
    }

    fn create(&self, _ctx: &Context, _path: &Path, _attrs: &PathAttrs) -> bool {
        true
    }

    fn update(&self, _ctx: &Context, _path: &Path, _attrs: &PathAttrs) -> bool {
        true
    }

    fn delete(&self, _ctx: &Context, _path: &Path, _attrs: &PathAttrs) -> bool {
        true
    }

    fn read_secrets(&self, _ctx: &Context) -> bool {
        true
    }
}
