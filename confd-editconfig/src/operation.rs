//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

//! The four option enums edit-config is parameterized by (spec §4.J,
//! §6 "Edit-Config payload").

use crate::error::Error;

/// An explicit `xc:operation` attribute value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    Merge,
    Replace,
    Create,
    Delete,
    Remove,
}

impl Operation {
    pub fn parse(value: &str) -> Result<Self, Error> {
        match value {
            "merge" => Ok(Operation::Merge),
            "replace" => Ok(Operation::Replace),
            "create" => Ok(Operation::Create),
            "delete" => Ok(Operation::Delete),
            "remove" => Ok(Operation::Remove),
            other => Err(Error::UnknownOperation(other.to_owned())),
        }
    }
}

/// The operation applied to every element that carries no explicit
/// `xc:operation` of its own.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DefaultOperation {
    #[default]
    Merge,
    Replace,
    /// No implicit operation at all: an element without an explicit
    /// `operation` attribute is only a waypoint toward its children, and
    /// is not itself set, replaced, or deleted (spec §4.J).
    None,
}

impl DefaultOperation {
    pub fn parse(value: &str) -> Result<Self, Error> {
        match value {
            "merge" => Ok(DefaultOperation::Merge),
            "replace" => Ok(DefaultOperation::Replace),
            "none" => Ok(DefaultOperation::None),
            other => Err(Error::UnknownOperation(other.to_owned())),
        }
    }
}

/// What to do with the edited candidate once every element has been
/// walked (spec §4.J, §8 "Rollback atomicity").
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TestOption {
    #[default]
    TestThenSet,
    Set,
    TestOnly,
}

impl TestOption {
    pub fn parse(value: &str) -> Result<Self, Error> {
        match value {
            "test-then-set" => Ok(TestOption::TestThenSet),
            "set" => Ok(TestOption::Set),
            "test-only" => Ok(TestOption::TestOnly),
            other => Err(Error::UnknownOperation(other.to_owned())),
        }
    }
}

/// How a failed element application affects the rest of the request
/// (spec §4.J).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ErrorOption {
    #[default]
    StopOnError,
    ContinueOnError,
    RollbackOnError,
}

impl ErrorOption {
    pub fn parse(value: &str) -> Result<Self, Error> {
        match value {
            "stop-on-error" => Ok(ErrorOption::StopOnError),
            "continue-on-error" => Ok(ErrorOption::ContinueOnError),
            "rollback-on-error" => Ok(ErrorOption::RollbackOnError),
            other => Err(Error::UnknownOperation(other.to_owned())),
        }
    }
}

/// The operation actually in force for one element, once its explicit
/// attribute (if any) has been combined with the request's
/// default-operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EffectiveOp {
    Merge,
    Replace,
    Create,
    Delete,
    Remove,
    /// `default-operation=none` and no explicit operation: descend into
    /// children without touching this node itself.
    Transparent,
}

impl EffectiveOp {
    pub fn resolve(explicit: Option<Operation>, default_operation: DefaultOperation) -> Self {
        match explicit {
            Some(Operation::Merge) => EffectiveOp::Merge,
            Some(Operation::Replace) => EffectiveOp::Replace,
            Some(Operation::Create) => EffectiveOp::Create,
            Some(Operation::Delete) => EffectiveOp::Delete,
            Some(Operation::Remove) => EffectiveOp::Remove,
            None => match default_operation {
                DefaultOperation::Merge => EffectiveOp::Merge,
                DefaultOperation::Replace => EffectiveOp::Replace,
                DefaultOperation::None => EffectiveOp::Transparent,
            },
        }
    }
}
