//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

/// Per-request context threaded through every tree operation (spec §6:
/// `Context{pid, uid, groups, configd_internal, dlog, elog}`).
///
/// `dlog`/`elog` (debug/event log sinks) are an out-of-scope external
/// collaborator per spec §1 ("logging sinks"); this crate logs through
/// `tracing` instead and carries only the fields that affect behavior.
#[derive(Clone, Debug)]
pub struct Context {
    pub pid: u32,
    pub uid: u32,
    pub groups: Vec<u32>,
    configd_internal: bool,
}

impl Context {
    pub fn new(pid: u32, uid: u32, groups: Vec<u32>) -> Self {
        Context {
            pid,
            uid,
            groups,
            configd_internal: false,
        }
    }

    /// A privileged context used for internal/system-originated requests.
    /// Bypasses authorization (spec §4.I) but is still accounted for.
    pub fn internal() -> Self {
        Context {
            pid: 0,
            uid: 0,
            groups: Vec::new(),
            configd_internal: true,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.configd_internal
    }
}
