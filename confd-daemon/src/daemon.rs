//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

//! Wires the schema, the shared running tree and the commit journal into a
//! [`SessionManager`] that a transport front-end (out of scope, spec §1)
//! hands client connections to, one [`Session`](confd_session::Session)
//! per client (spec §4.I).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use confd_commit::{CommitMgr, Journal};
use confd_schema::Schema;
use confd_session::SessionHandle;
use confd_tree::Tree;
use confd_utils::{AllowAllAuthorizer, Authorizer};
use tokio::sync::Mutex as AsyncMutex;
use tracing::info;

pub struct SessionManager {
    schema: Arc<Schema>,
    running: Arc<ArcSwap<Tree>>,
    cmgr: Arc<AsyncMutex<CommitMgr>>,
    authorizer: Arc<dyn Authorizer>,
    running_fs_readonly: bool,
    next_sid: AtomicU64,
}

impl SessionManager {
    pub fn new(schema: Schema, journal: Journal, running_fs_readonly: bool) -> Self {
        SessionManager {
            schema: Arc::new(schema),
            running: Arc::new(ArcSwap::new(Arc::new(Tree::new()))),
            cmgr: Arc::new(AsyncMutex::new(CommitMgr::new(journal))),
            // Stands in for the out-of-scope TACACS+/local ACM backend
            // (spec §1, §9 "bootstrap has an 'allow all' authorizer").
            authorizer: Arc::new(AllowAllAuthorizer),
            running_fs_readonly,
            next_sid: AtomicU64::new(1),
        }
    }

    /// Spawns a new Session actor for a connecting client (spec §4.I).
    pub fn spawn_session(&self, owner_uid: u32) -> SessionHandle {
        let sid = format!("sess-{}", self.next_sid.fetch_add(1, Ordering::Relaxed));
        info!(sid = %sid, owner_uid, "spawning session");
        let (handle, mut task) = confd_session::Session::spawn(
            sid,
            owner_uid,
            Arc::clone(&self.running),
            Arc::clone(&self.cmgr),
            Arc::clone(&self.schema),
            Arc::clone(&self.authorizer),
            self.running_fs_readonly,
        );
        task.detach();
        handle
    }
}
