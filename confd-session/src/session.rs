//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

//! The Session actor (spec §4.I): a single-writer-per-session event loop
//! that owns one candidate tree and arbitrates get/set/lock/commit
//! requests against it.

use std::sync::Arc;

use arc_swap::ArcSwap;
use confd_commit::CommitMgr;
use confd_schema::{LeafType, Schema};
use confd_tree::Tree;
use confd_utils::{Authorizer, Context, Path, Task};
use confd_view::UnionView;
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};
use tracing::{info, warn};

use crate::error::Error;
use crate::request::Request;

/// `lock_pid` sentinel meaning "unlocked" (spec §4.I).
pub const UNLOCKED: i64 = 0;
/// `lock_pid` held internally for the duration of a commit (spec §4.I
/// "a privileged internal holder... prints a symbolic name").
const COMMIT_IN_PROGRESS: i64 = -1;

/// Bounded channel capacity for a Session's request queue.
const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// A live handle to a running Session: a clonable sender for its request
/// channel plus the one-shot kill switch (spec §5 "Cancellation").
#[derive(Clone)]
pub struct SessionHandle {
    sid: String,
    tx: mpsc::Sender<Request>,
    kill: Arc<AsyncMutex<Option<oneshot::Sender<()>>>>,
}

impl SessionHandle {
    pub fn sid(&self) -> &str {
        &self.sid
    }

    pub fn sender(&self) -> mpsc::Sender<Request> {
        self.tx.clone()
    }

    /// Closes the Session's term channel. Idempotent: killing an already
    /// killed or finished session is a no-op.
    pub async fn kill(&self) {
        if let Some(tx) = self.kill.lock().await.take() {
            let _ = tx.send(());
        }
    }
}

pub struct Session {
    sid: String,
    owner_uid: u32,
    lock_pid: i64,
    saved_flag: bool,
    comment: Option<String>,
    candidate: Tree,
    running: Arc<ArcSwap<Tree>>,
    cmgr: Arc<AsyncMutex<CommitMgr>>,
    schema: Arc<Schema>,
    authorizer: Arc<dyn Authorizer>,
    running_fs_readonly: bool,
    rx: mpsc::Receiver<Request>,
    term_rx: oneshot::Receiver<()>,
}

impl Session {
    /// Creates a Session and spawns its event loop, returning a handle to
    /// it and the [`Task`] that owns the loop (dropping the task cancels
    /// it, matching confd-utils' teacher-derived [`Task`] semantics).
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        sid: impl Into<String>,
        owner_uid: u32,
        running: Arc<ArcSwap<Tree>>,
        cmgr: Arc<AsyncMutex<CommitMgr>>,
        schema: Arc<Schema>,
        authorizer: Arc<dyn Authorizer>,
        running_fs_readonly: bool,
    ) -> (SessionHandle, Task<()>) {
        let sid = sid.into();
        let (tx, rx) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);
        let (kill_tx, term_rx) = oneshot::channel();

        let session = Session {
            sid: sid.clone(),
            owner_uid,
            lock_pid: UNLOCKED,
            saved_flag: true,
            comment: None,
            candidate: Tree::new(),
            running,
            cmgr,
            schema,
            authorizer,
            running_fs_readonly,
            rx,
            term_rx,
        };

        let handle = SessionHandle { sid, tx, kill: Arc::new(AsyncMutex::new(Some(kill_tx))) };
        let task = Task::spawn(session.run());
        (handle, task)
    }

    /// The event loop: reads the request channel until `Kill` closes the
    /// term channel, which this select observes as `term_rx` resolving
    /// (spec §5 "Cancellation"). `Commit`/`Validate` are pulled out into
    /// [`Session::run_commit`]/[`Session::run_validate`], which pump the
    /// channel themselves while their background work is in flight.
    async fn run(mut self) {
        info!(sid = %self.sid, "session started");
        loop {
            tokio::select! {
                biased;
                _ = &mut self.term_rx => {
                    info!(sid = %self.sid, "session killed");
                    break;
                }
                request = self.rx.recv() => {
                    match request {
                        Some(Request::Commit { ctx, message, responder }) => self.run_commit(ctx, message, responder).await,
                        Some(Request::Validate { ctx, responder }) => self.run_validate(ctx, responder).await,
                        Some(request) => self.dispatch(request).await,
                        None => break,
                    }
                }
            }
        }
    }

    /// Spawns the commit as a background task and keeps servicing safe
    /// reads off the request channel until it resolves, matching spec
    /// §4.I "keeps pumping its request channel but only services
    /// requests marked safe" and §5's `Kill` cancellation.
    async fn run_commit(&mut self, ctx: Context, message: String, responder: confd_utils::Responder<Result<confd_commit::CommitOutcome, Error>>) {
        let held_before = self.lock_pid;
        if held_before == UNLOCKED {
            self.lock_pid = COMMIT_IN_PROGRESS;
        }

        let message = if message.is_empty() { self.comment.clone().unwrap_or_default() } else { message };
        let candidate_snapshot = self.candidate.clone();
        let running_snapshot = (*self.running.load_full()).clone();
        let schema = Arc::clone(&self.schema);
        let cmgr = Arc::clone(&self.cmgr);
        let sid = self.sid.clone();
        let readonly = self.running_fs_readonly;

        let mut task = Task::spawn(async move {
            let mut cmgr = cmgr.lock().await;
            let result = cmgr.commit(&sid, &candidate_snapshot, &mut running_snapshot, &schema, message, readonly);
            (result, running_snapshot)
        });

        loop {
            tokio::select! {
                biased;
                _ = &mut self.term_rx => {
                    info!(sid = %self.sid, "session killed with a commit in flight; its hooks run to completion but the result is discarded");
                    let _ = responder.send(Err(Error::Terminated));
                    if held_before == UNLOCKED {
                        self.lock_pid = UNLOCKED;
                    }
                    return;
                }
                result = &mut task => {
                    if held_before == UNLOCKED {
                        self.lock_pid = UNLOCKED;
                    }
                    match result {
                        Ok((Ok(outcome), running)) => {
                            if outcome.ok {
                                self.running.store(Arc::new(running));
                                self.candidate = Tree::new();
                                self.comment = None;
                                self.saved_flag = true;
                                info!(sid = %self.sid, uid = ctx.uid, "candidate committed");
                            } else {
                                warn!(sid = %self.sid, errors = ?outcome.err, "commit refused");
                            }
                            let _ = responder.send(Ok(outcome));
                        }
                        Ok((Err(e), _)) => {
                            let _ = responder.send(Err(e.into()));
                        }
                        Err(_join_error) => {
                            let _ = responder.send(Err(Error::Terminated));
                        }
                    }
                    return;
                }
                Some(request) = self.rx.recv() => {
                    if request.is_safe() {
                        self.dispatch(request).await;
                    } else {
                        respond_busy(request);
                    }
                }
            }
        }
    }

    /// Same pumping pattern as [`Session::run_commit`], without the
    /// running-promotion/candidate-clearing side effects.
    async fn run_validate(&mut self, _ctx: Context, responder: confd_utils::Responder<confd_commit::CommitOutcome>) {
        let candidate_snapshot = self.candidate.clone();
        let running_snapshot = (*self.running.load_full()).clone();
        let schema = Arc::clone(&self.schema);
        let cmgr = Arc::clone(&self.cmgr);
        let readonly = self.running_fs_readonly;

        let mut task = Task::spawn(async move {
            let cmgr = cmgr.lock().await;
            cmgr.validate(&candidate_snapshot, &running_snapshot, &schema, readonly)
        });

        loop {
            tokio::select! {
                biased;
                _ = &mut self.term_rx => {
                    // dropping `responder` without a value surfaces a
                    // closed channel to the caller, the same signal
                    // `Kill` gives every other in-flight request.
                    return;
                }
                result = &mut task => {
                    if let Ok(outcome) = result {
                        let _ = responder.send(outcome);
                    }
                    return;
                }
                Some(request) = self.rx.recv() => {
                    if request.is_safe() {
                        self.dispatch(request).await;
                    } else {
                        respond_busy(request);
                    }
                }
            }
        }
    }

    /// Routes one request that isn't `Commit`/`Validate` (those go
    /// through [`Session::run_commit`]/[`Session::run_validate`] instead,
    /// so they can pump the channel while their background work runs).
    async fn dispatch(&mut self, request: Request) {
        match request {
            Request::Get { ctx, path, include_defaults, responder } => {
                let _ = responder.send(self.get(&ctx, &path, include_defaults));
            }
            Request::Set { ctx, path, value, responder } => {
                let _ = responder.send(self.set(&ctx, &path, value.as_deref()));
            }
            Request::Delete { ctx, path, responder } => {
                let _ = responder.send(self.delete(&ctx, &path));
            }
            Request::Exists { ctx, path, include_defaults, responder } => {
                let _ = responder.send(self.exists(&ctx, &path, include_defaults));
            }
            Request::GetType { path, responder, .. } => {
                let _ = responder.send(Ok(self.get_type(&path)));
            }
            Request::GetStatus { path, responder, .. } => {
                let _ = responder.send(self.get_status(&path));
            }
            Request::IsDefault { ctx, path, responder } => {
                let _ = responder.send(self.is_default(&ctx, &path));
            }
            Request::GetTree { ctx, path, responder } => {
                let _ = responder.send(self.show(&ctx, &path, false, false));
            }
            Request::GetFullTree { ctx, path, responder } => {
                let _ = responder.send(self.show(&ctx, &path, true, false));
            }
            Request::Show { ctx, path, force_show, responder } => {
                let _ = responder.send(self.show(&ctx, &path, true, force_show));
            }
            Request::Validate { .. } | Request::Commit { .. } => {
                unreachable!("Commit/Validate are intercepted in Session::run before dispatch is called")
            }
            Request::Lock { pid, responder } => {
                let _ = responder.send(self.lock(pid));
            }
            Request::Unlock { pid, responder } => {
                let _ = responder.send(self.unlock(pid));
            }
            Request::Locked { responder } => {
                let _ = responder.send(self.lock_pid);
            }
            Request::Comment { text, responder } => {
                if text.is_some() {
                    self.comment = text;
                }
                let _ = responder.send(self.comment.clone());
            }
            Request::Changed { responder } => {
                let _ = responder.send(self.changed());
            }
            Request::Saved { responder } => {
                let _ = responder.send(self.saved_flag);
            }
            Request::MarkSaved { responder } => {
                self.saved_flag = true;
                let _ = responder.send(());
            }
            Request::Discard { responder } => {
                self.candidate = Tree::new();
                self.saved_flag = true;
                let _ = responder.send(());
            }
            Request::Load { ctx, xml, responder } => {
                self.candidate = Tree::new();
                let result = self.edit(
                    &ctx,
                    &xml,
                    confd_editconfig::DefaultOperation::Merge,
                    confd_editconfig::TestOption::Set,
                    confd_editconfig::ErrorOption::StopOnError,
                );
                let _ = responder.send(result);
            }
            Request::Merge { ctx, xml, responder } => {
                let result = self.edit(
                    &ctx,
                    &xml,
                    confd_editconfig::DefaultOperation::Merge,
                    confd_editconfig::TestOption::Set,
                    confd_editconfig::ErrorOption::StopOnError,
                );
                let _ = responder.send(result);
            }
            Request::EditConfig { ctx, xml, default_operation, test_option, error_option, responder } => {
                let result = self.edit(&ctx, &xml, default_operation, test_option, error_option);
                let _ = responder.send(result);
            }
            Request::GetHelp { path, responder } => {
                let _ = responder.send(self.get_help(path.as_ref()));
            }
            Request::ListTransactions { responder } => {
                let cmgr = self.cmgr.lock().await;
                let _ = responder.send(cmgr.journal().list());
            }
            Request::GetTransaction { id, responder } => {
                let cmgr = self.cmgr.lock().await;
                let _ = responder.send(cmgr.journal().get(id));
            }
        }
    }

    fn get(&mut self, ctx: &Context, path: &Path, include_defaults: bool) -> Result<Option<String>, Error> {
        let running = self.running.load_full();
        let view = UnionView::new(&mut self.candidate, &running, &self.schema, self.authorizer.as_ref());
        let Some(node) = view.get(ctx, path, include_defaults)? else {
            return Ok(None);
        };
        let Some(schema_node) = self.schema.descendant(path) else {
            return Ok(None);
        };
        Ok(Some(confd_view::marshal(&node, schema_node, confd_view::Encoding::Internal)?))
    }

    fn set(&mut self, ctx: &Context, path: &Path, value: Option<&str>) -> Result<(), Error> {
        let running = self.running.load_full();
        let mut view = UnionView::new(&mut self.candidate, &running, &self.schema, self.authorizer.as_ref());
        view.set(ctx, path, value)?;
        self.saved_flag = false;
        Ok(())
    }

    fn delete(&mut self, ctx: &Context, path: &Path) -> Result<(), Error> {
        let running = self.running.load_full();
        let mut view = UnionView::new(&mut self.candidate, &running, &self.schema, self.authorizer.as_ref());
        view.delete(ctx, path)?;
        self.saved_flag = false;
        Ok(())
    }

    fn exists(&mut self, ctx: &Context, path: &Path, include_defaults: bool) -> Result<bool, Error> {
        let running = self.running.load_full();
        let view = UnionView::new(&mut self.candidate, &running, &self.schema, self.authorizer.as_ref());
        Ok(view.exists(ctx, path, include_defaults)?)
    }

    fn get_type(&self, path: &Path) -> Option<String> {
        let schema_node = self.schema.descendant(path)?;
        Some(type_name(schema_node.leaf_type.as_ref()?))
    }

    /// spec §4.D "used by... status queries": the diff status of `path`
    /// between running and the candidate-merged-without-defaults.
    fn get_status(&self, path: &Path) -> Result<confd_view::DiffStatus, Error> {
        let running = self.running.load();
        let merged = Tree::merge_without_defaults(&self.candidate, &running, &self.schema);
        let Some(schema_node) = self.schema.descendant(path) else {
            return Ok(confd_view::DiffStatus::Unchanged);
        };
        let before = running.get(&self.schema, path).ok();
        let after = merged.get(&self.schema, path).ok();
        Ok(confd_view::diff(before, after, schema_node).status)
    }

    fn is_default(&mut self, ctx: &Context, path: &Path) -> Result<bool, Error> {
        let running = self.running.load_full();
        let view = UnionView::new(&mut self.candidate, &running, &self.schema, self.authorizer.as_ref());
        let explicit = view.exists(ctx, path, false)?;
        let with_defaults = view.exists(ctx, path, true)?;
        Ok(!explicit && with_defaults)
    }

    fn show(&mut self, ctx: &Context, path: &Path, include_defaults: bool, force_show: bool) -> Result<String, Error> {
        let running = self.running.load_full();
        let view = UnionView::new(&mut self.candidate, &running, &self.schema, self.authorizer.as_ref());
        let merged = view.merged(include_defaults);
        let node = merged.get(&self.schema, path).map_err(confd_view::Error::from)?;
        let schema_node = self.schema.descendant(path).ok_or_else(|| confd_view::Error::from(confd_schema::Error::UnknownElement(path.clone())))?;
        let secrets_visible = ctx.is_internal() || self.authorizer.read_secrets(ctx);
        Ok(confd_view::show(node, schema_node, force_show && secrets_visible))
    }

    fn changed(&self) -> bool {
        let running = self.running.load();
        let merged = Tree::merge_without_defaults(&self.candidate, &running, &self.schema);
        merged != **running
    }

    /// `Lock` fails if already held by anyone, including the same pid
    /// re-locking (spec §4.I).
    fn lock(&mut self, pid: i64) -> Result<(), Error> {
        if self.lock_pid != UNLOCKED {
            return Err(Error::AlreadyLocked(self.lock_pid));
        }
        self.lock_pid = pid;
        Ok(())
    }

    fn unlock(&mut self, pid: i64) -> Result<(), Error> {
        if self.lock_pid != pid {
            return Err(Error::NotLockHolder);
        }
        self.lock_pid = UNLOCKED;
        Ok(())
    }

    fn edit(
        &mut self,
        ctx: &Context,
        xml: &str,
        default_operation: confd_editconfig::DefaultOperation,
        test_option: confd_editconfig::TestOption,
        error_option: confd_editconfig::ErrorOption,
    ) -> Result<confd_editconfig::EditConfigOutcome, Error> {
        let running = self.running.load_full();
        let outcome = confd_editconfig::edit_config(
            ctx,
            &mut self.candidate,
            &running,
            &self.schema,
            self.authorizer.as_ref(),
            xml,
            default_operation,
            test_option,
            error_option,
        )?;
        if outcome.promoted {
            self.saved_flag = false;
        }
        Ok(outcome)
    }

    fn get_help(&self, path: Option<&Path>) -> String {
        match path {
            None => self
                .schema
                .root()
                .children_in_order()
                .map(|n| match &n.description {
                    Some(d) => format!("{}: {d}", n.name),
                    None => n.name.clone(),
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Some(path) => match self.schema.descendant(path) {
                Some(n) => n.description.clone().unwrap_or_else(|| format!("{} (no help text)", n.name)),
                None => format!("no such element: {path}"),
            },
        }
    }
}

/// Immediately fails a mutating request that arrived while a commit or
/// validate already had the candidate checked out (spec §4.I "only
/// services requests marked safe"). Requests with no `Result`-shaped
/// responder (`Comment`, `MarkSaved`, `Discard`) are dropped instead,
/// surfacing the same closed-channel signal a caller sees from `Kill`.
fn respond_busy(request: Request) {
    match request {
        Request::Set { responder, .. } => {
            let _ = responder.send(Err(Error::Busy));
        }
        Request::Delete { responder, .. } => {
            let _ = responder.send(Err(Error::Busy));
        }
        Request::Lock { responder, .. } => {
            let _ = responder.send(Err(Error::Busy));
        }
        Request::Unlock { responder, .. } => {
            let _ = responder.send(Err(Error::Busy));
        }
        Request::Load { responder, .. } => {
            let _ = responder.send(Err(Error::Busy));
        }
        Request::Merge { responder, .. } => {
            let _ = responder.send(Err(Error::Busy));
        }
        Request::EditConfig { responder, .. } => {
            let _ = responder.send(Err(Error::Busy));
        }
        Request::Commit { responder, .. } => {
            let _ = responder.send(Err(Error::Busy));
        }
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
        | Request::Validate { .. }
        | Request::Comment { .. }
        | Request::MarkSaved { .. }
        | Request::Discard { .. }
        | Request::ListTransactions { .. }
        | Request::GetTransaction { .. } => {}
    }
}

fn type_name(t: &LeafType) -> String {
    match t {
        LeafType::Int64 { .. } => "int64".to_owned(),
        LeafType::Decimal64 { .. } => "decimal64".to_owned(),
        LeafType::String { .. } => "string".to_owned(),
        LeafType::Boolean => "boolean".to_owned(),
        LeafType::Empty => "empty".to_owned(),
        LeafType::Enumeration(values) => format!("enumeration({})", values.join(",")),
        LeafType::Leafref(path) => format!("leafref({path})"),
        LeafType::Union(members) => format!("union({})", members.iter().map(type_name).collect::<Vec<_>>().join("|")),
    }
}
