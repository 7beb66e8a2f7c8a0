//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

//! The Session actor (spec §4.I): per-client event loop owning one
//! candidate tree, serialized request processing, and the lock/commit/
//! edit-config entry points wired to confd-commit and confd-editconfig.

pub mod error;
pub mod request;
pub mod session;

pub use error::Error;
pub use request::Request;
pub use session::{Session, SessionHandle, UNLOCKED};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arc_swap::ArcSwap;
    use confd_commit::{CommitMgr, Journal};
    use confd_schema::fixtures::sample_schema;
    use confd_tree::Tree;
    use confd_utils::{AllowAllAuthorizer, Context, Path};
    use tokio::sync::{oneshot, Mutex as AsyncMutex};

    use super::*;

    fn journal(tag: &str) -> Journal {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!("confd-session-{tag}-{}-{n}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);
        Journal::open(&path).unwrap()
    }

    fn spawn_session(tag: &str) -> SessionHandle {
        let schema = Arc::new(sample_schema());
        let running = Arc::new(ArcSwap::new(Arc::new(Tree::new())));
        let cmgr = Arc::new(AsyncMutex::new(CommitMgr::new(journal(tag))));
        let authorizer = Arc::new(AllowAllAuthorizer);
        let (handle, mut task) = Session::spawn("sess-1", 1000, running, cmgr, schema, authorizer, false);
        task.detach();
        handle
    }

    #[tokio::test]
    async fn set_then_get_round_trips_a_leaf_value() {
        let handle = spawn_session("set-get");
        let tx = handle.sender();

        let (set_tx, set_rx) = oneshot::channel();
        tx.send(Request::Set { ctx: Context::internal(), path: Path::parse("mtu"), value: Some("9000".into()), responder: set_tx }).await.unwrap();
        set_rx.await.unwrap().unwrap();

        let (get_tx, get_rx) = oneshot::channel();
        tx.send(Request::Get { ctx: Context::internal(), path: Path::parse("mtu"), include_defaults: false, responder: get_tx }).await.unwrap();
        let value = get_rx.await.unwrap().unwrap();
        assert_eq!(value.as_deref(), Some("\"9000\""));
    }

    #[tokio::test]
    async fn lock_excludes_a_second_pid_and_even_the_same_pid() {
        let handle = spawn_session("lock");
        let tx = handle.sender();

        let (tx1, rx1) = oneshot::channel();
        tx.send(Request::Lock { pid: 100, responder: tx1 }).await.unwrap();
        rx1.await.unwrap().unwrap();

        let (tx2, rx2) = oneshot::channel();
        tx.send(Request::Lock { pid: 100, responder: tx2 }).await.unwrap();
        assert!(rx2.await.unwrap().is_err());

        let (tx3, rx3) = oneshot::channel();
        tx.send(Request::Lock { pid: 200, responder: tx3 }).await.unwrap();
        assert!(rx3.await.unwrap().is_err());

        let (tx4, rx4) = oneshot::channel();
        tx.send(Request::Unlock { pid: 200, responder: tx4 }).await.unwrap();
        assert!(rx4.await.unwrap().is_err());

        let (tx5, rx5) = oneshot::channel();
        tx.send(Request::Unlock { pid: 100, responder: tx5 }).await.unwrap();
        rx5.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn commit_promotes_running_and_clears_the_candidate() {
        let handle = spawn_session("commit");
        let tx = handle.sender();

        let (set_tx, set_rx) = oneshot::channel();
        tx.send(Request::Set { ctx: Context::internal(), path: Path::parse("c300/value"), value: Some("x".into()), responder: set_tx }).await.unwrap();
        set_rx.await.unwrap().unwrap();

        let (commit_tx, commit_rx) = oneshot::channel();
        tx.send(Request::Commit { ctx: Context::internal(), message: "add value".into(), responder: commit_tx }).await.unwrap();
        let outcome = commit_rx.await.unwrap().unwrap();
        assert!(outcome.ok, "{:?}", outcome.err);

        let (exists_tx, exists_rx) = oneshot::channel();
        tx.send(Request::Exists { ctx: Context::internal(), path: Path::parse("c300/value"), include_defaults: false, responder: exists_tx }).await.unwrap();
        assert!(exists_rx.await.unwrap().unwrap());

        let (changed_tx, changed_rx) = oneshot::channel();
        tx.send(Request::Changed { responder: changed_tx }).await.unwrap();
        assert!(!changed_rx.await.unwrap());

        let (list_tx, list_rx) = oneshot::channel();
        tx.send(Request::ListTransactions { responder: list_tx }).await.unwrap();
        let transactions = list_rx.await.unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].comment, "add value");

        let (get_tx, get_rx) = oneshot::channel();
        tx.send(Request::GetTransaction { id: transactions[0].id, responder: get_tx }).await.unwrap();
        assert!(get_rx.await.unwrap().is_some());
    }

    #[tokio::test]
    async fn kill_closes_the_channel_and_stops_the_loop() {
        let handle = spawn_session("kill");
        let tx = handle.sender();
        handle.kill().await;

        // give the loop a chance to observe the closed term channel.
        tokio::task::yield_now().await;
        let (get_tx, get_rx) = oneshot::channel();
        let _ = tx.send(Request::Saved { responder: get_tx }).await;
        assert!(get_rx.await.is_err(), "the loop should have exited and dropped the responder");
    }

    #[tokio::test]
    async fn edit_config_through_the_session_updates_candidate_and_marks_unsaved() {
        let handle = spawn_session("editconfig");
        let tx = handle.sender();

        let (saved_tx, saved_rx) = oneshot::channel();
        tx.send(Request::Saved { responder: saved_tx }).await.unwrap();
        assert!(saved_rx.await.unwrap());

        let xml = r#"<config><mtu>9000</mtu></config>"#;
        let (edit_tx, edit_rx) = oneshot::channel();
        tx.send(Request::EditConfig {
            ctx: Context::internal(),
            xml: xml.into(),
            default_operation: confd_editconfig::DefaultOperation::Merge,
            test_option: confd_editconfig::TestOption::Set,
            error_option: confd_editconfig::ErrorOption::StopOnError,
            responder: edit_tx,
        })
        .await
        .unwrap();
        let outcome = edit_rx.await.unwrap().unwrap();
        assert!(outcome.errors.is_empty());
        assert!(outcome.promoted);

        let (saved_tx2, saved_rx2) = oneshot::channel();
        tx.send(Request::Saved { responder: saved_tx2 }).await.unwrap();
        assert!(!saved_rx2.await.unwrap());
    }
}
