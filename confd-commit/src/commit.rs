//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use chrono::Utc;
use confd_schema::Schema;
use confd_tree::Tree;
use tracing::{info, warn};

use crate::error::Error;
use crate::journal::Journal;

/// The `{out, err, ok}` shape returned by both `Commit` and `Validate`
/// (spec §4.H).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommitOutcome {
    pub out: String,
    pub err: Vec<String>,
    pub ok: bool,
}

impl CommitOutcome {
    fn ok() -> Self {
        CommitOutcome { out: String::new(), err: Vec::new(), ok: true }
    }

    fn refused(reason: impl Into<String>) -> Self {
        CommitOutcome { out: String::new(), err: vec![reason.into()], ok: false }
    }

    fn invalid(errors: Vec<impl ToString>) -> Self {
        CommitOutcome { out: String::new(), err: errors.iter().map(ToString::to_string).collect(), ok: false }
    }
}

/// The Commit Mgr (spec §4.H): validates and atomically promotes a
/// session's candidate onto the shared running configuration, recording a
/// journal entry for every successful commit.
pub struct CommitMgr {
    journal: Journal,
}

impl CommitMgr {
    pub fn new(journal: Journal) -> Self {
        CommitMgr { journal }
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// spec §4.H `Commit(sessionId, ctx, candidate, message, debug)`.
    ///
    /// `running_fs_readonly` is supplied by the caller rather than probed
    /// here: detecting a read-only mount needs a platform-specific
    /// syscall, and this workspace forbids unsafe code. confd-session
    /// determines it once at startup and threads it through.
    pub fn commit(
        &mut self,
        sid: &str,
        candidate: &Tree,
        running: &mut Tree,
        schema: &Schema,
        message: String,
        running_fs_readonly: bool,
    ) -> Result<CommitOutcome, Error> {
        let merged = Tree::merge_without_defaults(candidate, running, schema);

        // step 1: refuse a no-op commit, matching the teacher's early
        // return on an empty diff.
        if merged == *running {
            return Ok(CommitOutcome::ok());
        }

        // step 2: boot-time exemption — a read-only root is only a
        // problem once there's an existing running configuration to
        // protect.
        if running_fs_readonly && !is_empty(running) {
            return Ok(CommitOutcome::refused("running configuration is read-only"));
        }

        // steps 4-5: build the merged view and validate it.
        let errors = confd_validate::validate(&merged, schema);
        if !errors.is_empty() {
            return Ok(CommitOutcome::invalid(errors));
        }

        // step 6: run the ordered action set, before (running) to after
        // (merged). A failing hook fails the commit without touching
        // running or the journal.
        let run = match confd_action::run(running, &merged, schema, sid) {
            Ok(output) => output,
            Err(e) => {
                warn!(sid, error = %e, "commit aborted by a failing hook");
                return Ok(CommitOutcome::refused(e.to_string()));
            }
        };

        // step 7: promote and journal, then the caller (confd-session)
        // clears its own candidate and releases the commit lock (step 8).
        let text = confd_view::marshal(merged.root(), schema.root(), confd_view::Encoding::Internal)?;
        let id = self.journal.record(message, text, Utc::now())?;
        *running = merged;

        info!(sid, transaction_id = id, "commit applied");
        Ok(CommitOutcome { out: run.out, err: Vec::new(), ok: true })
    }

    /// spec §4.H `Validate(ctx)`: identical refusal and validation steps
    /// as `commit`, but discards the result instead of running hooks,
    /// promoting running, or journaling.
    pub fn validate(&self, candidate: &Tree, running: &Tree, schema: &Schema, running_fs_readonly: bool) -> CommitOutcome {
        let merged = Tree::merge_without_defaults(candidate, running, schema);
        if merged == *running {
            return CommitOutcome::ok();
        }
        if running_fs_readonly && !is_empty(running) {
            return CommitOutcome::refused("running configuration is read-only");
        }
        let errors = confd_validate::validate(&merged, schema);
        if errors.is_empty() {
            CommitOutcome::ok()
        } else {
            CommitOutcome::invalid(errors)
        }
    }
}

fn is_empty(tree: &Tree) -> bool {
    tree.root().as_container().map(confd_tree::Container::is_empty).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use confd_schema::fixtures::sample_schema;
    use confd_utils::Path;

    use super::*;

    fn journal(tag: &str) -> Journal {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!("confd-commit-commit-{tag}-{}-{n}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);
        Journal::open(&path).unwrap()
    }

    #[test]
    fn commit_with_no_changes_succeeds_without_journaling() {
        let schema = sample_schema();
        let mut mgr = CommitMgr::new(journal("noop"));
        let candidate = Tree::new();
        let mut running = Tree::new();

        let outcome = mgr.commit("sid-1", &candidate, &mut running, &schema, "noop".into(), false).unwrap();
        assert!(outcome.ok);
        assert!(mgr.journal().list().is_empty());
    }

    #[test]
    fn commit_refuses_on_validation_failure_and_leaves_running_untouched() {
        let schema = sample_schema();
        let mut mgr = CommitMgr::new(journal("invalid"));
        let mut candidate = Tree::new();
        // `p` is a presence container with a mandatory leaf `m`; presence
        // it without setting `m` to trigger MissingMandatory.
        candidate.create_presence_container(&schema, &Path::parse("p")).unwrap();
        let mut running = Tree::new();

        let outcome = mgr.commit("sid-1", &candidate, &mut running, &schema, "bad".into(), false).unwrap();
        assert!(!outcome.ok);
        assert!(!outcome.err.is_empty());
        assert!(running.root().as_container().unwrap().is_empty());
    }

    #[test]
    fn successful_commit_promotes_running_and_records_a_journal_entry() {
        let schema = sample_schema();
        let mut mgr = CommitMgr::new(journal("success"));
        let mut candidate = Tree::new();
        candidate.set_leaf(&schema, &Path::parse("c300/value"), Some("x")).unwrap();
        let mut running = Tree::new();

        let outcome = mgr.commit("sid-1", &candidate, &mut running, &schema, "add value".into(), false).unwrap();
        assert!(outcome.ok);
        assert_eq!(outcome.out, "begin-c300\nend-c300\n");
        assert!(running.exists(&schema, &Path::parse("c300/value")).unwrap());

        let entries = mgr.journal().list();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].comment, "add value");
    }

    #[test]
    fn commit_refuses_on_read_only_root_unless_running_is_empty() {
        let schema = sample_schema();
        let mut mgr = CommitMgr::new(journal("readonly"));
        let mut candidate = Tree::new();
        candidate.set_leaf(&schema, &Path::parse("c300/value"), Some("x")).unwrap();
        let mut running = Tree::new();

        // boot-time exemption: running is empty, so the commit proceeds
        // even though the filesystem is read-only.
        let outcome = mgr.commit("sid-1", &candidate, &mut running, &schema, "boot".into(), true).unwrap();
        assert!(outcome.ok);

        let mut candidate2 = Tree::new();
        candidate2.set_leaf(&schema, &Path::parse("c300/value"), Some("y")).unwrap();
        let outcome2 = mgr.commit("sid-1", &candidate2, &mut running, &schema, "later".into(), true).unwrap();
        assert!(!outcome2.ok);
        let value = running.get(&schema, &Path::parse("c300/value")).unwrap();
        assert_eq!(value.as_leaf_value(), Some("x"));
    }

    #[test]
    fn validate_never_mutates_running_or_the_journal() {
        let schema = sample_schema();
        let mgr = CommitMgr::new(journal("validate-only"));
        let mut candidate = Tree::new();
        candidate.set_leaf(&schema, &Path::parse("c300/value"), Some("x")).unwrap();
        let running = Tree::new();

        let outcome = mgr.validate(&candidate, &running, &schema, false);
        assert!(outcome.ok);
        assert!(running.root().as_container().unwrap().is_empty());
        assert!(mgr.journal().list().is_empty());
    }
}
