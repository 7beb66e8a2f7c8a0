//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::process::{Command, Stdio};

use tracing::debug;

use crate::env::hook_env;
use crate::error::Error;
use crate::plan::Action;

/// Combined stdout/stderr captured across a run, in hook execution order
/// (spec §4.H step 6 "capturing stdout/stderr into `out`").
#[derive(Clone, Debug, Default)]
pub struct RunOutput {
    pub out: String,
    pub err: String,
}

/// Runs every action in `actions` in order, stopping at the first
/// non-zero exit (spec §4.G "Failure of a create/delete/update hook
/// fails the commit").
pub fn run(actions: &[Action], sid: &str) -> Result<RunOutput, Error> {
    let mut output = RunOutput::default();
    for action in actions {
        run_one(action, sid, &mut output)?;
    }
    Ok(output)
}

fn run_one(action: &Action, sid: &str, output: &mut RunOutput) -> Result<(), Error> {
    debug!(path = %action.path, kind = %action.kind, command = %action.command, "running hook");

    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(&action.command).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
    for (key, value) in hook_env(action, sid) {
        cmd.env(key, value);
    }

    let result = cmd.output()?;
    output.out.push_str(&String::from_utf8_lossy(&result.stdout));
    output.err.push_str(&String::from_utf8_lossy(&result.stderr));

    if !result.status.success() {
        return Err(Error::HookFailed {
            path: action.path.clone(),
            kind: action.kind,
            command: action.command.clone(),
            status: result.status.code(),
            stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use confd_utils::Path;

    use super::*;
    use crate::plan::{CommitAction, HookKind};

    fn action(command: &str) -> Action {
        Action {
            path: Path::parse("c100"),
            kind: HookKind::Begin,
            command: command.into(),
            priority: 100,
            commit_action: CommitAction::Set,
        }
    }

    #[test]
    fn successful_hooks_capture_stdout_in_order() {
        let actions = vec![action("echo one"), action("echo two")];
        let out = run(&actions, "sid-1").unwrap();
        assert_eq!(out.out, "one\ntwo\n");
    }

    #[test]
    fn a_failing_hook_stops_the_run_and_reports_its_stderr() {
        let actions = vec![action("echo ok"), action("echo boom >&2; exit 1"), action("echo never")];
        let err = run(&actions, "sid-1").unwrap_err();
        match err {
            Error::HookFailed { stderr, status, .. } => {
                assert_eq!(stderr.trim(), "boom");
                assert_eq!(status, Some(1));
            }
            _ => panic!("expected HookFailed"),
        }
    }

    #[test]
    fn hook_sees_its_own_configd_ext_and_path() {
        let actions = vec![action("echo $CONFIGD_EXT $CONFIGD_PATH")];
        let out = run(&actions, "sid-1").unwrap();
        assert_eq!(out.out, "begin /c100\n");
    }
}
