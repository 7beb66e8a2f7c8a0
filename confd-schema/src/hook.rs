//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::io::Write;
use std::process::{Command, Stdio};

/// Runs `cmd` as `sh -c <cmd>`, feeding `input` on stdin and returning its
/// trimmed stdout. Used by [`crate::node::Node::normalize_value`].
pub fn run_filter(cmd: &str, input: &str) -> std::io::Result<String> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    if let Some(stdin) = child.stdin.as_mut() {
        stdin.write_all(input.as_bytes())?;
    }

    let output = child.wait_with_output()?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}
