//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use crate::plan::{Action, HookKind};

/// Fixed `vyatta_*` path set passed to every hook (spec §4.G rule 4). The
/// spec names the category, not the exact variable names; these match
/// the long-standing Vyatta/VyOS `/opt/vyatta` layout hooks in this
/// ecosystem are written against.
const VYATTA_SYSCONFDIR: &str = "/opt/vyatta/etc";
const VYATTA_SHARE_DIR: &str = "/opt/vyatta/share";
const VYATTA_SBINDIR: &str = "/opt/vyatta/sbin";
const VYATTA_BINDIR: &str = "/opt/vyatta/bin";
const VYATTA_CFG_TEMPLATES: &str = "/opt/vyatta/share/vyatta-cfg/templates";
const VYATTA_OP_TEMPLATES: &str = "/opt/vyatta/share/vyatta-op/templates";

/// Builds the fixed environment for one hook invocation (spec §4.G rule
/// 4). `sid` is the owning session's id (`VYATTA_CONFIG_SID`).
pub fn hook_env(action: &Action, sid: &str) -> Vec<(&'static str, String)> {
    vec![
        ("vyatta_sysconfdir", VYATTA_SYSCONFDIR.to_owned()),
        ("vyatta_share_dir", VYATTA_SHARE_DIR.to_owned()),
        ("vyatta_sbindir", VYATTA_SBINDIR.to_owned()),
        ("vyatta_bindir", VYATTA_BINDIR.to_owned()),
        ("vyatta_cfg_templates", VYATTA_CFG_TEMPLATES.to_owned()),
        ("vyatta_op_templates", VYATTA_OP_TEMPLATES.to_owned()),
        ("PATH", "/bin:/usr/bin:/sbin:/usr/sbin".to_owned()),
        ("PERL5LIB", "/opt/vyatta/share/perl5".to_owned()),
        ("VYATTA_CONFIG_SID", sid.to_owned()),
        ("COMMIT_ACTION", action.commit_action.as_env().to_owned()),
        ("CONFIGD_PATH", action.path.to_string()),
        ("CONFIGD_EXT", hook_kind_ext(action.kind).to_owned()),
    ]
}

fn hook_kind_ext(kind: HookKind) -> &'static str {
    kind.as_ext()
}

#[cfg(test)]
mod tests {
    use confd_utils::Path;

    use super::*;
    use crate::plan::CommitAction;

    #[test]
    fn env_carries_path_and_commit_action() {
        let action = Action {
            path: Path::parse("protocols/ospf"),
            kind: HookKind::Begin,
            command: "true".into(),
            priority: 300,
            commit_action: CommitAction::Set,
        };
        let env = hook_env(&action, "sid-1");
        assert!(env.contains(&("CONFIGD_PATH", "/protocols/ospf".to_owned())));
        assert!(env.contains(&("CONFIGD_EXT", "begin".to_owned())));
        assert!(env.contains(&("COMMIT_ACTION", "SET".to_owned())));
        assert!(env.contains(&("VYATTA_CONFIG_SID", "sid-1".to_owned())));
    }
}
