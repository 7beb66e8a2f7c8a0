//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

//! The Action Runner (spec §4.G): schedules and executes the shell-command
//! hooks a schema attaches to nodes, in the priority-grouped, depth-first
//! order commit requires.

pub mod env;
pub mod error;
pub mod exec;
pub mod plan;

use confd_schema::Schema;
use confd_tree::Tree;

pub use error::Error;
pub use exec::RunOutput;
pub use plan::{Action, CommitAction, HookKind};

/// Plans and runs the full commit action set for the transition from
/// `before` (running) to `after` (candidate merged without defaults).
pub fn run(before: &Tree, after: &Tree, schema: &Schema, sid: &str) -> Result<RunOutput, Error> {
    let actions = plan::plan(before, after, schema);
    exec::run(&actions, sid)
}

/// Runs every `validate` hook defined anywhere in `after`, regardless of
/// whether that node changed (spec §4.G "validate — run during
/// validation; non-zero exit is a validation failure").
pub fn run_validate_hooks(after: &Tree, schema: &Schema, sid: &str) -> Result<RunOutput, Error> {
    let mut actions = Vec::new();
    collect_validate(after.root().as_container(), schema.root(), &confd_utils::Path::root(), &mut actions);
    exec::run(&actions, sid)
}

fn collect_validate(
    container: Option<&confd_tree::node::Container>,
    schema_node: &confd_schema::Node,
    path: &confd_utils::Path,
    out: &mut Vec<Action>,
) {
    let Some(container) = container else { return };
    if let Some(cmd) = &schema_node.hooks.validate {
        out.push(Action {
            path: path.clone(),
            kind: HookKind::Validate,
            command: cmd.clone(),
            priority: schema_node.effective_priority(),
            commit_action: CommitAction::Set,
        });
    }
    for child_schema in schema_node.children_in_order() {
        if matches!(child_schema.kind, confd_schema::NodeKind::Choice | confd_schema::NodeKind::Case) {
            collect_validate(Some(container), child_schema, path, out);
            continue;
        }
        let Some(child) = container.get(&child_schema.name) else { continue };
        match child_schema.kind {
            confd_schema::NodeKind::Container => {
                collect_validate(child.as_container(), child_schema, &path.push(child_schema.name.clone()), out);
            }
            confd_schema::NodeKind::List => {
                if let Some((_, entries)) = child.as_list() {
                    for (key, entry) in entries {
                        let entry_path = key.iter().fold(path.push(child_schema.name.clone()), |p, k| p.push(k.clone()));
                        collect_validate(entry.as_container(), child_schema, &entry_path, out);
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use confd_schema::fixtures::sample_schema;
    use confd_tree::Tree;
    use confd_utils::Path;

    use super::*;

    #[test]
    fn end_to_end_run_executes_hooks_for_a_new_container() {
        let schema = sample_schema();
        let before = Tree::new();
        let mut after = Tree::new();
        after.set_leaf(&schema, &Path::parse("c300/value"), Some("x")).unwrap();

        let output = run(&before, &after, &schema, "sid-1").unwrap();
        assert_eq!(output.out, "begin-c300\nend-c300\n");
    }

    #[test]
    fn run_validate_hooks_fires_regardless_of_change() {
        let mut schema_root = confd_schema::Node::new("", confd_schema::NodeKind::Container);
        schema_root.presence = true;
        let mut leaf = confd_schema::Node::new("x", confd_schema::NodeKind::Leaf);
        leaf.leaf_type = Some(confd_schema::node::LeafType::String { length: vec![], patterns: vec![] });
        leaf.hooks.validate = Some("echo validate-x".into());
        schema_root.add_child(leaf);
        let schema = Schema::new(schema_root);

        let mut after = Tree::new();
        after.set_leaf(&schema, &Path::parse("x"), Some("1")).unwrap();

        let output = run_validate_hooks(&after, &schema, "sid-1").unwrap();
        assert_eq!(output.out, "validate-x\n");
    }
}
