//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

//! The Validator (spec §4.F): operates on the post-edit Union View
//! (merged-with-defaults) and produces an ordered list of errors.

pub mod error;
pub mod types;

use confd_schema::node::Node as SchemaNode;
use confd_schema::{LeafType, NodeKind, Schema};
use confd_tree::{Container, Node, Tree};
use confd_utils::Path;
use confd_xpath::eval::{EvalContext, Value};
use confd_xpath::view::{TreeView, XView};

pub use error::{ErrorKind, ValidationError};

/// Validates `tree` (typically the merged-with-defaults Union View)
/// against `schema`, returning every violation found, sorted by path
/// (spec §4.H "Validation errors are reported in a stable order").
pub fn validate(tree: &Tree, schema: &Schema) -> Vec<ValidationError> {
    let view = TreeView { schema, tree };
    let mut errors = Vec::new();
    walk_container(
        tree.root().as_container(),
        schema.root(),
        &Path::root(),
        true,
        &view,
        &mut errors,
    );
    errors.sort_by(|a, b| a.path.to_string().cmp(&b.path.to_string()));
    errors
}

fn walk_container(
    container: Option<&Container>,
    schema_node: &SchemaNode,
    path: &Path,
    enclosing_presence: bool,
    view: &TreeView<'_>,
    errors: &mut Vec<ValidationError>,
) {
    for child_schema in schema_node.children_in_order() {
        if child_schema.kind == NodeKind::Choice {
            walk_choice(container, child_schema, path, enclosing_presence, view, errors);
            continue;
        }
        let child_path = path.push(child_schema.name.clone());
        let child_node = container.and_then(|c| c.get(&child_schema.name));
        walk_node(child_node, child_schema, &child_path, enclosing_presence, view, errors);
    }
}

/// Picks the active case (the one with any configured descendant) among
/// `choice_schema.cases()` and recurses into just that one, flattened
/// into the parent's namespace (spec §4.F "at most one case active").
/// Choice-level `mandatory` isn't modeled on [`confd_schema::Node`]
/// (that field is leaf/leaf-list-only) so it isn't enforced here — see
/// DESIGN.md.
fn walk_choice(
    container: Option<&Container>,
    choice_schema: &SchemaNode,
    path: &Path,
    enclosing_presence: bool,
    view: &TreeView<'_>,
    errors: &mut Vec<ValidationError>,
) {
    let active: Vec<&SchemaNode> = choice_schema
        .cases()
        .filter(|case| case_is_configured(container, case))
        .collect();
    if active.len() > 1 {
        let names: Vec<String> = active.iter().map(|c| c.name.clone()).collect();
        errors.push(ValidationError::new(
            path.clone(),
            ErrorKind::InvalidValue(format!("more than one case of choice \"{}\" active: {}", choice_schema.name, names.join(", "))),
        ));
    }
    if let Some(case) = active.first() {
        walk_container(container, case, path, enclosing_presence, view, errors);
    }
}

fn case_is_configured(container: Option<&Container>, case_schema: &SchemaNode) -> bool {
    case_schema.children_in_order().any(|child| {
        if child.kind == NodeKind::Choice {
            return child.cases().any(|c| case_is_configured(container, c));
        }
        container.and_then(|c| c.get(&child.name)).is_some()
    })
}

fn walk_node(
    node: Option<&Node>,
    schema_node: &SchemaNode,
    path: &Path,
    enclosing_presence: bool,
    view: &TreeView<'_>,
    errors: &mut Vec<ValidationError>,
) {
    check_must(node, schema_node, path, view, errors);
    check_when(node, schema_node, path, view, errors);

    match schema_node.kind {
        NodeKind::Leaf => {
            if let Some(value) = node.and_then(Node::as_leaf_value) {
                if let Some(leaf_type) = &schema_node.leaf_type {
                    if let Err(detail) = types::check(leaf_type, value) {
                        errors.push(
                            ValidationError::new(path.clone(), ErrorKind::InvalidValue(detail))
                                .with_message(schema_node.description.clone()),
                        );
                    }
                    if let LeafType::Leafref(target) = leaf_type {
                        if !leafref_resolves(target, path, value, view) {
                            errors.push(ValidationError::new(path.clone(), ErrorKind::LeafrefMissing(target.clone())));
                        }
                    }
                }
            } else if schema_node.mandatory && enclosing_presence {
                errors.push(ValidationError::new(path.clone(), ErrorKind::MissingMandatory));
            }
        }
        NodeKind::LeafList => {
            let values = node.and_then(Node::as_leaf_list).unwrap_or(&[]);
            if let Some(leaf_type) = &schema_node.leaf_type {
                for v in values {
                    if let Err(detail) = types::check(leaf_type, v) {
                        errors.push(ValidationError::new(path.clone(), ErrorKind::InvalidValue(detail)));
                    }
                }
            }
            check_cardinality(schema_node, values.len(), path, errors);
        }
        NodeKind::Container => {
            let next_presence = if schema_node.presence { node.is_some() } else { enclosing_presence };
            walk_container(node.and_then(Node::as_container), schema_node, path, next_presence, view, errors);
        }
        NodeKind::List => {
            let entries = node.and_then(Node::as_list).map(|(_, e)| e.as_slice()).unwrap_or(&[]);
            check_cardinality(schema_node, entries.len(), path, errors);
            check_unique(schema_node, entries, path, errors);
            for (keys, entry) in entries {
                let entry_path = keys.iter().fold(path.clone(), |p, k| p.push(k.clone()));
                walk_container(entry.as_container(), schema_node, &entry_path, true, view, errors);
            }
        }
        NodeKind::Choice | NodeKind::Case => unreachable!("handled by walk_choice/walk_container"),
    }
}

fn check_cardinality(schema_node: &SchemaNode, actual: usize, path: &Path, errors: &mut Vec<ValidationError>) {
    if let Some(min) = schema_node.min_elements {
        if actual < min as usize {
            errors.push(ValidationError::new(path.clone(), ErrorKind::TooFew { min, actual }));
        }
    }
    if let Some(max) = schema_node.max_elements {
        if actual > max as usize {
            errors.push(ValidationError::new(path.clone(), ErrorKind::TooMany { max, actual }));
        }
    }
}

/// For each `unique "a b c"` group, entries missing any referenced leaf
/// are excluded from comparison (spec §4.F "An entry where any
/// referenced leaf is absent is excluded").
fn check_unique(schema_node: &SchemaNode, entries: &[(Vec<String>, Node)], path: &Path, errors: &mut Vec<ValidationError>) {
    for group in &schema_node.unique {
        let mut seen: Vec<Vec<String>> = Vec::new();
        let mut clashed = false;
        for (_, entry) in entries {
            let Some(container) = entry.as_container() else { continue };
            let mut tuple = Vec::with_capacity(group.len());
            let mut complete = true;
            for rel in group {
                match leaf_value_at_relative(container, rel) {
                    Some(v) => tuple.push(v),
                    None => {
                        complete = false;
                        break;
                    }
                }
            }
            if !complete {
                continue;
            }
            if seen.contains(&tuple) {
                clashed = true;
            } else {
                seen.push(tuple);
            }
        }
        if clashed {
            errors.push(ValidationError::new(path.clone(), ErrorKind::NotUnique(group.clone())));
        }
    }
}

fn leaf_value_at_relative(container: &Container, relative: &str) -> Option<String> {
    let mut cur = container;
    let comps: Vec<&str> = relative.split('/').filter(|c| !c.is_empty()).collect();
    let (last, init) = comps.split_last()?;
    for name in init {
        cur = cur.get(name)?.as_container()?;
    }
    cur.get(last)?.as_leaf_value().map(str::to_owned)
}

fn check_must(node: Option<&Node>, schema_node: &SchemaNode, path: &Path, view: &TreeView<'_>, errors: &mut Vec<ValidationError>) {
    let _ = node;
    for constraint in &schema_node.must {
        let ctx = EvalContext { view, current: path.clone() };
        let ok = confd_xpath::eval_str(&constraint.expr, &ctx).map(|v| v.to_bool(view)).unwrap_or(false);
        if !ok {
            errors.push(
                ValidationError::new(path.clone(), ErrorKind::MustViolation(constraint.expr.clone()))
                    .with_message(constraint.error_message.clone()),
            );
        }
    }
}

fn check_when(node: Option<&Node>, schema_node: &SchemaNode, path: &Path, view: &TreeView<'_>, errors: &mut Vec<ValidationError>) {
    let Some(constraint) = &schema_node.when else { return };
    if node.is_none() {
        // A `when`-guarded node that doesn't exist trivially satisfies
        // the constraint; only an existing node can violate it.
        return;
    }
    let ctx = EvalContext { view, current: path.clone() };
    let ok = confd_xpath::eval_str(&constraint.expr, &ctx).map(|v| v.to_bool(view)).unwrap_or(false);
    if !ok {
        errors.push(
            ValidationError::new(path.clone(), ErrorKind::WhenViolation(constraint.expr.clone()))
                .with_message(constraint.error_message.clone()),
        );
    }
}

fn leafref_resolves(target_expr: &str, leaf_path: &Path, value: &str, view: &TreeView<'_>) -> bool {
    let ctx = EvalContext { view, current: leaf_path.clone() };
    match confd_xpath::eval_str(target_expr, &ctx) {
        Ok(Value::NodeSet(paths)) => paths
            .iter()
            .any(|p| view.exists(p) && view.leaf_value(p).as_deref() == Some(value)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confd_schema::fixtures::sample_schema;
    use confd_utils::Path;

    #[test]
    fn must_is_satisfied_once_y_is_set() {
        let schema = sample_schema();
        let mut tree = Tree::new();
        // `x`'s only child is `y`, so the non-presence container can
        // only ever come into existence already satisfying its own
        // "not(.) or y" guard — there's no way to construct "x present,
        // y absent" through ordinary tree operations with this fixture.
        // This still exercises `check_must` being invoked on an existing
        // node and finding it satisfied.
        tree.set_leaf(&schema, &Path::parse("x/y"), Some("")).unwrap();

        let errors = validate(&tree, &schema);
        assert!(!errors.iter().any(|e| matches!(e.kind, ErrorKind::MustViolation(_))));
    }

    #[test]
    fn mandatory_leaf_missing_in_present_presence_container() {
        let schema = sample_schema();
        let mut tree = Tree::new();
        tree.create_presence_container(&schema, &Path::parse("p")).unwrap();

        let errors = validate(&tree, &schema);
        assert!(errors.iter().any(|e| e.kind == ErrorKind::MissingMandatory && e.path == Path::parse("p/m")));
    }

    #[test]
    fn mandatory_leaf_not_required_when_presence_container_absent() {
        let schema = sample_schema();
        let tree = Tree::new();
        let errors = validate(&tree, &schema);
        assert!(!errors.iter().any(|e| e.path == Path::parse("p/m")));
    }

    #[test]
    fn unique_violation_detected_when_all_referenced_leaves_present() {
        let schema = sample_schema();
        let mut tree = Tree::new();
        let server = Path::parse("server");
        tree.create_list_entry(&schema, &server, &["s1".into(), "10.0.0.1".into()]).unwrap();
        tree.create_list_entry(&schema, &server, &["s2".into(), "10.0.0.2".into()]).unwrap();
        tree.set_leaf(&schema, &Path::parse("server/s1/10.0.0.1/port"), Some("1111")).unwrap();
        tree.set_leaf(&schema, &Path::parse("server/s2/10.0.0.2/port"), Some("1111")).unwrap();

        let errors = validate(&tree, &schema);
        assert!(errors.iter().any(|e| matches!(e.kind, ErrorKind::NotUnique(_))));
    }

    #[test]
    fn unique_ignores_entries_missing_a_referenced_leaf() {
        let schema = sample_schema();
        let mut tree = Tree::new();
        let server = Path::parse("server");
        tree.create_list_entry(&schema, &server, &["s1".into(), "10.0.0.1".into()]).unwrap();
        tree.create_list_entry(&schema, &server, &["s2".into(), "10.0.0.2".into()]).unwrap();
        tree.set_leaf(&schema, &Path::parse("server/s1/10.0.0.1/port"), Some("1111")).unwrap();
        // s2 has no port set at all: excluded from the unique comparison.

        let errors = validate(&tree, &schema);
        assert!(!errors.iter().any(|e| matches!(e.kind, ErrorKind::NotUnique(_))));
    }
}
