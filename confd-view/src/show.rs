//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use confd_schema::{Node as SchemaNode, NodeKind, Schema};
use confd_tree::Node;

/// Renders a merged tree node as the canonical indented text format (spec
/// §6): tab-indented curly-brace blocks, `leaf value` lines (quoted when
/// the value contains whitespace or a special character), secret leaves
/// shown as `"********"` unless `force_show` is set, list entries shown as
/// `name key1 key2 { ... }`.
pub fn show(node: &Node, schema_node: &SchemaNode, force_show: bool) -> String {
    let mut out = String::new();
    show_container_children(node, schema_node, force_show, 0, &mut out);
    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

fn show_container_children(node: &Node, schema_node: &SchemaNode, force_show: bool, depth: usize, out: &mut String) {
    let Some(container) = node.as_container() else { return };
    for child_schema in schema_node.children_in_order() {
        if matches!(child_schema.kind, NodeKind::Choice | NodeKind::Case) {
            show_container_children(node, child_schema, force_show, depth, out);
            continue;
        }
        let Some(child) = container.get(&child_schema.name) else { continue };
        show_node(child, child_schema, force_show, depth, out);
    }
}

fn show_node(node: &Node, schema_node: &SchemaNode, force_show: bool, depth: usize, out: &mut String) {
    match schema_node.kind {
        NodeKind::Leaf => {
            indent(out, depth);
            let value = if schema_node.secret && !force_show {
                "\"********\"".to_string()
            } else {
                quote_if_needed(node.as_leaf_value().unwrap_or(""))
            };
            out.push_str(&schema_node.name);
            if !value.is_empty() {
                out.push(' ');
                out.push_str(&value);
            }
            out.push('\n');
        }
        NodeKind::LeafList => {
            let values = node.as_leaf_list().unwrap_or(&[]);
            for v in values {
                indent(out, depth);
                out.push_str(&schema_node.name);
                out.push(' ');
                out.push_str(&quote_if_needed(v));
                out.push('\n');
            }
        }
        NodeKind::Container => {
            indent(out, depth);
            out.push_str(&schema_node.name);
            out.push_str(" {\n");
            show_container_children(node, schema_node, force_show, depth + 1, out);
            indent(out, depth);
            out.push_str("}\n");
        }
        NodeKind::List => {
            let Some((_, entries)) = node.as_list() else { return };
            for (keys, entry) in entries {
                indent(out, depth);
                out.push_str(&schema_node.name);
                for k in keys {
                    out.push(' ');
                    out.push_str(&quote_if_needed(k));
                }
                out.push_str(" {\n");
                show_container_children(entry, schema_node, force_show, depth + 1, out);
                indent(out, depth);
                out.push_str("}\n");
            }
        }
        NodeKind::Choice | NodeKind::Case => unreachable!("transparent nodes are flattened by the caller"),
    }
}

/// Quotes `value` in double quotes, escaping embedded quotes/backslashes,
/// whenever it contains whitespace, braces or quote characters — anything
/// that would otherwise be ambiguous in the block syntax.
fn quote_if_needed(value: &str) -> String {
    let needs_quoting = value.is_empty()
        || value.chars().any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '"' | '\\'));
    if !needs_quoting {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use confd_schema::fixtures::sample_schema;
    use confd_tree::Tree;
    use confd_utils::Path;

    #[test]
    fn show_redacts_secret_unless_forced() {
        let schema = sample_schema();
        let mut tree = Tree::new();
        tree.set_leaf(&schema, &Path::parse("password"), Some("hunter2")).unwrap();

        let rendered = show(tree.root(), schema.root(), false);
        assert!(rendered.contains("password \"********\""));
        assert!(!rendered.contains("hunter2"));

        let forced = show(tree.root(), schema.root(), true);
        assert!(forced.contains("password hunter2"));
    }

    #[test]
    fn show_renders_list_entry_as_keyed_block() {
        let schema = sample_schema();
        let mut tree = Tree::new();
        let area = Path::parse("protocols/ospf/area");
        tree.create_list_entry(&schema, &area, &["0".into()]).unwrap();
        tree.leaf_list_insert(&schema, &Path::parse("protocols/ospf/area/0/network"), "10.0.0.0/24").unwrap();

        let rendered = show(tree.root(), schema.root(), false);
        assert!(rendered.contains("area 0 {"));
        assert!(rendered.contains("network 10.0.0.0/24"));
    }

    #[test]
    fn show_quotes_values_with_whitespace() {
        assert_eq!(quote_if_needed("hello world"), "\"hello world\"");
        assert_eq!(quote_if_needed("plain"), "plain");
        assert_eq!(quote_if_needed(""), "\"\"");
    }
}
