//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod ast;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod view;

pub use error::Error;
pub use eval::{evaluate, EvalContext, Value};
pub use view::{TreeView, XView};

use confd_utils::Path;

/// Parses and evaluates `expr` against `ctx` in one call, the entry
/// point `confd-validate` uses for `must`/`when` checks (spec §4.E).
pub fn eval_str(expr: &str, ctx: &EvalContext<'_>) -> Result<Value, Error> {
    let parsed = ast::parse(expr)?;
    evaluate(&parsed, ctx)
}

/// Convenience wrapper returning just the boolean truth value (spec
/// §4.F's `must`/`when` contract only ever needs this).
pub fn eval_bool(expr: &str, view: &dyn XView, current: &Path) -> Result<bool, Error> {
    let ctx = EvalContext { view, current: current.clone() };
    Ok(eval_str(expr, &ctx)?.to_bool(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use confd_schema::fixtures::sample_schema;
    use confd_tree::Tree;

    #[test]
    fn must_guard_rejects_x_without_y() {
        let schema = sample_schema();
        let tree = Tree::new();
        let view = TreeView { schema: &schema, tree: &tree };
        // "not(.) or y" attached to x, evaluated with x as context: x is
        // absent so `.` is false-y and the guard passes trivially.
        assert!(eval_bool("not(.) or y", &view, &Path::parse("x")).unwrap());
    }

    #[test]
    fn must_guard_requires_y_once_x_is_set() {
        let schema = sample_schema();
        let mut tree = Tree::new();
        tree.set_leaf(&schema, &Path::parse("x/y"), Some("")).unwrap();
        let view = TreeView { schema: &schema, tree: &tree };
        assert!(eval_bool("not(.) or y", &view, &Path::parse("x")).unwrap());
    }

    #[test]
    fn predicate_selects_list_entry_by_key() {
        let schema = sample_schema();
        let mut tree = Tree::new();
        tree.create_list_entry(&schema, &Path::parse("protocols/ospf/area"), &["0".into()])
            .unwrap();
        tree.create_list_entry(&schema, &Path::parse("protocols/ospf/area"), &["1".into()])
            .unwrap();
        let view = TreeView { schema: &schema, tree: &tree };
        let ctx = EvalContext { view: &view, current: Path::root() };
        let v = eval_str("count(protocols/ospf/area[area-id='1'])", &ctx).unwrap();
        assert_eq!(v.to_num(&view), 1.0);
    }

    #[test]
    fn starts_with_and_substring_functions() {
        let schema = sample_schema();
        let tree = Tree::new();
        let view = TreeView { schema: &schema, tree: &tree };
        let ctx = EvalContext { view: &view, current: Path::root() };
        assert!(eval_str("starts-with('10.0.0.0/24', '10.0')", &ctx).unwrap().to_bool(&view));
        let v = eval_str("substring-after('10.0.0.0/24', '/')", &ctx).unwrap();
        assert_eq!(v.to_text(&view), "24");
    }
}
