//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

//! Applies a parsed edit-config payload to a scratch copy of the
//! candidate, then decides whether to promote it based on `test-option`
//! and whether any failures occurred, per `error-option` (spec §4.J).

use confd_schema::node::Node as SchemaNode;
use confd_schema::{NodeKind, Schema};
use confd_tree::Tree;
use confd_utils::{Authorizer, Context, Path};
use confd_view::UnionView;

use crate::error::Error;
use crate::operation::{DefaultOperation, EffectiveOp, ErrorOption, TestOption};
use crate::xml::ConfigElement;

/// One authorized mutation, recorded the way the Action Runner accounts
/// for a shell-command invocation: `[set, a, b, c, ...]` or
/// `[delete, a, b, c, ...]` (spec §4.J, §6).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Accounted {
    Set(Path),
    Delete(Path),
}

impl Accounted {
    /// The `[set|delete, a, b, c, ...]` tuple form spec §4.J describes.
    pub fn command(&self) -> Vec<String> {
        let (tag, path) = match self {
            Accounted::Set(path) => ("set", path),
            Accounted::Delete(path) => ("delete", path),
        };
        std::iter::once(tag.to_owned()).chain(path.components().iter().cloned()).collect()
    }
}

pub struct EditConfigOutcome {
    pub accounted: Vec<Accounted>,
    /// Every failure encountered: apply-time errors plus, for
    /// `test-only`/`test-then-set`, any post-apply validation errors.
    pub errors: Vec<String>,
    /// Whether `candidate` was updated. False for `test-only`, for a
    /// failed `test-then-set`, and for any run under `rollback-on-error`
    /// that hit a failure.
    pub promoted: bool,
}

struct ApplyState {
    error_option: ErrorOption,
    accounted: Vec<Accounted>,
    errors: Vec<String>,
    aborted: bool,
}

impl ApplyState {
    fn fail(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        if !matches!(self.error_option, ErrorOption::ContinueOnError) {
            self.aborted = true;
        }
    }
}

/// Runs one edit-config request against `candidate`, leaving it
/// untouched unless the request both succeeds (per `error_option`) and
/// `test_option` calls for promotion.
pub fn edit_config(
    ctx: &Context,
    candidate: &mut Tree,
    running: &Tree,
    schema: &Schema,
    authorizer: &dyn Authorizer,
    xml: &str,
    default_operation: DefaultOperation,
    test_option: TestOption,
    error_option: ErrorOption,
) -> Result<EditConfigOutcome, Error> {
    let roots = crate::xml::parse(xml)?;

    let mut working = candidate.clone();
    let mut state = ApplyState { error_option, accounted: Vec::new(), errors: Vec::new(), aborted: false };

    {
        let mut view = UnionView::new(&mut working, running, schema, authorizer);
        for element in &roots {
            if state.aborted {
                break;
            }
            apply_top_level(ctx, &mut view, schema, element, default_operation, &mut state);
        }
    }

    let rollback_to_entry = matches!(error_option, ErrorOption::RollbackOnError) && !state.errors.is_empty();

    let validation_errors = if matches!(test_option, TestOption::TestOnly | TestOption::TestThenSet) {
        let merged = Tree::merge_without_defaults(&working, running, schema);
        confd_validate::validate(&merged, schema)
    } else {
        Vec::new()
    };

    let promoted = match test_option {
        TestOption::TestOnly => false,
        TestOption::Set => !rollback_to_entry,
        TestOption::TestThenSet => !rollback_to_entry && state.errors.is_empty() && validation_errors.is_empty(),
    };

    if promoted {
        *candidate = working;
    }

    let mut errors = state.errors;
    errors.extend(validation_errors.iter().map(|e| e.to_string()));

    Ok(EditConfigOutcome { accounted: state.accounted, errors, promoted })
}

/// Resolves a top-level element's namespace to a loaded module before
/// descending. A schema node that declares no owning module doesn't
/// require one on its element either; a schema node that does requires a
/// matching namespace, silently dropping the element on a mismatch and
/// failing outright when the element carries no namespace at all (spec
/// §4.J).
fn apply_top_level(
    ctx: &Context,
    view: &mut UnionView<'_>,
    schema: &Schema,
    element: &ConfigElement,
    default_operation: DefaultOperation,
    state: &mut ApplyState,
) {
    let Some(schema_node) = schema.root().children_in_order().find(|n| n.name == element.local_name) else {
        return;
    };

    if let Some(module) = &schema_node.module {
        match &element.namespace {
            None => {
                state.fail(Error::UnresolvedNamespace(element.local_name.clone()).to_string());
                return;
            }
            Some(ns) if ns != module => return,
            Some(_) => {}
        }
    }

    apply_element(ctx, view, schema_node, &Path::root(), element, default_operation, state);
}

/// Applies one element (and recursively its children) under `parent_path`.
fn apply_element(
    ctx: &Context,
    view: &mut UnionView<'_>,
    schema_node: &SchemaNode,
    parent_path: &Path,
    element: &ConfigElement,
    default_operation: DefaultOperation,
    state: &mut ApplyState,
) {
    if schema_node.kind == NodeKind::List {
        apply_list_entry(ctx, view, schema_node, parent_path, element, default_operation, state);
        return;
    }

    let path = parent_path.push(schema_node.name.clone());
    let effective = EffectiveOp::resolve(element.operation, default_operation);

    if schema_node.kind == NodeKind::Leaf || schema_node.kind == NodeKind::LeafList {
        apply_leaf(ctx, view, schema_node, &path, element, effective, state);
        return;
    }

    // Container. `create`/`delete`/`remove`/`replace` act on the
    // container's own presence (meaningless for a non-presence
    // container, which is only ever implicitly present); every kind
    // still recurses into children so a `replace` on an ancestor still
    // lets descendants carry their own explicit operations, same as
    // `merge`.
    match effective {
        EffectiveOp::Delete => {
            account_delete(view, state, ctx, &path, false);
            return;
        }
        EffectiveOp::Remove => {
            account_delete(view, state, ctx, &path, true);
            return;
        }
        EffectiveOp::Replace if schema_node.presence => {
            account_delete(view, state, ctx, &path, true);
            if state.aborted {
                return;
            }
            account_set(view, state, ctx, &path, None);
        }
        EffectiveOp::Create if schema_node.presence => {
            if !exists_or_fail(view, state, ctx, &path) {
                return;
            }
            account_set(view, state, ctx, &path, None);
        }
        EffectiveOp::Merge if schema_node.presence => {
            account_set(view, state, ctx, &path, None);
        }
        _ => {}
    }

    if state.aborted {
        return;
    }

    for child in &element.children {
        if state.aborted {
            return;
        }
        let Some(child_schema) = schema_node.resolve_child(&child.local_name) else {
            continue;
        };
        apply_element(ctx, view, child_schema, &path, child, default_operation, state);
    }
}

fn apply_leaf(
    ctx: &Context,
    view: &mut UnionView<'_>,
    schema_node: &SchemaNode,
    path: &Path,
    element: &ConfigElement,
    effective: EffectiveOp,
    state: &mut ApplyState,
) {
    match (schema_node.kind, effective) {
        (_, EffectiveOp::Transparent) => {}
        (NodeKind::LeafList, EffectiveOp::Delete | EffectiveOp::Remove) => {
            if let Some(value) = &element.text {
                match view.leaf_list_remove(ctx, path, value) {
                    Ok(()) => state.accounted.push(Accounted::Delete(path.clone())),
                    Err(confd_view::Error::Tree(confd_tree::Error::NodeDoesntExist(_)))
                        if effective == EffectiveOp::Remove => {}
                    Err(e) => state.fail(e.to_string()),
                }
            }
        }
        (_, EffectiveOp::Delete) => account_delete(view, state, ctx, path, false),
        (_, EffectiveOp::Remove) => account_delete(view, state, ctx, path, true),
        (_, EffectiveOp::Create) => {
            if exists_or_fail(view, state, ctx, path) {
                account_set(view, state, ctx, path, element.text.as_deref());
            }
        }
        (_, EffectiveOp::Replace | EffectiveOp::Merge) => {
            account_set(view, state, ctx, path, element.text.as_deref());
        }
    }
}

/// A list entry's key leaves address the entry rather than behaving as
/// ordinary child leaves: their values build the entry's path, and any
/// `xc:operation` on the key element itself is ignored in favor of the
/// entry's own effective operation (spec §4.J "Applying operation to a
/// list key leaf ... is silently ignored").
fn apply_list_entry(
    ctx: &Context,
    view: &mut UnionView<'_>,
    schema_node: &SchemaNode,
    parent_path: &Path,
    element: &ConfigElement,
    default_operation: DefaultOperation,
    state: &mut ApplyState,
) {
    let list_path = parent_path.push(schema_node.name.clone());
    let mut key_values = Vec::with_capacity(schema_node.keys.len());
    for key in &schema_node.keys {
        let Some(key_element) = element.children.iter().find(|c| &c.local_name == key) else {
            state.fail(format!("list entry '{}' is missing its key leaf '{}'", schema_node.name, key));
            return;
        };
        key_values.push(key_element.text.clone().unwrap_or_default());
    }
    let entry_path = key_values.iter().fold(list_path, |p, v| p.push(v.clone()));

    let effective = EffectiveOp::resolve(element.operation, default_operation);

    match effective {
        EffectiveOp::Delete => {
            account_delete(view, state, ctx, &entry_path, false);
            return;
        }
        EffectiveOp::Remove => {
            account_delete(view, state, ctx, &entry_path, true);
            return;
        }
        EffectiveOp::Replace => {
            // Full delete-then-recreate, uniformly with every other node
            // kind (see DESIGN.md for why list replacement isn't given a
            // narrower, field-preserving treatment).
            account_delete(view, state, ctx, &entry_path, true);
            if state.aborted {
                return;
            }
            account_set(view, state, ctx, &entry_path, None);
        }
        EffectiveOp::Create => {
            if !exists_or_fail(view, state, ctx, &entry_path) {
                return;
            }
            account_set(view, state, ctx, &entry_path, None);
        }
        EffectiveOp::Merge => account_set(view, state, ctx, &entry_path, None),
        EffectiveOp::Transparent => {}
    }

    if state.aborted {
        return;
    }

    for child in &element.children {
        if state.aborted {
            return;
        }
        if schema_node.keys.iter().any(|k| k == &child.local_name) {
            continue;
        }
        let Some(child_schema) = schema_node.resolve_child(&child.local_name) else {
            continue;
        };
        apply_element(ctx, view, child_schema, &entry_path, child, default_operation, state);
    }
}

/// `true` if `path` is absent so the caller may proceed with a `create`;
/// records the failure and returns `false` otherwise (whether because it
/// already exists or because the existence check itself errored).
fn exists_or_fail(view: &mut UnionView<'_>, state: &mut ApplyState, ctx: &Context, path: &Path) -> bool {
    match view.exists(ctx, path, false) {
        Ok(true) => {
            state.fail(confd_tree::Error::NodeExists(path.clone()).to_string());
            false
        }
        Ok(false) => true,
        Err(e) => {
            state.fail(e.to_string());
            false
        }
    }
}

fn account_set(view: &mut UnionView<'_>, state: &mut ApplyState, ctx: &Context, path: &Path, value: Option<&str>) {
    match view.set(ctx, path, value) {
        Ok(_) => state.accounted.push(Accounted::Set(path.clone())),
        Err(e) => state.fail(e.to_string()),
    }
}

/// Deletes `path`, recording the mutation. `tolerate_absent` makes a
/// missing node a no-op instead of a failure, matching `remove`'s
/// NETCONF semantics (and `replace`'s "delete if present" half).
fn account_delete(view: &mut UnionView<'_>, state: &mut ApplyState, ctx: &Context, path: &Path, tolerate_absent: bool) {
    match view.delete(ctx, path) {
        Ok(()) => state.accounted.push(Accounted::Delete(path.clone())),
        Err(confd_view::Error::Tree(confd_tree::Error::NodeDoesntExist(_))) if tolerate_absent => {}
        Err(e) => state.fail(e.to_string()),
    }
}
