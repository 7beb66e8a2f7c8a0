//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use confd_schema::{NodeKind, Schema};
use confd_tree::{Node, Tree};
use confd_utils::{AuthzOp, Authorizer, Context, Path, PathAttrs};

use crate::error::Error;

/// Constructed per request from `(candidate, running, schema, authorizer)`
/// (spec §4.C). All externally visible reads and writes go through this;
/// nothing else touches `candidate` directly once a session hands out a
/// view.
pub struct UnionView<'a> {
    candidate: &'a mut Tree,
    running: &'a Tree,
    schema: &'a Schema,
    authorizer: &'a dyn Authorizer,
}

impl<'a> UnionView<'a> {
    pub fn new(
        candidate: &'a mut Tree,
        running: &'a Tree,
        schema: &'a Schema,
        authorizer: &'a dyn Authorizer,
    ) -> Self {
        UnionView { candidate, running, schema, authorizer }
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    pub fn running(&self) -> &Tree {
        self.running
    }

    pub fn candidate(&self) -> &Tree {
        self.candidate
    }

    /// The merged view candidate-over-running (spec §4.B `Merge`).
    pub fn merged(&self, include_defaults: bool) -> Tree {
        Tree::merge(self.candidate, self.running, self.schema, include_defaults)
    }

    fn exists_without_defaults(&self, path: &Path) -> Result<bool, Error> {
        Ok(Tree::merge_without_defaults(self.candidate, self.running, self.schema).exists(self.schema, path)?)
    }

    /// True if `ctx` may perform `op` at `path`, with the `configd-internal`
    /// bypass and the `read_secrets` capability folded in (spec §4.I
    /// "Authorization", §9 "Authorizer").
    fn authorized(&self, ctx: &Context, op: AuthzOp, path: &Path, attrs: &PathAttrs) -> bool {
        if ctx.is_internal() {
            return true;
        }
        if op == AuthzOp::Read && attrs.is_secret() && !self.authorizer.read_secrets(ctx) {
            return false;
        }
        self.authorizer.authorize(ctx, op, path, attrs)
    }

    /// **Get/Exists** honor authorizer reads; hidden nodes appear absent
    /// (spec §4.C).
    pub fn exists(&self, ctx: &Context, path: &Path, include_defaults: bool) -> Result<bool, Error> {
        let attrs = self.schema.attrs_for_path(path);
        if !self.authorized(ctx, AuthzOp::Read, path, &attrs) {
            return Ok(false);
        }
        Ok(self.merged(include_defaults).exists(self.schema, path)?)
    }

    /// Returns `None` both for an absent node and for one the caller isn't
    /// authorized to read — the two are indistinguishable from outside
    /// (spec §4.C).
    pub fn get(&self, ctx: &Context, path: &Path, include_defaults: bool) -> Result<Option<Node>, Error> {
        let attrs = self.schema.attrs_for_path(path);
        if !self.authorized(ctx, AuthzOp::Read, path, &attrs) {
            return Ok(None);
        }
        match self.merged(include_defaults).get(self.schema, path) {
            Ok(node) => Ok(Some(node.clone())),
            Err(confd_tree::Error::NodeDoesntExist(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// `Descendant(path)`: a schema-validated sub-path, or
    /// `UnknownElementApplicationError` (spec §4.C).
    pub fn descendant(&self, path: &Path) -> Result<(), Error> {
        self.schema.validate(path, false)?;
        Ok(())
    }

    /// **Set** honors create vs update based on whether the node already
    /// exists excluding implicit defaults (spec §4.C). Returns which one
    /// it turned out to be, for the caller's accounting command tuple.
    pub fn set(&mut self, ctx: &Context, path: &Path, value: Option<&str>) -> Result<AuthzOp, Error> {
        let snode = self
            .schema
            .descendant(path)
            .ok_or_else(|| confd_schema::Error::UnknownElement(path.clone()))?;
        let attrs = self.schema.attrs_for_path(path);
        let existed = self.exists_without_defaults(path)?;
        let op = if existed { AuthzOp::Update } else { AuthzOp::Create };
        if !self.authorized(ctx, op, path, &attrs) {
            return Err(Error::AccessDenied(path.clone()));
        }

        self.ensure_ancestors(path)?;
        match snode.kind {
            NodeKind::Leaf => self.candidate.set_leaf(self.schema, path, value)?,
            NodeKind::LeafList => {
                let v = value.ok_or_else(|| confd_schema::Error::UnknownElement(path.clone()))?;
                self.candidate.leaf_list_insert(self.schema, path, v)?;
            }
            NodeKind::Container if snode.presence => {
                if !self.candidate.exists(self.schema, path)? {
                    self.candidate.create_presence_container(self.schema, path)?;
                }
            }
            NodeKind::List => {
                // `ensure_ancestors` walks the whole path, so a bare list
                // entry target is already created by the time we get here.
            }
            _ => return Err(confd_schema::Error::UnknownElement(path.clone()).into()),
        }
        Ok(op)
    }

    /// Appends a value to a leaf-list without disturbing existing ones
    /// (spec §4.B `leaf_list_insert`, surfaced here with authorization).
    pub fn leaf_list_insert(&mut self, ctx: &Context, path: &Path, value: &str) -> Result<(), Error> {
        self.set(ctx, path, Some(value)).map(|_| ())
    }

    /// Removes one value from a leaf-list, leaving the rest (distinct from
    /// [`UnionView::delete`], which removes the whole node).
    pub fn leaf_list_remove(&mut self, ctx: &Context, path: &Path, value: &str) -> Result<(), Error> {
        let attrs = self.schema.attrs_for_path(path);
        if !self.authorized(ctx, AuthzOp::Delete, path, &attrs) {
            return Err(Error::AccessDenied(path.clone()));
        }
        if !self.candidate.exists(self.schema, path)? && self.running.exists(self.schema, path)? {
            // Only running carries this leaf-list so far: materialize its
            // current values in candidate before removing one, the same
            // way a leaf delete falls back to a tombstone.
            if let Ok(node) = self.running.get(self.schema, path) {
                if let Some(values) = node.as_leaf_list() {
                    for v in values {
                        self.candidate.leaf_list_insert(self.schema, path, v)?;
                    }
                }
            }
        }
        self.candidate.leaf_list_remove(self.schema, path, value)?;
        Ok(())
    }

    /// **Delete** recurses; deleting a non-presence container only removes
    /// it in the sense that it collapses once its last meaningful child is
    /// gone (spec §4.C) — the tombstone mechanism already gives this for
    /// free, since an emptied non-presence container vanishes from the
    /// merged view regardless of why it emptied (spec §4.B `merge_node`).
    ///
    /// Deleting a leaf that only exists as an inherited default fails
    /// (spec §4.C policy, §8 "Default invisibility", §9 open question).
    pub fn delete(&mut self, ctx: &Context, path: &Path) -> Result<(), Error> {
        let attrs = self.schema.attrs_for_path(path);
        if !self.authorized(ctx, AuthzOp::Delete, path, &attrs) {
            return Err(Error::AccessDenied(path.clone()));
        }
        if !self.exists_without_defaults(path)? {
            return Err(confd_tree::Error::NodeDoesntExist(path.clone()).into());
        }
        self.candidate.mark_deleted(self.schema, path)?;
        Ok(())
    }

    /// Auto-vivifies presence containers and list entries along `path`'s
    /// ancestor chain in candidate (non-presence containers already
    /// auto-vivify inside [`confd_tree::Tree::set_leaf`] itself). Config
    /// Tree deliberately never does this on its own (spec §3's presence
    /// invariant is strict at that layer); the Union View is where NETCONF
    /// -style "setting a deep leaf just works" ergonomics live.
    fn ensure_ancestors(&mut self, path: &Path) -> Result<(), Error> {
        let comps = path.components();
        let mut schema_node = self.schema.root();
        let mut i = 0;
        while i < comps.len() {
            let name = &comps[i];
            let child_schema = schema_node
                .resolve_child(name)
                .ok_or_else(|| confd_schema::Error::UnknownElement(path.clone()))?;
            i += 1;
            let node_path = Path::from_components(comps[..i].iter().cloned());

            if child_schema.kind == NodeKind::List {
                let nkeys = child_schema.keys.len();
                if comps.len() - i < nkeys {
                    return Err(confd_schema::Error::UnknownElement(path.clone()).into());
                }
                let key_values = comps[i..i + nkeys].to_vec();
                i += nkeys;
                let entry_path = Path::from_components(comps[..i].iter().cloned());
                if !self.candidate.exists(self.schema, &entry_path)? {
                    self.candidate.create_list_entry(self.schema, &node_path, &key_values)?;
                }
            } else if child_schema.kind == NodeKind::Container && child_schema.presence {
                if !self.candidate.exists(self.schema, &node_path)? {
                    self.candidate.create_presence_container(self.schema, &node_path)?;
                }
            }
            schema_node = child_schema;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confd_schema::fixtures::sample_schema;
    use confd_utils::AllowAllAuthorizer;

    #[test]
    fn set_auto_vivifies_list_entry_and_presence_container() {
        let schema = sample_schema();
        let running = Tree::new();
        let mut candidate = Tree::new();
        let authz = AllowAllAuthorizer;
        let ctx = Context::internal();

        {
            let mut view = UnionView::new(&mut candidate, &running, &schema, &authz);
            let op = view.set(&ctx, &Path::parse("protocols/ospf/area/0/area-id"), Some("0")).unwrap();
            assert_eq!(op, AuthzOp::Create);
            view.set(&ctx, &Path::parse("p/m"), Some("x")).unwrap();
        }
        assert!(candidate.exists(&schema, &Path::parse("protocols/ospf/area/0")).unwrap());
        assert!(candidate.exists(&schema, &Path::parse("p")).unwrap());
    }

    #[test]
    fn set_reports_update_for_existing_running_value() {
        let schema = sample_schema();
        let mut running = Tree::new();
        running.set_leaf(&schema, &Path::parse("mtu"), Some("9000")).unwrap();
        let mut candidate = Tree::new();
        let authz = AllowAllAuthorizer;
        let ctx = Context::internal();

        let mut view = UnionView::new(&mut candidate, &running, &schema, &authz);
        let op = view.set(&ctx, &Path::parse("mtu"), Some("1400")).unwrap();
        assert_eq!(op, AuthzOp::Update);
    }

    #[test]
    fn delete_default_only_leaf_fails() {
        let schema = sample_schema();
        let running = Tree::new();
        let mut candidate = Tree::new();
        let authz = AllowAllAuthorizer;
        let ctx = Context::internal();

        let mut view = UnionView::new(&mut candidate, &running, &schema, &authz);
        let err = view.delete(&ctx, &Path::parse("mtu")).unwrap_err();
        assert!(matches!(err, Error::Tree(confd_tree::Error::NodeDoesntExist(_))));
    }

    #[test]
    fn delete_of_only_child_prunes_np_container_from_merged_view() {
        let schema = sample_schema();
        let mut running = Tree::new();
        running.set_leaf(&schema, &Path::parse("x/y"), Some("")).unwrap();
        let mut candidate = Tree::new();
        let authz = AllowAllAuthorizer;
        let ctx = Context::internal();

        let mut view = UnionView::new(&mut candidate, &running, &schema, &authz);
        view.delete(&ctx, &Path::parse("x/y")).unwrap();
        assert!(!view.exists(&ctx, &Path::parse("x"), false).unwrap());
    }

    #[test]
    fn read_denied_hides_node_instead_of_erroring() {
        struct DenyAll;
        impl Authorizer for DenyAll {
            fn read(&self, _: &Context, _: &Path, _: &PathAttrs) -> bool {
                false
            }
            fn create(&self, _: &Context, _: &Path, _: &PathAttrs) -> bool {
                true
            }
            fn update(&self, _: &Context, _: &Path, _: &PathAttrs) -> bool {
                true
            }
            fn delete(&self, _: &Context, _: &Path, _: &PathAttrs) -> bool {
                true
            }
            fn read_secrets(&self, _: &Context) -> bool {
                false
            }
        }

        let schema = sample_schema();
        let mut running = Tree::new();
        running.set_leaf(&schema, &Path::parse("mtu"), Some("9000")).unwrap();
        let mut candidate = Tree::new();
        let authz = DenyAll;
        let ctx = Context::new(1, 1, vec![]);

        let view = UnionView::new(&mut candidate, &running, &schema, &authz);
        assert!(!view.exists(&ctx, &Path::parse("mtu"), false).unwrap());
        assert!(view.get(&ctx, &Path::parse("mtu"), false).unwrap().is_none());
    }
}
