//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use confd_schema::Schema;
use confd_utils::Path;

/// What the evaluator needs from whatever tree it's pointed at (spec
/// §4.E: evaluation happens "against the Union View merged-with-defaults
/// view augmented by any ephemeral node"). `confd-view` implements this
/// over its merged tree; tests implement it directly over a bare
/// [`confd_tree::Tree`].
pub trait XView {
    fn schema(&self) -> &Schema;
    fn exists(&self, path: &Path) -> bool;
    fn leaf_value(&self, path: &Path) -> Option<String>;
    fn leaf_list_values(&self, path: &Path) -> Vec<String>;
    /// Key tuples of every entry of the list at `list_path`.
    fn list_entry_keys(&self, list_path: &Path) -> Vec<Vec<String>>;
}

/// A minimal [`XView`] over a bare `(Schema, Tree)` pair, with no
/// candidate/running overlay or ephemeral-node augmentation. Used by
/// this crate's own tests and by callers that already hold a
/// fully-merged [`confd_tree::Tree`].
pub struct TreeView<'a> {
    pub schema: &'a Schema,
    pub tree: &'a confd_tree::Tree,
}

impl<'a> XView for TreeView<'a> {
    fn schema(&self) -> &Schema {
        self.schema
    }

    fn exists(&self, path: &Path) -> bool {
        self.tree.exists(self.schema, path).unwrap_or(false)
    }

    fn leaf_value(&self, path: &Path) -> Option<String> {
        self.tree
            .get(self.schema, path)
            .ok()
            .and_then(|n| n.as_leaf_value())
            .map(str::to_owned)
    }

    fn leaf_list_values(&self, path: &Path) -> Vec<String> {
        self.tree
            .get(self.schema, path)
            .ok()
            .and_then(|n| n.as_leaf_list())
            .map(|v| v.to_vec())
            .unwrap_or_default()
    }

    fn list_entry_keys(&self, list_path: &Path) -> Vec<Vec<String>> {
        self.tree
            .get(self.schema, list_path)
            .ok()
            .and_then(|n| n.as_list())
            .map(|(_, entries)| entries.iter().map(|(k, _)| k.clone()).collect())
            .unwrap_or_default()
    }
}
