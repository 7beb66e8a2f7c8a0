//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use confd_utils::{Path, PathAttr, PathAttrs};

use crate::node::Node;

/// Errors raised while resolving a path against the compiled schema (spec
/// §4.A, and the `UnknownElementApplicationError` of §4.B/§7).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    UnknownElement(Path),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnknownElement(path) => {
                write!(f, "unknown schema element: {path}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// The compiled, process-wide, read-only data model (spec §4.A).
///
/// A real deployment loads this once at startup from the YANG toolchain's
/// output; that compiler is out of scope (spec §1). `Schema` is populated
/// programmatically (see [`crate::builder`]) or deserialized from a
/// bundled schema document, and never mutates afterwards.
#[derive(Clone, Debug)]
pub struct Schema {
    root: Node,
}

impl Schema {
    pub fn new(root: Node) -> Self {
        Schema { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Resolves `path` to its schema node, consuming key-value components
    /// for every list traversed. Returns `None` if any component doesn't
    /// match, or the path ends mid-way through a list's key components.
    pub fn descendant(&self, path: &Path) -> Option<&Node> {
        let (node, consumed) = self.resolve(path.components())?;
        if consumed == path.components().len() {
            Some(node)
        } else {
            None
        }
    }

    /// Structural validation of a single path (spec §4.A `Validate`). When
    /// `allow_incomplete` is set, a path that ends exactly at a list name
    /// before its key components are supplied is accepted (used while
    /// descending an XML edit-config subtree one element at a time).
    pub fn validate(&self, path: &Path, allow_incomplete: bool) -> Result<(), Error> {
        match self.resolve(path.components()) {
            Some((_, consumed)) if consumed == path.components().len() => Ok(()),
            Some(_) if allow_incomplete => Ok(()),
            _ => Err(Error::UnknownElement(path.clone())),
        }
    }

    /// Per-element secret flags for `path` (spec §4.A `AttrsForPath`).
    /// Only the final element's own `secret` extension is considered;
    /// earlier elements are never secret-bearing in this schema (secrets
    /// are always leaf values).
    pub fn attrs_for_path(&self, path: &Path) -> PathAttrs {
        let secret = self.descendant(path).is_some_and(|n| n.secret);
        let mut attrs = vec![PathAttr::default(); path.len()];
        if let Some(last) = attrs.last_mut() {
            last.secret = secret;
        }
        PathAttrs::new(attrs)
    }

    /// Walks `components`, consuming one schema child per name and, for
    /// lists, an additional `keys.len()` raw components for the entry's
    /// key values. Returns the node reached and how many components were
    /// consumed to get there.
    fn resolve<'s>(&'s self, components: &[String]) -> Option<(&'s Node, usize)> {
        let mut cur = &self.root;
        let mut i = 0;
        while i < components.len() {
            let child = cur.resolve_child(&components[i])?;
            i += 1;
            cur = child;
            if child.kind == crate::node::NodeKind::List {
                let nkeys = child.keys.len();
                let remaining = components.len() - i;
                if remaining < nkeys {
                    // Incomplete: stop right at the list node itself.
                    return Some((cur, i));
                }
                i += nkeys;
            }
        }
        Some((cur, i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_schema;

    #[test]
    fn descendant_resolves_through_list_keys() {
        let schema = sample_schema();
        let path = Path::parse("protocols/ospf/area/0/network");
        let node = schema.descendant(&path).unwrap();
        assert_eq!(node.name, "network");
    }

    #[test]
    fn descendant_rejects_unknown_element() {
        let schema = sample_schema();
        let path = Path::parse("protocols/ospf/bogus");
        assert!(schema.descendant(&path).is_none());
    }

    #[test]
    fn validate_allows_incomplete_list_path() {
        let schema = sample_schema();
        // `server` is keyed by (name, ip); giving only `name` stops
        // mid-key, which XML edit-config's element-by-element descent
        // needs to accept while a plain Set/Delete path must reject.
        let partial = Path::parse("server/eth0");
        assert!(schema.validate(&partial, true).is_ok());
        assert!(schema.validate(&partial, false).is_err());
    }

    #[test]
    fn validate_accepts_bare_list_path_regardless_of_flag() {
        let schema = sample_schema();
        // No keys at all addresses the list as a whole (what
        // `create_list_entry` resolves against), distinct from stopping
        // mid-key above.
        let bare = Path::parse("protocols/ospf/area");
        assert!(schema.validate(&bare, false).is_ok());
        assert!(schema.descendant(&bare).is_some());
    }

    #[test]
    fn attrs_for_path_flags_secret_leaf() {
        let schema = sample_schema();
        let secret_path = Path::parse("password");
        assert!(schema.attrs_for_path(&secret_path).is_secret());

        let plain_path = Path::parse("mtu");
        assert!(!schema.attrs_for_path(&plain_path).is_secret());
    }
}
