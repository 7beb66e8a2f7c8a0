//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::fmt;

use serde::{Deserialize, Serialize};

/// An ordered sequence of path components addressing a node in the
/// configuration tree (spec §3 "Path").
///
/// Equality is component-wise, matching the spec's definition exactly:
/// two paths are equal iff they have the same length and every component
/// matches positionally.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Path(Vec<String>);

/// Per-element metadata running parallel to a [`Path`], carrying the
/// `secret` flag used by authorization and by `Show` redaction (spec §3,
/// §4.I).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathAttrs(Vec<PathAttr>);

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PathAttr {
    pub secret: bool,
}

// ===== impl Path =====

impl Path {
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn from_components<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Path(components.into_iter().map(Into::into).collect())
    }

    /// Parses a slash-separated textual path such as `protocols/ospf/area`.
    /// Empty components (leading/trailing/duplicate slashes) are dropped.
    pub fn parse(text: &str) -> Self {
        Path(
            text.split('/')
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    pub fn components(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Returns the path with its last component removed, along with the
    /// removed component.
    pub fn split_last(&self) -> Option<(&str, Path)> {
        let (last, init) = self.0.split_last()?;
        Some((last.as_str(), Path(init.to_vec())))
    }

    pub fn parent(&self) -> Option<Path> {
        self.split_last().map(|(_, parent)| parent)
    }

    pub fn push(&self, component: impl Into<String>) -> Path {
        let mut components = self.0.clone();
        components.push(component.into());
        Path(components)
    }

    pub fn join(&self, other: &Path) -> Path {
        let mut components = self.0.clone();
        components.extend(other.0.iter().cloned());
        Path(components)
    }

    /// Returns true if `self` is equal to or a descendant of `ancestor`.
    pub fn starts_with(&self, ancestor: &Path) -> bool {
        self.0.len() >= ancestor.0.len() && self.0[..ancestor.0.len()] == ancestor.0[..]
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0.join("/"))
    }
}

impl FromIterator<String> for Path {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

// ===== impl PathAttrs =====

impl PathAttrs {
    pub fn new(attrs: Vec<PathAttr>) -> Self {
        PathAttrs(attrs)
    }

    pub fn all_clear(len: usize) -> Self {
        PathAttrs(vec![PathAttr::default(); len])
    }

    pub fn get(&self, index: usize) -> Option<PathAttr> {
        self.0.get(index).copied()
    }

    /// True if any element along the path is marked secret, matching the
    /// spec's "secret leaves' values are redacted" rule: a secret leaf's
    /// own element carries the flag, and callers check the last element.
    pub fn is_secret(&self) -> bool {
        self.0.last().is_some_and(|attr| attr.secret)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathAttr> {
        self.0.iter()
    }
}
