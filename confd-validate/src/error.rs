//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use confd_utils::Path;

/// One validation failure (spec §4.F, §7). Errors are accumulated rather
/// than aborting at the first one, then sorted by path before being
/// handed back to the Commit Mgr.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationError {
    pub path: Path,
    pub kind: ErrorKind,
    /// The schema-supplied `error-message`, when the violated node
    /// carries one (spec §4.F, §7 "custom error-message").
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ErrorKind {
    /// Type/range/pattern/enum failure (spec §4.F "Type validation").
    InvalidValue(String),
    /// `mandatory true` leaf absent while its nearest enclosing presence
    /// container (or root) exists.
    MissingMandatory,
    /// Fewer than `min-elements` entries.
    TooFew { min: u32, actual: usize },
    /// More than `max-elements` entries.
    TooMany { max: u32, actual: usize },
    /// A `must` expression evaluated false. Carries the original
    /// expression text (spec §7 "includes the original expression text").
    MustViolation(String),
    /// A `when` expression evaluated false while the node exists.
    WhenViolation(String),
    /// A leafref's value didn't resolve to any value at the referenced
    /// path in the union view.
    LeafrefMissing(String),
    /// More than one `unique` statement's referenced tuple collided
    /// across list entries (the taxonomy of spec §7 has no dedicated
    /// kind for this; folded into `InvalidValue` at the list's own path,
    /// see DESIGN.md).
    NotUnique(Vec<String>),
}

impl ValidationError {
    pub fn new(path: Path, kind: ErrorKind) -> Self {
        ValidationError { path, kind, message: None }
    }

    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ErrorKind::InvalidValue(detail) => write!(f, "{}: invalid value: {detail}", self.path),
            ErrorKind::MissingMandatory => write!(f, "{}: mandatory node not set", self.path),
            ErrorKind::TooFew { min, actual } => {
                write!(f, "{}: too few entries (have {actual}, need at least {min})", self.path)
            }
            ErrorKind::TooMany { max, actual } => {
                write!(f, "{}: too many entries (have {actual}, allow at most {max})", self.path)
            }
            ErrorKind::MustViolation(expr) => write!(f, "{}: must \"{expr}\" failed", self.path),
            ErrorKind::WhenViolation(expr) => write!(f, "{}: when \"{expr}\" failed", self.path),
            ErrorKind::LeafrefMissing(target) => write!(f, "{}: leafref to \"{target}\" didn't resolve", self.path),
            ErrorKind::NotUnique(fields) => write!(f, "{}: not unique on ({})", self.path, fields.join(", ")),
        }?;
        if let Some(msg) = &self.message {
            write!(f, " ({msg})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
