use std::fmt;

use serde::{Deserialize, Serialize};

/// One step from a node to one of its children.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PathStep {
    /// Named attribute of an object.
    Attribute(String),
    /// Position within a sequence.
    Index(usize),
    /// Key within a map.
    Key(String),
    /// Set member, identified by its canonical text.
    Element(String),
}

/// Location of a node within a value tree.
///
/// Paths tag diagnostics and tracing output; comparison logic never looks at
/// them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributePath(Vec<PathStep>);

impl AttributePath {
    /// The empty path, addressing the tree root.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<PathStep>) -> Self {
        Self(steps)
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn last(&self) -> Option<&PathStep> {
        self.0.last()
    }

    /// A new path one step below this one.
    pub fn child(&self, step: PathStep) -> Self {
        let mut steps = Vec::with_capacity(self.0.len() + 1);
        steps.extend_from_slice(&self.0);
        steps.push(step);
        Self(steps)
    }

    pub fn attribute(&self, name: impl Into<String>) -> Self {
        self.child(PathStep::Attribute(name.into()))
    }

    pub fn index(&self, i: usize) -> Self {
        self.child(PathStep::Index(i))
    }

    pub fn key(&self, key: impl Into<String>) -> Self {
        self.child(PathStep::Key(key.into()))
    }

    pub fn element(&self, canonical: impl Into<String>) -> Self {
        self.child(PathStep::Element(canonical.into()))
    }

    /// The path one step up, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Returns `true` if `self` equals `other` or lies below it.
    pub fn starts_with(&self, other: &AttributePath) -> bool {
        self.0.starts_with(&other.0)
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(root)");
        }
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathStep::Attribute(name) if i == 0 => f.write_str(name)?,
                PathStep::Attribute(name) => write!(f, ".{name}")?,
                PathStep::Index(idx) => write!(f, "[{idx}]")?,
                PathStep::Key(key) => write!(f, "[{key:?}]")?,
                PathStep::Element(canonical) => write!(f, "[Value({canonical})]")?,
            }
        }
        Ok(())
    }
}
