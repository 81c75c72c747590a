//! Property paths
//!
//! A [`PropertyPath`] locates a value inside the root object graph. It is a
//! sequence of named and indexed segments rendered as `Orders[0].Lines[2].Sku`.
//!
//! Every execution context owns its own path. Failures capture the rendered
//! string, so a path can keep growing after a failure was recorded without
//! affecting it.

use smallvec::SmallVec;
use std::fmt;

/// One step of a [`PropertyPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A member name, joined with `.`.
    Name(String),
    /// A zero-based position, rendered as `[i]`.
    Index(usize),
    /// A caller-supplied display index, rendered as `[key]`.
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Index(index) => write!(f, "[{index}]"),
            Self::Key(key) => write!(f, "[{key}]"),
        }
    }
}

/// Ordered sequence of path segments.
///
/// # Examples
///
/// ```rust,ignore
/// use ruleweave_validator::path::PropertyPath;
///
/// let mut path = PropertyPath::new();
/// path.push_name("Orders");
/// path.push_index(0);
/// path.push_name("Sku");
/// assert_eq!(path.to_string(), "Orders[0].Sku");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    segments: SmallVec<[PathSegment; 4]>,
}

impl PropertyPath {
    /// Creates an empty path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a member name. Empty names are ignored.
    pub fn push_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !name.is_empty() {
            self.segments.push(PathSegment::Name(name));
        }
    }

    /// Appends a positional index.
    pub fn push_index(&mut self, index: usize) {
        self.segments.push(PathSegment::Index(index));
    }

    /// Appends a display key rendered inside brackets.
    pub fn push_key(&mut self, key: impl Into<String>) {
        self.segments.push(PathSegment::Key(key.into()));
    }

    /// Appends every segment of `other`.
    pub fn extend_from(&mut self, other: &PropertyPath) {
        self.segments.extend(other.segments.iter().cloned());
    }

    /// Returns a copy of this path with `name` appended.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        let mut path = self.clone();
        path.push_name(name);
        path
    }

    /// Renders the path with `name` appended, without allocating a new path.
    ///
    /// An empty `name` renders the path itself.
    #[must_use]
    pub fn build_property_name(&self, name: &str) -> String {
        let mut rendered = self.to_string();
        if !name.is_empty() {
            if !rendered.is_empty() {
                rendered.push('.');
            }
            rendered.push_str(name);
        }
        rendered
    }

    /// Returns the segments in order.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if the path has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns true if `self` starts with every segment of `parent`.
    #[must_use]
    pub fn is_child_of(&self, parent: &PropertyPath) -> bool {
        self.segments.len() > parent.segments.len()
            && self.segments.starts_with(&parent.segments)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 && matches!(segment, PathSegment::Name(_)) {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for PropertyPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut path = Self::new();
        for name in iter {
            path.push_name(name);
        }
        path
    }
}
