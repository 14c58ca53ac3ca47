use serde::Serialize;

/// One step of the path from the root of the tree to a mutated slot: an
/// array index or an object property name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum EventKind {
    /// A container was opened at `path`.
    Begin,
    /// A scalar was assigned at `path`.
    Set,
    /// The container at `path` was closed.
    End,
}

/// A record of one structural mutation of the value tree, captured in
/// traversal order. Replaying the log against an empty root reproduces the
/// shape of the final tree, which makes the log suitable for differential
/// rendering.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Event {
    pub kind: EventKind,
    pub path: Vec<PathSegment>,
}

impl Event {
    pub(crate) fn new(kind: EventKind, path: Vec<PathSegment>) -> Self {
        Self { kind, path }
    }
}
