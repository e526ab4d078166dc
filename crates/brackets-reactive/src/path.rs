//! Paths into a state tree.
//!
//! A path is a sequence of key and index segments. Its text form is the
//! dotted accessor form `todos[0].title`; only the root key takes part in
//! dependency tracking.

use crate::error::{ReactiveError, ReactiveResult};
use std::fmt;

/// One step into a container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Seg {
    /// Object key.
    Key(String),
    /// Array position.
    Index(usize),
}

impl Seg {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Seg::Key(key) => Some(key),
            Seg::Index(_) => None,
        }
    }

    /// The position this segment addresses in an array. Numeric keys count.
    pub fn as_position(&self) -> Option<usize> {
        match self {
            Seg::Index(i) => Some(*i),
            Seg::Key(key) => key.parse().ok(),
        }
    }
}

impl fmt::Display for Seg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seg::Key(key) => write!(f, ".{key}"),
            Seg::Index(i) => write!(f, "[{i}]"),
        }
    }
}

impl From<&str> for Seg {
    fn from(key: &str) -> Self {
        Seg::Key(key.to_string())
    }
}

impl From<String> for Seg {
    fn from(key: String) -> Self {
        Seg::Key(key)
    }
}

impl From<usize> for Seg {
    fn from(i: usize) -> Self {
        Seg::Index(i)
    }
}

/// A location inside one state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<Seg>);

impl Path {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Parse `a.b[0].c`. The first segment must be a key; keys may not be
    /// empty or contain brackets.
    pub fn parse(text: &str) -> ReactiveResult<Self> {
        let mut segs = Vec::new();
        let mut rest = text;
        let mut expect_key = true;

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('[') {
                let close = after
                    .find(']')
                    .ok_or_else(|| ReactiveError::invalid_path(text, "unclosed `[`"))?;
                let index = after[..close].trim().parse::<usize>().map_err(|_| {
                    ReactiveError::invalid_path(text, format!("`{}` is not an index", &after[..close]))
                })?;
                if segs.is_empty() {
                    return Err(ReactiveError::invalid_path(text, "path must start with a key"));
                }
                segs.push(Seg::Index(index));
                rest = &after[close + 1..];
                expect_key = false;
                continue;
            }

            if !expect_key {
                rest = rest.strip_prefix('.').ok_or_else(|| {
                    ReactiveError::invalid_path(text, "expected `.` or `[` between segments")
                })?;
            }
            let end = rest.find(['.', '[', ']']).unwrap_or(rest.len());
            let key = &rest[..end];
            if key.is_empty() {
                return Err(ReactiveError::invalid_path(text, "empty key"));
            }
            segs.push(Seg::Key(key.to_string()));
            rest = &rest[end..];
            if rest.starts_with(']') {
                return Err(ReactiveError::invalid_path(text, "unexpected `]`"));
            }
            expect_key = false;
        }

        if segs.is_empty() {
            return Err(ReactiveError::invalid_path(text, "empty path"));
        }
        Ok(Self(segs))
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(Seg::Key(key.into()));
        self
    }

    pub fn index(mut self, i: usize) -> Self {
        self.0.push(Seg::Index(i));
        self
    }

    pub fn push(&mut self, seg: Seg) {
        self.0.push(seg);
    }

    /// This path followed by every segment of `other`.
    pub fn join(&self, other: &Path) -> Path {
        let mut segs = self.0.clone();
        segs.extend(other.0.iter().cloned());
        Path(segs)
    }

    pub fn segments(&self) -> &[Seg] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The top-level key that owns this path in the dependency graph.
    pub fn root_key(&self) -> Option<&str> {
        self.0.first().and_then(Seg::as_key)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            match seg {
                Seg::Key(key) if i == 0 => f.write_str(key)?,
                seg => write!(f, "{seg}")?,
            }
        }
        Ok(())
    }
}

impl From<Vec<Seg>> for Path {
    fn from(segs: Vec<Seg>) -> Self {
        Self(segs)
    }
}
