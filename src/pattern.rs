//! URL pattern compilation and matching.
//!
//! ```text
//! /users/:id/posts?page=:page
//!  ───── ─── ─────  ────────
//!  lit   ph  lit    query placeholder (key `page`, name `page`)
//! ```
//!
//! Captures come out path-first, left to right, then query placeholders in
//! declaration order. A pattern's placeholder count is fixed at compile time
//! and is what handler arity is checked against.

use crate::bind::KeyValues;
use crate::error::ConfigError;

#[derive(Clone, Debug, Eq, PartialEq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct QueryPlaceholder {
    key: String,
    name: String,
}

/// A compiled URL pattern.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
    query: Vec<QueryPlaceholder>,
}

impl Pattern {
    /// Compiles `/literal/:placeholder?key=:name` syntax.
    pub fn compile(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |reason| ConfigError::InvalidPattern { pattern: raw.to_owned(), reason };

        if !raw.starts_with('/') {
            return Err(invalid("must start with `/`"));
        }

        let (path, query) = match raw.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (raw, None),
        };

        let mut segments = Vec::new();
        for part in path.split('/') {
            match part.strip_prefix(':') {
                Some("") => return Err(invalid("placeholder without a name")),
                Some(name) => segments.push(Segment::Placeholder(name.to_owned())),
                None => segments.push(Segment::Literal(part.to_owned())),
            }
        }

        let mut placeholders = Vec::new();
        if let Some(query) = query {
            for entry in query.split('&') {
                let Some((key, value)) = entry.split_once('=') else {
                    return Err(invalid("query entries must read `key=:name`"));
                };
                let Some(name) = value.strip_prefix(':') else {
                    return Err(invalid("query values must be placeholders"));
                };
                if key.is_empty() || name.is_empty() {
                    return Err(invalid("empty query key or placeholder name"));
                }
                placeholders.push(QueryPlaceholder { key: key.to_owned(), name: name.to_owned() });
            }
        }

        Ok(Self { raw: raw.to_owned(), segments, query: placeholders })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of values a match captures, path and query together.
    pub fn param_count(&self) -> usize {
        let path = self.segments.iter()
            .filter(|s| matches!(s, Segment::Placeholder(_)))
            .count();
        path + self.query.len()
    }

    /// Placeholder names in capture order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        let path = self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        });
        path.chain(self.query.iter().map(|q| q.name.as_str()))
    }

    /// Matches an already-decoded path and its query map.
    ///
    /// Returns the captured values in capture order, or `None`. Segment counts
    /// must line up exactly; there is no trailing-slash normalisation.
    pub fn captures(&self, path: &str, query: &KeyValues) -> Option<Vec<String>> {
        let mut captured = Vec::with_capacity(self.param_count());
        let mut parts = path.split('/');

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(lit) if lit != part => return None,
                Segment::Literal(_) => {}
                Segment::Placeholder(_) if part.is_empty() => return None,
                Segment::Placeholder(_) => captured.push(part.to_owned()),
            }
        }
        if parts.next().is_some() {
            return None;
        }

        for placeholder in &self.query {
            captured.push(query.get(&placeholder.key)?.to_owned());
        }
        Some(captured)
    }

    /// Prepends a mount prefix: `/say` + `/hello` → `/say/hello`.
    pub(crate) fn join(prefix: &str, pattern: &str) -> String {
        let prefix = prefix.trim_end_matches('/');
        format!("{prefix}{pattern}")
    }
}
