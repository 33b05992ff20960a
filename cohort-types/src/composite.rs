//! Composite keys addressing entities across a federation of services.
//!
//! A composite key is a delimited string: an ordered list of service-name
//! segments followed by a key local to the final service, e.g.
//! `svcA.svcB.user42`. The delimiter can appear inside a segment when escaped
//! with a backslash (`a\.b` is the single segment `a.b`).
//!
//! `format` is the exact left inverse of `parse`: for every well-formed key
//! `k`, `format(parse(k)) == k`.

use crate::ids::{EntityIdentifier, TypeTag};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separates the nodes of a composite key.
pub const DELIMITER: char = '.';

/// Escapes a literal delimiter or escape character inside a node.
pub const ESCAPE: char = '\\';

/// Errors produced by the composite key codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// The key text cannot be parsed into non-empty nodes.
    #[error("malformed composite key `{key}`: {reason}")]
    Malformed { key: String, reason: String },

    /// `pop_node` was called on an identifier with an empty service path.
    #[error("service path has no nodes to remove")]
    EmptyPath,
}

impl KeyError {
    fn malformed(key: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            key: key.to_owned(),
            reason: reason.into(),
        }
    }
}

/// An ordered sequence of service-name segments.
///
/// Empty only for names belonging to the root federation. No segment is ever
/// the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServiceName(Vec<String>);

impl ServiceName {
    /// The empty (root federation) service name.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Builds a service name from segments, rejecting empty ones.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut name = Self::root();
        for segment in segments {
            name.push(segment)?;
        }
        Ok(name)
    }

    /// Parses a dotted service name. The empty string is the root name.
    pub fn parse(text: &str) -> Result<Self, KeyError> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        Ok(Self(split_nodes(text)?))
    }

    /// Returns the segments in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns true if there are no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first segment, if any.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Appends a segment. Fails if the segment is empty.
    pub fn push(&mut self, segment: impl Into<String>) -> Result<(), KeyError> {
        let segment = segment.into();
        if segment.is_empty() {
            return Err(KeyError::malformed("", "empty service-name segment"));
        }
        self.0.push(segment);
        Ok(())
    }

    /// Removes and returns the last segment.
    pub fn pop(&mut self) -> Result<String, KeyError> {
        self.0.pop().ok_or(KeyError::EmptyPath)
    }

    /// Returns a copy with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> Result<Self, KeyError> {
        let mut name = self.clone();
        name.push(segment)?;
        Ok(name)
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_nodes(self.0.iter().map(String::as_str)))
    }
}

/// Identifies an entity managed somewhere in a federation: a service path
/// plus a key local to the final service, plus the entity kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompositeEntityIdentifier {
    service_name: ServiceName,
    local_key: String,
    tag: TypeTag,
}

impl CompositeEntityIdentifier {
    /// Creates an identifier from parts. Fails if the local key is empty.
    pub fn new(
        service_name: ServiceName,
        local_key: impl Into<String>,
        tag: TypeTag,
    ) -> Result<Self, KeyError> {
        let local_key = local_key.into();
        if local_key.is_empty() {
            return Err(KeyError::malformed("", "empty local key"));
        }
        Ok(Self {
            service_name,
            local_key,
            tag,
        })
    }

    /// Parses a composite key string. The final node is the local key; all
    /// preceding nodes form the service path.
    pub fn parse(composite_key: &str, tag: TypeTag) -> Result<Self, KeyError> {
        let mut nodes = split_nodes(composite_key)?;
        let local_key = nodes.pop().ok_or_else(|| {
            KeyError::malformed(composite_key, "key has no nodes")
        })?;
        Ok(Self {
            service_name: ServiceName(nodes),
            local_key,
            tag,
        })
    }

    /// Returns the key local to the owning service.
    #[must_use]
    pub fn local_key(&self) -> &str {
        &self.local_key
    }

    /// Returns the service path.
    #[must_use]
    pub const fn service_name(&self) -> &ServiceName {
        &self.service_name
    }

    /// Returns the entity kind.
    #[must_use]
    pub const fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Removes and returns the last node of the service path.
    pub fn pop_node(&mut self) -> Result<String, KeyError> {
        self.service_name.pop()
    }

    /// Appends a node to the service path. Fails on an empty node.
    pub fn push_node(&mut self, node: impl Into<String>) -> Result<(), KeyError> {
        self.service_name.push(node)
    }

    /// Formats the full composite key (the inverse of [`Self::parse`]).
    #[must_use]
    pub fn format(&self) -> String {
        join_nodes(
            self.service_name
                .segments()
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(self.local_key.as_str())),
        )
    }

    /// The flat identifier for this entity, keyed by the full composite key.
    #[must_use]
    pub fn to_entity_identifier(&self) -> EntityIdentifier {
        EntityIdentifier::new(self.format(), self.tag)
    }
}

impl fmt::Display for CompositeEntityIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// Extracts the final node from the string form of a composite key.
pub fn parse_local_key(composite_key: &str) -> Result<String, KeyError> {
    let mut nodes = split_nodes(composite_key)?;
    nodes
        .pop()
        .ok_or_else(|| KeyError::malformed(composite_key, "key has no nodes"))
}

// ── codec internals ──────────────────────────────────────────────

/// Splits a composite key into unescaped nodes, rejecting empty nodes and
/// invalid escapes.
fn split_nodes(key: &str) -> Result<Vec<String>, KeyError> {
    let mut nodes = Vec::new();
    let mut current = String::new();
    let mut saw_content = false;
    let mut chars = key.chars();

    while let Some(c) = chars.next() {
        match c {
            ESCAPE => match chars.next() {
                Some(escaped @ (DELIMITER | ESCAPE)) => {
                    current.push(escaped);
                    saw_content = true;
                }
                Some(other) => {
                    return Err(KeyError::malformed(key, format!("invalid escape `\\{other}`")));
                }
                None => return Err(KeyError::malformed(key, "trailing escape")),
            },
            DELIMITER => {
                if !saw_content {
                    return Err(KeyError::malformed(key, "empty node"));
                }
                nodes.push(std::mem::take(&mut current));
                saw_content = false;
            }
            _ => {
                current.push(c);
                saw_content = true;
            }
        }
    }

    if !saw_content {
        return Err(KeyError::malformed(key, "empty node"));
    }
    nodes.push(current);
    Ok(nodes)
}

/// Joins nodes with the delimiter, escaping delimiter and escape characters.
fn join_nodes<'a>(nodes: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for (i, node) in nodes.enumerate() {
        if i > 0 {
            out.push(DELIMITER);
        }
        for c in node.chars() {
            if c == DELIMITER || c == ESCAPE {
                out.push(ESCAPE);
            }
            out.push(c);
        }
    }
    out
}
