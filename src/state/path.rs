use std::fmt;

use serde_json::Value;

/// Fields under which the page's observable containers keep their payload,
/// in order of preference.
pub const CONTAINER_FIELDS: [&str; 2] = ["value", "_value"];

/// Name of the global the page hydrates its state into
pub const STATE_ROOT: &str = "window.__INITIAL_STATE__";

/// Peel one level of container indirection off a node.
///
/// The first field from [`CONTAINER_FIELDS`] present on the node wins, even
/// when it holds `null`. A node without any of them is returned as is.
pub fn unwrap_container(node: &Value) -> &Value {
    if let Value::Object(map) = node {
        for field in CONTAINER_FIELDS {
            if let Some(inner) = map.get(field) {
                return inner;
            }
        }
    }
    node
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Unwrap,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{}", key),
            Segment::Unwrap => write!(f, "({})", CONTAINER_FIELDS.join("|")),
        }
    }
}

/// Dotted path into the page state, relative to [`STATE_ROOT`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatePath {
    segments: Vec<Segment>,
}

impl StatePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(Segment::Key(key.into()));
        self
    }

    pub fn container(mut self) -> Self {
        self.segments.push(Segment::Unwrap);
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Segments as the in-page walker reads them: a key name, or `null`
    /// for a container unwrap.
    pub fn script_segments(&self) -> Vec<Option<&str>> {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Key(key) => Some(key.as_str()),
                Segment::Unwrap => None,
            })
            .collect()
    }

    /// `topic.topicData(value|_value).pageInfo` -> `topic.topicData` for the
    /// first `len` segments.
    pub fn render_prefix(&self, len: usize) -> String {
        let mut out = String::new();
        for segment in self.segments.iter().take(len) {
            match segment {
                Segment::Key(key) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(key);
                }
                Segment::Unwrap => out.push_str(&segment.to_string()),
            }
        }
        out
    }

    /// Topic header: `topic.topicData` container, `pageInfo` inside it
    pub fn topic_info() -> Self {
        Self::new().key("topic").key("topicData").container().key("pageInfo")
    }

    /// Feed list: `topic.topicNotes` container
    pub fn topic_notes() -> Self {
        Self::new().key("topic").key("topicNotes").container()
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render_prefix(self.segments.len()))
    }
}
