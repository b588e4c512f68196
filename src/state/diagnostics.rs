use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::locator::walk;
use super::path::{StatePath, STATE_ROOT};

/// Why a located path came back empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnosis {
    /// The page never defined its state global
    RootMissing,

    /// `segment` is absent; `siblings` are the keys of the deepest node that
    /// did resolve (`parent`), or empty when that node is not an object.
    MissingSegment {
        path: String,
        segment: String,
        parent: String,
        parent_kind: &'static str,
        siblings: Vec<String>,
    },

    /// The whole path resolved but holds no data
    EmptyPayload { path: String },
}

/// Walk `path` one segment at a time and describe where it breaks.
pub fn diagnose(root: &Value, path: &StatePath) -> Diagnosis {
    if root.is_null() {
        return Diagnosis::RootMissing;
    }

    let walked = walk(root, path);
    if walked.is_complete(path) {
        return Diagnosis::EmptyPayload {
            path: path.to_string(),
        };
    }

    let parent = path.render_prefix(walked.depth);
    let mut siblings: Vec<String> = match walked.node {
        Value::Object(map) => map.keys().cloned().collect(),
        _ => Vec::new(),
    };
    siblings.sort();

    Diagnosis::MissingSegment {
        path: path.render_prefix(walked.depth + 1),
        segment: path.segments()[walked.depth].to_string(),
        parent,
        parent_kind: kind_of(walked.node),
        siblings,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn qualified(path: &str) -> String {
    if path.is_empty() {
        STATE_ROOT.to_string()
    } else {
        format!("{}.{}", STATE_ROOT, path)
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnosis::RootMissing => write!(f, "{} is not defined", STATE_ROOT),
            Diagnosis::MissingSegment {
                path,
                parent,
                parent_kind,
                siblings,
                ..
            } => {
                write!(f, "{} does not exist, ", qualified(path))?;
                let parent = qualified(parent);
                if *parent_kind != "object" {
                    write!(f, "{} is {}", parent, parent_kind)
                } else if siblings.is_empty() {
                    write!(f, "{} has no keys", parent)
                } else {
                    write!(f, "{} keys: {}", parent, siblings.join(", "))
                }
            }
            Diagnosis::EmptyPayload { path } => {
                write!(f, "{} is present but its data is empty", qualified(path))
            }
        }
    }
}
