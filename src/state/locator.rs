use serde_json::Value;

use super::path::{unwrap_container, Segment, StatePath};

/// Outcome of walking a [`StatePath`] as far as the tree allows.
#[derive(Debug)]
pub struct Walk<'a> {
    /// Deepest node reached
    pub node: &'a Value,
    /// Number of segments consumed to reach `node`
    pub depth: usize,
}

impl Walk<'_> {
    pub fn is_complete(&self, path: &StatePath) -> bool {
        self.depth == path.segments().len()
    }
}

/// Follow `path` from `root`, stopping at the first key that is absent.
///
/// Container steps never fail: a node without a container field is its own
/// payload.
pub fn walk<'a>(root: &'a Value, path: &StatePath) -> Walk<'a> {
    let mut node = root;

    for (depth, segment) in path.segments().iter().enumerate() {
        node = match segment {
            Segment::Unwrap => unwrap_container(node),
            Segment::Key(key) => match node.get(key.as_str()) {
                Some(child) => child,
                None => return Walk { node, depth },
            },
        };
    }

    Walk {
        node,
        depth: path.segments().len(),
    }
}

/// Resolve `path` and return the leaf, or `None` when the path is broken or
/// ends in `null`.
pub fn resolve<'a>(root: &'a Value, path: &StatePath) -> Option<&'a Value> {
    let walked = walk(root, path);
    if walked.is_complete(path) && !walked.node.is_null() {
        Some(walked.node)
    } else {
        None
    }
}

/// Locate `path` and serialize the leaf back to JSON text.
///
/// Empty text means "nothing there"; callers decide whether that is an
/// error and ask [`super::diagnose`] why.
pub fn locate(root: &Value, path: &StatePath) -> String {
    resolve(root, path)
        .map(Value::to_string)
        .unwrap_or_default()
}
