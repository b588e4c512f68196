use serde_json::Value;

use super::diagnostics::{diagnose, Diagnosis};
use super::locator::locate;
use super::path::{StatePath, CONTAINER_FIELDS};
use crate::browser::PageDriver;
use crate::errors::ScraperResult;

/// In-page walker behind [`capture_script`].
///
/// Each path in `__PATHS__` is followed on the live state object, so container
/// fields are read through their getters. The result is a reduced copy of the
/// state: nodes along a path keep their own keys (off-path values become
/// `null`), the container field that was taken is written out under its own
/// name, and the leaf is copied whole. Back-references become a marker.
/// Evaluates to "" when the global is missing.
const CAPTURE_TEMPLATE: &str = r#"(() => {
    const root = window.__INITIAL_STATE__;
    if (root === undefined || root === null) return "";
    const paths = __PATHS__;
    const containers = __CONTAINERS__;
    const isRecord = (v) => v !== null && typeof v === "object" && !Array.isArray(v);
    const outline = (v) => {
        if (Array.isArray(v)) return [];
        if (typeof v === "function" || v === undefined) return null;
        if (!isRecord(v)) return v;
        const out = {};
        for (const key of Object.keys(v)) out[key] = null;
        return out;
    };
    const tree = outline(root);
    for (const path of paths) {
        let live = root;
        let slot = null;
        let complete = true;
        for (const segment of path) {
            let key = segment;
            if (segment === null) {
                key = isRecord(live)
                    ? containers.find((field) => live[field] !== undefined)
                    : undefined;
                if (key === undefined) continue;
            } else if (!isRecord(live) || live[segment] === undefined) {
                complete = false;
                break;
            }
            const holder = slot === null ? tree : slot[0][slot[1]];
            live = live[key];
            if (holder[key] === null || holder[key] === undefined) holder[key] = outline(live);
            slot = [holder, key];
        }
        if (complete && slot !== null) slot[0][slot[1]] = live;
    }
    const ancestors = [];
    return JSON.stringify(tree, function (key, value) {
        if (typeof value === "bigint") return value.toString();
        if (typeof value !== "object" || value === null) return value;
        while (ancestors.length > 0 && ancestors[ancestors.length - 1] !== this) {
            ancestors.pop();
        }
        if (ancestors.includes(value)) return "[Circular]";
        ancestors.push(value);
        return value;
    });
})()"#;

/// Script that captures the slices of the page state reached by `paths`.
pub fn capture_script(paths: &[StatePath]) -> ScraperResult<String> {
    let segments: Vec<Vec<Option<&str>>> = paths.iter().map(StatePath::script_segments).collect();
    Ok(CAPTURE_TEMPLATE
        .replace("__PATHS__", &serde_json::to_string(&segments)?)
        .replace("__CONTAINERS__", &serde_json::to_string(&CONTAINER_FIELDS)?))
}

/// The page's client-side state at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot {
    root: Value,
}

impl PageSnapshot {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Parse captured state text. Empty text is a page without state.
    pub fn from_json(text: &str) -> ScraperResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::new(Value::Null));
        }
        Ok(Self::new(serde_json::from_str(text)?))
    }

    /// Capture the parts of the page state in `driver` that `paths` reach
    pub async fn capture<D: PageDriver + ?Sized>(
        driver: &D,
        paths: &[StatePath],
    ) -> ScraperResult<Self> {
        let text = driver.evaluate(&capture_script(paths)?).await?;
        tracing::debug!(bytes = text.len(), "Captured page state");
        Self::from_json(&text)
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_null()
    }

    /// JSON text of the leaf at `path`, empty when there is none
    pub fn locate(&self, path: &StatePath) -> String {
        locate(&self.root, path)
    }

    pub fn diagnose(&self, path: &StatePath) -> Diagnosis {
        diagnose(&self.root, path)
    }

    pub fn to_json_pretty(&self) -> ScraperResult<String> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }
}
