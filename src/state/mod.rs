//! Generic view of the page's hydrated client state.
//!
//! The page walks the wanted paths itself, reading container getters, and
//! hands back a reduced JSON tree; locating, diagnosing and decoding all
//! work on that tree without touching the page again.

pub mod decoder;
pub mod diagnostics;
pub mod locator;
pub mod path;
pub mod snapshot;

pub use decoder::{decode_list, decode_record, Record};
pub use diagnostics::{diagnose, Diagnosis};
pub use locator::locate;
pub use path::{unwrap_container, StatePath, CONTAINER_FIELDS, STATE_ROOT};
pub use snapshot::{capture_script, PageSnapshot};
