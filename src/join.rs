use serde_json::{Map, Value};
use tracing::debug;

use crate::store::{FragmentKind, IndexEntry, Store};

/// Merge the stored fragments for one provider id into a single raw record.
///
/// The profile fragment supplies the base field set; without it there is no
/// record. Location data attaches under the `location` key and the id-index
/// row under `index`, so neither can collide with profile fields. Either
/// may be absent — downstream defaulting covers the gaps.
pub fn join_provider(
    store: &Store,
    id: &str,
    index: Option<&IndexEntry>,
) -> Option<Map<String, Value>> {
    let mut record = match store.get_fragment(FragmentKind::Profile, id) {
        Some(profile) => profile,
        None => {
            debug!("no profile fragment for provider {}", id);
            return None;
        }
    };
    record.remove("raw_html");

    if let Some(mut location) = store.get_fragment(FragmentKind::Location, id) {
        location.remove("raw_html");
        record.insert("location".to_string(), Value::Object(location));
    }

    if let Some(entry) = index {
        if let Ok(value) = serde_json::to_value(entry) {
            record.insert("index".to_string(), value);
        }
    }

    Some(record)
}

// ── Tests ──
