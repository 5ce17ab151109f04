use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

/// Result pages embed one pseudo-object per provider between these two
/// script statements. The close sentinel's spelling is the site's own.
pub const OPEN_SENTINEL: &str = "var location = {};";
pub const CLOSE_SENTINEL: &str = "mapLoactionData.push(location);";

static PRIMARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"location\.(\w+)='(.*?)';").unwrap());
static FALLBACK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+)=['"](.*?)['"];?"#).unwrap());

/// Outcome of one sentinel scan. `unterminated` flags an open sentinel with
/// no matching close before end of input; the complete blocks before it are
/// still returned.
#[derive(Debug)]
pub struct BlockScan {
    pub blocks: Vec<String>,
    pub unterminated: bool,
}

/// Scan page text left to right for sentinel-delimited blocks. Blocks are
/// non-overlapping and may span line boundaries; a page with no sentinel
/// pairs yields an empty list.
pub fn scan_blocks(page: &str) -> BlockScan {
    let mut blocks = Vec::new();
    let mut unterminated = false;
    let mut pos = 0;

    while let Some(open) = page[pos..].find(OPEN_SENTINEL) {
        let body_start = pos + open + OPEN_SENTINEL.len();
        match page[body_start..].find(CLOSE_SENTINEL) {
            Some(close) => {
                blocks.push(page[body_start..body_start + close].to_string());
                pos = body_start + close + CLOSE_SENTINEL.len();
            }
            None => {
                unterminated = true;
                break;
            }
        }
    }

    BlockScan {
        blocks,
        unterminated,
    }
}

/// Decode one block into an ordered field map.
///
/// Two passes: `location.<key>='<value>';` assignments first, then any bare
/// `<key>='<value>'` / `<key>="<value>"` assignment the first pass missed.
/// A key already present is never overwritten, so primary-pass values win
/// collisions and the first occurrence wins within a pass.
pub fn decode_fields(block: &str) -> Map<String, Value> {
    let mut fields = Map::new();

    for caps in PRIMARY_RE.captures_iter(block) {
        let key = &caps[1];
        if !fields.contains_key(key) {
            fields.insert(key.to_string(), Value::String(caps[2].to_string()));
        }
    }

    for caps in FALLBACK_RE.captures_iter(block) {
        let key = &caps[1];
        if !fields.contains_key(key) {
            fields.insert(key.to_string(), Value::String(caps[2].to_string()));
        }
    }

    fields
}

// ── Tests ──
