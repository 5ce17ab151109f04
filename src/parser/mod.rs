pub mod blocks;
pub mod listing;
pub mod location;
pub mod profile;

use serde_json::{Map, Value};
use tracing::warn;

/// Two-pass pipeline for a search-results page: sentinel scan → field
/// decode. One raw record per embedded block, in page order.
pub fn process_search_page(html: &str) -> Vec<Map<String, Value>> {
    let scan = blocks::scan_blocks(html);
    if scan.unterminated {
        warn!("page ends inside an unterminated result block; trailing record dropped");
    }
    scan.blocks
        .iter()
        .map(|block| blocks::decode_fields(block))
        .collect()
}
