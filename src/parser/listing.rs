use std::sync::LazyLock;

use scraper::{Html, Selector};

static TD_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

const ID_MARKER: &str = "License/Registration ID:";

/// Pull provider ids out of a search-result listing page. Each result cell
/// carries a `License/Registration ID:` label; the id is the remainder of
/// that line. Duplicates within a page are kept as-is — the id index is
/// append-only and downstream joining works per id.
pub fn parse_provider_ids(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let mut ids = Vec::new();

    for td in doc.select(&TD_SEL) {
        // Text nodes keep their line structure; the id is the rest of the
        // labelled line.
        let text = td.text().collect::<Vec<_>>().join("\n");
        let Some((_, rest)) = text.split_once(ID_MARKER) else {
            continue;
        };
        let id = rest.lines().next().unwrap_or("").trim();
        if !id.is_empty() {
            ids.push(id.to_string());
        }
    }

    ids
}

/// Result pages link to the next page of the same search while more results
/// remain.
pub fn has_next_page(html: &str) -> bool {
    html.contains("Next Page")
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/ocfs_listing.html").unwrap()
    }

    #[test]
    fn extracts_ids_in_page_order() {
        let ids = parse_provider_ids(&fixture());
        assert_eq!(ids, ["784302", "201553", "784302"]);
    }

    #[test]
    fn page_without_results() {
        assert!(parse_provider_ids("<html><body>No matches</body></html>").is_empty());
    }

    #[test]
    fn next_page_detection() {
        assert!(has_next_page(&fixture()));
        assert!(!has_next_page("<html><body>last page</body></html>"));
    }
}
