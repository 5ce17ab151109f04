use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};

static TD_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static B_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("b").unwrap());
static H3_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h3").unwrap());
static SPAN_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());
static U_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("u").unwrap());

/// Parse a provider profile page into an ordered field map: the labelled
/// table cells as key/value pairs, plus `program_name`, `address`, and
/// `total_capacity` from their page-specific markers. Fields the page does
/// not carry are stored as null.
pub fn parse_profile_page(html: &str) -> Map<String, Value> {
    let doc = Html::parse_document(html);
    let mut data = parse_field_cells(&doc);

    data.insert("program_name".to_string(), opt_value(parse_program_name(&doc)));
    data.insert("address".to_string(), opt_value(parse_site_address(&doc)));
    data.insert(
        "total_capacity".to_string(),
        opt_value(parse_total_capacity(&doc)),
    );

    data
}

fn opt_value(v: Option<String>) -> Value {
    v.map(Value::String).unwrap_or(Value::Null)
}

/// Labelled cells look like `<td><b>Phone:</b> (718) 555-0100</td>`: the key
/// is the bold text with colons removed, the value the text right after the
/// bold element. Cells with no trailing text are skipped.
fn parse_field_cells(doc: &Html) -> Map<String, Value> {
    let mut data = Map::new();

    for td in doc.select(&TD_SEL) {
        let Some(b) = td.select(&B_SEL).next() else {
            continue;
        };
        let key = b.text().collect::<String>().trim().replace(':', "");
        let value = b
            .next_sibling()
            .and_then(|n| n.value().as_text().map(|t| t.trim().to_string()));
        match value {
            Some(v) if !v.is_empty() && !key.is_empty() => {
                data.insert(key, Value::String(v));
            }
            _ => {}
        }
    }

    data
}

/// `<h3>Program Name: Sunny Days Family Day Care</h3>` — text after the
/// marker, first line only.
fn parse_program_name(doc: &Html) -> Option<String> {
    for h3 in doc.select(&H3_SEL) {
        let text = h3.text().collect::<Vec<_>>().join("\n");
        if let Some((_, rest)) = text.split_once("Program Name:") {
            let name = rest.lines().next().unwrap_or("").trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}

/// The span following the `Site Address:` label span, in document order.
fn parse_site_address(doc: &Html) -> Option<String> {
    let marker = doc
        .select(&SPAN_SEL)
        .find(|s| s.text().collect::<String>().contains("Site Address:"))?;
    let next = first_following(doc, marker, "span")?;
    let address = next.text().collect::<String>().trim().to_string();
    (!address.is_empty()).then_some(address)
}

/// The cell following the underlined `Total Capacity:` label.
fn parse_total_capacity(doc: &Html) -> Option<String> {
    let marker = doc
        .select(&U_SEL)
        .find(|u| u.text().collect::<String>().contains("Total Capacity:"))?;
    let cell = first_following(doc, marker, "td")?;
    let capacity = cell.text().collect::<String>().trim().to_string();
    (!capacity.is_empty()).then_some(capacity)
}

/// First element named `tag` that appears after `marker` in document order,
/// anywhere in the tree.
fn first_following<'a>(doc: &'a Html, marker: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    let mut seen = false;
    for node in doc.root_element().descendants() {
        if node.id() == marker.id() {
            seen = true;
            continue;
        }
        if !seen {
            continue;
        }
        if let Some(el) = ElementRef::wrap(node) {
            if el.value().name() == tag {
                return Some(el);
            }
        }
    }
    None
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/ocfs_profile.html").unwrap()
    }

    #[test]
    fn labelled_cells_become_fields() {
        let data = parse_profile_page(&fixture());
        assert_eq!(data["Phone"], "(718) 555-0100");
        assert_eq!(data["Program Type"], "Family Day Care");
        assert_eq!(data["School District"], "Brooklyn");
    }

    #[test]
    fn page_markers_extracted() {
        let data = parse_profile_page(&fixture());
        assert_eq!(data["program_name"], "Sunny Days Family Day Care");
        assert_eq!(data["address"], "123 Flatbush Ave, Brooklyn, NY 11201");
        assert!(data["total_capacity"]
            .as_str()
            .unwrap()
            .contains("6 weeks"));
    }

    #[test]
    fn single_cell() {
        let data = parse_profile_page("<table><tr><td><b>Phone:</b> (718) 555-0100</td></tr></table>");
        assert_eq!(data["Phone"], "(718) 555-0100");
    }

    #[test]
    fn empty_cell_value_skipped() {
        let data = parse_profile_page("<td><b>Phone:</b></td>");
        assert!(!data.contains_key("Phone"));
    }

    #[test]
    fn missing_markers_are_null() {
        let data = parse_profile_page("<html><body><p>nothing here</p></body></html>");
        assert_eq!(data["program_name"], Value::Null);
        assert_eq!(data["address"], Value::Null);
        assert_eq!(data["total_capacity"], Value::Null);
    }
}
