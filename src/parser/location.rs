use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::{Map, Value};

static LAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"var lat = "([-+]?[0-9]*\.?[0-9]+)""#).unwrap());
static LNG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"var lng = "([-+]?[0-9]*\.?[0-9]+)""#).unwrap());
static ADDRESS_SPAN_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#facilityaddress span").unwrap());

/// Parse a provider map page. Coordinates come from the embedded script
/// variables, the display address from the facility-address panel.
///
/// Returns a fragment only when both coordinates are present; a page
/// without them contributes no location data for the provider.
pub fn parse_location_page(html: &str) -> Option<Map<String, Value>> {
    let latitude: f64 = LAT_RE.captures(html)?[1].parse().ok()?;
    let longitude: f64 = LNG_RE.captures(html)?[1].parse().ok()?;

    let mut data = Map::new();
    data.insert("latitude".to_string(), json_number(latitude)?);
    data.insert("longitude".to_string(), json_number(longitude)?);

    let doc = Html::parse_document(html);
    if let Some(span) = doc.select(&ADDRESS_SPAN_SEL).next() {
        let address = span.text().collect::<String>().trim().to_string();
        if !address.is_empty() {
            data.insert("address".to_string(), Value::String(address));
        }
    }

    Some(data)
}

fn json_number(v: f64) -> Option<Value> {
    serde_json::Number::from_f64(v).map(Value::Number)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/ocfs_location.html").unwrap()
    }

    #[test]
    fn coordinates_and_address() {
        let data = parse_location_page(&fixture()).unwrap();
        assert_eq!(data["latitude"].as_f64(), Some(40.6892));
        assert_eq!(data["longitude"].as_f64(), Some(-73.9857));
        assert_eq!(data["address"], "123 Flatbush Ave, Brooklyn, NY 11201");
    }

    #[test]
    fn missing_longitude_means_no_fragment() {
        let html = r#"<script type="text/javascript">var lat = "40.6892";</script>"#;
        assert!(parse_location_page(html).is_none());
    }

    #[test]
    fn negative_longitude_parses() {
        let html = concat!(
            r#"<script>var lat = "40.7128"; var lng = "-74.0060";</script>"#,
            r#"<div id="facilityaddress"><span>1 Centre St, New York, NY 10007</span></div>"#,
        );
        let data = parse_location_page(html).unwrap();
        assert_eq!(data["longitude"].as_f64(), Some(-74.0060));
    }

    #[test]
    fn address_is_optional() {
        let html = r#"<script>var lat = "40.1"; var lng = "-73.9";</script>"#;
        let data = parse_location_page(html).unwrap();
        assert!(!data.contains_key("address"));
    }
}
