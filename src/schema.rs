use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::availability::AgeRanges;

pub const OCFS_PROFILE_URL_PREFIX: &str = "https://hs.ocfs.ny.gov/DCFS/Profile/Index/";

/// Canonical output columns, in declared order. Both sources emit exactly
/// this set; the CSV header is derived from the record's field names and
/// must stay in sync with this list.
pub const COLUMNS: [&str; 21] = [
    "PROGRAM_NAME",
    "ADDRESS_CITY",
    "ADDRESS_COUNTRY",
    "ADDRESS_BOUROUGH",
    "ADDRESS_COUNTY",
    "ADDRESS_LATITUDE",
    "ADDRESS_LONGITUDE",
    "ADDRESS_STATE",
    "ADDRESS_STREET",
    "ADDRESS_ZIPCODE",
    "AGE_RANGE",
    "AGE_RANGE_1_YEAR",
    "AGE_RANGE_2_YEARS",
    "AGE_RANGE_3_YEARS",
    "AGE_RANGE_4_YEARS",
    "AGE_RANGE_5_YEARS",
    "AGE_RANGE_INFANTS",
    "AGE_RANGE_SCHOOL",
    "GEN_PHONE_1",
    "GEN_PROGRAM_SETTING",
    "GEN_WEBSITE",
];

/// One provider in the shared output shape. Every field is present in every
/// record; absent source data shows up as an empty cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    #[serde(rename = "PROGRAM_NAME")]
    pub program_name: String,
    #[serde(rename = "ADDRESS_CITY")]
    pub city: String,
    #[serde(rename = "ADDRESS_COUNTRY")]
    pub country: String,
    #[serde(rename = "ADDRESS_BOUROUGH")]
    pub borough: Option<String>,
    #[serde(rename = "ADDRESS_COUNTY")]
    pub county: String,
    #[serde(rename = "ADDRESS_LATITUDE")]
    pub latitude: Option<f64>,
    #[serde(rename = "ADDRESS_LONGITUDE")]
    pub longitude: Option<f64>,
    #[serde(rename = "ADDRESS_STATE")]
    pub state: String,
    #[serde(rename = "ADDRESS_STREET")]
    pub street: String,
    #[serde(rename = "ADDRESS_ZIPCODE")]
    pub zipcode: String,
    #[serde(rename = "AGE_RANGE")]
    pub age_range: String,
    #[serde(rename = "AGE_RANGE_1_YEAR")]
    pub age_range_1_year: bool,
    #[serde(rename = "AGE_RANGE_2_YEARS")]
    pub age_range_2_years: bool,
    #[serde(rename = "AGE_RANGE_3_YEARS")]
    pub age_range_3_years: bool,
    #[serde(rename = "AGE_RANGE_4_YEARS")]
    pub age_range_4_years: bool,
    #[serde(rename = "AGE_RANGE_5_YEARS")]
    pub age_range_5_years: bool,
    #[serde(rename = "AGE_RANGE_INFANTS")]
    pub age_range_infants: bool,
    #[serde(rename = "AGE_RANGE_SCHOOL")]
    pub age_range_school: bool,
    #[serde(rename = "GEN_PHONE_1")]
    pub phone: String,
    #[serde(rename = "GEN_PROGRAM_SETTING")]
    pub program_setting: Option<String>,
    #[serde(rename = "GEN_WEBSITE")]
    pub website: Option<String>,
}

/// Map one decoded NYC search record into the canonical shape. City, state,
/// and country are fixed for this source; coordinates are coerced from the
/// embedded text values.
pub fn normalize_nych(raw: &Map<String, Value>, ages: &AgeRanges) -> CanonicalRecord {
    CanonicalRecord {
        program_name: text_field(raw, "centerName"),
        city: "New York".to_string(),
        country: "United States".to_string(),
        borough: None,
        county: String::new(),
        latitude: coerce_float("lat", raw.get("lat")),
        longitude: coerce_float("lon", raw.get("lon")),
        state: "New York".to_string(),
        street: text_field(raw, "address"),
        zipcode: text_field(raw, "zipCode"),
        age_range: ages.availability_string(),
        age_range_1_year: ages.one_year,
        age_range_2_years: ages.two_years,
        age_range_3_years: ages.three_years,
        age_range_4_years: ages.four_years,
        age_range_5_years: ages.five_years,
        age_range_infants: ages.infants,
        age_range_school: ages.school_age,
        phone: text_field(raw, "phone"),
        program_setting: normalize_program_setting(str_field(raw, "programType")),
        website: None,
    }
}

/// Map one joined OCFS record into the canonical shape. City and county are
/// substituted from the id-index fragment when present; street and zip come
/// from splitting the composite site address.
pub fn normalize_ocfs(id: &str, raw: &Map<String, Value>, ages: &AgeRanges) -> CanonicalRecord {
    let index = raw.get("index").and_then(Value::as_object);
    let location = raw.get("location").and_then(Value::as_object);
    let index_county = index.and_then(|ix| ix.get("county")).and_then(Value::as_str);

    let address = text_field(raw, "address");
    let (street, zipcode) = split_site_address(&address);

    CanonicalRecord {
        program_name: text_field(raw, "program_name"),
        city: index_county.unwrap_or("Unknown City").to_string(),
        country: "United States".to_string(),
        borough: Some(text_field(raw, "School District")),
        county: index_county.unwrap_or("").to_string(),
        latitude: coerce_float("latitude", location.and_then(|l| l.get("latitude"))),
        longitude: coerce_float("longitude", location.and_then(|l| l.get("longitude"))),
        state: "New York".to_string(),
        street,
        zipcode,
        age_range: ages.availability_string(),
        age_range_1_year: ages.one_year,
        age_range_2_years: ages.two_years,
        age_range_3_years: ages.three_years,
        age_range_4_years: ages.four_years,
        age_range_5_years: ages.five_years,
        age_range_infants: ages.infants,
        age_range_school: ages.school_age,
        phone: text_field(raw, "Phone"),
        program_setting: str_field(raw, "Program Type").map(str::to_string),
        website: Some(format!("{}{}", OCFS_PROFILE_URL_PREFIX, id)),
    }
}

/// Street is the first comma-delimited segment of the site address; the zip
/// code is the last segment with the state-code prefix stripped.
fn split_site_address(address: &str) -> (String, String) {
    if address.is_empty() {
        return (String::new(), String::new());
    }
    let street = address.split(',').next().unwrap_or("").to_string();
    let last = address.rsplit(',').next().unwrap_or("").trim();
    let zipcode = last.strip_prefix("NY ").unwrap_or(last).to_string();
    (street, zipcode)
}

/// Infant/toddler program listings name the category inconsistently; both
/// markers mean a licensed center in the output vocabulary.
fn normalize_program_setting(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }
    if raw.contains("Infants") || raw.contains("Toddlers") {
        return Some("Child Care Center".to_string());
    }
    Some(raw.to_string())
}

/// Coerce a trimmed text or numeric value into a float. Empty input is
/// absent; unparsable input is absent plus a diagnostic — never zero.
fn coerce_float(field: &str, value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<f64>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!("unparsable {} value: {:?}", field, s);
                    None
                }
            }
        }
        _ => None,
    }
}

fn text_field(raw: &Map<String, Value>, key: &str) -> String {
    str_field(raw, key).unwrap_or("").to_string()
}

fn str_field<'a>(raw: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    raw.get(key).and_then(Value::as_str)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::SearchCategory;
    use serde_json::json;

    fn map(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn nych_full_record() {
        let raw = map(&[
            ("centerName", json!("Bright Horizons at Tribeca")),
            ("lat", json!("40.7170")),
            ("lon", json!("-74.0094")),
            ("address", json!("107 Chambers St")),
            ("zipCode", json!("10007")),
            ("phone", json!("212-555-0142")),
            ("programType", json!("Child Care - Infants/Toddlers")),
        ]);
        let ages = SearchCategory::InfantsToddlers.age_ranges();
        let rec = normalize_nych(&raw, &ages);

        assert_eq!(rec.program_name, "Bright Horizons at Tribeca");
        assert_eq!(rec.city, "New York");
        assert_eq!(rec.state, "New York");
        assert_eq!(rec.country, "United States");
        assert_eq!(rec.latitude, Some(40.7170));
        assert_eq!(rec.longitude, Some(-74.0094));
        assert_eq!(rec.street, "107 Chambers St");
        assert_eq!(rec.zipcode, "10007");
        assert_eq!(rec.age_range, "0-12 Months (Infant)|~|1 year");
        assert!(rec.age_range_infants && rec.age_range_1_year);
        assert_eq!(rec.program_setting.as_deref(), Some("Child Care Center"));
        assert_eq!(rec.website, None);
    }

    #[test]
    fn nych_empty_record_gets_defaults() {
        let rec = normalize_nych(&Map::new(), &AgeRanges::default());
        assert_eq!(rec.program_name, "");
        assert_eq!(rec.city, "New York");
        assert_eq!(rec.borough, None);
        assert_eq!(rec.county, "");
        assert_eq!(rec.latitude, None);
        assert_eq!(rec.longitude, None);
        assert_eq!(rec.street, "");
        assert_eq!(rec.zipcode, "");
        assert_eq!(rec.age_range, "");
        assert!(!rec.age_range_infants && !rec.age_range_school);
        assert_eq!(rec.phone, "");
        assert_eq!(rec.program_setting, None);
        assert_eq!(rec.website, None);
    }

    #[test]
    fn program_setting_passthrough_and_forcing() {
        assert_eq!(
            normalize_program_setting(Some("Child Care - Infants/Toddlers")),
            Some("Child Care Center".to_string())
        );
        assert_eq!(
            normalize_program_setting(Some("School Based Child Care")),
            Some("School Based Child Care".to_string())
        );
        assert_eq!(normalize_program_setting(Some("")), None);
        assert_eq!(normalize_program_setting(None), None);
    }

    #[test]
    fn coercion_rules() {
        assert_eq!(coerce_float("lat", Some(&json!("40.7128"))), Some(40.7128));
        assert_eq!(coerce_float("lat", Some(&json!("  40.7128  "))), Some(40.7128));
        assert_eq!(coerce_float("lat", Some(&json!(""))), None);
        assert_eq!(coerce_float("lat", Some(&json!("abc"))), None);
        assert_eq!(coerce_float("lat", Some(&json!(40.6892))), Some(40.6892));
        assert_eq!(coerce_float("lat", None), None);
        assert_eq!(coerce_float("lat", Some(&Value::Null)), None);
    }

    #[test]
    fn ocfs_full_record() {
        let raw = map(&[
            ("program_name", json!("Sunny Days Family Day Care")),
            ("address", json!("123 Flatbush Ave, Brooklyn, NY 11201")),
            ("Phone", json!("(718) 555-0100")),
            ("Program Type", json!("Family Day Care")),
            ("School District", json!("Brooklyn")),
            ("total_capacity", json!("12 Preschoolers")),
            (
                "location",
                json!({"latitude": 40.6892, "longitude": -73.9857}),
            ),
            (
                "index",
                json!({"county": "Brooklyn", "program_type": "Family Day Care", "provider_id": "784302"}),
            ),
        ]);
        let ages = AgeRanges::from_capacity_text("12 Preschoolers");
        let rec = normalize_ocfs("784302", &raw, &ages);

        assert_eq!(rec.program_name, "Sunny Days Family Day Care");
        assert_eq!(rec.city, "Brooklyn");
        assert_eq!(rec.county, "Brooklyn");
        assert_eq!(rec.borough.as_deref(), Some("Brooklyn"));
        assert_eq!(rec.street, "123 Flatbush Ave");
        assert_eq!(rec.zipcode, "11201");
        assert_eq!(rec.latitude, Some(40.6892));
        assert_eq!(rec.longitude, Some(-73.9857));
        assert_eq!(rec.age_range, "3 years|~|4 years|~|5 years");
        assert_eq!(rec.phone, "(718) 555-0100");
        assert_eq!(rec.program_setting.as_deref(), Some("Family Day Care"));
        assert_eq!(
            rec.website.as_deref(),
            Some("https://hs.ocfs.ny.gov/DCFS/Profile/Index/784302")
        );
    }

    #[test]
    fn ocfs_without_index_uses_placeholders() {
        let raw = map(&[("program_name", json!("Sunny Days"))]);
        let rec = normalize_ocfs("1", &raw, &AgeRanges::default());
        assert_eq!(rec.city, "Unknown City");
        assert_eq!(rec.county, "");
        assert_eq!(rec.latitude, None);
        assert_eq!(rec.longitude, None);
        assert_eq!(rec.street, "");
        assert_eq!(rec.zipcode, "");
    }

    #[test]
    fn site_address_splitting() {
        assert_eq!(
            split_site_address("123 Flatbush Ave, Brooklyn, NY 11201"),
            ("123 Flatbush Ave".to_string(), "11201".to_string())
        );
        // Single-segment addresses: the whole string is both street and
        // last segment.
        assert_eq!(
            split_site_address("Somewhere 5"),
            ("Somewhere 5".to_string(), "Somewhere 5".to_string())
        );
        assert_eq!(split_site_address(""), (String::new(), String::new()));
    }
}
