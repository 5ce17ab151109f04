use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::schema::CanonicalRecord;

/// Write the canonical records to a CSV file, header row first, rows in the
/// order given. Losing this write loses the run's output, so any failure
/// here is propagated to the caller.
pub fn write_csv(path: impl AsRef<Path>, records: &[CanonicalRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }

    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for record in records {
        wtr.serialize(record)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    wtr.flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::SearchCategory;
    use crate::schema::{normalize_nych, COLUMNS};
    use serde_json::Map;

    #[test]
    fn header_matches_declared_columns() {
        let path = std::env::temp_dir().join(format!("nycc_export_{}.csv", std::process::id()));
        let rec = normalize_nych(&Map::new(), &SearchCategory::SchoolBased.age_ranges());
        write_csv(&path, &[rec]).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        let header = written.lines().next().unwrap();
        assert_eq!(header, COLUMNS.join(","));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn rows_keep_input_order() {
        let path =
            std::env::temp_dir().join(format!("nycc_export_order_{}.csv", std::process::id()));
        let mut first = Map::new();
        first.insert("centerName".into(), serde_json::json!("Alpha"));
        let mut second = Map::new();
        second.insert("centerName".into(), serde_json::json!("Beta"));

        let ages = SearchCategory::PreSchool.age_ranges();
        let records = vec![
            normalize_nych(&first, &ages),
            normalize_nych(&second, &ages),
        ];
        write_csv(&path, &records).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert!(lines[1].starts_with("Alpha,"));
        assert!(lines[2].starts_with("Beta,"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn empty_optionals_are_empty_cells() {
        let path =
            std::env::temp_dir().join(format!("nycc_export_empty_{}.csv", std::process::id()));
        let rec = normalize_nych(&Map::new(), &SearchCategory::SchoolBased.age_ranges());
        write_csv(&path, &[rec]).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        let row = written.lines().nth(1).unwrap();
        let cells: Vec<&str> = row.split(',').collect();
        assert_eq!(cells.len(), COLUMNS.len());
        // Latitude and longitude columns are empty, not zero.
        assert_eq!(cells[5], "");
        assert_eq!(cells[6], "");
        let _ = fs::remove_file(&path);
    }
}
