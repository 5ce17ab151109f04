use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

pub const DATA_DIR: &str = "data";

/// One row of the append-only provider id index. Re-running discovery
/// appends again; duplicate ids are tolerated and resolved at join time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub county: String,
    pub program_type: String,
    pub provider_id: String,
}

/// Detail fragments persisted per provider id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Profile,
    Location,
}

impl FragmentKind {
    fn dir(self) -> &'static str {
        match self {
            FragmentKind::Profile => "profiles",
            FragmentKind::Location => "locations",
        }
    }

    fn file_name(self, id: &str) -> String {
        match self {
            FragmentKind::Profile => format!("profile_{}.json", id),
            FragmentKind::Location => format!("location_{}.json", id),
        }
    }
}

/// Keyed record store over the on-disk layout: one JSON object per provider
/// id per fragment kind, plus the flat id-index CSV. Lookups have a
/// present/absent contract — a missing or unreadable fragment is absent,
/// never an error.
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn open(root: impl Into<PathBuf>) -> Store {
        Store { root: root.into() }
    }

    fn fragment_path(&self, kind: FragmentKind, id: &str) -> PathBuf {
        self.root.join("ocfs").join(kind.dir()).join(kind.file_name(id))
    }

    fn index_path(&self) -> PathBuf {
        self.root.join("ocfs").join("provider_ids.csv")
    }

    /// Write a fragment, overwriting any previous version for the same id.
    pub fn put_fragment(&self, kind: FragmentKind, id: &str, data: &Map<String, Value>) -> Result<()> {
        let path = self.fragment_path(kind, id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(data)?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Look up a fragment. Absent, unreadable, and unparsable files are all
    /// reported as absent; only the latter two are logged.
    pub fn get_fragment(&self, kind: FragmentKind, id: &str) -> Option<Map<String, Value>> {
        let path = self.fragment_path(kind, id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("unreadable fragment {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_str::<Map<String, Value>>(&raw) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!("malformed fragment {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn has_fragment(&self, kind: FragmentKind, id: &str) -> bool {
        self.fragment_path(kind, id).exists()
    }

    /// Append rows to the id index, writing the header only when the file
    /// is new.
    pub fn append_index(&self, entries: &[IndexEntry]) -> Result<()> {
        let path = self.index_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let is_new = !path.exists();
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            wtr.write_record(["county", "program_type", "provider_id"])?;
        }
        for entry in entries {
            wtr.serialize(entry)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Read the id index in file order. A missing index is empty, not an
    /// error — discovery simply hasn't run yet.
    pub fn read_index(&self) -> Result<Vec<IndexEntry>> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut rdr = csv::Reader::from_path(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        let mut entries = Vec::new();
        for row in rdr.deserialize() {
            entries.push(row?);
        }
        Ok(entries)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let entries = self.read_index()?;
        let distinct: HashSet<&str> = entries.iter().map(|e| e.provider_id.as_str()).collect();
        Ok(StoreStats {
            index_rows: entries.len(),
            distinct_ids: distinct.len(),
            profiles: count_files(&self.root.join("ocfs").join("profiles")),
            locations: count_files(&self.root.join("ocfs").join("locations")),
        })
    }
}

pub struct StoreStats {
    pub index_rows: usize,
    pub distinct_ids: usize,
    pub profiles: usize,
    pub locations: usize,
}

fn count_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).count())
        .unwrap_or(0)
}

// ── Tests ──
