mod availability;
mod export;
mod fetch;
mod join;
mod parser;
mod schema;
mod store;

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::warn;

use availability::{AgeRanges, SearchCategory};
use store::{FragmentKind, IndexEntry, Store};

const NYCH_OUTPUT: &str = "data/nych_providers.csv";
const OCFS_OUTPUT: &str = "data/ocfs_providers.csv";

const COUNTIES: [&str; 5] = ["Manhattan", "Bronx", "Brooklyn", "Queens", "Staten Island"];
const PROGRAM_TYPES: [&str; 3] = [
    "Family Day Care",
    "Group Family Day Care",
    "School-Age Child Care",
];

#[derive(Parser)]
#[command(name = "nycc_scraper", about = "NY childcare provider aggregator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the NYC childcare search (all three categories) and export
    Nych,
    /// Enumerate day-care searches per county and append provider ids
    OcfsDiscover,
    /// Fetch profile + map pages per provider id and persist fragments
    OcfsScrape {
        /// Max provider ids to process (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Re-fetch ids that already have a profile fragment
        #[arg(long)]
        refresh: bool,
    },
    /// Join stored fragments and export the canonical CSV
    OcfsExport,
    /// Show store statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Nych => run_nych().await,
        Commands::OcfsDiscover => run_ocfs_discover().await,
        Commands::OcfsScrape { limit, refresh } => run_ocfs_scrape(limit, refresh).await,
        Commands::OcfsExport => run_ocfs_export(),
        Commands::Stats => run_stats(),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run_nych() -> anyhow::Result<()> {
    let client = fetch::client()?;
    let mut records = Vec::new();

    for category in SearchCategory::ALL {
        let html = match fetch::fetch_search_page(&client, category).await {
            Ok(html) => html,
            Err(e) => {
                warn!("skipping category {}: {:#}", category.query_value(), e);
                continue;
            }
        };

        let ages = category.age_ranges();
        let raws = parser::process_search_page(&html);
        println!("{}: {} providers", category.query_value(), raws.len());
        for raw in &raws {
            records.push(schema::normalize_nych(raw, &ages));
        }
    }

    if records.is_empty() {
        println!("No provider data to export.");
        return Ok(());
    }

    export::write_csv(NYCH_OUTPUT, &records)?;
    println!("Exported {} providers to {}", records.len(), NYCH_OUTPUT);
    Ok(())
}

async fn run_ocfs_discover() -> anyhow::Result<()> {
    let client = fetch::client()?;
    let store = Store::open(store::DATA_DIR);
    let mut total = 0;

    for county in COUNTIES {
        for program_type in PROGRAM_TYPES {
            let entries = match fetch::discover_provider_ids(&client, county, program_type).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("skipping {} / {}: {:#}", county, program_type, e);
                    continue;
                }
            };
            store.append_index(&entries)?;
            total += entries.len();
        }
    }

    println!("Appended {} index rows.", total);
    Ok(())
}

async fn run_ocfs_scrape(limit: Option<usize>, refresh: bool) -> anyhow::Result<()> {
    let store = Store::open(store::DATA_DIR);
    let mut ids = distinct_ids(&store.read_index()?);
    if ids.is_empty() {
        println!("No provider ids. Run 'ocfs-discover' first.");
        return Ok(());
    }
    if let Some(n) = limit {
        ids.truncate(n);
    }

    let client = fetch::client()?;
    let pb = ProgressBar::new(ids.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut saved = 0usize;
    let mut skipped = 0usize;
    let mut errors = 0usize;

    for id in &ids {
        if !refresh && store.has_fragment(FragmentKind::Profile, id) {
            skipped += 1;
            pb.inc(1);
            continue;
        }

        match fetch::fetch_page(&client, &fetch::profile_url(id)).await {
            Ok(html) => {
                let mut fragment = parser::profile::parse_profile_page(&html);
                fragment.insert("raw_html".to_string(), Value::String(html));
                fragment.insert("scraped_at".to_string(), Value::String(now_stamp()));
                store.put_fragment(FragmentKind::Profile, id, &fragment)?;
                saved += 1;
            }
            Err(e) => {
                warn!("profile fetch failed for {}: {:#}", id, e);
                errors += 1;
                pb.inc(1);
                continue;
            }
        }

        // The map page is best-effort; many family day cares never geocode.
        match fetch::fetch_page(&client, &fetch::location_url(id)).await {
            Ok(html) => {
                if let Some(mut fragment) = parser::location::parse_location_page(&html) {
                    fragment.insert("raw_html".to_string(), Value::String(html));
                    fragment.insert("scraped_at".to_string(), Value::String(now_stamp()));
                    store.put_fragment(FragmentKind::Location, id, &fragment)?;
                }
            }
            Err(e) => warn!("map fetch failed for {}: {:#}", id, e),
        }

        pb.inc(1);
    }

    pb.finish_and_clear();
    println!(
        "Saved {} profiles ({} skipped, {} errors).",
        saved, skipped, errors
    );
    Ok(())
}

fn run_ocfs_export() -> anyhow::Result<()> {
    let store = Store::open(store::DATA_DIR);
    let entries = store.read_index()?;
    if entries.is_empty() {
        println!("Id index is empty. Run 'ocfs-discover' and 'ocfs-scrape' first.");
        return Ok(());
    }

    // First index row per id wins; later duplicates are rerun noise.
    let mut index_by_id: HashMap<&str, &IndexEntry> = HashMap::new();
    for entry in &entries {
        index_by_id.entry(entry.provider_id.as_str()).or_insert(entry);
    }

    let ids = distinct_ids(&entries);
    let mut records = Vec::new();
    let mut missing = 0usize;

    for id in &ids {
        let Some(raw) = join::join_provider(&store, id, index_by_id.get(id.as_str()).copied())
        else {
            missing += 1;
            continue;
        };
        let capacity = raw
            .get("total_capacity")
            .and_then(Value::as_str)
            .unwrap_or("");
        let ages = AgeRanges::from_capacity_text(capacity);
        records.push(schema::normalize_ocfs(id, &raw, &ages));
    }

    export::write_csv(OCFS_OUTPUT, &records)?;
    println!(
        "Exported {} providers to {} ({} ids had no profile).",
        records.len(),
        OCFS_OUTPUT,
        missing
    );
    Ok(())
}

fn run_stats() -> anyhow::Result<()> {
    let store = Store::open(store::DATA_DIR);
    let s = store.stats()?;
    println!("Index rows:   {}", s.index_rows);
    println!("Distinct ids: {}", s.distinct_ids);
    println!("Profiles:     {}", s.profiles);
    println!("Locations:    {}", s.locations);
    Ok(())
}

/// Provider ids in discovery order, duplicates dropped.
fn distinct_ids(entries: &[IndexEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|e| seen.insert(e.provider_id.as_str()))
        .map(|e| e.provider_id.clone())
        .collect()
}

fn now_stamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
