use anyhow::{Context, Result};
use tracing::info;

use crate::availability::SearchCategory;
use crate::parser::listing;
use crate::store::IndexEntry;

const NYCH_SEARCH_URL: &str = "https://a816-healthpsi.nyc.gov/ChildCare/search";
const OCFS_SEARCH_URL: &str = "https://hs.ocfs.ny.gov/dcfs";
const OCFS_PAGE_SIZE: &str = "500";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/110.0.0.0 Safari/537.36";

pub fn profile_url(id: &str) -> String {
    format!("https://hs.ocfs.ny.gov/DCFS/Profile/Index/{}", id)
}

pub fn location_url(id: &str) -> String {
    format!("https://hs.ocfs.ny.gov/DCFS/Map/Index/{}", id)
}

pub fn client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("building HTTP client")
}

/// POST the NYC childcare search form for one category and return the
/// result page. The endpoint expects the browser form fields verbatim,
/// including the column toggles.
pub async fn fetch_search_page(
    client: &reqwest::Client,
    category: SearchCategory,
) -> Result<String> {
    let form: Vec<(&str, &str)> = vec![
        ("searchBean.linkPK", "0"),
        ("searchBean.pageoffset", "0"),
        ("searchBean.getNewResult", "true"),
        ("searchBean.progTypeValues", category.query_value()),
        ("searchBean.search1", "1"),
        ("toggle-cols", "co-1"),
        ("toggle-cols", "co-2"),
        ("toggle-cols", "co-3"),
        ("toggle-cols", "co-4"),
        ("toggle-cols", "co-5"),
    ];

    let response = client
        .post(NYCH_SEARCH_URL)
        .header("Origin", "https://a816-healthpsi.nyc.gov")
        .header("Referer", NYCH_SEARCH_URL)
        .form(&form)
        .send()
        .await
        .with_context(|| format!("searching category {:?}", category.query_value()))?
        .error_for_status()
        .with_context(|| format!("searching category {:?}", category.query_value()))?;

    let html = response.text().await.context("reading search response")?;
    info!("fetched search page for {}", category.query_value());
    Ok(html)
}

/// GET one detail page (profile or map).
pub async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<String> {
    let html = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("fetching {}", url))?
        .error_for_status()
        .with_context(|| format!("fetching {}", url))?
        .text()
        .await
        .with_context(|| format!("reading {}", url))?;
    Ok(html)
}

/// Walk the paginated day-care search for one (county, program type) pair
/// and collect every listed provider id, in discovery order.
pub async fn discover_provider_ids(
    client: &reqwest::Client,
    county: &str,
    program_type: &str,
) -> Result<Vec<IndexEntry>> {
    let mut entries: Vec<IndexEntry> = Vec::new();
    let mut page = 1usize;

    loop {
        let page_number = page.to_string();
        let form: Vec<(&str, &str)> = vec![
            ("ddlCounty", county),
            ("ddlProgramType", program_type),
            ("Paging.PageSize", OCFS_PAGE_SIZE),
            ("Paging.PageNumber", &page_number),
            ("btnSubmit", "Find Day Care"),
        ];

        let html = client
            .post(OCFS_SEARCH_URL)
            .form(&form)
            .send()
            .await
            .with_context(|| format!("searching {} / {}", county, program_type))?
            .error_for_status()
            .with_context(|| format!("searching {} / {}", county, program_type))?
            .text()
            .await
            .with_context(|| format!("reading {} / {} results", county, program_type))?;

        let ids = listing::parse_provider_ids(&html);
        if ids.is_empty() {
            break;
        }

        // A server that ignores the page parameter would serve the same
        // page forever; stop once a page adds nothing new.
        let known: std::collections::HashSet<&str> =
            entries.iter().map(|e| e.provider_id.as_str()).collect();
        let fresh: Vec<String> = ids.into_iter().filter(|id| !known.contains(id.as_str())).collect();
        if fresh.is_empty() {
            break;
        }

        info!(
            "{} / {}: page {} listed {} providers",
            county,
            program_type,
            page,
            fresh.len()
        );
        entries.extend(fresh.into_iter().map(|provider_id| IndexEntry {
            county: county.to_string(),
            program_type: program_type.to_string(),
            provider_id,
        }));

        if !listing::has_next_page(&html) {
            break;
        }
        page += 1;
    }

    Ok(entries)
}
