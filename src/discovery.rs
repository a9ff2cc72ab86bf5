//! URL discovery: walk the region's listing pages per category and collect
//! profile links, deduplicated by URL. Listing fetches that fail are logged
//! and skipped — discovery is best-effort by design.

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{info, warn};

use crate::record::{Gender, ProfileIdentifier};

const DIRECTORY_BASE: &str = "https://www.psychologytoday.com";

static PROFILE_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"class="profile-title"[^>]*href="([^"]+)""#).unwrap());

pub struct DiscoveryPlan {
    /// Region slug, e.g. `north-carolina` (two-word states dashed).
    pub region: String,
    /// Listing pages to walk for each of male and female.
    pub binary_pages: u32,
    /// Listing pages for non-binary; far fewer profiles exist there.
    pub non_binary_pages: u32,
    pub cooldown: Duration,
}

/// Collect profile identifiers for a region, first-seen order, deduplicated.
pub async fn discover_urls(plan: &DiscoveryPlan) -> Result<Vec<ProfileIdentifier>> {
    let client = reqwest::Client::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut ids: Vec<ProfileIdentifier> = Vec::new();

    for page in 1..=plan.binary_pages {
        for gender in [Gender::Male, Gender::Female] {
            collect_page(&client, plan, gender, page, &mut seen, &mut ids).await;
            tokio::time::sleep(plan.cooldown).await;
        }
    }
    for page in 1..=plan.non_binary_pages {
        collect_page(&client, plan, Gender::NonBinary, page, &mut seen, &mut ids).await;
        tokio::time::sleep(plan.cooldown).await;
    }

    info!(
        region = plan.region.as_str(),
        urls = ids.len(),
        "discovery finished"
    );
    Ok(ids)
}

async fn collect_page(
    client: &reqwest::Client,
    plan: &DiscoveryPlan,
    gender: Gender,
    page: u32,
    seen: &mut HashSet<String>,
    ids: &mut Vec<ProfileIdentifier>,
) {
    let url = listing_url(&plan.region, gender, page);
    match fetch_listing(client, &url).await {
        Ok(html) => {
            for profile_url in extract_profile_links(&html) {
                if seen.insert(profile_url.clone()) {
                    ids.push(ProfileIdentifier {
                        gender,
                        url: profile_url,
                    });
                }
            }
        }
        // Usually a request/handshake hiccup; the page is skipped, not fatal.
        Err(e) => warn!(url = url.as_str(), error = %e, "listing fetch failed, skipping"),
    }
}

async fn fetch_listing(client: &reqwest::Client, url: &str) -> Result<String> {
    client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
        .context("failed to read listing page body")
}

fn listing_url(region: &str, gender: Gender, page: u32) -> String {
    if page <= 1 {
        format!("{DIRECTORY_BASE}/us/therapists/{region}?category={gender}")
    } else {
        format!("{DIRECTORY_BASE}/us/therapists/{region}?category={gender}&page={page}")
    }
}

/// Profile hrefs from a listing page, absolutized against the site base.
pub fn extract_profile_links(html: &str) -> Vec<String> {
    PROFILE_LINK_RE
        .captures_iter(html)
        .map(|c| c[1].to_string())
        .map(|href| {
            if href.starts_with('/') {
                format!("{DIRECTORY_BASE}{href}")
            } else {
                href
            }
        })
        .collect()
}

// ── Tests ──
