//! Directory builder: scrape every identifier strictly one at a time with a
//! fixed cooldown between requests, then retry whole-page failures once and
//! fold successful retries back into the table.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::extract::{self, Diagnostics};
use crate::fetcher::PageFetcher;
use crate::record::{ProfileIdentifier, ProfileRecord};
use crate::vocab::VocabSet;

/// Pause between profile requests. Rate limiting for the source site's
/// benefit, not a tunable performance knob.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(10);

pub struct BuildOptions {
    /// Re-scrape whole-page failures once after the main pass.
    pub retry: bool,
    pub cooldown: Duration,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            retry: true,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

/// Scrape all identifiers into a table, one row per identifier, input order
/// preserved. Fetch errors never fail the build, they become program-failure
/// rows.
pub async fn build<F: PageFetcher>(
    fetcher: &F,
    vocabs: &VocabSet,
    diag: &dyn Diagnostics,
    ids: &[ProfileIdentifier],
    opts: &BuildOptions,
) -> Result<Vec<ProfileRecord>> {
    let t0 = Instant::now();

    let mut records = scrape_all(fetcher, vocabs, diag, ids, opts.cooldown).await?;
    if opts.retry {
        retry_failures(fetcher, vocabs, diag, ids, opts.cooldown, &mut records).await?;
    }
    for r in &mut records {
        r.normalize();
    }

    info!(
        profiles = ids.len(),
        elapsed_s = t0.elapsed().as_secs_f64(),
        "directory build finished"
    );
    Ok(records)
}

async fn scrape_all<F: PageFetcher>(
    fetcher: &F,
    vocabs: &VocabSet,
    diag: &dyn Diagnostics,
    ids: &[ProfileIdentifier],
    cooldown: Duration,
) -> Result<Vec<ProfileRecord>> {
    let pb = ProgressBar::new(ids.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} (eta {eta})")?
            .progress_chars("=> "),
    );

    let mut records = Vec::with_capacity(ids.len());
    for id in ids {
        let record = match fetcher.fetch(&id.url).await {
            Ok(page_text) => extract::extract_record(id, &page_text, vocabs, diag),
            Err(e) => {
                // Usually a handshake failure or a profile removed since
                // discovery; the retry pass gets a second look.
                warn!(url = id.url.as_str(), error = %e, "page fetch failed");
                ProfileRecord::program_failure(&id.url)
            }
        };
        records.push(record);
        pb.inc(1);
        tokio::time::sleep(cooldown).await;
    }
    pb.finish_and_clear();
    Ok(records)
}

/// Second sequential pass over the program-failure rows only. A row is
/// overwritten when its retry succeeded; a row failing both passes stays a
/// program failure for the quality gate to reject.
async fn retry_failures<F: PageFetcher>(
    fetcher: &F,
    vocabs: &VocabSet,
    diag: &dyn Diagnostics,
    ids: &[ProfileIdentifier],
    cooldown: Duration,
    records: &mut [ProfileRecord],
) -> Result<()> {
    let failed: Vec<ProfileIdentifier> = records
        .iter()
        .filter(|r| r.is_program_failure())
        .filter_map(|r| ids.iter().find(|id| id.url == r.url).cloned())
        .collect();
    if failed.is_empty() {
        return Ok(());
    }

    info!(failures = failed.len(), "retrying whole-page failures");
    let retried = scrape_all(fetcher, vocabs, diag, &failed, cooldown).await?;
    let by_url: HashMap<&str, &ProfileRecord> =
        retried.iter().map(|r| (r.url.as_str(), r)).collect();

    for record in records.iter_mut() {
        if let Some(newer) = by_url.get(record.url.as_str()) {
            if !newer.is_program_failure() {
                *record = (*newer).clone();
            }
        }
    }
    Ok(())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Field, Gender};
    use crate::vocab::{IssueScanner, Vocabulary};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const PAGE: &str = "Next\n\nJohn Roe\n\nLPC\n# About";

    struct NullDiagnostics;

    impl Diagnostics for NullDiagnostics {
        fn extraction_failure(&self, _url: &str, _record: &ProfileRecord) {}
    }

    /// Scripted fetcher: per-URL queue of outcomes, consumed in order.
    struct MockFetcher {
        pages: Mutex<HashMap<String, VecDeque<Result<String, String>>>>,
    }

    impl MockFetcher {
        fn new(script: &[(&str, &[Result<&str, &str>])]) -> MockFetcher {
            let pages = script
                .iter()
                .map(|(url, outcomes)| {
                    let queue = outcomes
                        .iter()
                        .map(|o| match o {
                            Ok(t) => Ok(t.to_string()),
                            Err(e) => Err(e.to_string()),
                        })
                        .collect();
                    (url.to_string(), queue)
                })
                .collect();
            MockFetcher {
                pages: Mutex::new(pages),
            }
        }
    }

    impl PageFetcher for MockFetcher {
        fn fetch(&self, url: &str) -> impl std::future::Future<Output = anyhow::Result<String>> + Send {
            let next = self
                .pages
                .lock()
                .unwrap()
                .get_mut(url)
                .and_then(|q| q.pop_front());
            async move {
                match next {
                    Some(Ok(text)) => Ok(text),
                    Some(Err(e)) => Err(anyhow::anyhow!(e)),
                    None => Err(anyhow::anyhow!("no scripted response")),
                }
            }
        }
    }

    fn empty_vocabs() -> VocabSet {
        let empty = |name: &str| Vocabulary::from_terms(name, []);
        VocabSet {
            ethnicities: empty("ethnicities"),
            faith: empty("faith"),
            insurance: empty("insurance"),
            languages: empty("languages"),
            therapy_types: empty("therapy_types"),
            issues: IssueScanner::new(&empty("issues")).unwrap(),
        }
    }

    fn ids(urls: &[&str]) -> Vec<ProfileIdentifier> {
        urls.iter()
            .map(|u| ProfileIdentifier {
                gender: Gender::Male,
                url: u.to_string(),
            })
            .collect()
    }

    fn opts(retry: bool) -> BuildOptions {
        BuildOptions {
            retry,
            cooldown: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn every_identifier_yields_one_row_in_order() {
        let fetcher = MockFetcher::new(&[
            ("https://x/a", &[Ok(PAGE)]),
            ("https://x/b", &[Err("boom"), Err("boom")]),
            ("https://x/c", &[Ok(PAGE)]),
        ]);
        let ids = ids(&["https://x/a", "https://x/b", "https://x/c"]);
        let records = build(&fetcher, &empty_vocabs(), &NullDiagnostics, &ids, &opts(true))
            .await
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].url, "https://x/a");
        assert_eq!(records[1].url, "https://x/b");
        assert_eq!(records[2].url, "https://x/c");
        assert!(!records[0].is_program_failure());
        assert!(records[1].is_program_failure());
    }

    #[tokio::test]
    async fn retry_overwrites_recovered_failures() {
        let fetcher = MockFetcher::new(&[("https://x/a", &[Err("handshake"), Ok(PAGE)])]);
        let ids = ids(&["https://x/a"]);
        let records = build(&fetcher, &empty_vocabs(), &NullDiagnostics, &ids, &opts(true))
            .await
            .unwrap();

        assert!(!records[0].is_program_failure());
        assert_eq!(records[0].name, Field::Value("John Roe".to_string()));
        assert_eq!(records[0].credentials, Field::Value("LPC".to_string()));
    }

    #[tokio::test]
    async fn failing_both_passes_stays_a_program_failure() {
        let fetcher = MockFetcher::new(&[("https://x/a", &[Err("down"), Err("removed")])]);
        let ids = ids(&["https://x/a"]);
        let records = build(&fetcher, &empty_vocabs(), &NullDiagnostics, &ids, &opts(true))
            .await
            .unwrap();
        assert!(records[0].is_program_failure());
    }

    #[tokio::test]
    async fn retry_disabled_leaves_failures_alone() {
        // A second fetch would succeed, but retry is off.
        let fetcher = MockFetcher::new(&[("https://x/a", &[Err("down"), Ok(PAGE)])]);
        let ids = ids(&["https://x/a"]);
        let records = build(&fetcher, &empty_vocabs(), &NullDiagnostics, &ids, &opts(false))
            .await
            .unwrap();
        assert!(records[0].is_program_failure());
    }
}
