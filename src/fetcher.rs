//! Page-fetch collaborator: URL in, normalized plain text of the rendered
//! page out. Rendering and HTML-to-text conversion are delegated to the
//! spider.cloud API; everything behind this seam treats the page as opaque
//! text.

use std::future::Future;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use spider_client::shapes::request::{ReturnFormat, ReturnFormatHandling};
use spider_client::{RequestParams, Spider};

/// Fixed-size boilerplate block the site appends to every rendered page.
const FOOTER_CHARS: usize = 540;

/// Fetch seam for the directory builder; tests inject fakes.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

pub struct SpiderFetcher {
    spider: Spider,
}

impl SpiderFetcher {
    pub fn from_env() -> Result<SpiderFetcher> {
        let api_key = std::env::var("SPIDER_API_KEY")
            .map_err(|_| anyhow::anyhow!("SPIDER_API_KEY environment variable must be set"))?;
        let spider = Spider::new(Some(api_key))
            .map_err(|e| anyhow::anyhow!("Failed to create Spider client: {}", e))?;
        Ok(SpiderFetcher { spider })
    }
}

impl PageFetcher for SpiderFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String>> + Send {
        async move {
            let params = RequestParams {
                return_format: Some(ReturnFormatHandling::Single(ReturnFormat::Markdown)),
                ..Default::default()
            };

            let response = self
                .spider
                .scrape_url(url, Some(params), "application/json")
                .await
                .map_err(|e| anyhow::anyhow!("Spider scrape failed: {}", e))?;

            let parsed: serde_json::Value = match response.as_str() {
                Some(s) => serde_json::from_str(s).unwrap_or(response.clone()),
                None => response,
            };

            let content = parsed
                .as_array()
                .and_then(|arr| arr.first())
                .and_then(|obj| obj.get("content"))
                .and_then(|c| c.as_str())
                .ok_or_else(|| anyhow::anyhow!("No content in spider response"))?;

            Ok(normalize_page_text(content))
        }
    }
}

static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());
static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Strip markdown image syntax, collapse blank-line runs, and drop the
/// trailing site footer.
pub fn normalize_page_text(md: &str) -> String {
    let cleaned = IMAGE_RE.replace_all(md, "");
    let text = BLANK_RUN_RE.replace_all(&cleaned, "\n\n").to_string();
    trim_footer(&text)
}

fn trim_footer(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= FOOTER_CHARS {
        return text.to_string();
    }
    chars[..chars.len() - FOOTER_CHARS].iter().collect()
}

// ── Tests ──
