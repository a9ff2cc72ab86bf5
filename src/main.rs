mod directory;
mod discovery;
mod export;
mod extract;
mod fetcher;
mod fuzzy;
mod quality;
mod record;
mod vocab;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::export::RunStamp;
use crate::fetcher::PageFetcher;
use crate::record::{Gender, ProfileIdentifier, COLUMNS};

#[derive(Parser)]
#[command(
    name = "therapist_directory",
    about = "Therapist directory scraper: listing discovery, profile extraction, quality gate"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover profile URLs for a region and write the URL table
    Urls {
        /// Region slug, e.g. north-carolina (lowercase, dashes for spaces)
        #[arg(short, long)]
        region: String,
        /// Listing pages to walk per binary category (20 profiles per page)
        #[arg(short, long, default_value = "250")]
        pages: u32,
        /// Listing pages for the non-binary category
        #[arg(long, default_value = "20")]
        nonbinary_pages: u32,
        #[arg(long, default_value = "scraped_data")]
        out_dir: PathBuf,
        /// Seconds to wait between listing requests
        #[arg(long, default_value = "10")]
        cooldown_secs: u64,
    },
    /// Scrape a URL table into clean and rejected directory tables
    Build {
        #[arg(short, long)]
        region: String,
        /// URL table produced by `urls` (Gender,URL)
        #[arg(short, long)]
        urls: PathBuf,
        /// Max profiles to scrape (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Skip the retry pass over whole-page failures
        #[arg(long)]
        no_retry: bool,
        #[arg(long, default_value = "reference_data")]
        reference_dir: PathBuf,
        #[arg(long, default_value = "scraped_data")]
        out_dir: PathBuf,
        /// Seconds to wait between profile requests
        #[arg(long, default_value = "10")]
        cooldown_secs: u64,
    },
    /// Discover + build in one run
    Run {
        #[arg(short, long)]
        region: String,
        #[arg(short, long, default_value = "250")]
        pages: u32,
        #[arg(long, default_value = "20")]
        nonbinary_pages: u32,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[arg(long)]
        no_retry: bool,
        #[arg(long, default_value = "reference_data")]
        reference_dir: PathBuf,
        #[arg(long, default_value = "scraped_data")]
        out_dir: PathBuf,
        #[arg(long, default_value = "10")]
        cooldown_secs: u64,
    },
    /// Scrape one profile and print its record (regex maintenance aid)
    Profile {
        #[arg(long)]
        url: String,
        /// Listing category the profile came from
        #[arg(long, default_value = "female")]
        gender: String,
        /// Dump the raw page text before the record
        #[arg(long)]
        show_text: bool,
        #[arg(long, default_value = "reference_data")]
        reference_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Urls {
            region,
            pages,
            nonbinary_pages,
            out_dir,
            cooldown_secs,
        } => {
            let stamp = RunStamp::new(&region);
            discover_and_save(
                &region,
                pages,
                nonbinary_pages,
                &out_dir,
                Duration::from_secs(cooldown_secs),
                &stamp,
            )
            .await
            .map(|_| ())
        }
        Commands::Build {
            region,
            urls,
            limit,
            no_retry,
            reference_dir,
            out_dir,
            cooldown_secs,
        } => {
            let mut ids = export::read_urls(&urls)?;
            if let Some(n) = limit {
                ids.truncate(n);
            }
            if ids.is_empty() {
                println!("URL table is empty. Run 'urls' first.");
                return Ok(());
            }
            let stamp = RunStamp::new(&region);
            build_and_save(
                &ids,
                !no_retry,
                &reference_dir,
                &out_dir,
                Duration::from_secs(cooldown_secs),
                &stamp,
            )
            .await
        }
        Commands::Run {
            region,
            pages,
            nonbinary_pages,
            limit,
            no_retry,
            reference_dir,
            out_dir,
            cooldown_secs,
        } => {
            let cooldown = Duration::from_secs(cooldown_secs);
            let stamp = RunStamp::new(&region);
            let mut ids = discover_and_save(
                &region,
                pages,
                nonbinary_pages,
                &out_dir,
                cooldown,
                &stamp,
            )
            .await?;
            if let Some(n) = limit {
                ids.truncate(n);
            }
            if ids.is_empty() {
                println!("No profile URLs discovered.");
                return Ok(());
            }
            build_and_save(&ids, !no_retry, &reference_dir, &out_dir, cooldown, &stamp).await
        }
        Commands::Profile {
            url,
            gender,
            show_text,
            reference_dir,
        } => scrape_one(&url, &gender, show_text, &reference_dir).await,
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn discover_and_save(
    region: &str,
    pages: u32,
    nonbinary_pages: u32,
    out_dir: &Path,
    cooldown: Duration,
    stamp: &RunStamp,
) -> Result<Vec<ProfileIdentifier>> {
    let plan = discovery::DiscoveryPlan {
        region: region.to_string(),
        binary_pages: pages,
        non_binary_pages: nonbinary_pages,
        cooldown,
    };
    let ids = discovery::discover_urls(&plan).await?;
    let path = export::write_urls(out_dir, stamp, &ids)?;
    println!("Discovered {} profile URLs -> {}", ids.len(), path.display());
    Ok(ids)
}

async fn build_and_save(
    ids: &[ProfileIdentifier],
    retry: bool,
    reference_dir: &Path,
    out_dir: &Path,
    cooldown: Duration,
    stamp: &RunStamp,
) -> Result<()> {
    let vocabs = vocab::VocabSet::load(reference_dir)?;
    let spider = fetcher::SpiderFetcher::from_env()?;
    let opts = directory::BuildOptions { retry, cooldown };

    println!("Scraping {} profiles...", ids.len());
    let records =
        directory::build(&spider, &vocabs, &extract::TracingDiagnostics, ids, &opts).await?;

    let parts = quality::partition(&records);
    let clean_path = export::write_directory(out_dir, stamp, &parts.clean)?;
    let removed_path = export::write_rejected(out_dir, stamp, &parts.rejected)?;
    println!(
        "Clean: {} rows -> {}",
        parts.clean.len(),
        clean_path.display()
    );
    println!(
        "Rejected: {} audit rows -> {}",
        parts.rejected.len(),
        removed_path.display()
    );
    Ok(())
}

async fn scrape_one(url: &str, gender: &str, show_text: bool, reference_dir: &Path) -> Result<()> {
    let gender: Gender = gender.parse()?;
    let vocabs = vocab::VocabSet::load(reference_dir)?;
    let spider = fetcher::SpiderFetcher::from_env()?;

    let page_text = spider.fetch(url).await?;
    if show_text {
        println!("{page_text}\n\n--- end of page text ---\n");
    }

    let id = ProfileIdentifier {
        gender,
        url: url.to_string(),
    };
    let record = extract::extract_record(&id, &page_text, &vocabs, &extract::TracingDiagnostics);
    for (col, cell) in COLUMNS.iter().zip(record.to_row()) {
        println!("{col:>22}: {cell}");
    }
    Ok(())
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
