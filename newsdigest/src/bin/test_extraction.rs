//! Manual check of feed reading and article extraction against live sites.
//! Never calls the LLM, so no API key is needed.

use clap::Parser;

use newsdigest::extraction::ContentExtractor;
use newsdigest::ingestion::FeedReader;
use newsdigest::scraping::{PageFetcher, DEFAULT_FETCH_TIMEOUT_SECS};

#[derive(Parser, Debug)]
#[command(name = "test_extraction", about = "Print what newsdigest would send to the summarizer")]
struct Args {
    /// Article or feed URL
    url: String,

    /// Treat the URL as an RSS/Atom feed
    #[arg(long)]
    feed: bool,

    /// Number of feed entries to show
    #[arg(long, default_value_t = 5)]
    limit: usize,

    /// Fetch timeout in seconds
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let args = Args::parse();

    println!("\n{}", "=".repeat(60));
    println!("Testing: {}", args.url);
    println!("{}", "=".repeat(60));

    if args.feed {
        let reader = FeedReader::new(args.timeout)?;
        match reader.fetch(&args.url, args.limit).await {
            Ok(articles) => {
                println!("✓ {} entries", articles.len());
                for (i, article) in articles.iter().enumerate() {
                    println!("  {}. {}", i + 1, article.title);
                    println!("     URL: {}", article.link);
                    println!("     Content: {} chars", article.content.chars().count());
                }
            }
            Err(e) => println!("✗ Failed: {:#}", e),
        }
        return Ok(());
    }

    let fetcher = PageFetcher::new(args.timeout, None)?;
    let extractor = ContentExtractor::standard()?;

    match fetcher.fetch(&args.url).await {
        Ok(html) => {
            println!("  Title: {:?}", extractor.extract_title(&html));
            match extractor.extract(&html) {
                Ok(text) => {
                    println!("✓ Extracted {} chars\n", text.chars().count());
                    println!("{}", text);
                }
                Err(e) => println!("✗ {}", e),
            }
        }
        Err(e) => println!("✗ {}", e),
    }

    Ok(())
}
