use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use secrecy::SecretString;

use poalim_scraper::models::Credentials;
use poalim_scraper::scraper::{ScrapeOptions, Scraper};

#[derive(Parser)]
#[command(name = "poalim-scraper")]
#[command(about = "Scrape Bank Hapoalim accounts and transactions")]
struct Cli {
    /// Show the browser window instead of running headless
    #[arg(long)]
    headful: bool,

    /// Earliest transaction date to request (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let credentials = Credentials {
        user_code: std::env::var("POALIM_USER_CODE").ok(),
        password: std::env::var("POALIM_PASSWORD").ok().map(SecretString::from),
    };

    let options = ScrapeOptions {
        start_date: cli.start_date,
        ..ScrapeOptions::default()
    };

    let scraper = Scraper::setup(!cli.headful).await?.with_options(options);
    let result = scraper.get_account_data(&credentials).await;
    scraper.close().await;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
