use auto_resume::scrape_jobs;
use auto_resume::utils::cli::ScrapeArgs;
use auto_resume::utils::log::Logger;
use clap::Parser;
use eyre::Result;
use log::LevelFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = ScrapeArgs::parse();
    Logger::init(LevelFilter::Info);

    let jobs = scrape_jobs(&args.config).await?;
    println!("{}", serde_json::to_string_pretty(&jobs)?);

    Ok(())
}
