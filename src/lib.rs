pub mod chat;
pub mod latex;
pub mod models;
pub mod scraper;
pub mod utils;

use std::path::Path;

use eyre::Result;

use crate::models::job::JobRecord;
use crate::scraper::job::JobScraper;
use crate::utils::config::config;
use crate::utils::toolchain::Toolchain;

/// Loads the config at `path` and scrapes every site it lists.
///
/// Only configuration problems are errors; unreachable pages and missing
/// browsers reduce the result instead.
pub async fn scrape_jobs(path: impl AsRef<Path>) -> Result<Vec<JobRecord>> {
    let config = config(path)?;
    let toolchain = Toolchain::resolve(&config.toolchain);
    let scraper = JobScraper::from_config(&config, &toolchain)?;
    Ok(scraper.scrape_all().await)
}
