use eyre::Result;
use log::{debug, warn};
use scraper::Html;
use url::Url;

use crate::models::job::JobRecord;
use crate::scraper::extract::FieldSelectors;
use crate::scraper::fetch::PageSource;

/// Fetches a listing's detail page and extracts `fields` from it.
///
/// Failures are logged and produce an empty record so the listing keeps its
/// summary fields.
pub async fn fetch_details<S: PageSource>(
    source: &S,
    link: &str,
    fields: &FieldSelectors,
) -> JobRecord {
    match try_fetch_details(source, link, fields).await {
        Ok(record) => {
            debug!("fetched {} detail fields from {}", record.len(), link);
            record
        }
        Err(e) => {
            warn!("failed to fetch job details from {}: {:#}", link, e);
            JobRecord::new()
        }
    }
}

async fn try_fetch_details<S: PageSource>(
    source: &S,
    link: &str,
    fields: &FieldSelectors,
) -> Result<JobRecord> {
    let url = Url::parse(link)?;
    let html = source.fetch(&url).await?;
    let document = Html::parse_document(&html);
    Ok(fields.extract_document(&document, &url))
}
