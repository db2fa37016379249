use eyre::Result;
use log::debug;
use url::Url;

use crate::utils::config::ScraperSettings;

/// Something that can return the HTML behind an address.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch(&self, url: &Url) -> Result<String>;
}

/// Plain HTTP fetcher with a fixed per-request timeout and a desktop user agent.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(settings: &ScraperSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }
}

impl PageSource for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}
