use eyre::Result;
use log::info;

use crate::models::job::JobRecord;
use crate::scraper::fetch::{HttpFetcher, PageSource};
use crate::scraper::filter::JobFilter;
use crate::scraper::scroll::{BrowserDriver, driver_for};
use crate::scraper::site::{ScrapeContext, SiteScraper};
use crate::utils::config::{ConfigInner, ScraperSettings};
use crate::utils::toolchain::Toolchain;

/// Scrapes every configured site in order.
pub struct JobScraper<S> {
    sites: Vec<SiteScraper>,
    filter: JobFilter,
    settings: ScraperSettings,
    source: S,
    driver: Box<dyn BrowserDriver>,
}

impl JobScraper<HttpFetcher> {
    pub fn from_config(config: &ConfigInner, toolchain: &Toolchain) -> Result<Self> {
        let source = HttpFetcher::new(&config.scraper)?;
        let driver = driver_for(toolchain, &config.scraper.user_agent);
        Self::new(config, source, driver)
    }
}

impl<S: PageSource> JobScraper<S> {
    /// Fails if any site carries an invalid selector.
    pub fn new(config: &ConfigInner, source: S, driver: Box<dyn BrowserDriver>) -> Result<Self> {
        let sites = config
            .sites
            .iter()
            .map(SiteScraper::new)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            sites,
            filter: JobFilter::from_config(config),
            settings: config.scraper.clone(),
            source,
            driver,
        })
    }

    /// Site order and within-site order are preserved. Postings listed on two
    /// sites appear twice.
    pub async fn scrape_all(&self) -> Vec<JobRecord> {
        let ctx = ScrapeContext {
            source: &self.source,
            driver: self.driver.as_ref(),
            filter: &self.filter,
            settings: &self.settings,
        };

        let mut jobs = Vec::new();
        for site in &self.sites {
            let found = site.scrape(&ctx).await;
            info!("{} jobs from `{}`", found.len(), site.name());
            jobs.extend(found);
        }

        info!("found {} matching jobs across {} sites", jobs.len(), self.sites.len());
        jobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::fetch::fixtures::FixtureSource;
    use crate::scraper::scroll::NullDriver;
    use crate::scraper::site::tests::{quiet, site};
    use crate::utils::config::{Pagination, SkillRequirement};

    fn config(urls: &[&str]) -> ConfigInner {
        ConfigInner {
            sites: urls.iter().map(|url| site(url, Pagination::None)).collect(),
            skills: Vec::new(),
            salary: Default::default(),
            llm: Default::default(),
            scraper: quiet(),
            toolchain: Default::default(),
        }
    }

    fn listing(title: &str) -> String {
        format!(r#"<div class="job"><h2>{title}</h2><a href="/{title}">x</a></div>"#)
    }

    #[tokio::test]
    async fn concatenates_sites_in_order_without_dedup() {
        let a = format!("{}{}", listing("A1"), listing("A2"));
        let b = format!("{}{}", listing("B1"), listing("A1"));
        let source = FixtureSource::new(&[("https://a.com/", &a), ("https://b.com/", &b)]);
        let scraper = JobScraper::new(
            &config(&["https://a.com/", "https://b.com/"]),
            source,
            Box::new(NullDriver),
        )
        .unwrap();

        let jobs = scraper.scrape_all().await;

        let titles: Vec<_> = jobs.iter().filter_map(|j| j.title()).collect();
        assert_eq!(titles, vec!["A1", "A2", "B1", "A1"]);
        assert_eq!(jobs[3].link(), Some("https://b.com/A1"));
    }

    #[tokio::test]
    async fn failing_site_does_not_affect_others() {
        let b = listing("B1");
        let source = FixtureSource::new(&[("https://b.com/", &b)]);
        let scraper = JobScraper::new(
            &config(&["https://down.com/", "https://b.com/"]),
            source,
            Box::new(NullDriver),
        )
        .unwrap();

        let jobs = scraper.scrape_all().await;

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title(), Some("B1"));
    }

    #[tokio::test]
    async fn skills_from_config_filter_every_site() {
        let a = format!("{}{}", listing("rust"), listing("java"));
        let source = FixtureSource::new(&[("https://a.com/", &a)]);
        let mut config = config(&["https://a.com/"]);
        config.skills = vec![SkillRequirement::Requirement {
            name: "Rust".to_string(),
            required: true,
        }];
        let scraper = JobScraper::new(&config, source, Box::new(NullDriver)).unwrap();

        let jobs = scraper.scrape_all().await;

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title(), Some("rust"));
    }

    #[test]
    fn invalid_site_fails_construction() {
        let mut config = config(&["https://a.com/"]);
        config.sites[0].fields.insert("title".to_string(), ":::".to_string());

        assert!(JobScraper::new(&config, FixtureSource::default(), Box::new(NullDriver)).is_err());
    }
}
