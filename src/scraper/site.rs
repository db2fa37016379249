use std::collections::HashSet;

use eyre::{Result, WrapErr};
use log::{debug, info, warn};
use scraper::{Html, Selector};
use url::Url;

use crate::models::job::JobRecord;
use crate::scraper::detail::fetch_details;
use crate::scraper::extract::{FieldSelectors, compile_selector};
use crate::scraper::fetch::PageSource;
use crate::scraper::filter::JobFilter;
use crate::scraper::pagination::PageLinks;
use crate::scraper::scroll::{BrowserDriver, ScrollNavigator};
use crate::utils::config::{Pagination, ScraperSettings, SiteConfig};

/// Everything a site scrape needs besides its own configuration.
pub struct ScrapeContext<'a, S> {
    pub source: &'a S,
    pub driver: &'a dyn BrowserDriver,
    pub filter: &'a JobFilter,
    pub settings: &'a ScraperSettings,
}

#[derive(Debug, Clone)]
enum Traversal {
    SinglePage,
    Links(PageLinks),
    InfiniteScroll { max_scrolls: u32 },
}

/// One configured site with all selectors compiled.
#[derive(Debug, Clone)]
pub struct SiteScraper {
    name: String,
    url: Url,
    listing: Selector,
    fields: FieldSelectors,
    detail_fields: Option<FieldSelectors>,
    traversal: Traversal,
    max_jobs: usize,
    max_pages: usize,
}

impl SiteScraper {
    pub fn new(site: &SiteConfig) -> Result<Self> {
        Self::compile(site).wrap_err_with(|| format!("invalid configuration for site `{}`", site.name))
    }

    fn compile(site: &SiteConfig) -> Result<Self> {
        let detail_fields = match &site.detail_fields {
            Some(fields) if !fields.is_empty() => Some(FieldSelectors::compile(fields)?),
            _ => None,
        };

        let traversal = match &site.pagination {
            Pagination::InfiniteScroll { max_scrolls } => Traversal::InfiniteScroll {
                max_scrolls: *max_scrolls,
            },
            other => PageLinks::compile(other)?
                .map(Traversal::Links)
                .unwrap_or(Traversal::SinglePage),
        };

        Ok(Self {
            name: site.name.clone(),
            url: site.url.clone(),
            listing: compile_selector(&site.job_selector)?,
            fields: FieldSelectors::compile(&site.fields)?,
            detail_fields,
            traversal,
            max_jobs: site.max_jobs,
            max_pages: site.max_pages,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accepted jobs for this site in discovery order, never more than `max_jobs`.
    pub async fn scrape<S: PageSource>(&self, ctx: &ScrapeContext<'_, S>) -> Vec<JobRecord> {
        info!("scraping site `{}` from {}", self.name, self.url);

        let jobs = match &self.traversal {
            Traversal::InfiniteScroll { max_scrolls } => self.scrape_scroll(ctx, *max_scrolls).await,
            Traversal::Links(links) => self.scrape_pages(ctx, Some(links)).await,
            Traversal::SinglePage => self.scrape_pages(ctx, None).await,
        };

        info!("site `{}` yielded {} matching jobs", self.name, jobs.len());
        jobs
    }

    async fn scrape_scroll<S: PageSource>(
        &self,
        ctx: &ScrapeContext<'_, S>,
        max_scrolls: u32,
    ) -> Vec<JobRecord> {
        let navigator = ScrollNavigator {
            url: &self.url,
            listing: &self.listing,
            fields: &self.fields,
            detail_fields: self.detail_fields.as_ref(),
            max_jobs: self.max_jobs,
            max_scrolls,
            settle: ctx.settings.scroll_settle(),
            detail_delay: ctx.settings.detail_delay(),
        };

        navigator
            .collect(ctx.driver, ctx.source)
            .await
            .into_iter()
            .filter(|job| ctx.filter.accepts(job))
            .take(self.max_jobs)
            .collect()
    }

    async fn scrape_pages<S: PageSource>(
        &self,
        ctx: &ScrapeContext<'_, S>,
        links: Option<&PageLinks>,
    ) -> Vec<JobRecord> {
        let mut jobs = Vec::new();
        let mut visited = HashSet::new();
        let mut url = self.url.clone();

        for page in 1..=self.max_pages {
            visited.insert(url.clone());
            debug!("[{}] page {}: {}", self.name, page, url);

            let html = match ctx.source.fetch(&url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("[{}] failed to load {}, stopping: {:#}", self.name, url, e);
                    break;
                }
            };

            let (listings, next) = self.parse_page(&html, &url, links);
            self.absorb(listings, ctx, &mut jobs).await;

            if jobs.len() >= self.max_jobs {
                info!("[{}] reached the limit of {} jobs", self.name, self.max_jobs);
                break;
            }

            match next {
                Some(next) if visited.contains(&next) => {
                    info!("[{}] pagination does not advance past {}, stopping", self.name, url);
                    break;
                }
                Some(next) => {
                    url = next;
                    tokio::time::sleep(ctx.settings.page_delay()).await;
                }
                None => break,
            }
        }

        jobs
    }

    /// Summary records for every listing on the page, plus the next page address.
    fn parse_page(
        &self,
        html: &str,
        url: &Url,
        links: Option<&PageLinks>,
    ) -> (Vec<JobRecord>, Option<Url>) {
        let document = Html::parse_document(html);
        let listings = document
            .select(&self.listing)
            .map(|element| self.fields.extract(element, url))
            .collect();
        let next = links.and_then(|links| links.next_page(&document, url));
        (listings, next)
    }

    async fn absorb<S: PageSource>(
        &self,
        listings: Vec<JobRecord>,
        ctx: &ScrapeContext<'_, S>,
        jobs: &mut Vec<JobRecord>,
    ) {
        for mut job in listings {
            if jobs.len() >= self.max_jobs {
                break;
            }

            if let Some(detail_fields) = &self.detail_fields
                && let Some(link) = job.link().map(str::to_string)
            {
                job.merge(fetch_details(ctx.source, &link, detail_fields).await);
                tokio::time::sleep(ctx.settings.detail_delay()).await;
            }

            if ctx.filter.accepts(&job) {
                jobs.push(job);
            } else {
                debug!("[{}] filtered out {:?}", self.name, job.title());
            }
        }
    }
}
