use std::time::Duration;

use eyre::{Result, eyre};
use log::{debug, info, warn};
use scraper::{Html, Selector};
use url::Url;

use crate::models::job::JobRecord;
use crate::scraper::detail::fetch_details;
use crate::scraper::extract::FieldSelectors;
use crate::scraper::fetch::PageSource;
use crate::utils::toolchain::Toolchain;

/// A live page inside a browser. Dropping the session releases the browser.
pub trait BrowserSession {
    /// Serialized HTML of the current DOM.
    fn content(&mut self) -> Result<String>;
    fn scroll_to_bottom(&mut self) -> Result<()>;
    fn page_height(&mut self) -> Result<u64>;
}

pub trait BrowserDriver {
    /// Opens `url` in a fresh browser session.
    fn launch(&self, url: &Url) -> Result<Box<dyn BrowserSession>>;
}

/// Driver used when no browser can be started. Every launch fails.
pub struct NullDriver;

impl BrowserDriver for NullDriver {
    fn launch(&self, _url: &Url) -> Result<Box<dyn BrowserSession>> {
        Err(eyre!("headless browser is not available in this environment"))
    }
}

/// Picks the Chrome driver when the toolchain has a usable browser.
pub fn driver_for(toolchain: &Toolchain, user_agent: &str) -> Box<dyn BrowserDriver> {
    #[cfg(feature = "browser")]
    if let Some(chrome) = toolchain.chrome.clone().filter(|_| toolchain.browser_available()) {
        return Box::new(chrome::ChromeDriver::new(chrome, user_agent));
    }

    #[cfg(not(feature = "browser"))]
    let _ = (toolchain, user_agent);

    Box::new(NullDriver)
}

#[cfg(feature = "browser")]
mod chrome {
    use std::ffi::OsStr;
    use std::fmt::Display;
    use std::path::PathBuf;
    use std::sync::Arc;

    use eyre::{Report, Result, eyre};
    use headless_chrome::{Browser, LaunchOptions, Tab};
    use tokio::runtime::{Handle, RuntimeFlavor};
    use url::Url;

    use super::{BrowserDriver, BrowserSession};

    const WINDOW_SIZE: (u32, u32) = (1920, 1080);

    fn browser_error<E: Display>(context: &'static str) -> impl FnOnce(E) -> Report {
        move |e| eyre!("{}: {}", context, e)
    }

    /// headless_chrome calls block until the browser answers. On a multi-thread
    /// runtime the worker hands its other tasks off first.
    fn blocking<T>(call: impl FnOnce() -> T) -> T {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(call)
            }
            _ => call(),
        }
    }

    pub struct ChromeDriver {
        chrome: PathBuf,
        user_agent: String,
    }

    impl ChromeDriver {
        pub fn new(chrome: PathBuf, user_agent: &str) -> Self {
            Self {
                chrome,
                user_agent: user_agent.to_string(),
            }
        }

        fn open(&self, url: &Url) -> Result<Box<dyn BrowserSession>> {
            let options = LaunchOptions::default_builder()
                .headless(true)
                .sandbox(false)
                .window_size(Some(WINDOW_SIZE))
                .path(Some(self.chrome.clone()))
                .args(vec![
                    OsStr::new("--disable-gpu"),
                    OsStr::new("--disable-dev-shm-usage"),
                    OsStr::new("--disable-blink-features=AutomationControlled"),
                ])
                .build()
                .map_err(browser_error("invalid browser launch options"))?;

            let browser = Browser::new(options).map_err(browser_error("failed to launch browser"))?;
            let tab = browser.new_tab().map_err(browser_error("failed to open tab"))?;
            tab.set_user_agent(&self.user_agent, None, None)
                .map_err(browser_error("failed to set user agent"))?;
            tab.navigate_to(url.as_str())
                .and_then(|tab| tab.wait_until_navigated())
                .map_err(browser_error("navigation failed"))?;

            Ok(Box::new(ChromeSession {
                tab,
                _browser: browser,
            }))
        }
    }

    impl BrowserDriver for ChromeDriver {
        fn launch(&self, url: &Url) -> Result<Box<dyn BrowserSession>> {
            blocking(|| self.open(url))
        }
    }

    /// Field order matters: the tab is dropped before the browser process.
    struct ChromeSession {
        tab: Arc<Tab>,
        _browser: Browser,
    }

    impl BrowserSession for ChromeSession {
        fn content(&mut self) -> Result<String> {
            blocking(|| self.tab.get_content())
                .map_err(browser_error("failed to read page content"))
        }

        fn scroll_to_bottom(&mut self) -> Result<()> {
            blocking(|| {
                self.tab
                    .evaluate("window.scrollTo(0, document.body.scrollHeight)", false)
            })
            .map_err(browser_error("scroll failed"))?;
            Ok(())
        }

        fn page_height(&mut self) -> Result<u64> {
            let height = blocking(|| self.tab.evaluate("document.body.scrollHeight", false))
                .map_err(browser_error("failed to read page height"))?;
            height
                .value
                .and_then(|v| v.as_f64())
                .map(|h| h as u64)
                .ok_or_else(|| eyre!("page height is not a number"))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::blocking;

        #[tokio::test(flavor = "multi_thread")]
        async fn blocking_runs_on_multi_thread_runtime() {
            assert_eq!(blocking(|| 7), 7);
        }

        #[tokio::test]
        async fn blocking_runs_inline_on_current_thread_runtime() {
            assert_eq!(blocking(|| 7), 7);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrollState {
    Loading,
    Extracting,
    Scrolling,
    Done,
}

/// Collects listings from a page that loads more content as it is scrolled.
pub struct ScrollNavigator<'a> {
    pub url: &'a Url,
    pub listing: &'a Selector,
    pub fields: &'a FieldSelectors,
    pub detail_fields: Option<&'a FieldSelectors>,
    pub max_jobs: usize,
    pub max_scrolls: u32,
    pub settle: Duration,
    pub detail_delay: Duration,
}

impl ScrollNavigator<'_> {
    /// Never fails: a browser that cannot start yields no jobs, and a session
    /// error mid-way keeps what was collected so far.
    pub async fn collect<S: PageSource>(
        &self,
        driver: &dyn BrowserDriver,
        source: &S,
    ) -> Vec<JobRecord> {
        let mut session = match driver.launch(self.url) {
            Ok(session) => session,
            Err(e) => {
                warn!("could not start browser for {}: {:#}", self.url, e);
                return Vec::new();
            }
        };

        let mut jobs = Vec::new();
        if let Err(e) = self.run(session.as_mut(), source, &mut jobs).await {
            warn!("scrolling {} stopped early: {:#}", self.url, e);
        }
        info!("collected {} listings from {} by scrolling", jobs.len(), self.url);

        jobs
    }

    async fn run<S: PageSource>(
        &self,
        session: &mut dyn BrowserSession,
        source: &S,
        jobs: &mut Vec<JobRecord>,
    ) -> Result<()> {
        let mut state = ScrollState::Loading;
        let mut seen = 0;
        let mut attempts = 0;
        let mut height = 0;

        while state != ScrollState::Done {
            state = match state {
                ScrollState::Loading => {
                    tokio::time::sleep(self.settle).await;
                    height = session.page_height()?;
                    ScrollState::Extracting
                }
                ScrollState::Extracting => {
                    if jobs.len() >= self.max_jobs || attempts >= self.max_scrolls {
                        ScrollState::Done
                    } else {
                        let fresh = self.new_listings(&session.content()?, &mut seen);
                        debug!("scroll cycle {}: {} new listings", attempts + 1, fresh.len());
                        self.absorb(fresh, source, jobs).await;

                        if jobs.len() >= self.max_jobs {
                            ScrollState::Done
                        } else {
                            ScrollState::Scrolling
                        }
                    }
                }
                ScrollState::Scrolling => {
                    session.scroll_to_bottom()?;
                    tokio::time::sleep(self.settle).await;
                    let new_height = session.page_height()?;

                    if new_height <= height {
                        debug!("page height settled at {}, no more content", height);
                        ScrollState::Done
                    } else {
                        height = new_height;
                        attempts += 1;
                        ScrollState::Extracting
                    }
                }
                ScrollState::Done => ScrollState::Done,
            };
        }

        Ok(())
    }

    /// Records for listings past the first `seen` ones, skipping those without a link.
    fn new_listings(&self, html: &str, seen: &mut usize) -> Vec<JobRecord> {
        let document = Html::parse_document(html);
        let elements: Vec<_> = document.select(self.listing).collect();

        let fresh = elements
            .iter()
            .skip(*seen)
            .map(|element| self.fields.extract(*element, self.url))
            .filter(|record| record.link().is_some())
            .collect();
        *seen = elements.len();

        fresh
    }

    async fn absorb<S: PageSource>(
        &self,
        fresh: Vec<JobRecord>,
        source: &S,
        jobs: &mut Vec<JobRecord>,
    ) {
        for mut record in fresh {
            if jobs.len() >= self.max_jobs {
                break;
            }
            if let Some(detail_fields) = self.detail_fields
                && let Some(link) = record.link().map(str::to_string)
            {
                record.merge(fetch_details(source, &link, detail_fields).await);
                tokio::time::sleep(self.detail_delay).await;
            }
            jobs.push(record);
        }
    }
}
