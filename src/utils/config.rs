use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use eyre::{Result, WrapErr};
use log::{debug, info};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use url::Url;

pub type Config = Arc<ConfigInner>;

/// Directory the default config, templates and outputs are resolved against.
pub fn install_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn default_config_path() -> PathBuf {
    install_root().join("config").join("job_config.toml")
}

pub fn config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
    let inner = ConfigInner::from_toml(&raw)
        .wrap_err_with(|| format!("invalid config file {}", path.display()))?;

    info!(
        "config parsing successful ({} sites, {} skills)",
        inner.sites.len(),
        inner.skills.len()
    );
    if let Ok(dump) = toml::to_string_pretty(&inner) {
        debug!("loaded configuration:\n{}", dump);
    }

    Ok(Arc::new(inner))
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct ConfigInner {
    pub sites: Vec<SiteConfig>,
    #[serde(default)]
    pub skills: Vec<SkillRequirement>,
    #[serde(default)]
    pub salary: SalaryThreshold,
    #[serde(default)]
    pub llm: LLMConfig,
    #[serde(default)]
    pub scraper: ScraperSettings,
    #[serde(default)]
    pub toolchain: ToolchainConfig,
}

impl ConfigInner {
    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct SiteConfig {
    pub name: String,
    pub url: Url,
    pub job_selector: String,
    #[serde(default)]
    pub fields: FieldMap,
    #[serde(default)]
    pub detail_fields: Option<FieldMap>,
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,
    /// Upper bound on pages visited, guards against malformed pagination.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

/// Field name to CSS selector, in the order the config lists them.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct FieldMap(Vec<(String, String)>);

impl FieldMap {
    /// Replaces the selector of an existing field, otherwise appends it.
    pub fn insert(&mut self, field: impl Into<String>, selector: impl Into<String>) {
        let (field, selector) = (field.into(), selector.into());
        match self.0.iter_mut().find(|(name, _)| *name == field) {
            Some((_, slot)) => *slot = selector,
            None => self.0.push((field, selector)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::default();
        for (field, selector) in iter {
            fields.insert(field, selector);
        }
        fields
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, selector) in &self.0 {
            map.serialize_entry(field, selector)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldMapVisitor;

        impl<'de> Visitor<'de> for FieldMapVisitor {
            type Value = FieldMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a table of field names to CSS selectors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FieldMap, A::Error> {
                let mut fields = FieldMap::default();
                while let Some((field, selector)) = access.next_entry::<String, String>()? {
                    fields.insert(field, selector);
                }
                Ok(fields)
            }
        }

        deserializer.deserialize_map(FieldMapVisitor)
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Pagination {
    #[default]
    None,
    NextButton {
        selector: String,
    },
    NumberedLinks {
        selector: String,
        #[serde(default = "default_active_class")]
        active_class: String,
    },
    InfiniteScroll {
        #[serde(default = "default_max_scrolls")]
        max_scrolls: u32,
    },
}

/// A skill entry as written in the config: either a bare keyword or a table.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum SkillRequirement {
    Keyword(String),
    Requirement {
        name: String,
        #[serde(default)]
        required: bool,
    },
}

impl SkillRequirement {
    pub fn keyword(&self) -> &str {
        match self {
            SkillRequirement::Keyword(name) | SkillRequirement::Requirement { name, .. } => name,
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, SkillRequirement::Requirement { required: true, .. })
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct SalaryThreshold {
    pub usd: Option<f64>,
    pub brl: Option<f64>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct LLMConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_llm_model(),
            endpoint: default_llm_endpoint(),
            max_retries: default_max_retries(),
        }
    }
}

impl LLMConfig {
    /// The configured key, or `GEMINI_API_KEY` from the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .filter(|key| !key.is_empty())
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct ScraperSettings {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_detail_delay_ms")]
    pub detail_delay_ms: u64,
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    #[serde(default = "default_scroll_settle_ms")]
    pub scroll_settle_ms: u64,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            detail_delay_ms: default_detail_delay_ms(),
            page_delay_ms: default_page_delay_ms(),
            scroll_settle_ms: default_scroll_settle_ms(),
        }
    }
}

impl ScraperSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn detail_delay(&self) -> Duration {
        Duration::from_millis(self.detail_delay_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }
}

/// Explicit paths to external binaries. Unset entries are looked up on `PATH`.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct ToolchainConfig {
    pub chrome: Option<PathBuf>,
    pub pdflatex: Option<PathBuf>,
    pub bibtex: Option<PathBuf>,
}

fn default_max_jobs() -> usize {
    50
}

fn default_max_pages() -> usize {
    20
}

fn default_active_class() -> String {
    "active".to_string()
}

fn default_max_scrolls() -> u32 {
    10
}

fn default_llm_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_llm_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".to_string()
}

fn default_max_retries() -> u32 {
    5
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_detail_delay_ms() -> u64 {
    1000
}

fn default_page_delay_ms() -> u64 {
    2000
}

fn default_scroll_settle_ms() -> u64 {
    3000
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        skills = ["go", { name = "rust", required = true }, { name = "python" }]

        [salary]
        brl = 5000

        [[sites]]
        name = "board"
        url = "https://jobs.example.com/list"
        job_selector = ".job"
        fields = { title = "h2", link = "a" }
        detail_fields = { description = ".body" }
        pagination = { type = "numbered_links", selector = ".pages a" }

        [[sites]]
        name = "feed"
        url = "https://feed.example.com/"
        job_selector = "article"
        max_jobs = 5
        pagination = { type = "infinite_scroll" }
    "#;

    #[test]
    fn parses_sites_with_defaults() {
        let config = ConfigInner::from_toml(SAMPLE).unwrap();

        assert_eq!(config.sites.len(), 2);
        let board = &config.sites[0];
        assert_eq!(board.max_jobs, 50);
        assert_eq!(board.max_pages, 20);
        assert!(board.fields.iter().any(|field| field == ("link", "a")));
        assert_eq!(
            board.pagination,
            Pagination::NumberedLinks {
                selector: ".pages a".to_string(),
                active_class: "active".to_string(),
            }
        );

        let feed = &config.sites[1];
        assert_eq!(feed.max_jobs, 5);
        assert!(feed.fields.is_empty());
        assert_eq!(feed.detail_fields, None);
        assert_eq!(feed.pagination, Pagination::InfiniteScroll { max_scrolls: 10 });

        assert_eq!(config.salary.brl, Some(5000.0));
        assert_eq!(config.salary.usd, None);
        assert_eq!(config.scraper.timeout(), Duration::from_secs(30));
        assert_eq!(config.llm.max_retries, 5);
    }

    #[test]
    fn fields_keep_document_order() {
        let raw = r#"
            [[sites]]
            name = "ordered"
            url = "https://x.com/"
            job_selector = ".job"
            fields = { title = "h2", company = ".company", link = "a" }

            [sites.detail_fields]
            salary = ".pay"
            description = ".body"
        "#;
        let site = &ConfigInner::from_toml(raw).unwrap().sites[0];

        let fields: Vec<_> = site.fields.iter().map(|(name, _)| name).collect();
        assert_eq!(fields, vec!["title", "company", "link"]);
        let detail: Vec<_> = site
            .detail_fields
            .iter()
            .flat_map(|fields| fields.iter())
            .map(|(name, _)| name)
            .collect();
        assert_eq!(detail, vec!["salary", "description"]);
    }

    #[test]
    fn non_string_selector_is_an_error() {
        let raw = r#"
            [[sites]]
            name = "bad"
            url = "https://x.com/"
            job_selector = ".job"
            fields = { title = 3 }
        "#;
        assert!(ConfigInner::from_toml(raw).is_err());
    }

    #[test]
    fn resolves_skill_variants_once() {
        let config = ConfigInner::from_toml(SAMPLE).unwrap();

        assert_eq!(config.skills[0], SkillRequirement::Keyword("go".to_string()));
        assert!(config.skills[1].is_required());
        assert_eq!(config.skills[1].keyword(), "rust");
        assert!(!config.skills[2].is_required());
    }

    #[test]
    fn missing_sites_is_an_error() {
        assert!(ConfigInner::from_toml("skills = [\"rust\"]").is_err());
    }

    #[test]
    fn invalid_site_url_is_an_error() {
        let raw = r#"
            [[sites]]
            name = "bad"
            url = "not a url"
            job_selector = ".job"
        "#;
        assert!(ConfigInner::from_toml(raw).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = config("/definitely/not/here.toml").unwrap_err();
        assert!(format!("{err:#}").contains("failed to read config file"));
    }

    #[test]
    fn shipped_config_parses() {
        config(default_config_path()).unwrap();
    }
}
