use eyre::{Result, eyre};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::models::job::JobRecord;
use crate::utils::config::FieldMap;

/// Field name whose `href` is resolved into an absolute address.
pub const LINK_FIELD: &str = "link";

pub fn compile_selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|e| eyre!("invalid CSS selector `{}`: {:?}", raw, e))
}

/// A field→selector mapping with every selector parsed up front.
#[derive(Debug, Clone)]
pub struct FieldSelectors {
    fields: Vec<(String, Selector)>,
}

impl FieldSelectors {
    pub fn compile(fields: &FieldMap) -> Result<Self> {
        let fields = fields
            .iter()
            .map(|(field, raw)| Ok((field.to_string(), compile_selector(raw)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { fields })
    }

    /// Maps one element to a record. Fields whose selector matches nothing are `None`.
    pub fn extract(&self, element: ElementRef<'_>, base: &Url) -> JobRecord {
        self.fields
            .iter()
            .map(|(field, selector)| {
                let value = element
                    .select(selector)
                    .next()
                    .map(|target| field_value(field, target, base));
                (field.as_str(), value)
            })
            .collect()
    }

    /// Same as [`extract`](Self::extract) with the whole document as the element.
    pub fn extract_document(&self, document: &Html, base: &Url) -> JobRecord {
        self.extract(document.root_element(), base)
    }
}

fn field_value(field: &str, target: ElementRef<'_>, base: &Url) -> String {
    if field == LINK_FIELD
        && let Some(href) = target.value().attr("href")
    {
        return resolve_href(base, href);
    }
    visible_text(target)
}

/// Resolves `href` against `base`; absolute addresses pass through unchanged.
pub fn resolve_href(base: &Url, href: &str) -> String {
    let href = href.trim();
    base.join(href)
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}

pub fn visible_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
