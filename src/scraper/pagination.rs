use eyre::Result;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::scraper::extract::{compile_selector, resolve_href};
use crate::utils::config::Pagination;

/// Link-based pagination with its selectors compiled.
#[derive(Debug, Clone)]
pub enum PageLinks {
    NextButton(Selector),
    NumberedLinks {
        links: Selector,
        active_class: String,
    },
}

impl PageLinks {
    /// `None` for pagination kinds that are not link based.
    pub fn compile(pagination: &Pagination) -> Result<Option<Self>> {
        Ok(match pagination {
            Pagination::NextButton { selector } => {
                Some(PageLinks::NextButton(compile_selector(selector)?))
            }
            Pagination::NumberedLinks {
                selector,
                active_class,
            } => Some(PageLinks::NumberedLinks {
                links: compile_selector(selector)?,
                active_class: active_class.clone(),
            }),
            Pagination::None | Pagination::InfiniteScroll { .. } => None,
        })
    }

    /// Address of the page after `current`, or `None` when this is the last page.
    pub fn next_page(&self, document: &Html, current: &Url) -> Option<Url> {
        let href = match self {
            PageLinks::NextButton(selector) => {
                document.select(selector).next()?.value().attr("href")?
            }
            PageLinks::NumberedLinks {
                links,
                active_class,
            } => {
                let links: Vec<ElementRef<'_>> = document.select(links).collect();
                let current_index = links
                    .iter()
                    .position(|link| is_active(*link, active_class))?;
                links.get(current_index + 1)?.value().attr("href")?
            }
        };

        Url::parse(&resolve_href(current, href)).ok()
    }
}

/// A page link is current when it, or its direct parent, carries the marker class,
/// or when it has `aria-current` set to anything but `"false"`.
fn is_active(link: ElementRef<'_>, active_class: &str) -> bool {
    let has_class = |element: ElementRef<'_>| element.value().classes().any(|c| c == active_class);

    has_class(link)
        || link
            .value()
            .attr("aria-current")
            .is_some_and(|current| current != "false")
        || link
            .parent()
            .and_then(ElementRef::wrap)
            .is_some_and(has_class)
}
