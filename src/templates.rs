//! HTML fragments handed to the DOM port.
//!
//! Every fragment built from backend or user data goes through an askama
//! template, so interpolated text is escaped when the `Markup` is created.

use askama::Template;
use serde::Serialize;

use std::fmt;

/// HTML that is safe to insert into the page.
///
/// Only templates in this module and fixed strings can produce one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Markup(String);

impl Markup {
    pub(crate) fn render<T: Template>(template: &T) -> askama::Result<Self> {
        Ok(Self(template.render()?))
    }

    pub(crate) fn trusted(html: &'static str) -> Self {
        Self(html.to_string())
    }

    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub(crate) const LOADING_HTML: &str = r#"<div class="spinner"></div>"#;
pub(crate) const SEARCH_FAILED_HTML: &str =
    r#"<div class="alert alert-danger">Search failed. Please try again.</div>"#;
pub(crate) const USER_POPUP_HTML: &str = "<strong>Your Location</strong>";

#[derive(Template)]
#[template(path = "center_popup.html")]
pub(crate) struct CenterPopupTemplate<'a> {
    pub(crate) name: &'a str,
    pub(crate) address: &'a str,
    pub(crate) phone_number: &'a str,
    pub(crate) availability: String,
    pub(crate) distance: Option<String>,
    pub(crate) detail_url: String,
}

#[derive(Template)]
#[template(path = "toast.html")]
pub(crate) struct ToastTemplate<'a> {
    pub(crate) id: &'a str,
    pub(crate) icon: &'static str,
    pub(crate) color: &'static str,
    pub(crate) title: &'a str,
    pub(crate) message: &'a str,
}

#[derive(Template)]
#[template(path = "search_results.html")]
pub(crate) struct SearchResultsTemplate {
    pub(crate) results: Vec<SearchResultView>,
}

pub(crate) struct SearchResultView {
    pub(crate) url: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) distance: Option<String>,
}

#[derive(Template)]
#[template(path = "file_preview.html")]
pub(crate) struct FilePreviewTemplate<'a> {
    pub(crate) src: &'a str,
    pub(crate) file_name: &'a str,
}
