//! HTTP client for the page backend.
//!
//! Wraps `reqwest` with the conventions the backend expects: JSON bodies,
//! `X-Requested-With` on every request and the CSRF token on every POST.

use percent_encoding::percent_decode_str;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::ports::{BoxFuture, CentersApi, Dom, NotificationApi, SearchApi, Target};
use crate::types::{ActionResponse, Center, NotificationId, SearchResult, UnreadCount};

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_FIELD: &str = "csrfmiddlewaretoken";
pub const CSRF_HEADER: &str = "X-CSRFToken";

const UNREAD_COUNT_PATH: &str = "/notifications/unread-count/";
const MARK_ALL_READ_PATH: &str = "/notifications/mark-all-read/";
const CENTERS_PATH: &str = "/centers/api/centers/";

/// Client for the notification, search and centers endpoints.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    csrf_token: Option<String>,
}

#[derive(Deserialize)]
struct CentersResponse {
    centers: Vec<Center>,
}

impl HttpBackend {
    /// Creates a client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if `base_url` does not parse, or
    /// [`ApiError::Http`] if the underlying `reqwest::Client` cannot be built.
    pub fn new(base_url: &str, csrf_token: Option<String>) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|_| ApiError::InvalidUrl(base_url.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Requested-With",
            HeaderValue::from_static("XMLHttpRequest"),
        );
        let client = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("ecotracker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            csrf_token,
        })
    }

    /// Creates a client whose CSRF token is read from the page.
    ///
    /// # Errors
    ///
    /// Same as [`HttpBackend::new`].
    pub fn from_page<D: Dom>(base_url: &str, dom: &D) -> Result<Self, ApiError> {
        let token = csrf_token(dom);
        if token.is_none() {
            tracing::warn!("no CSRF token on the page; POST requests will be rejected");
        }
        Self::new(base_url, token)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|_| ApiError::InvalidUrl(path.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.json().await?)
    }

    async fn post_action(&self, path: &str) -> Result<bool, ApiError> {
        let url = self.url(path)?;
        let mut request = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = &self.csrf_token {
            request = request.header(CSRF_HEADER, token);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        let body: ActionResponse = response.json().await?;
        Ok(body.success)
    }
}

impl NotificationApi for HttpBackend {
    fn unread_count(&self) -> BoxFuture<'_, Result<u64, ApiError>> {
        Box::pin(async move {
            let url = self.url(UNREAD_COUNT_PATH)?;
            let body: UnreadCount = self.get_json(url).await?;
            Ok(body.count)
        })
    }

    fn mark_read(&self, id: NotificationId) -> BoxFuture<'_, Result<bool, ApiError>> {
        Box::pin(async move {
            self.post_action(&format!("/notifications/{id}/mark-read/"))
                .await
        })
    }

    fn delete(&self, id: NotificationId) -> BoxFuture<'_, Result<bool, ApiError>> {
        Box::pin(async move { self.post_action(&format!("/notifications/{id}/delete/")).await })
    }

    fn mark_all_read(&self) -> BoxFuture<'_, Result<bool, ApiError>> {
        Box::pin(async move { self.post_action(MARK_ALL_READ_PATH).await })
    }
}

impl SearchApi for HttpBackend {
    fn search<'a>(
        &'a self,
        endpoint: &'a str,
        query: &'a str,
    ) -> BoxFuture<'a, Result<Vec<SearchResult>, ApiError>> {
        Box::pin(async move {
            let mut url = self.url(endpoint)?;
            url.query_pairs_mut().append_pair("q", query);
            self.get_json(url).await
        })
    }
}

impl CentersApi for HttpBackend {
    fn centers<'a>(
        &'a self,
        material: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<Center>, ApiError>> {
        Box::pin(async move {
            let mut url = self.url(CENTERS_PATH)?;
            if let Some(material) = material.map(str::trim)
                && !material.is_empty()
            {
                url.query_pairs_mut().append_pair("material_type", material);
            }
            let body: CentersResponse = self.get_json(url).await?;
            Ok(body.centers)
        })
    }
}

/// The CSRF token from the `csrftoken` cookie, falling back to the hidden
/// `csrfmiddlewaretoken` form field.
pub fn csrf_token<D: Dom>(dom: &D) -> Option<String> {
    cookie_value(&dom.cookies(), CSRF_COOKIE).or_else(|| {
        dom.value(&Target::Named(CSRF_FIELD.to_string()))
            .filter(|value| !value.is_empty())
    })
}

/// Looks up `name` in a `document.cookie` style string and percent-decodes it.
pub fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    cookies.split(';').find_map(|cookie| {
        let (key, value) = cookie.trim().split_once('=')?;
        (key == name).then(|| percent_decode_str(value).decode_utf8_lossy().into_owned())
    })
}
