//! Fakes shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::{ApiError, GeolocationError};
use crate::geo::LatLng;
use crate::ports::{self, BoxFuture, PositionOptions};
use crate::types::{Center, NotificationId, SearchResult};

/// Clock driven by tokio's (pausable) timer, starting at a fixed instant.
#[derive(Clone)]
pub(crate) struct TestTime {
    origin: OffsetDateTime,
    started: tokio::time::Instant,
}

impl TestTime {
    pub(crate) fn new() -> Self {
        Self {
            origin: OffsetDateTime::parse("2025-01-12T09:30:00Z", &Rfc3339).expect("parse origin"),
            started: tokio::time::Instant::now(),
        }
    }
}

impl ports::TimeProvider for TestTime {
    type Sleep<'a>
        = tokio::time::Sleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        self.origin + self.started.elapsed()
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        tokio::time::sleep(duration)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    UnreadCount,
    MarkRead(NotificationId),
    Delete(NotificationId),
    MarkAllRead,
    Search {
        endpoint: String,
        query: String,
        at: tokio::time::Instant,
    },
    Centers(Option<String>),
}

/// What a state-changing endpoint answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reply {
    Success,
    Declined,
    ServerError,
}

impl Reply {
    fn into_result(self, url: &str) -> Result<bool, ApiError> {
        match self {
            Reply::Success => Ok(true),
            Reply::Declined => Ok(false),
            Reply::ServerError => Err(server_error(url)),
        }
    }
}

fn server_error(url: &str) -> ApiError {
    ApiError::Status {
        status: 500,
        url: url.to_string(),
    }
}

struct FakeState {
    unread: Option<u64>,
    action_reply: Reply,
    search_results: HashMap<String, Vec<SearchResult>>,
    search_delays: HashMap<String, Duration>,
    search_fails: bool,
    centers: Vec<Center>,
    calls: Vec<Call>,
}

/// In-memory stand-in for every backend endpoint.
#[derive(Clone)]
pub(crate) struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                unread: Some(0),
                action_reply: Reply::Success,
                search_results: HashMap::new(),
                search_delays: HashMap::new(),
                search_fails: false,
                centers: Vec::new(),
                calls: Vec::new(),
            })),
        }
    }
}

impl FakeBackend {
    /// `None` makes the unread-count request fail.
    pub(crate) fn set_unread(&self, count: Option<u64>) {
        self.lock().unread = count;
    }

    pub(crate) fn set_action_reply(&self, reply: Reply) {
        self.lock().action_reply = reply;
    }

    pub(crate) fn set_search_results(&self, query: &str, results: Vec<SearchResult>) {
        self.lock()
            .search_results
            .insert(query.to_string(), results);
    }

    pub(crate) fn set_search_delay(&self, query: &str, delay: Duration) {
        self.lock().search_delays.insert(query.to_string(), delay);
    }

    pub(crate) fn fail_searches(&self) {
        self.lock().search_fails = true;
    }

    pub(crate) fn set_centers(&self, centers: Vec<Center>) {
        self.lock().centers = centers;
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub(crate) fn search_calls(&self) -> Vec<(String, tokio::time::Instant)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Search { query, at, .. } => Some((query, at)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.lock().calls.push(call);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake backend lock")
    }
}

impl ports::NotificationApi for FakeBackend {
    fn unread_count(&self) -> BoxFuture<'_, Result<u64, ApiError>> {
        self.record(Call::UnreadCount);
        let unread = self.lock().unread;
        Box::pin(async move { unread.ok_or_else(|| server_error("/notifications/unread-count/")) })
    }

    fn mark_read(&self, id: NotificationId) -> BoxFuture<'_, Result<bool, ApiError>> {
        self.record(Call::MarkRead(id));
        let reply = self.lock().action_reply;
        Box::pin(async move { reply.into_result("/notifications/mark-read/") })
    }

    fn delete(&self, id: NotificationId) -> BoxFuture<'_, Result<bool, ApiError>> {
        self.record(Call::Delete(id));
        let reply = self.lock().action_reply;
        Box::pin(async move { reply.into_result("/notifications/delete/") })
    }

    fn mark_all_read(&self) -> BoxFuture<'_, Result<bool, ApiError>> {
        self.record(Call::MarkAllRead);
        let reply = self.lock().action_reply;
        Box::pin(async move { reply.into_result("/notifications/mark-all-read/") })
    }
}

impl ports::SearchApi for FakeBackend {
    fn search<'a>(
        &'a self,
        endpoint: &'a str,
        query: &'a str,
    ) -> BoxFuture<'a, Result<Vec<SearchResult>, ApiError>> {
        self.record(Call::Search {
            endpoint: endpoint.to_string(),
            query: query.to_string(),
            at: tokio::time::Instant::now(),
        });
        let (delay, outcome) = {
            let state = self.lock();
            let delay = state.search_delays.get(query).copied();
            let outcome = if state.search_fails {
                Err(server_error(endpoint))
            } else {
                Ok(state.search_results.get(query).cloned().unwrap_or_default())
            };
            (delay, outcome)
        };
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            outcome
        })
    }
}

impl ports::CentersApi for FakeBackend {
    fn centers<'a>(
        &'a self,
        material: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<Center>, ApiError>> {
        self.record(Call::Centers(material.map(str::to_string)));
        let centers: Vec<Center> = self
            .lock()
            .centers
            .iter()
            .filter(|center| material.is_none_or(|material| center.accepts(material)))
            .cloned()
            .collect();
        Box::pin(async move { Ok(centers) })
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Fix {
    Now(Result<LatLng, GeolocationError>),
    After(Duration, Result<LatLng, GeolocationError>),
    Never,
}

/// Geolocator that answers from a script and records each request.
#[derive(Clone, Default)]
pub(crate) struct ScriptedGeolocator {
    script: Arc<Mutex<VecDeque<Fix>>>,
    requests: Arc<Mutex<Vec<PositionOptions>>>,
}

impl ScriptedGeolocator {
    pub(crate) fn answering(fixes: impl IntoIterator<Item = Fix>) -> Self {
        let geolocator = Self::default();
        geolocator
            .script
            .lock()
            .expect("script lock")
            .extend(fixes);
        geolocator
    }

    pub(crate) fn requests(&self) -> Vec<PositionOptions> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl ports::Geolocator for ScriptedGeolocator {
    type Fut<'a>
        = BoxFuture<'a, Result<LatLng, GeolocationError>>
    where
        Self: 'a;

    fn current_position<'a>(&'a self, options: &'a PositionOptions) -> Self::Fut<'a> {
        self.requests.lock().expect("requests lock").push(*options);
        let fix = self
            .script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or(Fix::Now(Err(GeolocationError::Unavailable)));
        Box::pin(async move {
            match fix {
                Fix::Now(result) => result,
                Fix::After(delay, result) => {
                    tokio::time::sleep(delay).await;
                    result
                }
                Fix::Never => std::future::pending().await,
            }
        })
    }
}
