//! Debounced search-as-you-type.
//!
//! Each keystroke supersedes the previous search: its pending task is
//! aborted, whether it is still waiting out the debounce or already waiting
//! on the backend, and a generation counter keeps a response that slipped
//! past the abort from rendering.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::config::SearchConfig;
use crate::geo::format_distance;
use crate::ports::{Dom, SearchApi, Target, TimeProvider};
use crate::templates::{
    LOADING_HTML, Markup, SEARCH_FAILED_HTML, SearchResultView, SearchResultsTemplate,
};
use crate::types::SearchResult;

#[derive(Debug, Default)]
struct SearchState {
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

struct Shared<A, D, T> {
    api: A,
    dom: D,
    time: T,
    endpoint: String,
    results: Target,
    config: SearchConfig,
    state: Mutex<SearchState>,
}

/// A search box wired to a results container.
pub struct SearchTypeahead<A, D, T> {
    shared: Arc<Shared<A, D, T>>,
}

impl<A, D, T> Clone for SearchTypeahead<A, D, T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A, D, T> SearchTypeahead<A, D, T>
where
    A: SearchApi,
    D: Dom,
    T: TimeProvider,
{
    /// Wire `input_id` to render into `results_id`. Returns `None` when either
    /// element is missing from the page.
    pub fn attach(
        api: A,
        dom: D,
        time: T,
        input_id: &str,
        results_id: &str,
        endpoint: &str,
        config: SearchConfig,
    ) -> Option<Self> {
        let results = Target::id(results_id);
        if !dom.exists(&Target::id(input_id)) || !dom.exists(&results) {
            tracing::debug!(input_id, results_id, "search elements missing; not attaching");
            return None;
        }
        Some(Self {
            shared: Arc::new(Shared {
                api,
                dom,
                time,
                endpoint: endpoint.to_string(),
                results,
                config,
                state: Mutex::new(SearchState::default()),
            }),
        })
    }

    /// Handle the input's new value.
    pub fn on_input(&self, value: &str) {
        let shared = &self.shared;
        let mut state = shared.lock();
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        state.generation += 1;
        let generation = state.generation;

        let query = value.trim().to_string();
        if query.chars().count() < shared.config.min_chars {
            shared.dom.set_html(&shared.results, &Markup::empty());
            return;
        }

        let task = Arc::clone(shared);
        state.pending = Some(tokio::spawn(async move {
            task.time.sleep(task.config.debounce()).await;
            if !task.write_if_current(generation, || Markup::trusted(LOADING_HTML)) {
                return;
            }
            let outcome = task.api.search(&task.endpoint, &query).await;
            let markup = match outcome {
                Ok(results) => match render_results(&results) {
                    Ok(markup) => markup,
                    Err(err) => {
                        tracing::error!(error = %err, "failed to render search results");
                        Markup::trusted(SEARCH_FAILED_HTML)
                    }
                },
                Err(err) => {
                    tracing::error!(query = %query, error = %err, "search error");
                    Markup::trusted(SEARCH_FAILED_HTML)
                }
            };
            if !task.write_if_current(generation, || markup) {
                tracing::debug!(query = %query, "discarding superseded search response");
            }
        }));
    }

    /// Cancel any pending search.
    pub fn detach(&self) {
        let mut state = self.shared.lock();
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        state.generation += 1;
    }
}

impl<A, D, T> Shared<A, D, T>
where
    D: Dom,
{
    /// Replace the results with `markup` unless a newer keystroke arrived.
    fn write_if_current(&self, generation: u64, markup: impl FnOnce() -> Markup) -> bool {
        let state = self.lock();
        if state.generation != generation {
            return false;
        }
        self.dom.set_html(&self.results, &markup());
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SearchState> {
        self.state.lock().expect("search state lock")
    }
}

fn render_results(results: &[SearchResult]) -> askama::Result<Markup> {
    Markup::render(&SearchResultsTemplate {
        results: results
            .iter()
            .map(|result| SearchResultView {
                url: result.url.clone(),
                title: result.title.clone(),
                description: result.description.clone(),
                distance: result.distance.map(format_distance),
            })
            .collect(),
    })
}
