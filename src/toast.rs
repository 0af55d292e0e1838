//! Transient notifications stacked in a single page-wide container.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::task::JoinHandle;

use crate::config::ToastConfig;
use crate::error::Result;
use crate::ports::{Dom, Target, TimeProvider};
use crate::templates::{Markup, ToastTemplate};

const CONTAINER_CLASS: &str = "toast-container position-fixed top-0 end-0 p-3";
const SHOWING_CLASS: &str = "show";
const HIDING_CLASS: &str = "hide";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastKind {
    fn icon(self) -> &'static str {
        match self {
            ToastKind::Success => "fas fa-check-circle",
            ToastKind::Error => "fas fa-exclamation-circle",
            ToastKind::Warning => "fas fa-exclamation-triangle",
            ToastKind::Info => "fas fa-info-circle",
        }
    }

    fn color(self) -> &'static str {
        match self {
            ToastKind::Success => "text-success",
            ToastKind::Error => "text-danger",
            ToastKind::Warning => "text-warning",
            ToastKind::Info => "text-info",
        }
    }

    /// Heading used when the caller gives no title.
    pub fn default_title(self) -> &'static str {
        match self {
            ToastKind::Success => "Success",
            ToastKind::Error => "Error",
            ToastKind::Warning => "Warning",
            ToastKind::Info => "Info",
        }
    }
}

impl FromStr for ToastKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(ToastKind::Success),
            // Bootstrap's contextual name for the error color.
            "error" | "danger" => Ok(ToastKind::Error),
            "warning" => Ok(ToastKind::Warning),
            "info" => Ok(ToastKind::Info),
            other => Err(format!("unknown toast kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ToastId(u64);

impl ToastId {
    pub fn dom_id(self) -> String {
        format!("toast-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub kind: ToastKind,
    pub title: Option<String>,
    pub duration: Duration,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Default)]
struct QueueState {
    next_id: u64,
    live: Vec<Toast>,
    timers: HashMap<ToastId, JoinHandle<()>>,
}

/// Shows toasts and removes each one after its duration plus the hide
/// animation. Clones share the same queue.
#[derive(Clone)]
pub struct ToastQueue<D, T> {
    dom: D,
    time: T,
    config: ToastConfig,
    state: Arc<Mutex<QueueState>>,
}

impl<D, T> ToastQueue<D, T>
where
    D: Dom,
    T: TimeProvider,
{
    pub fn new(dom: D, time: T, config: ToastConfig) -> Self {
        Self {
            dom,
            time,
            config,
            state: Arc::new(Mutex::new(QueueState {
                next_id: 1,
                ..QueueState::default()
            })),
        }
    }

    /// Append a toast to the container and schedule its removal.
    ///
    /// `duration` defaults to the configured display time.
    pub fn show(
        &self,
        message: &str,
        kind: ToastKind,
        title: Option<&str>,
        duration: Option<Duration>,
    ) -> Result<ToastId> {
        let duration = duration.unwrap_or_else(|| self.config.duration());
        let container = Target::id(self.config.container_id.as_str());
        self.dom
            .ensure_element(None, &self.config.container_id, CONTAINER_CLASS);

        let id = {
            let mut state = self.lock();
            let id = ToastId(state.next_id);
            state.next_id += 1;
            id
        };
        let dom_id = id.dom_id();
        let markup = Markup::render(&ToastTemplate {
            id: &dom_id,
            icon: kind.icon(),
            color: kind.color(),
            title: title.unwrap_or(kind.default_title()),
            message,
        })?;
        self.dom.append(&container, &dom_id, &markup);
        self.dom.add_class(&Target::id(dom_id.as_str()), SHOWING_CLASS);

        let toast = Toast {
            id,
            message: message.to_string(),
            kind,
            title: title.map(str::to_string),
            duration,
            created_at: self.time.now(),
        };
        tracing::debug!(toast = %dom_id, ?kind, "showing toast");

        let queue = self.clone();
        let hide_animation = self.config.hide_animation();
        let mut state = self.lock();
        state.live.push(toast);
        let handle = tokio::spawn(async move {
            queue.time.sleep(duration).await;
            queue.begin_hide(id);
            queue.time.sleep(hide_animation).await;
            queue.expire(id);
        });
        state.timers.insert(id, handle);
        Ok(id)
    }

    pub fn success(&self, message: &str) -> Result<ToastId> {
        self.show(message, ToastKind::Success, None, None)
    }

    pub fn error(&self, message: &str) -> Result<ToastId> {
        self.show(message, ToastKind::Error, None, None)
    }

    /// Close a toast early, as its close button does. Returns `false` when it
    /// was already gone.
    pub fn dismiss(&self, id: ToastId) -> bool {
        if let Some(timer) = self.lock().timers.remove(&id) {
            timer.abort();
        }
        self.remove(id)
    }

    /// Toasts currently on screen, oldest first.
    pub fn live(&self) -> Vec<Toast> {
        self.lock().live.clone()
    }

    /// Remove every toast and cancel pending timers.
    pub fn clear(&self) {
        let (timers, ids): (Vec<_>, Vec<_>) = {
            let mut state = self.lock();
            let timers = state.timers.drain().map(|(_, timer)| timer).collect();
            let ids = state.live.iter().map(|toast| toast.id).collect();
            (timers, ids)
        };
        for timer in timers {
            timer.abort();
        }
        for id in ids {
            self.remove(id);
        }
    }

    fn begin_hide(&self, id: ToastId) {
        let dom_id = id.dom_id();
        if self
            .dom
            .replace_class(&Target::id(dom_id.as_str()), SHOWING_CLASS, HIDING_CLASS)
            > 0
        {
            tracing::debug!(toast = %dom_id, "hiding toast");
        }
    }

    fn expire(&self, id: ToastId) {
        self.lock().timers.remove(&id);
        self.remove(id);
    }

    fn remove(&self, id: ToastId) -> bool {
        let was_live = {
            let mut state = self.lock();
            let before = state.live.len();
            state.live.retain(|toast| toast.id != id);
            state.live.len() != before
        };
        if was_live {
            self.dom.remove(&Target::id(id.dom_id()));
        }
        was_live
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.state.lock().expect("toast queue lock")
    }
}
