//! `EcoTracker`, the one object a host page talks to.
//!
//! The page hands over its globals at `init` and calls back into the
//! tracker from its event handlers. Everything the tracker starts is
//! stopped again by `teardown`.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::{GeolocationError, Result};
use crate::forms::{self, FileUpload};
use crate::geo::LatLng;
use crate::map::MapController;
use crate::notifications::{ActionOutcome, NotificationAction, NotificationPoller, PollerHandle};
use crate::ports::{
    CentersApi, Dom, Geolocator, MapBackend, NotificationApi, SearchApi, Target, TimeProvider,
};
use crate::search::SearchTypeahead;
use crate::templates::Markup;
use crate::toast::{ToastId, ToastKind, ToastQueue};
use crate::types::{Center, NotificationId};

pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields.";
const CENTERS_FAILED_MESSAGE: &str = "Could not load recycling centers.";

/// Values the host page sets before initialization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PageGlobals {
    #[serde(default)]
    pub centers: Vec<Center>,
    #[serde(default)]
    pub selected_material: Option<String>,
}

pub struct EcoTracker<A, B: MapBackend, G, D, T> {
    api: A,
    dom: D,
    time: T,
    config: AppConfig,
    map: Arc<Mutex<MapController<B, G, D, T>>>,
    toasts: ToastQueue<D, T>,
    notifications: NotificationPoller<A, D, T>,
    poller: Option<PollerHandle>,
    searches: Vec<SearchTypeahead<A, D, T>>,
}

impl<A, B, G, D, T> EcoTracker<A, B, G, D, T>
where
    A: NotificationApi + SearchApi + CentersApi,
    B: MapBackend,
    G: Geolocator,
    D: Dom,
    T: TimeProvider,
{
    pub fn new(api: A, backend: B, geolocator: G, dom: D, time: T, config: AppConfig) -> Self {
        let toasts = ToastQueue::new(dom.clone(), time.clone(), config.toast.clone());
        let notifications = NotificationPoller::new(
            api.clone(),
            dom.clone(),
            time.clone(),
            toasts.clone(),
            config.notifications.clone(),
        );
        let map = MapController::new(
            backend,
            geolocator,
            dom.clone(),
            time.clone(),
            config.map.clone(),
            config.geolocation.position_options(),
        );
        Self {
            api,
            dom,
            time,
            config,
            map: Arc::new(Mutex::new(map)),
            toasts,
            notifications,
            poller: None,
            searches: Vec::new(),
        }
    }

    /// Build the map from the page globals and start badge polling.
    /// Calling it again re-renders without starting a second poller.
    pub fn init(&mut self, globals: PageGlobals) -> Result<()> {
        {
            let mut map = self.map_lock();
            map.ensure_map();
            map.render_centers(globals.centers)?;
            if let Some(material) = globals.selected_material.as_deref() {
                map.filter_by_material(material);
            }
        }
        if self.poller.is_none() {
            self.poller = Some(self.notifications.spawn());
        }
        tracing::info!("page initialized");
        Ok(())
    }

    /// Stop polling and pending searches, drop toasts and the map.
    pub fn teardown(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
        for search in self.searches.drain(..) {
            search.detach();
        }
        self.toasts.clear();
        self.map_lock().teardown();
        tracing::info!("page torn down");
    }

    /// Handler for the material filter select.
    pub fn on_material_change(&self, value: &str) {
        self.map_lock().filter_by_material(value);
    }

    /// Fetch centers from the backend and redraw them. A failed fetch keeps
    /// the current markers and shows an error toast.
    pub async fn reload_centers(&self, material: Option<&str>) -> Result<usize> {
        let centers = match self.api.centers(material).await {
            Ok(centers) => centers,
            Err(err) => {
                tracing::error!(error = %err, "failed to load centers");
                self.toast(CENTERS_FAILED_MESSAGE, ToastKind::Error);
                return Err(err.into());
            }
        };
        let count = centers.len();
        let mut map = self.map_lock();
        map.render_centers(centers)?;
        if let Some(material) = material {
            map.filter_by_material(material);
        }
        Ok(count)
    }

    /// Locate the user. Other map updates may run while the lookup is pending;
    /// a later call supersedes this one.
    pub async fn locate_user(&self) -> Result<LatLng, GeolocationError> {
        let request = self.map_lock().position_request();
        let resolved = request.resolve().await;
        self.map_lock().apply_position(resolved)
    }

    pub fn show_toast(
        &self,
        message: &str,
        kind: ToastKind,
        title: Option<&str>,
        duration: Option<Duration>,
    ) -> Result<ToastId> {
        self.toasts.show(message, kind, title, duration)
    }

    pub fn dismiss_toast(&self, id: ToastId) -> bool {
        self.toasts.dismiss(id)
    }

    pub async fn refresh_badge(&self) -> Option<u64> {
        self.notifications.refresh_badge().await
    }

    pub async fn mark_notification_read(&self, id: NotificationId) -> ActionOutcome {
        self.notifications.mark_read(id).await
    }

    pub async fn delete_notification(&self, id: NotificationId) -> ActionOutcome {
        self.notifications.delete(id).await
    }

    pub async fn mark_all_notifications_read(&self) -> ActionOutcome {
        self.notifications.mark_all_read().await
    }

    /// Document click handler for the notification list. `None` when the
    /// click was not on a notification action.
    pub async fn on_notification_click(
        &self,
        class_list: &str,
        notification_id: Option<&str>,
    ) -> Option<ActionOutcome> {
        let action = NotificationAction::from_click(class_list, notification_id)?;
        Some(self.notifications.dispatch(action).await)
    }

    /// Wire a search box. Returns the typeahead so the host can feed it
    /// input events.
    pub fn attach_search(
        &mut self,
        input_id: &str,
        results_id: &str,
        endpoint: &str,
    ) -> Option<SearchTypeahead<A, D, T>> {
        let typeahead = SearchTypeahead::attach(
            self.api.clone(),
            self.dom.clone(),
            self.time.clone(),
            input_id,
            results_id,
            endpoint,
            self.config.search.clone(),
        )?;
        self.searches.push(typeahead.clone());
        Some(typeahead)
    }

    /// Submit handler for `form[data-validate]`. Returns whether the submit
    /// may proceed.
    pub fn on_form_submit(&self, form_id: &str) -> bool {
        let valid = forms::validate_form(&self.dom, form_id);
        if !valid {
            self.toast(REQUIRED_FIELDS_MESSAGE, ToastKind::Error);
        }
        valid
    }

    pub fn preview_image(&self, preview_id: &str, file: &FileUpload) -> bool {
        forms::preview_image(&self.dom, preview_id, file)
    }

    pub fn preview_upload(&self, parent_id: &str, file: &FileUpload) -> bool {
        forms::preview_upload(&self.dom, parent_id, file).unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to render file preview");
            false
        })
    }

    pub fn show_loading(&self, element_id: &str) -> bool {
        forms::show_loading(&self.dom, element_id)
    }

    pub fn hide_loading(&self, element_id: &str, content: &Markup) -> bool {
        forms::hide_loading(&self.dom, element_id, content)
    }

    /// Where the filter form navigates: the selected material, the search
    /// text and the user's location when known.
    pub fn filter_url(&self, page: &Url, search: Option<&str>) -> Url {
        let material = self
            .dom
            .value(&Target::id(self.config.map.material_filter_id.as_str()));
        let location = self.map_lock().user_location();
        forms::filter_url(page, material.as_deref(), search, location)
    }

    /// Run `f` against the map controller.
    pub fn with_map<R>(&self, f: impl FnOnce(&MapController<B, G, D, T>) -> R) -> R {
        f(&self.map_lock())
    }

    pub fn toasts(&self) -> &ToastQueue<D, T> {
        &self.toasts
    }

    fn toast(&self, message: &str, kind: ToastKind) {
        if let Err(err) = self.toasts.show(message, kind, None, None) {
            tracing::error!(error = %err, "failed to render toast");
        }
    }

    fn map_lock(&self) -> MutexGuard<'_, MapController<B, G, D, T>> {
        self.map.lock().expect("map controller lock")
    }
}
