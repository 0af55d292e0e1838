//! Unread badge polling and the notification list actions.

use tokio::task::JoinHandle;

use crate::config::NotificationConfig;
use crate::error::ApiError;
use crate::ports::{Dom, NotificationApi, Target, TimeProvider};
use crate::toast::{ToastKind, ToastQueue};
use crate::types::NotificationId;

pub const DELETE_CONFIRMATION: &str = "Are you sure you want to delete this notification?";

const MARK_READ_CLASS: &str = "notification-mark-read";
const DELETE_CLASS: &str = "notification-delete";
const REMOVING_CLASS: &str = "removing";
const BADGE_CAP: u64 = 99;

/// Badge label for `count` unread notifications.
pub fn badge_text(count: u64) -> String {
    if count > BADGE_CAP {
        format!("{BADGE_CAP}+")
    } else {
        count.to_string()
    }
}

/// What a click inside the notification list asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    MarkRead(NotificationId),
    Delete(NotificationId),
    MarkAllRead,
}

impl NotificationAction {
    /// Map a clicked element's class list and `data-notification-id` to an
    /// action. Clicks on anything else, or with an unparsable id, yield `None`.
    pub fn from_click(class_list: &str, notification_id: Option<&str>) -> Option<Self> {
        let id = || notification_id?.trim().parse::<NotificationId>().ok();
        let mut classes = class_list.split_whitespace();
        if classes.clone().any(|class| class == MARK_READ_CLASS) {
            id().map(NotificationAction::MarkRead)
        } else if classes.any(|class| class == DELETE_CLASS) {
            id().map(NotificationAction::Delete)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    Failed,
    /// The user declined the confirmation prompt; nothing was sent.
    Cancelled,
}

pub struct PollerHandle {
    handle: JoinHandle<()>,
}

impl PollerHandle {
    pub fn abort(&self) {
        self.handle.abort();
    }
}

#[derive(Clone)]
pub struct NotificationPoller<A, D, T> {
    api: A,
    dom: D,
    time: T,
    toasts: ToastQueue<D, T>,
    config: NotificationConfig,
}

impl<A, D, T> NotificationPoller<A, D, T>
where
    A: NotificationApi,
    D: Dom,
    T: TimeProvider,
{
    pub fn new(
        api: A,
        dom: D,
        time: T,
        toasts: ToastQueue<D, T>,
        config: NotificationConfig,
    ) -> Self {
        Self {
            api,
            dom,
            time,
            toasts,
            config,
        }
    }

    /// Poll the unread count every interval until the handle is aborted.
    /// The first poll happens one interval after the call.
    pub fn spawn(&self) -> PollerHandle {
        let poller = self.clone();
        let interval = self.config.poll_interval();
        let handle = tokio::spawn(async move {
            loop {
                poller.time.sleep(interval).await;
                poller.refresh_badge().await;
            }
        });
        tracing::info!(interval_ms = interval.as_millis() as u64, "notification polling started");
        PollerHandle { handle }
    }

    /// Fetch the unread count and mirror it on the badge. Failures are logged
    /// and leave the badge as it was.
    pub async fn refresh_badge(&self) -> Option<u64> {
        let count = match self.api.unread_count().await {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!(error = %err, "error updating notification badge");
                return None;
            }
        };
        let badge = Target::NotificationBadge;
        if count > 0 {
            self.dom.set_text(&badge, &badge_text(count));
            self.dom.set_visible(&badge, true);
        } else {
            self.dom.set_visible(&badge, false);
        }
        Some(count)
    }

    pub async fn dispatch(&self, action: NotificationAction) -> ActionOutcome {
        match action {
            NotificationAction::MarkRead(id) => self.mark_read(id).await,
            NotificationAction::Delete(id) => self.delete(id).await,
            NotificationAction::MarkAllRead => self.mark_all_read().await,
        }
    }

    pub async fn mark_read(&self, id: NotificationId) -> ActionOutcome {
        let result = self.api.mark_read(id).await;
        if !self.succeeded(result, "mark notification read") {
            self.toast("Error marking notification as read", ToastKind::Error);
            return ActionOutcome::Failed;
        }
        self.dom
            .replace_class(&Target::Notification(id), "unread", "read");
        self.refresh_badge().await;
        self.toast("Notification marked as read", ToastKind::Success);
        ActionOutcome::Applied
    }

    /// Delete after the user confirms. The item fades for the removal
    /// animation before it leaves the document.
    pub async fn delete(&self, id: NotificationId) -> ActionOutcome {
        if !self.dom.confirm(DELETE_CONFIRMATION) {
            return ActionOutcome::Cancelled;
        }
        let result = self.api.delete(id).await;
        if !self.succeeded(result, "delete notification") {
            self.toast("Error deleting notification", ToastKind::Error);
            return ActionOutcome::Failed;
        }

        let item = Target::Notification(id);
        if self.dom.add_class(&item, REMOVING_CLASS) > 0 {
            let dom = self.dom.clone();
            let time = self.time.clone();
            let delay = self.config.removal_animation();
            tokio::spawn(async move {
                time.sleep(delay).await;
                dom.remove(&item);
            });
        }
        self.refresh_badge().await;
        self.toast("Notification deleted", ToastKind::Success);
        ActionOutcome::Applied
    }

    pub async fn mark_all_read(&self) -> ActionOutcome {
        let result = self.api.mark_all_read().await;
        if !self.succeeded(result, "mark all notifications read") {
            self.toast("Error marking notifications as read", ToastKind::Error);
            return ActionOutcome::Failed;
        }
        let changed = self
            .dom
            .replace_class(&Target::UnreadNotifications, "unread", "read");
        tracing::debug!(changed, "marked all notifications read");
        self.refresh_badge().await;
        self.toast("All notifications marked as read", ToastKind::Success);
        ActionOutcome::Applied
    }

    fn succeeded(&self, result: Result<bool, ApiError>, action: &str) -> bool {
        match result {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!(action, "server declined notification action");
                false
            }
            Err(err) => {
                tracing::error!(action, error = %err, "notification action failed");
                false
            }
        }
    }

    fn toast(&self, message: &str, kind: ToastKind) {
        if let Err(err) = self.toasts.show(message, kind, None, None) {
            tracing::error!(error = %err, "failed to render toast");
        }
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::adapters::{Element, MemoryDom};
    use crate::config::ToastConfig;
    use crate::testing::{Call, FakeBackend, Reply, TestTime};
    use std::time::Duration;

    fn page() -> MemoryDom {
        MemoryDom::new()
            .with(Element::with_id("badge").class("notification-badge"))
            .with(
                Element::with_id("n1")
                    .class("notification-item unread")
                    .attr("data-notification-id", "1"),
            )
            .with(
                Element::with_id("n2")
                    .class("notification-item unread")
                    .attr("data-notification-id", "2"),
            )
    }

    fn poller(
        api: &FakeBackend,
        dom: &MemoryDom,
    ) -> NotificationPoller<FakeBackend, MemoryDom, TestTime> {
        let time = TestTime::new();
        let toasts = ToastQueue::new(dom.clone(), time.clone(), ToastConfig::default());
        NotificationPoller::new(
            api.clone(),
            dom.clone(),
            time,
            toasts,
            NotificationConfig::default(),
        )
    }

    fn toast_html(dom: &MemoryDom) -> Vec<String> {
        dom.children("toast-container")
            .into_iter()
            .map(|toast| toast.html)
            .collect()
    }

    #[test]
    fn badge_text__should_cap_at_ninety_nine() {
        assert_eq!(badge_text(1), "1");
        assert_eq!(badge_text(99), "99");
        assert_eq!(badge_text(100), "99+");
    }

    #[test]
    fn from_click__should_map_action_classes() {
        assert_eq!(
            NotificationAction::from_click("btn notification-mark-read", Some("4")),
            Some(NotificationAction::MarkRead(4))
        );
        assert_eq!(
            NotificationAction::from_click("notification-delete btn-sm", Some(" 9 ")),
            Some(NotificationAction::Delete(9))
        );
        assert_eq!(NotificationAction::from_click("btn", Some("4")), None);
        assert_eq!(
            NotificationAction::from_click("notification-delete", Some("x")),
            None
        );
        assert_eq!(NotificationAction::from_click("notification-delete", None), None);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_badge__should_show_capped_count_and_hide_at_zero() {
        // Given
        let api = FakeBackend::default();
        let dom = page();
        let poller = poller(&api, &dom);
        api.set_unread(Some(120));

        // When
        poller.refresh_badge().await;

        // Then
        let badge = dom.element("badge").expect("badge");
        assert_eq!(badge.text, "99+");
        assert!(badge.visible);

        // When
        api.set_unread(Some(0));
        poller.refresh_badge().await;

        // Then
        assert!(!dom.element("badge").expect("badge").visible);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_badge__should_keep_badge_and_stay_silent_on_failure() {
        let api = FakeBackend::default();
        let dom = page();
        let poller = poller(&api, &dom);
        api.set_unread(Some(3));
        poller.refresh_badge().await;

        api.set_unread(None);
        let count = poller.refresh_badge().await;

        assert_eq!(count, None);
        assert_eq!(dom.element("badge").expect("badge").text, "3");
        assert!(toast_html(&dom).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn spawn__should_poll_every_interval_until_aborted() {
        // Given
        let api = FakeBackend::default();
        let dom = page();
        let poller = poller(&api, &dom);
        api.set_unread(Some(5));

        // When
        let handle = poller.spawn();
        tokio::time::sleep(Duration::from_secs(29)).await;

        // Then
        assert!(api.calls().is_empty());

        // When
        tokio::time::sleep(Duration::from_secs(2)).await;

        // Then
        assert_eq!(api.calls(), vec![Call::UnreadCount]);
        assert_eq!(dom.element("badge").expect("badge").text, "5");

        // When
        tokio::time::sleep(Duration::from_secs(30)).await;
        handle.abort();
        tokio::time::sleep(Duration::from_secs(120)).await;

        // Then
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn mark_read__should_swap_class_refresh_badge_and_toast() {
        // Given
        let api = FakeBackend::default();
        let dom = page();
        let poller = poller(&api, &dom);

        // When
        let outcome = poller.mark_read(1).await;

        // Then
        assert_eq!(outcome, ActionOutcome::Applied);
        let item = dom.element("n1").expect("n1");
        assert!(item.has_class("read"));
        assert!(!item.has_class("unread"));
        assert_eq!(api.calls(), vec![Call::MarkRead(1), Call::UnreadCount]);
        assert!(toast_html(&dom)[0].contains("Notification marked as read"));
    }

    #[tokio::test(start_paused = true)]
    async fn mark_read__should_leave_item_unchanged_and_toast_on_failure() {
        for reply in [Reply::Declined, Reply::ServerError] {
            // Given
            let api = FakeBackend::default();
            let dom = page();
            let poller = poller(&api, &dom);
            api.set_action_reply(reply);

            // When
            let outcome = poller.mark_read(1).await;

            // Then
            assert_eq!(outcome, ActionOutcome::Failed);
            let item = dom.element("n1").expect("n1");
            assert!(item.has_class("unread"));
            assert!(!item.has_class("read"));
            assert_eq!(api.calls(), vec![Call::MarkRead(1)]);
            let toasts = toast_html(&dom);
            assert_eq!(toasts.len(), 1);
            assert!(toasts[0].contains("Error marking notification as read"));
            assert!(toasts[0].contains("text-danger"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn delete__should_do_nothing_when_not_confirmed() {
        let api = FakeBackend::default();
        let dom = page();
        let poller = poller(&api, &dom);
        dom.set_confirm_answer(false);

        let outcome = poller.delete(2).await;

        assert_eq!(outcome, ActionOutcome::Cancelled);
        assert_eq!(dom.confirms(), vec![DELETE_CONFIRMATION]);
        assert!(api.calls().is_empty());
        assert!(dom.element("n2").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn delete__should_remove_item_after_animation() {
        // Given
        let api = FakeBackend::default();
        let dom = page();
        let poller = poller(&api, &dom);
        dom.set_confirm_answer(true);

        // When
        let outcome = poller.delete(2).await;

        // Then
        assert_eq!(outcome, ActionOutcome::Applied);
        assert!(dom.element("n2").expect("n2").has_class("removing"));

        // When
        tokio::time::sleep(Duration::from_millis(310)).await;

        // Then
        assert!(dom.element("n2").is_none());
        assert!(toast_html(&dom)[0].contains("Notification deleted"));
    }

    #[tokio::test(start_paused = true)]
    async fn mark_all_read__should_mark_every_unread_item() {
        let api = FakeBackend::default();
        let dom = page();
        let poller = poller(&api, &dom);

        let outcome = poller.dispatch(NotificationAction::MarkAllRead).await;

        assert_eq!(outcome, ActionOutcome::Applied);
        assert!(dom.find(&Target::UnreadNotifications).is_empty());
        assert!(toast_html(&dom)[0].contains("All notifications marked as read"));
    }

    #[tokio::test(start_paused = true)]
    async fn mark_all_read__should_keep_unread_items_on_failure() {
        let api = FakeBackend::default();
        let dom = page();
        let poller = poller(&api, &dom);
        api.set_action_reply(Reply::ServerError);

        let outcome = poller.mark_all_read().await;

        assert_eq!(outcome, ActionOutcome::Failed);
        assert_eq!(dom.find(&Target::UnreadNotifications).len(), 2);
        assert!(toast_html(&dom)[0].contains("Error marking notifications as read"));
    }
}
