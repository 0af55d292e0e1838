use crate::templates::Markup;
use crate::types::NotificationId;

/// Which element(s) an operation applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// The element with this `id`.
    Id(String),
    /// Form fields with this `name` attribute.
    Named(String),
    /// The item tagged `data-notification-id="{id}"`.
    Notification(NotificationId),
    /// Every `.notification-item.unread`.
    UnreadNotifications,
    /// The `.notification-badge` in the navigation bar.
    NotificationBadge,
}

impl Target {
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }
}

/// The document the page layer mutates.
///
/// Operations on a target that matches nothing are no-ops; methods that can
/// miss report whether anything matched.
pub trait Dom: Clone + Send + Sync + 'static {
    fn exists(&self, target: &Target) -> bool;
    fn attribute(&self, target: &Target, name: &str) -> Option<String>;
    fn set_attribute(&self, target: &Target, name: &str, value: &str) -> bool;
    /// Current value of a form control.
    fn value(&self, target: &Target) -> Option<String>;

    /// Create `id` as the last child of `parent` (the body when `None`) unless
    /// an element with that id already exists. Returns whether it was created.
    fn ensure_element(&self, parent: Option<&Target>, id: &str, class: &str) -> bool;
    /// Append `html` wrapped as a child identified by `child_id`.
    fn append(&self, parent: &Target, child_id: &str, html: &Markup) -> bool;
    fn set_html(&self, target: &Target, html: &Markup) -> bool;
    fn set_text(&self, target: &Target, text: &str) -> bool;
    fn set_visible(&self, target: &Target, visible: bool) -> bool;

    fn add_class(&self, target: &Target, class: &str) -> usize;
    fn remove_class(&self, target: &Target, class: &str) -> usize;
    /// Swap `from` for `to` on every match; returns how many elements changed.
    fn replace_class(&self, target: &Target, from: &str, to: &str) -> usize;
    fn remove(&self, target: &Target) -> bool;

    /// Ids of the `[required]` controls inside the form `form_id`.
    fn required_fields(&self, form_id: &str) -> Vec<String>;
    /// Raw `document.cookie` string.
    fn cookies(&self) -> String;

    fn confirm(&self, message: &str) -> bool;
    fn alert(&self, message: &str);
}
