//! In-memory document used by the CLI and by tests.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex};

use crate::ports::{Dom, Target};
use crate::templates::Markup;

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Id of the enclosing element; `None` means the body.
    pub parent: Option<String>,
    pub classes: BTreeSet<String>,
    pub attributes: BTreeMap<String, String>,
    pub text: String,
    pub html: String,
    pub value: String,
    pub visible: bool,
    /// Form this control belongs to when it is `[required]`.
    pub required_in: Option<String>,
}

impl Default for Element {
    fn default() -> Self {
        Self {
            id: None,
            name: None,
            parent: None,
            classes: BTreeSet::new(),
            attributes: BTreeMap::new(),
            text: String::new(),
            html: String::new(),
            value: String::new(),
            visible: true,
            required_in: None,
        }
    }
}

impl Element {
    pub fn with_id(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Self::default()
        }
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn class(mut self, class: &str) -> Self {
        for class in class.split_whitespace() {
            self.classes.insert(class.to_string());
        }
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn required_in(mut self, form_id: &str) -> Self {
        self.required_in = Some(form_id.to_string());
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    fn matches(&self, target: &Target) -> bool {
        match target {
            Target::Id(id) => self.id.as_deref() == Some(id.as_str()),
            Target::Named(name) => self.name.as_deref() == Some(name.as_str()),
            Target::Notification(id) => self
                .attributes
                .get("data-notification-id")
                .is_some_and(|value| value.trim() == id.to_string()),
            Target::UnreadNotifications => {
                self.has_class("notification-item") && self.has_class("unread")
            }
            Target::NotificationBadge => self.has_class("notification-badge"),
        }
    }
}

#[derive(Debug, Default)]
struct Document {
    elements: Vec<Element>,
    cookies: String,
    confirm_answer: bool,
    confirms: Vec<String>,
    alerts: Vec<String>,
    removed: Vec<String>,
}

impl Document {
    fn matching(&mut self, target: &Target) -> impl Iterator<Item = &mut Element> {
        self.elements
            .iter_mut()
            .filter(move |element| element.matches(target))
    }

    fn first(&self, target: &Target) -> Option<&Element> {
        self.elements.iter().find(|element| element.matches(target))
    }

    fn drop_children_of(&mut self, parents: HashSet<String>) {
        let mut doomed = parents;
        loop {
            let before = doomed.len();
            for element in &self.elements {
                if let (Some(parent), Some(id)) = (&element.parent, &element.id)
                    && doomed.contains(parent)
                {
                    doomed.insert(id.clone());
                }
            }
            if doomed.len() == before {
                break;
            }
        }
        let removed = &mut self.removed;
        self.elements.retain(|element| {
            let orphaned = element
                .parent
                .as_ref()
                .is_some_and(|parent| doomed.contains(parent));
            if orphaned && let Some(id) = &element.id {
                removed.push(id.clone());
            }
            !orphaned
        });
    }
}

/// A shared, cloneable document.
#[derive(Debug, Clone, Default)]
pub struct MemoryDom {
    document: Arc<Mutex<Document>>,
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, element: Element) -> Self {
        self.insert(element);
        self
    }

    pub fn insert(&self, element: Element) {
        self.lock().elements.push(element);
    }

    pub fn set_cookies(&self, cookies: &str) {
        self.lock().cookies = cookies.to_string();
    }

    /// Answer given to every later `confirm` prompt.
    pub fn set_confirm_answer(&self, answer: bool) {
        self.lock().confirm_answer = answer;
    }

    pub fn element(&self, id: &str) -> Option<Element> {
        self.lock().first(&Target::id(id)).cloned()
    }

    pub fn find(&self, target: &Target) -> Vec<Element> {
        self.lock()
            .elements
            .iter()
            .filter(|element| element.matches(target))
            .cloned()
            .collect()
    }

    pub fn children(&self, parent_id: &str) -> Vec<Element> {
        self.lock()
            .elements
            .iter()
            .filter(|element| element.parent.as_deref() == Some(parent_id))
            .cloned()
            .collect()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.lock().alerts.clone()
    }

    pub fn confirms(&self) -> Vec<String> {
        self.lock().confirms.clone()
    }

    /// Ids of removed elements, in removal order.
    pub fn removed(&self) -> Vec<String> {
        self.lock().removed.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Document> {
        self.document.lock().expect("document lock")
    }
}

impl Dom for MemoryDom {
    fn exists(&self, target: &Target) -> bool {
        self.lock().first(target).is_some()
    }

    fn attribute(&self, target: &Target, name: &str) -> Option<String> {
        self.lock()
            .first(target)
            .and_then(|element| element.attributes.get(name).cloned())
    }

    fn set_attribute(&self, target: &Target, name: &str, value: &str) -> bool {
        let mut document = self.lock();
        let mut changed = false;
        for element in document.matching(target) {
            element
                .attributes
                .insert(name.to_string(), value.to_string());
            changed = true;
        }
        changed
    }

    fn value(&self, target: &Target) -> Option<String> {
        self.lock().first(target).map(|element| element.value.clone())
    }

    fn ensure_element(&self, parent: Option<&Target>, id: &str, class: &str) -> bool {
        let mut document = self.lock();
        if document.first(&Target::id(id)).is_some() {
            return false;
        }
        let parent_id = match parent {
            Some(parent) => match document.first(parent) {
                Some(parent) => parent.id.clone(),
                None => return false,
            },
            None => None,
        };
        let mut element = Element::with_id(id).class(class);
        element.parent = parent_id;
        document.elements.push(element);
        true
    }

    fn append(&self, parent: &Target, child_id: &str, html: &Markup) -> bool {
        let mut document = self.lock();
        let parent_id = match document.first(parent) {
            Some(parent) => parent.id.clone(),
            None => return false,
        };
        let mut child = Element::with_id(child_id);
        child.parent = parent_id;
        child.html = html.as_str().to_string();
        document.elements.push(child);
        true
    }

    fn set_html(&self, target: &Target, html: &Markup) -> bool {
        let mut document = self.lock();
        let mut replaced = HashSet::new();
        for element in document.matching(target) {
            element.html = html.as_str().to_string();
            element.text.clear();
            if let Some(id) = &element.id {
                replaced.insert(id.clone());
            }
        }
        let matched = document.first(target).is_some();
        document.drop_children_of(replaced);
        matched
    }

    fn set_text(&self, target: &Target, text: &str) -> bool {
        let mut document = self.lock();
        let mut changed = false;
        for element in document.matching(target) {
            element.text = text.to_string();
            changed = true;
        }
        changed
    }

    fn set_visible(&self, target: &Target, visible: bool) -> bool {
        let mut document = self.lock();
        let mut changed = false;
        for element in document.matching(target) {
            element.visible = visible;
            changed = true;
        }
        changed
    }

    fn add_class(&self, target: &Target, class: &str) -> usize {
        let mut document = self.lock();
        document
            .matching(target)
            .map(|element| element.classes.insert(class.to_string()))
            .count()
    }

    fn remove_class(&self, target: &Target, class: &str) -> usize {
        let mut document = self.lock();
        document
            .matching(target)
            .map(|element| element.classes.remove(class))
            .count()
    }

    fn replace_class(&self, target: &Target, from: &str, to: &str) -> usize {
        let mut document = self.lock();
        let mut changed = 0;
        for element in document.matching(target) {
            if element.classes.remove(from) {
                element.classes.insert(to.to_string());
                changed += 1;
            }
        }
        changed
    }

    fn remove(&self, target: &Target) -> bool {
        let mut document = self.lock();
        let mut gone = HashSet::new();
        let mut removed_ids = Vec::new();
        document.elements.retain(|element| {
            if !element.matches(target) {
                return true;
            }
            if let Some(id) = &element.id {
                gone.insert(id.clone());
                removed_ids.push(id.clone());
            }
            false
        });
        let matched = !removed_ids.is_empty();
        document.removed.extend(removed_ids);
        document.drop_children_of(gone);
        matched
    }

    fn required_fields(&self, form_id: &str) -> Vec<String> {
        self.lock()
            .elements
            .iter()
            .filter(|element| element.required_in.as_deref() == Some(form_id))
            .filter_map(|element| element.id.clone())
            .collect()
    }

    fn cookies(&self) -> String {
        self.lock().cookies.clone()
    }

    fn confirm(&self, message: &str) -> bool {
        let mut document = self.lock();
        document.confirms.push(message.to_string());
        document.confirm_answer
    }

    fn alert(&self, message: &str) {
        tracing::info!(text = message, "alert shown");
        self.lock().alerts.push(message.to_string());
    }
}
