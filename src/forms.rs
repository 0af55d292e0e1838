//! Form helpers: required-field validation, upload previews, loading
//! placeholders and the center filter URL.

use reqwest::Url;

use crate::geo::LatLng;
use crate::ports::{Dom, Target};
use crate::templates::{FilePreviewTemplate, LOADING_HTML, Markup};

const INVALID_CLASS: &str = "is-invalid";
const VALID_CLASS: &str = "is-valid";

/// Mark each required field of `form_id` valid or invalid by whether its
/// trimmed value is empty. Returns `false` if any field is empty or the form
/// does not exist.
pub fn validate_form<D: Dom>(dom: &D, form_id: &str) -> bool {
    if !dom.exists(&Target::id(form_id)) {
        return false;
    }
    let mut valid = true;
    for field in dom.required_fields(form_id) {
        let target = Target::Id(field);
        let filled = dom
            .value(&target)
            .is_some_and(|value| !value.trim().is_empty());
        if filled {
            dom.remove_class(&target, INVALID_CLASS);
            dom.add_class(&target, VALID_CLASS);
        } else {
            dom.add_class(&target, INVALID_CLASS);
            valid = false;
        }
    }
    valid
}

/// A file picked in an `<input type="file">`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::encode(&self.bytes)
        )
    }
}

/// Point the `<img id=preview_id>` at `file` and show it.
pub fn preview_image<D: Dom>(dom: &D, preview_id: &str, file: &FileUpload) -> bool {
    let preview = Target::id(preview_id);
    if !dom.set_attribute(&preview, "src", &file.data_url()) {
        return false;
    }
    dom.set_visible(&preview, true)
}

/// Render a thumbnail and the file name under `parent_id`. Files that are
/// not images are ignored.
pub fn preview_upload<D: Dom>(dom: &D, parent_id: &str, file: &FileUpload) -> askama::Result<bool> {
    if !file.is_image() {
        return Ok(false);
    }
    let parent = Target::id(parent_id);
    if !dom.exists(&parent) {
        return Ok(false);
    }
    let preview_id = format!("{parent_id}-file-preview");
    dom.ensure_element(Some(&parent), &preview_id, "file-preview mt-2");
    let markup = Markup::render(&FilePreviewTemplate {
        src: &file.data_url(),
        file_name: &file.name,
    })?;
    Ok(dom.set_html(&Target::id(preview_id), &markup))
}

pub fn show_loading<D: Dom>(dom: &D, element_id: &str) -> bool {
    dom.set_html(&Target::id(element_id), &Markup::trusted(LOADING_HTML))
}

/// Replace a loading placeholder with `content`.
pub fn hide_loading<D: Dom>(dom: &D, element_id: &str, content: &Markup) -> bool {
    dom.set_html(&Target::id(element_id), content)
}

/// The center list URL for the chosen filters. Blank values are left out;
/// a known location adds `lat` and `lon`.
pub fn filter_url(
    page: &Url,
    material: Option<&str>,
    search: Option<&str>,
    location: Option<LatLng>,
) -> Url {
    let mut pairs: Vec<(&str, String)> = Vec::new();
    if let Some(material) = material.map(str::trim).filter(|m| !m.is_empty()) {
        pairs.push(("material_type", material.to_string()));
    }
    if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
        pairs.push(("search", search.to_string()));
    }
    if let Some(location) = location {
        pairs.push(("lat", location.lat.to_string()));
        pairs.push(("lon", location.lng.to_string()));
    }

    let mut url = page.clone();
    url.set_query(None);
    url.set_fragment(None);
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    url
}
