use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

pub const ERROR_MESSAGE: &str = "errorMsg";
pub const SUBMIT_BUTTON: &str = "btn-send-bill";
pub const FILE_INPUT: &str = "file";
pub const NEW_BILL_FORM: &str = "form-new-bill";
pub const NEW_BILL_BUTTON: &str = "btn-new-bill";
pub const EYE_ICON: &str = "icon-eye";
pub const MODAL: &str = "modaleFile";
pub const MODAL_IMAGE: &str = "modaleFile-img";

pub const BILL_URL_ATTRIBUTE: &str = "data-bill-url";
pub const MODAL_SHOWN_CLASS: &str = "show";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Block,
    None,
}

/// The element state the controllers are allowed to touch.
pub trait Document: Send + Sync {
    fn set_display(&self, id: &str, display: DisplayMode);
    fn set_disabled(&self, id: &str, disabled: bool);
    fn set_attribute(&self, id: &str, name: &str, value: &str);
    fn remove_attribute(&self, id: &str, name: &str);
    fn add_class(&self, id: &str, class: &str);
}

/// Shows a dialog element by id.
pub trait Modal: Send + Sync {
    fn show(&self, element_id: &str);
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementState {
    pub display: Option<DisplayMode>,
    pub disabled: bool,
    pub attributes: BTreeMap<String, String>,
    pub classes: BTreeSet<String>,
}

/// In-process DOM used outside a browser.
#[derive(Debug, Default)]
pub struct HeadlessDocument {
    elements: Mutex<HashMap<String, ElementState>>,
}

impl HeadlessDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elements of the new-bill page in their initial state.
    pub fn new_bill_page() -> Self {
        let document = Self::new();
        for id in [ERROR_MESSAGE, SUBMIT_BUTTON, FILE_INPUT, NEW_BILL_FORM] {
            document.with_element(id, |_| {});
        }
        document.set_display(ERROR_MESSAGE, DisplayMode::None);
        document
    }

    /// Elements of the bills page in their initial state.
    pub fn bills_page() -> Self {
        let document = Self::new();
        for id in [NEW_BILL_BUTTON, MODAL, MODAL_IMAGE] {
            document.with_element(id, |_| {});
        }
        document
    }

    pub fn display(&self, id: &str) -> Option<DisplayMode> {
        self.lock().get(id).and_then(|el| el.display)
    }

    pub fn is_disabled(&self, id: &str) -> bool {
        self.lock().get(id).map(|el| el.disabled).unwrap_or(false)
    }

    pub fn attribute(&self, id: &str, name: &str) -> Option<String> {
        self.lock()
            .get(id)
            .and_then(|el| el.attributes.get(name).cloned())
    }

    pub fn has_class(&self, id: &str, class: &str) -> bool {
        self.lock()
            .get(id)
            .map(|el| el.classes.contains(class))
            .unwrap_or(false)
    }

    fn with_element(&self, id: &str, f: impl FnOnce(&mut ElementState)) {
        let mut elements = self.lock();
        f(elements.entry(id.to_string()).or_default());
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ElementState>> {
        self.elements
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Document for HeadlessDocument {
    fn set_display(&self, id: &str, display: DisplayMode) {
        self.with_element(id, |el| el.display = Some(display));
    }

    fn set_disabled(&self, id: &str, disabled: bool) {
        self.with_element(id, |el| el.disabled = disabled);
    }

    fn set_attribute(&self, id: &str, name: &str, value: &str) {
        self.with_element(id, |el| {
            el.attributes.insert(name.to_string(), value.to_string());
        });
    }

    fn remove_attribute(&self, id: &str, name: &str) {
        self.with_element(id, |el| {
            el.attributes.remove(name);
        });
    }

    fn add_class(&self, id: &str, class: &str) {
        self.with_element(id, |el| {
            el.classes.insert(class.to_string());
        });
    }
}

/// Modal capability that marks the dialog element as shown.
pub struct DocumentModal {
    document: Arc<dyn Document>,
}

impl DocumentModal {
    pub fn new(document: Arc<dyn Document>) -> Self {
        DocumentModal { document }
    }
}

impl Modal for DocumentModal {
    fn show(&self, element_id: &str) {
        self.document.add_class(element_id, MODAL_SHOWN_CLASS);
    }
}
