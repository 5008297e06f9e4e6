use std::collections::HashMap;

use crate::models::SelectedFile;

pub const FIELD_TYPE: &str = "expense-type";
pub const FIELD_NAME: &str = "expense-name";
pub const FIELD_AMOUNT: &str = "amount";
pub const FIELD_DATE: &str = "datepicker";
pub const FIELD_VAT: &str = "vat";
pub const FIELD_PCT: &str = "pct";
pub const FIELD_COMMENTARY: &str = "commentary";

/// The element an event was dispatched on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTarget {
    pub id: Option<String>,
    pub attributes: HashMap<String, String>,
}

impl EventTarget {
    pub fn with_id(id: impl Into<String>) -> Self {
        EventTarget {
            id: Some(id.into()),
            attributes: HashMap::new(),
        }
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClickEvent {
    pub target: EventTarget,
    default_prevented: bool,
}

impl ClickEvent {
    pub fn on(target: EventTarget) -> Self {
        ClickEvent {
            target,
            default_prevented: false,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

#[derive(Debug, Clone, Default)]
pub struct FileChangeEvent {
    pub file: Option<SelectedFile>,
    default_prevented: bool,
}

impl FileChangeEvent {
    pub fn selected(file: SelectedFile) -> Self {
        FileChangeEvent {
            file: Some(file),
            default_prevented: false,
        }
    }

    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Field values of the submitted form, keyed by `data-testid`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    fields: HashMap<String, String>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Trimmed value; empty and missing fields are both `None`.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubmitEvent {
    pub form: FormData,
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn with_form(form: FormData) -> Self {
        SubmitEvent {
            form,
            default_prevented: false,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}
