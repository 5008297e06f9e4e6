pub mod dom;
pub mod events;
pub mod routes;

pub use dom::{Document, DocumentModal, DisplayMode, HeadlessDocument, Modal};
pub use events::{ClickEvent, EventTarget, FileChangeEvent, FormData, SubmitEvent};
pub use routes::{Navigator, Route};
