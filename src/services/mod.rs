pub mod http;
pub mod local;
pub mod memory;
pub mod state;
pub mod store;

pub use http::HttpStore;
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use store::{BillsResource, CreatePayload, CreatedBill, Store, UpdatePayload};
