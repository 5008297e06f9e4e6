use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::models::{BillRecord, NewBill, SelectedFile};

/// A receipt file sent to the store on behalf of `email`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentPayload {
    pub file: SelectedFile,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreatePayload {
    Attachment(AttachmentPayload),
    Bill(NewBill),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBill {
    #[serde(default)]
    pub file_url: Option<String>,
    pub key: String,
}

/// Fills in the bill identified by `selector`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePayload {
    pub selector: String,
    pub bill: NewBill,
}

/// Per-resource handle for bills.
#[async_trait]
pub trait BillsResource: Send + Sync {
    async fn list(&self) -> Result<Vec<BillRecord>, StoreError>;
    async fn create(&self, payload: CreatePayload) -> Result<CreatedBill, StoreError>;
    async fn update(&self, payload: UpdatePayload) -> Result<BillRecord, StoreError>;
}

/// Remote persistence used by the controllers.
///
/// `HttpStore` talks to the billing API, `LocalStore` keeps everything in
/// SQLite and `MemoryStore` serves fixtures.
pub trait Store: Send + Sync {
    fn bills(&self) -> &dyn BillsResource;
}
