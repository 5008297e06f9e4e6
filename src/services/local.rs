use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::db::{Database, StoredAttachment};
use crate::error::StoreError;
use crate::models::{BillRecord, NewBill};
use crate::services::store::{
    AttachmentPayload, BillsResource, CreatePayload, CreatedBill, Store, UpdatePayload,
};
use crate::utils::{now_rfc3339, sha256_bytes};

/// Store kept in a local SQLite database.
pub struct LocalStore {
    bills: LocalBills,
}

impl LocalStore {
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        Ok(Self::with_database(Database::new(db_path)?))
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Ok(Self::with_database(Database::in_memory()?))
    }

    fn with_database(db: Database) -> Self {
        LocalStore {
            bills: LocalBills {
                db: Arc::new(Mutex::new(db)),
            },
        }
    }

    pub fn attachment(&self, key: &str) -> Result<Option<StoredAttachment>, StoreError> {
        Ok(self.bills.db()?.get_attachment(key)?)
    }
}

impl Store for LocalStore {
    fn bills(&self) -> &dyn BillsResource {
        &self.bills
    }
}

struct LocalBills {
    db: Arc<Mutex<Database>>,
}

impl LocalBills {
    fn db(&self) -> Result<MutexGuard<'_, Database>, StoreError> {
        self.db
            .lock()
            .map_err(|_| StoreError::Database("DB lock poisoned".to_string()))
    }

    fn store_attachment(&self, payload: AttachmentPayload) -> Result<CreatedBill, StoreError> {
        let key = uuid::Uuid::new_v4().to_string();
        let file_url = attachment_url(&key, &payload.file.name);
        let attachment = StoredAttachment {
            key: key.clone(),
            email: payload.email,
            file_hash: sha256_bytes(&payload.file.bytes),
            file_name: payload.file.name,
            content_type: payload.file.content_type,
            content: payload.file.bytes,
            created_at: now_rfc3339(),
        };
        self.db()?.insert_attachment(&attachment)?;
        debug!(key = %key, hash = %attachment.file_hash, "stored attachment");

        Ok(CreatedBill {
            file_url: Some(file_url),
            key,
        })
    }

    fn store_bill(&self, id: String, bill: NewBill) -> Result<BillRecord, StoreError> {
        let record = bill.into_record(id);
        let db = self.db()?;
        db.upsert_bill(&record, &now_rfc3339())?;
        db.get_bill(&record.id)?
            .ok_or_else(|| StoreError::NotFound(record.id.clone()))
    }
}

#[async_trait]
impl BillsResource for LocalBills {
    async fn list(&self) -> Result<Vec<BillRecord>, StoreError> {
        Ok(self.db()?.list_bills()?)
    }

    async fn create(&self, payload: CreatePayload) -> Result<CreatedBill, StoreError> {
        match payload {
            CreatePayload::Attachment(attachment) => self.store_attachment(attachment),
            CreatePayload::Bill(bill) => {
                let record = self.store_bill(uuid::Uuid::new_v4().to_string(), bill)?;
                Ok(CreatedBill {
                    file_url: record.file_url,
                    key: record.id,
                })
            }
        }
    }

    async fn update(&self, payload: UpdatePayload) -> Result<BillRecord, StoreError> {
        let known = {
            let db = self.db()?;
            db.get_attachment(&payload.selector)?.is_some()
                || db.get_bill(&payload.selector)?.is_some()
        };
        if !known {
            return Err(StoreError::NotFound(format!("bill {}", payload.selector)));
        }
        self.store_bill(payload.selector, payload.bill)
    }
}

fn attachment_url(key: &str, file_name: &str) -> String {
    format!("local://attachments/{}/{}", key, file_name)
}
