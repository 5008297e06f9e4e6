use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{BillRecord, BillStatus, BillType};
use crate::services::store::{BillsResource, CreatePayload, CreatedBill, Store, UpdatePayload};

/// In-memory store that records every call it receives.
///
/// Serves the demo backend and the controller tests. Each `fail_next_*`
/// makes exactly one following call of that kind reject.
#[derive(Default)]
pub struct MemoryStore {
    bills: MemoryBills,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bills(bills: Vec<BillRecord>) -> Self {
        let store = Self::new();
        *lock(&store.bills.records) = bills;
        store
    }

    /// Seeded with the four sample bills of the demo account `a@a`.
    pub fn with_fixtures() -> Self {
        Self::with_bills(fixture_bills())
    }

    pub fn fail_next_list(&self, err: StoreError) {
        *lock(&self.bills.fail_list) = Some(err);
    }

    pub fn fail_next_create(&self, err: StoreError) {
        *lock(&self.bills.fail_create) = Some(err);
    }

    pub fn fail_next_update(&self, err: StoreError) {
        *lock(&self.bills.fail_update) = Some(err);
    }

    pub fn list_calls(&self) -> usize {
        self.bills.list_calls.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> Vec<CreatePayload> {
        lock(&self.bills.created).clone()
    }

    pub fn updated(&self) -> Vec<UpdatePayload> {
        lock(&self.bills.updated).clone()
    }

    pub fn records(&self) -> Vec<BillRecord> {
        lock(&self.bills.records).clone()
    }
}

impl Store for MemoryStore {
    fn bills(&self) -> &dyn BillsResource {
        &self.bills
    }
}

#[derive(Default)]
struct MemoryBills {
    records: Mutex<Vec<BillRecord>>,
    attachments: Mutex<HashSet<String>>,
    created: Mutex<Vec<CreatePayload>>,
    updated: Mutex<Vec<UpdatePayload>>,
    fail_list: Mutex<Option<StoreError>>,
    fail_create: Mutex<Option<StoreError>>,
    fail_update: Mutex<Option<StoreError>>,
    list_calls: AtomicUsize,
}

#[async_trait]
impl BillsResource for MemoryBills {
    async fn list(&self) -> Result<Vec<BillRecord>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = lock(&self.fail_list).take() {
            return Err(err);
        }
        Ok(lock(&self.records).clone())
    }

    async fn create(&self, payload: CreatePayload) -> Result<CreatedBill, StoreError> {
        lock(&self.created).push(payload.clone());
        if let Some(err) = lock(&self.fail_create).take() {
            return Err(err);
        }

        let key = uuid::Uuid::new_v4().to_string();
        match payload {
            CreatePayload::Attachment(attachment) => {
                lock(&self.attachments).insert(key.clone());
                Ok(CreatedBill {
                    file_url: Some(format!(
                        "memory://attachments/{}/{}",
                        key, attachment.file.name
                    )),
                    key,
                })
            }
            CreatePayload::Bill(bill) => {
                let record = bill.into_record(key.clone());
                let file_url = record.file_url.clone();
                lock(&self.records).push(record);
                Ok(CreatedBill { file_url, key })
            }
        }
    }

    async fn update(&self, payload: UpdatePayload) -> Result<BillRecord, StoreError> {
        lock(&self.updated).push(payload.clone());
        if let Some(err) = lock(&self.fail_update).take() {
            return Err(err);
        }

        let uploaded = lock(&self.attachments).contains(&payload.selector);
        let record = payload.bill.into_record(payload.selector);
        let mut records = lock(&self.records);
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None if uploaded => records.push(record.clone()),
            None => return Err(StoreError::NotFound(format!("bill {}", record.id))),
        }
        Ok(record)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn fixture(
    id: &str,
    bill_type: BillType,
    name: &str,
    amount: f64,
    date: &str,
    status: BillStatus,
    file_name: &str,
) -> BillRecord {
    BillRecord {
        id: id.to_string(),
        email: "a@a".to_string(),
        bill_type,
        name: name.to_string(),
        amount,
        date: date.to_string(),
        vat: Some(amount / 5.0),
        pct: Some(20),
        commentary: None,
        file_url: Some(format!(
            "https://test.storage.tld/v0/b/billable-677b6.appspot.com/o/justificatifs%2F{}?alt=media",
            file_name
        )),
        file_name: Some(file_name.to_string()),
        status,
        comment_admin: None,
    }
}

pub fn fixture_bills() -> Vec<BillRecord> {
    vec![
        BillRecord {
            commentary: Some("séminaire billed".to_string()),
            comment_admin: Some("ok".to_string()),
            ..fixture(
                "47qAXb6fIm2zOKkLzMro",
                BillType::Lodging,
                "encore",
                400.0,
                "2004-04-04",
                BillStatus::Pending,
                "preview-facture-free-201801-pdf-1.jpg",
            )
        },
        BillRecord {
            commentary: Some("plop".to_string()),
            comment_admin: Some("en fait non".to_string()),
            vat: None,
            ..fixture(
                "BeKy5Mo4jkmdfPGYpTxZ",
                BillType::Transports,
                "test1",
                100.0,
                "2001-01-01",
                BillStatus::Refused,
                "1592770761.jpeg",
            )
        },
        BillRecord {
            comment_admin: Some("bon bah d'accord".to_string()),
            ..fixture(
                "UIUZtnPQvnbFnB0ozvJh",
                BillType::OnlineServices,
                "test3",
                300.0,
                "2003-03-03",
                BillStatus::Accepted,
                "facture-client-php-exportee-dans-document-pdf-enregistre-sur-disque-dur.png",
            )
        },
        BillRecord {
            commentary: Some("test2".to_string()),
            comment_admin: Some("pas la bonne facture".to_string()),
            ..fixture(
                "qcCK3SzECmaZAGRrHjaC",
                BillType::Restaurants,
                "test2",
                200.0,
                "2002-02-02",
                BillStatus::Refused,
                "preview-facture-free-201801-pdf-1.jpg",
            )
        },
    ]
}
