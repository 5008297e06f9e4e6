use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info, warn};

use crate::error::StoreError;
use crate::models::{AttachmentUpload, BillStatus, BillType, NewBill, Session, DEFAULT_PCT};
use crate::services::store::{AttachmentPayload, CreatePayload, Store, UpdatePayload};
use crate::ui::dom::{ERROR_MESSAGE, SUBMIT_BUTTON};
use crate::ui::events::{
    FormData, FIELD_AMOUNT, FIELD_COMMENTARY, FIELD_DATE, FIELD_NAME, FIELD_PCT, FIELD_TYPE,
    FIELD_VAT,
};
use crate::ui::{DisplayMode, Document, FileChangeEvent, Navigator, Route, SubmitEvent};
use crate::utils::{is_accepted_attachment, parse_decimal, parse_percent};

/// Controller of the new-bill form.
pub struct NewBillController {
    store: Arc<dyn Store>,
    navigator: Arc<dyn Navigator>,
    document: Arc<dyn Document>,
    session: Session,
    upload: Mutex<Option<AttachmentUpload>>,
    // Bumped on every accepted selection; an upload only lands if it is still the latest.
    generation: AtomicU64,
}

impl NewBillController {
    pub fn new(
        store: Arc<dyn Store>,
        navigator: Arc<dyn Navigator>,
        document: Arc<dyn Document>,
        session: Session,
    ) -> Self {
        NewBillController {
            store,
            navigator,
            document,
            session,
            upload: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn current_upload(&self) -> Option<AttachmentUpload> {
        self.upload_slot().clone()
    }

    /// Validates the selected receipt and uploads it when it is an image.
    ///
    /// Upload failures are logged and leave the previous upload in place.
    pub async fn on_file_changed(&self, event: &mut FileChangeEvent) {
        event.prevent_default();

        let file = match event.file.as_ref() {
            Some(file) if is_accepted_attachment(&file.name) => file.clone(),
            other => {
                warn!(file = ?other.map(|f| f.name.as_str()), "rejected receipt file");
                self.document.set_display(ERROR_MESSAGE, DisplayMode::Block);
                self.document.set_disabled(SUBMIT_BUTTON, true);
                return;
            }
        };

        self.document.set_display(ERROR_MESSAGE, DisplayMode::None);
        self.document.set_disabled(SUBMIT_BUTTON, false);

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let file_name = file.name.clone();
        let payload = CreatePayload::Attachment(AttachmentPayload {
            file,
            email: self.session.email.clone(),
        });

        let created = match self.store.bills().create(payload).await {
            Ok(created) => created,
            Err(err) => {
                error!(error = %err, file = %file_name, "receipt upload failed");
                return;
            }
        };

        let Some(file_url) = created.file_url else {
            error!(key = %created.key, "receipt upload returned no file url");
            return;
        };

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(file = %file_name, "discarding stale receipt upload");
            return;
        }

        debug!(key = %created.key, file = %file_name, "receipt uploaded");
        *self.upload_slot() = Some(AttachmentUpload {
            file_url,
            file_name,
            key: created.key,
        });
    }

    /// Persists the bill described by the form, then returns to the bills page.
    pub async fn on_form_submitted(&self, event: &mut SubmitEvent) -> Result<(), StoreError> {
        event.prevent_default();

        let upload = self.current_upload();
        let bill = self.assemble_bill(&event.form, upload.as_ref());

        let persisted = match upload {
            Some(upload) => self
                .store
                .bills()
                .update(UpdatePayload {
                    selector: upload.key,
                    bill,
                })
                .await
                .map(|record| record.id),
            None => self
                .store
                .bills()
                .create(CreatePayload::Bill(bill))
                .await
                .map(|created| created.key),
        };

        match persisted {
            Ok(id) => {
                info!(bill = %id, "bill submitted");
                self.navigator.navigate(Route::Bills.path());
                Ok(())
            }
            Err(err) => {
                error!(error = %err, status = ?err.status(), "bill submission failed");
                Err(err)
            }
        }
    }

    fn assemble_bill(&self, form: &FormData, upload: Option<&AttachmentUpload>) -> NewBill {
        let bill_type = form
            .value(FIELD_TYPE)
            .and_then(|value| match value.parse::<BillType>() {
                Ok(bill_type) => Some(bill_type),
                Err(err) => {
                    warn!(error = %err, "falling back to default expense type");
                    None
                }
            })
            .unwrap_or_default();

        let amount = form.value(FIELD_AMOUNT).and_then(parse_decimal);
        if amount.is_none() {
            warn!(value = ?form.value(FIELD_AMOUNT), "unreadable amount, submitting 0");
        }

        NewBill {
            email: self.session.email.clone(),
            bill_type,
            name: form.value(FIELD_NAME).unwrap_or_default().to_string(),
            amount: amount.unwrap_or(0.0),
            date: form.value(FIELD_DATE).unwrap_or_default().to_string(),
            vat: form.value(FIELD_VAT).and_then(parse_decimal),
            pct: form
                .value(FIELD_PCT)
                .and_then(parse_percent)
                .unwrap_or(DEFAULT_PCT),
            commentary: form.value(FIELD_COMMENTARY).map(str::to_string),
            file_url: upload.map(|u| u.file_url.clone()),
            file_name: upload.map(|u| u.file_name.clone()),
            status: BillStatus::Pending,
        }
    }

    fn upload_slot(&self) -> MutexGuard<'_, Option<AttachmentUpload>> {
        self.upload
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
