use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::error::StoreError;
use crate::models::{BillRecord, FormattedBillRow, Session};
use crate::services::store::Store;
use crate::ui::dom::{BILL_URL_ATTRIBUTE, MODAL, MODAL_IMAGE};
use crate::ui::{ClickEvent, Document, Modal, Navigator, Route};
use crate::utils::{format_date, parse_date};

/// Controller of the employee bills page.
pub struct BillsController {
    store: Arc<dyn Store>,
    navigator: Arc<dyn Navigator>,
    document: Arc<dyn Document>,
    modal: Arc<dyn Modal>,
    session: Session,
}

impl BillsController {
    pub fn new(
        store: Arc<dyn Store>,
        navigator: Arc<dyn Navigator>,
        document: Arc<dyn Document>,
        modal: Arc<dyn Modal>,
        session: Session,
    ) -> Self {
        BillsController {
            store,
            navigator,
            document,
            modal,
            session,
        }
    }

    /// Fetches every bill, newest first, formatted for the bills table.
    ///
    /// A bill whose date cannot be formatted keeps its raw date and is sorted
    /// after all dated bills. Store failures are returned unchanged.
    pub async fn fetch_bills(&self) -> Result<Vec<FormattedBillRow>, StoreError> {
        let records = self.store.bills().list().await.map_err(|err| {
            error!(error = %err, status = ?err.status(), "failed to list bills");
            err
        })?;
        debug!(count = records.len(), user = %self.session.email, "fetched bills");

        let mut rows: Vec<_> = records
            .into_iter()
            .map(|record| (parse_date(&record.date), format_row(record)))
            .collect();
        rows.sort_by(|(a, _), (b, _)| b.cmp(a));

        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }

    pub fn on_new_bill_clicked(&self, event: &mut ClickEvent) {
        event.prevent_default();
        self.navigator.navigate(Route::NewBill.path());
    }

    pub fn on_attachment_icon_clicked(&self, event: &mut ClickEvent) {
        match event.target.get_attribute(BILL_URL_ATTRIBUTE) {
            Some(url) if !url.is_empty() => self.document.set_attribute(MODAL_IMAGE, "src", url),
            _ => {
                debug!("attachment icon carries no bill url");
                self.document.remove_attribute(MODAL_IMAGE, "src");
            }
        }
        self.modal.show(MODAL);
    }
}

fn format_row(record: BillRecord) -> FormattedBillRow {
    let date = match format_date(&record.date) {
        Ok(display) => display,
        Err(err) => {
            warn!(error = %err, bill = %record.id, "keeping unformatted date");
            record.date.clone()
        }
    };

    FormattedBillRow {
        status_label: record.status.label().to_string(),
        raw_date: record.date,
        date,
        id: record.id,
        email: record.email,
        bill_type: record.bill_type,
        name: record.name,
        amount: record.amount,
        vat: record.vat,
        pct: record.pct,
        commentary: record.commentary,
        file_url: record.file_url,
        file_name: record.file_name,
        status: record.status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BillStatus, BillType};
    use crate::services::memory::{fixture_bills, MemoryStore};
    use crate::ui::dom::{EYE_ICON, MODAL_SHOWN_CLASS, NEW_BILL_BUTTON};
    use crate::ui::{DocumentModal, EventTarget, HeadlessDocument};
    use std::sync::Mutex;

    struct Harness {
        controller: BillsController,
        store: Arc<MemoryStore>,
        document: Arc<HeadlessDocument>,
        visited: Arc<Mutex<Vec<String>>>,
    }

    fn harness(store: MemoryStore) -> Harness {
        let store = Arc::new(store);
        let document = Arc::new(HeadlessDocument::bills_page());
        let visited = Arc::new(Mutex::new(Vec::new()));
        let log = visited.clone();
        let navigator = move |path: &str| log.lock().unwrap().push(path.to_string());
        let controller = BillsController::new(
            store.clone(),
            Arc::new(navigator),
            document.clone(),
            Arc::new(DocumentModal::new(document.clone())),
            Session::employee("a@a"),
        );
        Harness {
            controller,
            store,
            document,
            visited,
        }
    }

    fn bill(id: &str, date: &str) -> BillRecord {
        BillRecord {
            id: id.to_string(),
            date: date.to_string(),
            ..fixture_bills().remove(0)
        }
    }

    #[tokio::test]
    async fn fixtures_are_ordered_newest_first() {
        let h = harness(MemoryStore::with_fixtures());
        let rows = h.controller.fetch_bills().await.unwrap();
        let dates: Vec<&str> = rows.iter().map(|r| r.raw_date.as_str()).collect();
        assert_eq!(dates, vec!["2004-04-04", "2003-03-03", "2002-02-02", "2001-01-01"]);
        assert_eq!(rows[0].date, "4 Avr. 04");
        assert_eq!(rows[0].status_label, "En attente");
        assert_eq!(h.store.list_calls(), 1);
    }

    #[tokio::test]
    async fn equal_dates_keep_collection_order() {
        let h = harness(MemoryStore::with_bills(vec![
            bill("first", "2021-02-10"),
            bill("newest", "2021-03-05"),
            bill("second", "2021-02-10"),
            bill("third", "2021-02-10"),
        ]));
        let ids: Vec<String> = h
            .controller
            .fetch_bills()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["newest", "first", "second", "third"]);
    }

    #[tokio::test]
    async fn unparsable_dates_are_kept_raw_and_sorted_last() {
        let h = harness(MemoryStore::with_bills(vec![
            bill("broken", "not-a-date"),
            bill("old", "2020-01-01"),
            bill("empty", ""),
            bill("new", "2021-01-01"),
        ]));
        let rows = h.controller.fetch_bills().await.unwrap();
        assert_eq!(rows.len(), 4);

        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "broken", "empty"]);
        assert_eq!(rows[2].date, "not-a-date");
        assert_eq!(rows[2].raw_date, "not-a-date");
    }

    #[tokio::test]
    async fn status_pills_are_labeled() {
        let mut refused = bill("r", "2021-01-01");
        refused.status = BillStatus::Refused;
        let mut accepted = bill("a", "2021-01-02");
        accepted.status = BillStatus::Accepted;
        accepted.bill_type = BillType::Equipment;

        let h = harness(MemoryStore::with_bills(vec![refused, accepted]));
        let rows = h.controller.fetch_bills().await.unwrap();
        assert_eq!(rows[0].status_label, "Accepté");
        assert_eq!(rows[0].bill_type, BillType::Equipment);
        assert_eq!(rows[1].status_label, "Refused");
    }

    #[tokio::test]
    async fn store_rejection_is_returned_unchanged() {
        let h = harness(MemoryStore::with_fixtures());
        h.store.fail_next_list(StoreError::http(500, "Erreur 500"));

        let err = h.controller.fetch_bills().await.unwrap_err();
        assert_eq!(err, StoreError::http(500, "Erreur 500"));
        assert_eq!(h.store.list_calls(), 1);
    }

    #[tokio::test]
    async fn empty_collection_yields_no_rows() {
        let h = harness(MemoryStore::new());
        assert!(h.controller.fetch_bills().await.unwrap().is_empty());
    }

    #[test]
    fn new_bill_button_navigates_to_form() {
        let h = harness(MemoryStore::new());
        let mut event = ClickEvent::on(EventTarget::with_id(NEW_BILL_BUTTON));
        h.controller.on_new_bill_clicked(&mut event);
        h.controller.on_new_bill_clicked(&mut event);

        assert!(event.default_prevented());
        assert_eq!(
            *h.visited.lock().unwrap(),
            vec!["#employee/bill/new".to_string(), "#employee/bill/new".to_string()]
        );
    }

    #[test]
    fn eye_icon_opens_modal_with_receipt() {
        let h = harness(MemoryStore::new());
        let url = "https://test.storage.tld/receipt.jpg";
        let mut event = ClickEvent::on(
            EventTarget::with_id(EYE_ICON).attribute(BILL_URL_ATTRIBUTE, url),
        );
        h.controller.on_attachment_icon_clicked(&mut event);

        assert_eq!(h.document.attribute(MODAL_IMAGE, "src").as_deref(), Some(url));
        assert!(h.document.has_class(MODAL, MODAL_SHOWN_CLASS));
    }

    #[test]
    fn eye_icon_without_url_opens_empty_modal() {
        let h = harness(MemoryStore::new());
        h.document.set_attribute(MODAL_IMAGE, "src", "https://previous/receipt.png");

        let mut event = ClickEvent::on(EventTarget::with_id(EYE_ICON));
        h.controller.on_attachment_icon_clicked(&mut event);

        assert_eq!(h.document.attribute(MODAL_IMAGE, "src"), None);
        assert!(h.document.has_class(MODAL, MODAL_SHOWN_CLASS));
    }
}
