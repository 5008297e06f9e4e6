//! HttpStore against an in-process axum server on 127.0.0.1:0.

use std::sync::{Arc, Mutex};

use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use billed::controllers::{BillsController, NewBillController};
use billed::models::{BillRecord, BillStatus, NewBill, SelectedFile, Session};
use billed::services::{HttpStore, Store};
use billed::ui::events::{FIELD_AMOUNT, FIELD_DATE, FIELD_NAME, FIELD_TYPE, FIELD_VAT};
use billed::ui::{
    DocumentModal, FileChangeEvent, FormData, HeadlessDocument, Navigator, SubmitEvent,
};
use billed::StoreError;

#[derive(Debug, Clone)]
struct FormPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
struct Seen {
    method: String,
    path: String,
    authorization: Option<String>,
    parts: Vec<FormPart>,
    bill: Option<NewBill>,
}

type Log = Arc<Mutex<Vec<Seen>>>;

fn seen(method: &str, path: String, headers: &HeaderMap) -> Seen {
    Seen {
        method: method.to_string(),
        path,
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        ..Seen::default()
    }
}

async fn list_bills(State(log): State<Log>, headers: HeaderMap) -> Json<Value> {
    log.lock()
        .unwrap()
        .push(seen("GET", "/bills".to_string(), &headers));
    Json(json!([
        {
            "id": "1", "email": "a@a", "type": "Transports", "name": "train",
            "amount": 40, "date": "2021-01-01", "vat": "", "pct": 20,
            "status": "pending"
        },
        {
            "id": "2", "email": "a@a", "type": "Hôtel et logement", "name": "hotel",
            "amount": 120, "date": "2021-03-05", "vat": "20", "pct": 20,
            "status": "refused"
        }
    ]))
}

async fn create_bill(State(log): State<Log>, request: Request) -> Json<Value> {
    let mut entry = seen("POST", "/bills".to_string(), request.headers());
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let response = if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &()).await.unwrap();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.unwrap().to_vec();
            entry.parts.push(FormPart {
                name,
                file_name,
                content_type,
                bytes,
            });
        }
        json!({ "fileUrl": "https://storage.test.tld/ticket.png", "key": "key-1" })
    } else {
        let Json(bill) = Json::<NewBill>::from_request(request, &()).await.unwrap();
        entry.bill = Some(bill);
        json!({ "key": "bill-1" })
    };

    log.lock().unwrap().push(entry);
    Json(response)
}

async fn update_bill(
    State(log): State<Log>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(bill): Json<NewBill>,
) -> Json<BillRecord> {
    let mut entry = seen("PATCH", format!("/bills/{key}"), &headers);
    entry.bill = Some(bill.clone());
    log.lock().unwrap().push(entry);
    Json(bill.into_record(key))
}

async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn spawn_api() -> (String, Log) {
    let log = Log::default();
    let app = Router::new()
        .route("/bills", get(list_bills).post(create_bill))
        .route("/bills/{key}", patch(update_bill))
        .with_state(log.clone());
    (spawn_server(app).await, log)
}

async fn spawn_failing_api(status: StatusCode, body: &'static str) -> String {
    let app = Router::new().route("/bills", get(move || async move { (status, body) }));
    spawn_server(app).await
}

fn navigator() -> (Arc<dyn Navigator>, Arc<Mutex<Vec<String>>>) {
    let visited = Arc::new(Mutex::new(Vec::new()));
    let log = visited.clone();
    let navigator = move |path: &str| log.lock().unwrap().push(path.to_string());
    (Arc::new(navigator), visited)
}

fn bills_page(store: HttpStore) -> BillsController {
    let document = Arc::new(HeadlessDocument::bills_page());
    BillsController::new(
        Arc::new(store),
        navigator().0,
        document.clone(),
        Arc::new(DocumentModal::new(document)),
        Session::employee("a@a"),
    )
}

#[tokio::test]
async fn api_404_reaches_bills_page_as_http_error() {
    let url = spawn_failing_api(StatusCode::NOT_FOUND, r#"{"message":"Erreur 404"}"#).await;
    let err = bills_page(HttpStore::new(&url))
        .fetch_bills()
        .await
        .unwrap_err();

    assert_eq!(err, StoreError::http(404, "Erreur 404"));
    assert_eq!(err.to_string(), "Erreur 404: Erreur 404");
}

#[tokio::test]
async fn api_500_with_text_body_keeps_status_and_text() {
    let url = spawn_failing_api(StatusCode::INTERNAL_SERVER_ERROR, "database offline").await;
    let err = bills_page(HttpStore::new(&url))
        .fetch_bills()
        .await
        .unwrap_err();

    assert_eq!(err, StoreError::http(500, "database offline"));
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn listed_bills_are_sorted_and_labeled() {
    let (url, log) = spawn_api().await;
    let rows = bills_page(HttpStore::new(&url)).fetch_bills().await.unwrap();

    let summary: Vec<(&str, &str, &str)> = rows
        .iter()
        .map(|r| (r.id.as_str(), r.date.as_str(), r.status_label.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![("2", "5 Mar. 21", "Refused"), ("1", "1 Jan. 21", "En attente")]
    );
    assert_eq!(rows[0].vat, Some(20.0));
    assert_eq!(rows[1].vat, None);

    let requests = log.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].authorization, None);
}

#[tokio::test]
async fn upload_and_submit_go_through_multipart_and_patch() {
    let (url, log) = spawn_api().await;
    let store: Arc<dyn Store> = Arc::new(HttpStore::with_token(&url, "secret".to_string()));
    let (navigator, visited) = navigator();
    let controller = NewBillController::new(
        store,
        navigator,
        Arc::new(HeadlessDocument::new_bill_page()),
        Session::employee("employee@test.tld"),
    );

    controller
        .on_file_changed(&mut FileChangeEvent::selected(
            SelectedFile::new("ticket.png", vec![0x89, 0x50]).with_content_type("image/png"),
        ))
        .await;
    let upload = controller.current_upload().unwrap();
    assert_eq!(upload.key, "key-1");
    assert_eq!(upload.file_url, "https://storage.test.tld/ticket.png");

    let form = FormData::new()
        .field(FIELD_TYPE, "Transports")
        .field(FIELD_NAME, "taxi")
        .field(FIELD_AMOUNT, "32,40")
        .field(FIELD_DATE, "2021-06-01")
        .field(FIELD_VAT, "");
    controller
        .on_form_submitted(&mut SubmitEvent::with_form(form))
        .await
        .unwrap();
    assert_eq!(*visited.lock().unwrap(), vec!["#employee/bills".to_string()]);

    let requests = log.lock().unwrap();
    assert_eq!(requests.len(), 2);

    let post = &requests[0];
    assert_eq!((post.method.as_str(), post.path.as_str()), ("POST", "/bills"));
    assert_eq!(post.authorization.as_deref(), Some("Bearer secret"));
    assert!(post.bill.is_none());
    let file = post.parts.iter().find(|p| p.name == "file").unwrap();
    assert_eq!(file.file_name.as_deref(), Some("ticket.png"));
    assert_eq!(file.content_type.as_deref(), Some("image/png"));
    assert_eq!(file.bytes, vec![0x89, 0x50]);
    let email = post.parts.iter().find(|p| p.name == "email").unwrap();
    assert_eq!(email.bytes, b"employee@test.tld".to_vec());

    let update = &requests[1];
    assert_eq!(
        (update.method.as_str(), update.path.as_str()),
        ("PATCH", "/bills/key-1")
    );
    assert_eq!(update.authorization.as_deref(), Some("Bearer secret"));
    let bill = update.bill.as_ref().unwrap();
    assert_eq!(bill.status, BillStatus::Pending);
    assert_eq!(bill.amount, 32.4);
    assert_eq!(bill.vat, None);
    assert_eq!(bill.file_name.as_deref(), Some("ticket.png"));
}

#[tokio::test]
async fn submit_without_upload_posts_json_bill() {
    let (url, log) = spawn_api().await;
    let (navigator, _) = navigator();
    let controller = NewBillController::new(
        Arc::new(HttpStore::new(&url)),
        navigator,
        Arc::new(HeadlessDocument::new_bill_page()),
        Session::employee("a@a"),
    );

    let form = FormData::new()
        .field(FIELD_NAME, "lunch")
        .field(FIELD_AMOUNT, "12")
        .field(FIELD_DATE, "2021-06-02");
    controller
        .on_form_submitted(&mut SubmitEvent::with_form(form))
        .await
        .unwrap();

    let requests = log.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert!(requests[0].parts.is_empty());
    let bill = requests[0].bill.as_ref().unwrap();
    assert_eq!(bill.name, "lunch");
    assert_eq!(bill.email, "a@a");
    assert_eq!(bill.file_url, None);
}
