use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::StoreError;
use crate::models::{BillRecord, NewBill};
use crate::services::store::{
    AttachmentPayload, BillsResource, CreatePayload, CreatedBill, Store, UpdatePayload,
};

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Store backed by the billing HTTP API.
pub struct HttpStore {
    bills: HttpBills,
}

impl HttpStore {
    pub fn new(base_url: &str) -> Self {
        HttpStore {
            bills: HttpBills {
                base_url: base_url.trim_end_matches('/').to_string(),
                client: Client::new(),
                token: None,
            },
        }
    }

    pub fn with_token(base_url: &str, token: String) -> Self {
        let mut store = Self::new(base_url);
        store.bills.token = Some(token);
        store
    }
}

impl Store for HttpStore {
    fn bills(&self) -> &dyn BillsResource {
        &self.bills
    }
}

struct HttpBills {
    base_url: String,
    client: Client,
    token: Option<String>,
}

impl HttpBills {
    fn url(&self, path: &str) -> String {
        format!("{}/bills{}", self.base_url, path)
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, StoreError> {
        let response = self.with_auth(builder).send().await?;
        handle_response(response).await
    }

    async fn upload(&self, payload: AttachmentPayload) -> Result<CreatedBill, StoreError> {
        debug!(file = %payload.file.name, "uploading attachment");
        let mut part = Part::bytes(payload.file.bytes).file_name(payload.file.name);
        if let Some(content_type) = payload.file.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|e| StoreError::Transport(e.to_string()))?;
        }
        let form = Form::new().part("file", part).text("email", payload.email);
        self.send(self.client.post(self.url("")).multipart(form))
            .await
    }

    async fn create_bill(&self, bill: NewBill) -> Result<CreatedBill, StoreError> {
        self.send(self.client.post(self.url("")).json(&bill)).await
    }
}

#[async_trait]
impl BillsResource for HttpBills {
    async fn list(&self) -> Result<Vec<BillRecord>, StoreError> {
        self.send(self.client.get(self.url(""))).await
    }

    async fn create(&self, payload: CreatePayload) -> Result<CreatedBill, StoreError> {
        match payload {
            CreatePayload::Attachment(attachment) => self.upload(attachment).await,
            CreatePayload::Bill(bill) => self.create_bill(bill).await,
        }
    }

    async fn update(&self, payload: UpdatePayload) -> Result<BillRecord, StoreError> {
        let path = format!("/{}", payload.selector);
        self.send(self.client.patch(self.url(&path)).json(&payload.bill))
            .await
    }
}

async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    Err(StoreError::http(status.as_u16(), error_message(&body, status.as_str())))
}

fn error_message(body: &str, fallback: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(_) if body.trim().is_empty() => fallback.to_string(),
        Err(_) => body.trim().to_string(),
    }
}
