use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::{Backend, Config};
use crate::controllers::{BillsController, NewBillController};
use crate::models::Session;
use crate::services::{HttpStore, LocalStore, MemoryStore, Store};
use crate::ui::{Document, Modal, Navigator};

/// The pieces every page controller is built from.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub session: Session,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, session: Session) -> Self {
        AppState { store, session }
    }

    pub fn from_config(config: &Config, config_dir: &Path, session: Session) -> Result<Self> {
        let store: Arc<dyn Store> = match config.backend {
            Backend::Http => match &config.api_token {
                Some(token) => Arc::new(HttpStore::with_token(&config.api_url, token.clone())),
                None => Arc::new(HttpStore::new(&config.api_url)),
            },
            Backend::Local => {
                let path = config.database_path(config_dir);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                Arc::new(LocalStore::open(&path)?)
            }
            Backend::Memory => Arc::new(MemoryStore::with_fixtures()),
        };
        info!(backend = ?config.backend, user = %session.email, "store ready");
        Ok(AppState::new(store, session))
    }

    pub fn bills_controller(
        &self,
        navigator: Arc<dyn Navigator>,
        document: Arc<dyn Document>,
        modal: Arc<dyn Modal>,
    ) -> BillsController {
        BillsController::new(
            self.store.clone(),
            navigator,
            document,
            modal,
            self.session.clone(),
        )
    }

    pub fn new_bill_controller(
        &self,
        navigator: Arc<dyn Navigator>,
        document: Arc<dyn Document>,
    ) -> NewBillController {
        NewBillController::new(self.store.clone(), navigator, document, self.session.clone())
    }
}
