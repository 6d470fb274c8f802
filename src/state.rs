use std::sync::Arc;

use crate::{config::AuthSettings, database::Repository, services::notification_service::Notifier};

/// Shared application state handed to every handler through `web::Data`
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub notifier: Arc<dyn Notifier>,
    pub auth: AuthSettings,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>, notifier: Arc<dyn Notifier>, auth: AuthSettings) -> Self {
        AppState { repo, notifier, auth }
    }

    pub fn repo(&self) -> &dyn Repository {
        self.repo.as_ref()
    }
}
