//! Application state shared across request handlers.

use std::sync::Arc;

use crate::repository::Repositories;
use crate::service::EvacuationService;

/// Shared application state.
///
/// This is passed to all request handlers via Axum's state extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    service: EvacuationService,
}

impl AppState {
    pub fn new(repos: Repositories) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                service: EvacuationService::new(repos),
            }),
        }
    }

    pub fn service(&self) -> &EvacuationService {
        &self.inner.service
    }
}
