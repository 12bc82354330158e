use std::sync::Arc;

use ventanilla_core::audit::AuditStore;
use ventanilla_core::{Config, EventHub, TurnService};

/// Shared application state
pub struct AppState {
    config: Config,
    service: TurnService,
    audit_store: Arc<dyn AuditStore>,
}

impl AppState {
    pub fn new(config: Config, service: TurnService, audit_store: Arc<dyn AuditStore>) -> Self {
        Self {
            config,
            service,
            audit_store,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn service(&self) -> &TurnService {
        &self.service
    }

    pub fn hub(&self) -> &Arc<EventHub> {
        self.service.hub()
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }
}
