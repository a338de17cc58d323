pub mod auth;
pub mod equipment;
pub mod materials;
pub mod movements;
pub mod reports;
pub mod sites;
pub mod vehicles;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

pub use crate::AppState;

/// Services layer backing the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub ledger: Arc<crate::services::ledger::LedgerService>,
    pub registry: Arc<crate::services::registry::RegistryService>,
    pub reports: Arc<crate::services::reports::ReportService>,
    pub auth: Arc<crate::auth::AuthService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        auth_service: Arc<crate::auth::AuthService>,
    ) -> Self {
        Self {
            ledger: Arc::new(crate::services::ledger::LedgerService::new(
                db_pool.clone(),
                event_sender,
            )),
            registry: Arc::new(crate::services::registry::RegistryService::new(
                db_pool.clone(),
            )),
            reports: Arc::new(crate::services::reports::ReportService::new(db_pool)),
            auth: auth_service,
        }
    }
}
