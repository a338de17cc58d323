//! Armazem API Library
//!
//! Asset and stock ledger for a construction company warehouse: a registry
//! of sites, equipment, vehicles and materials, an append-only movement
//! ledger as the single mutation path for locations and stock, expiry and
//! low-stock alerts, and reports aggregated from the ledger.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{extract::State, middleware, response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

impl AppState {
    /// Resolves page/limit query values against the configured defaults
    /// and the hard per-page cap.
    pub fn page_params(&self, page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
        let page = page.unwrap_or(1).max(1);
        let limit = limit
            .unwrap_or(self.config.api_default_page_size as u64)
            .clamp(1, self.config.api_max_page_size as u64);
        (page, limit)
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let per_page = limit.max(1);
        Self {
            items,
            total,
            page,
            limit,
            total_pages: (total + per_page - 1) / per_page,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// All routes under `/api/v1`. Everything except `/auth/*` requires a
/// bearer token; the middleware reads the auth service out of the state.
pub fn api_v1_routes(auth_service: Arc<auth::AuthService>) -> Router<AppState> {
    let auth_routes = Router::new()
        .route("/auth/register", axum::routing::post(handlers::auth::register))
        .route("/auth/login", axum::routing::post(handlers::auth::login))
        .route("/auth/refresh", axum::routing::post(handlers::auth::refresh));

    let protected = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        // Registry
        .route(
            "/obras",
            get(handlers::sites::list_sites).post(handlers::sites::create_site),
        )
        .route(
            "/obras/:id",
            get(handlers::sites::get_site)
                .put(handlers::sites::update_site)
                .delete(handlers::sites::delete_site),
        )
        .route("/obras/:id/recursos", get(handlers::sites::get_site_resources))
        .route(
            "/equipamentos",
            get(handlers::equipment::list_equipment).post(handlers::equipment::create_equipment),
        )
        .route(
            "/equipamentos/:id",
            get(handlers::equipment::get_equipment)
                .put(handlers::equipment::update_equipment)
                .delete(handlers::equipment::delete_equipment),
        )
        .route(
            "/equipamentos/:id/manutencao",
            axum::routing::patch(handlers::equipment::set_equipment_maintenance),
        )
        .route(
            "/viaturas",
            get(handlers::vehicles::list_vehicles).post(handlers::vehicles::create_vehicle),
        )
        .route(
            "/viaturas/:id",
            get(handlers::vehicles::get_vehicle)
                .put(handlers::vehicles::update_vehicle)
                .delete(handlers::vehicles::delete_vehicle),
        )
        .route(
            "/viaturas/:id/manutencao",
            axum::routing::patch(handlers::vehicles::set_vehicle_maintenance),
        )
        .route(
            "/viaturas/:id/viagens",
            axum::routing::post(handlers::vehicles::record_trip),
        )
        .route(
            "/materiais",
            get(handlers::materials::list_materials).post(handlers::materials::create_material),
        )
        .route(
            "/materiais/:id",
            get(handlers::materials::get_material)
                .put(handlers::materials::update_material)
                .delete(handlers::materials::delete_material),
        )
        // Ledger
        .route(
            "/movimentos/atribuir",
            axum::routing::post(handlers::movements::assign_resource),
        )
        .route(
            "/movimentos/devolver",
            axum::routing::post(handlers::movements::return_resource),
        )
        .route(
            "/movimentos/stock",
            get(handlers::movements::list_stock_movements)
                .post(handlers::movements::move_stock),
        )
        .route(
            "/movimentos/viaturas",
            get(handlers::movements::list_vehicle_trips),
        )
        // Reports
        .route(
            "/relatorios/movimentos",
            get(handlers::reports::movements_report),
        )
        .route("/relatorios/stock", get(handlers::reports::stock_report))
        .route("/relatorios/alertas", get(handlers::reports::alerts_report))
        .route(
            "/relatorios/manutencoes",
            get(handlers::reports::maintenance_report),
        )
        .route(
            "/relatorios/utilizacao",
            get(handlers::reports::utilization_report),
        )
        .route("/relatorios/obra/:id", get(handlers::reports::site_report))
        .route("/summary", get(handlers::reports::summary))
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            auth::auth_middleware,
        ));

    auth_routes.merge(protected)
}

/// Liveness probe. Also pings the database so a wedged pool shows up.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db_ok = db::check_connection(&state.db).await.is_ok();
    Json(json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "database": db_ok,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[test]
    fn pagination_rounds_total_pages_up() {
        let page: PaginatedResponse<u8> = PaginatedResponse::new(vec![], 41, 1, 20);
        assert_eq!(page.total_pages, 3);
    }
}
