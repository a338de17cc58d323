use axum::extract::{Json, Query, State};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::entities::movement::ResourceType;
use crate::errors::ServiceError;
use crate::services::reports::{
    DashboardSummary, MaintenanceReport, MovementFilter, MovementsReport, StockReport,
    UtilizationReport,
};
use crate::{ApiResponse, AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct MovementReportQuery {
    pub obra_id: Option<Uuid>,
    pub tipo_recurso: Option<ResourceType>,
    pub mes: Option<u32>,
    pub ano: Option<i32>,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DateRangeQuery {
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
}

impl From<MovementReportQuery> for MovementFilter {
    fn from(q: MovementReportQuery) -> Self {
        MovementFilter {
            obra_id: q.obra_id,
            tipo_recurso: q.tipo_recurso,
            mes: q.mes,
            ano: q.ano,
            data_inicio: q.data_inicio,
            data_fim: q.data_fim,
        }
    }
}

/// Movement history with totals per kind and resource type
#[utoipa::path(
    get,
    path = "/api/v1/relatorios/movimentos",
    params(MovementReportQuery),
    responses(
        (status = 200, description = "Movements report", body = ApiResponse<MovementsReport>)
    ),
    security(("bearer_auth" = [])),
    tag = "relatorios"
)]
pub async fn movements_report(
    State(state): State<AppState>,
    Query(query): Query<MovementReportQuery>,
) -> Result<Json<ApiResponse<MovementsReport>>, ServiceError> {
    let report = state
        .services
        .reports
        .generate_movements_report(query.into())
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Per-material balances and entrada/saida totals
#[utoipa::path(
    get,
    path = "/api/v1/relatorios/stock",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Stock report", body = ApiResponse<StockReport>)
    ),
    security(("bearer_auth" = [])),
    tag = "relatorios"
)]
pub async fn stock_report(
    State(state): State<AppState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<ApiResponse<StockReport>>, ServiceError> {
    let report = state
        .services
        .reports
        .generate_stock_report(query.data_inicio, query.data_fim)
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Every current alert: vehicle deadlines (dates and km) and low stock
#[utoipa::path(
    get,
    path = "/api/v1/relatorios/alertas",
    responses(
        (status = 200, description = "Active alerts", body = ApiResponse<Vec<crate::services::alerts::Alert>>)
    ),
    security(("bearer_auth" = [])),
    tag = "relatorios"
)]
pub async fn alerts_report(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<crate::services::alerts::Alert>>>, ServiceError> {
    let alerts = state.services.reports.generate_alerts().await?;
    Ok(Json(ApiResponse::success(alerts)))
}

#[utoipa::path(
    get,
    path = "/api/v1/relatorios/manutencoes",
    responses(
        (status = 200, description = "Maintenance report", body = ApiResponse<MaintenanceReport>)
    ),
    security(("bearer_auth" = [])),
    tag = "relatorios"
)]
pub async fn maintenance_report(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<MaintenanceReport>>, ServiceError> {
    let report = state.services.reports.generate_maintenance_report().await?;
    Ok(Json(ApiResponse::success(report)))
}

#[utoipa::path(
    get,
    path = "/api/v1/relatorios/utilizacao",
    params(MovementReportQuery),
    responses(
        (status = 200, description = "Utilization report", body = ApiResponse<UtilizationReport>)
    ),
    security(("bearer_auth" = [])),
    tag = "relatorios"
)]
pub async fn utilization_report(
    State(state): State<AppState>,
    Query(query): Query<MovementReportQuery>,
) -> Result<Json<ApiResponse<UtilizationReport>>, ServiceError> {
    let report = state
        .services
        .reports
        .generate_utilization_report(query.into())
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Assigned resources and material consumption for one site
#[utoipa::path(
    get,
    path = "/api/v1/relatorios/obra/{id}",
    params(("id" = Uuid, Path, description = "Site id")),
    responses(
        (status = 200, description = "Site report", body = ApiResponse<crate::services::reports::SiteReport>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "relatorios"
)]
pub async fn site_report(
    State(state): State<AppState>,
    axum::extract::Path(id): axum::extract::Path<Uuid>,
) -> Result<Json<ApiResponse<crate::services::reports::SiteReport>>, ServiceError> {
    let report = state.services.reports.generate_site_report(id).await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Dashboard counts, today's activity and the full alert sweep
#[utoipa::path(
    get,
    path = "/api/v1/summary",
    responses(
        (status = 200, description = "Dashboard summary", body = ApiResponse<DashboardSummary>)
    ),
    security(("bearer_auth" = [])),
    tag = "relatorios"
)]
pub async fn summary(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DashboardSummary>>, ServiceError> {
    let report = state.services.reports.generate_summary().await?;
    Ok(Json(ApiResponse::success(report)))
}
