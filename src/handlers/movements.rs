use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::movement::{self, ResourceType};
use crate::entities::stock_movement::{self, StockDirection};
use crate::entities::vehicle_trip;
use crate::errors::ServiceError;
use crate::services::ledger::{AssignResourceCommand, MoveStockCommand, ReturnResourceCommand};
use crate::{ApiResponse, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignRequest {
    pub tipo_recurso: ResourceType,
    pub recurso_id: Uuid,
    pub obra_id: Uuid,
    pub actor: Option<String>,
    pub notas: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReturnRequest {
    pub tipo_recurso: ResourceType,
    pub recurso_id: Uuid,
    pub actor: Option<String>,
    pub notas: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StockMoveRequest {
    pub material_id: Uuid,
    pub direcao: StockDirection,
    pub quantidade: Decimal,
    pub obra_id: Option<Uuid>,
    pub actor: Option<String>,
    pub notas: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockMoveResponse {
    pub movimento: stock_movement::Model,
    pub stock_atual: Decimal,
    pub stock_minimo: Decimal,
    pub abaixo_minimo: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct StockMovementListQuery {
    pub material_id: Option<Uuid>,
    pub obra_id: Option<Uuid>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct VehicleTripListQuery {
    pub viatura_id: Option<Uuid>,
    pub obra_id: Option<Uuid>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

// The actor recorded on a movement defaults to the authenticated user.
fn resolve_actor(explicit: Option<String>, auth_user: &AuthUser) -> Option<String> {
    explicit.or_else(|| auth_user.name.clone()).or_else(|| auth_user.email.clone())
}

/// Assign a warehouse resource to an active site
#[utoipa::path(
    post,
    path = "/api/v1/movimentos/atribuir",
    request_body = AssignRequest,
    responses(
        (status = 201, description = "Resource assigned", body = ApiResponse<movement::Model>),
        (status = 400, description = "Resource unavailable or site not active", body = crate::errors::ErrorResponse),
        (status = 404, description = "Resource or site not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "movimentos"
)]
pub async fn assign_resource(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<AssignRequest>,
) -> Result<(StatusCode, Json<ApiResponse<movement::Model>>), ServiceError> {
    let actor = resolve_actor(request.actor, &auth_user);
    let created = state
        .services
        .ledger
        .assign(AssignResourceCommand {
            resource_type: request.tipo_recurso,
            resource_id: request.recurso_id,
            obra_id: request.obra_id,
            actor,
            notas: request.notas,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// Return an assigned resource to the warehouse
#[utoipa::path(
    post,
    path = "/api/v1/movimentos/devolver",
    request_body = ReturnRequest,
    responses(
        (status = 201, description = "Resource returned", body = ApiResponse<movement::Model>),
        (status = 400, description = "Resource not assigned", body = crate::errors::ErrorResponse),
        (status = 404, description = "Resource not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "movimentos"
)]
pub async fn return_resource(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<ReturnRequest>,
) -> Result<(StatusCode, Json<ApiResponse<movement::Model>>), ServiceError> {
    let actor = resolve_actor(request.actor, &auth_user);
    let created = state
        .services
        .ledger
        .return_resource(ReturnResourceCommand {
            resource_type: request.tipo_recurso,
            resource_id: request.recurso_id,
            actor,
            notas: request.notas,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// Move material stock in or out of the warehouse
#[utoipa::path(
    post,
    path = "/api/v1/movimentos/stock",
    request_body = StockMoveRequest,
    responses(
        (status = 201, description = "Stock moved", body = ApiResponse<StockMoveResponse>),
        (status = 400, description = "Invalid quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Material not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "movimentos"
)]
pub async fn move_stock(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<StockMoveRequest>,
) -> Result<(StatusCode, Json<ApiResponse<StockMoveResponse>>), ServiceError> {
    let actor = resolve_actor(request.actor, &auth_user);
    let result = state
        .services
        .ledger
        .move_stock(MoveStockCommand {
            material_id: request.material_id,
            direcao: request.direcao,
            quantidade: request.quantidade,
            obra_id: request.obra_id,
            actor,
            notas: request.notas,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(StockMoveResponse {
            movimento: result.movement,
            stock_atual: result.stock_atual,
            stock_minimo: result.stock_minimo,
            abaixo_minimo: result.below_minimum,
        })),
    ))
}

/// Stock ledger history, newest first
#[utoipa::path(
    get,
    path = "/api/v1/movimentos/stock",
    params(StockMovementListQuery),
    responses(
        (status = 200, description = "Stock movement list", body = ApiResponse<PaginatedResponse<stock_movement::Model>>)
    ),
    security(("bearer_auth" = [])),
    tag = "movimentos"
)]
pub async fn list_stock_movements(
    State(state): State<AppState>,
    Query(query): Query<StockMovementListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<stock_movement::Model>>>, ServiceError> {
    let (page, limit) = state.page_params(query.page, query.limit);
    let (items, total) = state
        .services
        .reports
        .list_stock_movements(query.material_id, query.obra_id, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

/// Recorded vehicle trips, newest first
#[utoipa::path(
    get,
    path = "/api/v1/movimentos/viaturas",
    params(VehicleTripListQuery),
    responses(
        (status = 200, description = "Vehicle trip list", body = ApiResponse<PaginatedResponse<vehicle_trip::Model>>)
    ),
    security(("bearer_auth" = [])),
    tag = "movimentos"
)]
pub async fn list_vehicle_trips(
    State(state): State<AppState>,
    Query(query): Query<VehicleTripListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<vehicle_trip::Model>>>, ServiceError> {
    let (page, limit) = state.page_params(query.page, query.limit);
    let (items, total) = state
        .services
        .reports
        .list_vehicle_trips(query.viatura_id, query.obra_id, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}
