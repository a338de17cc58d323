use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::movement::ResourceType;
use crate::entities::{vehicle, vehicle_trip};
use crate::errors::ServiceError;
use crate::handlers::equipment::MaintenanceRequest;
use crate::services::ledger::{RecordTripCommand, SetMaintenanceCommand};
use crate::services::registry::{CreateVehicle, ResourceFilter, UpdateVehicle};
use crate::{ApiResponse, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, IntoParams)]
pub struct VehicleListQuery {
    pub ativo: Option<bool>,
    pub obra_id: Option<Uuid>,
    pub em_manutencao: Option<bool>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordTripRequest {
    pub condutor: String,
    pub km_inicial: i64,
    pub km_final: i64,
    pub obra_id: Option<Uuid>,
    pub notas: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/viaturas",
    params(VehicleListQuery),
    responses(
        (status = 200, description = "Vehicle list", body = ApiResponse<PaginatedResponse<vehicle::Model>>)
    ),
    security(("bearer_auth" = [])),
    tag = "viaturas"
)]
pub async fn list_vehicles(
    State(state): State<AppState>,
    Query(query): Query<VehicleListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<vehicle::Model>>>, ServiceError> {
    let (page, limit) = state.page_params(query.page, query.limit);
    let filter = ResourceFilter {
        ativo: query.ativo,
        obra_id: query.obra_id,
        em_manutencao: query.em_manutencao,
    };
    let (items, total) = state
        .services
        .registry
        .list_vehicles(filter, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/viaturas",
    request_body = CreateVehicle,
    responses(
        (status = 201, description = "Vehicle created", body = ApiResponse<vehicle::Model>),
        (status = 409, description = "Duplicate matricula", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "viaturas"
)]
pub async fn create_vehicle(
    State(state): State<AppState>,
    Json(request): Json<CreateVehicle>,
) -> Result<(StatusCode, Json<ApiResponse<vehicle::Model>>), ServiceError> {
    let created = state.services.registry.create_vehicle(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

#[utoipa::path(
    get,
    path = "/api/v1/viaturas/{id}",
    params(("id" = Uuid, Path, description = "Vehicle id")),
    responses(
        (status = 200, description = "Vehicle", body = ApiResponse<vehicle::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "viaturas"
)]
pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<vehicle::Model>>, ServiceError> {
    let item = state.services.registry.get_vehicle(id).await?;
    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    put,
    path = "/api/v1/viaturas/{id}",
    params(("id" = Uuid, Path, description = "Vehicle id")),
    request_body = UpdateVehicle,
    responses(
        (status = 200, description = "Vehicle updated", body = ApiResponse<vehicle::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "viaturas"
)]
pub async fn update_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicle>,
) -> Result<Json<ApiResponse<vehicle::Model>>, ServiceError> {
    let updated = state.services.registry.update_vehicle(id, request).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Soft delete. Refused while the vehicle is assigned to a site.
#[utoipa::path(
    delete,
    path = "/api/v1/viaturas/{id}",
    params(("id" = Uuid, Path, description = "Vehicle id")),
    responses(
        (status = 200, description = "Vehicle deactivated", body = ApiResponse<serde_json::Value>),
        (status = 409, description = "Still assigned to a site", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "viaturas"
)]
pub async fn delete_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    state.services.registry.delete_vehicle(id).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": id }),
    )))
}

#[utoipa::path(
    patch,
    path = "/api/v1/viaturas/{id}/manutencao",
    params(("id" = Uuid, Path, description = "Vehicle id")),
    request_body = MaintenanceRequest,
    responses(
        (status = 200, description = "Maintenance flag updated", body = ApiResponse<vehicle::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "viaturas"
)]
pub async fn set_vehicle_maintenance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MaintenanceRequest>,
) -> Result<Json<ApiResponse<vehicle::Model>>, ServiceError> {
    state
        .services
        .ledger
        .set_maintenance(SetMaintenanceCommand {
            resource_type: ResourceType::Viatura,
            resource_id: id,
            em_manutencao: request.em_manutencao,
            motivo: request.motivo,
        })
        .await?;
    let item = state.services.registry.get_vehicle(id).await?;
    Ok(Json(ApiResponse::success(item)))
}

/// Log a trip. Advances the odometer when km_final is ahead of it.
#[utoipa::path(
    post,
    path = "/api/v1/viaturas/{id}/viagens",
    params(("id" = Uuid, Path, description = "Vehicle id")),
    request_body = RecordTripRequest,
    responses(
        (status = 201, description = "Trip recorded", body = ApiResponse<vehicle_trip::Model>),
        (status = 400, description = "Invalid kilometres", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "viaturas"
)]
pub async fn record_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordTripRequest>,
) -> Result<(StatusCode, Json<ApiResponse<vehicle_trip::Model>>), ServiceError> {
    let trip = state
        .services
        .ledger
        .record_trip(RecordTripCommand {
            vehicle_id: id,
            condutor: request.condutor,
            km_inicial: request.km_inicial,
            km_final: request.km_final,
            obra_id: request.obra_id,
            notas: request.notas,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(trip))))
}
