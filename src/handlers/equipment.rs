use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::equipment;
use crate::entities::movement::ResourceType;
use crate::errors::ServiceError;
use crate::services::ledger::SetMaintenanceCommand;
use crate::services::registry::{CreateEquipment, ResourceFilter, UpdateEquipment};
use crate::{ApiResponse, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, IntoParams)]
pub struct EquipmentListQuery {
    pub ativo: Option<bool>,
    pub obra_id: Option<Uuid>,
    pub em_manutencao: Option<bool>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MaintenanceRequest {
    pub em_manutencao: bool,
    pub motivo: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/equipamentos",
    params(EquipmentListQuery),
    responses(
        (status = 200, description = "Equipment list", body = ApiResponse<PaginatedResponse<equipment::Model>>)
    ),
    security(("bearer_auth" = [])),
    tag = "equipamentos"
)]
pub async fn list_equipment(
    State(state): State<AppState>,
    Query(query): Query<EquipmentListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<equipment::Model>>>, ServiceError> {
    let (page, limit) = state.page_params(query.page, query.limit);
    let filter = ResourceFilter {
        ativo: query.ativo,
        obra_id: query.obra_id,
        em_manutencao: query.em_manutencao,
    };
    let (items, total) = state
        .services
        .registry
        .list_equipment(filter, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/equipamentos",
    request_body = CreateEquipment,
    responses(
        (status = 201, description = "Equipment created", body = ApiResponse<equipment::Model>),
        (status = 409, description = "Duplicate codigo", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "equipamentos"
)]
pub async fn create_equipment(
    State(state): State<AppState>,
    Json(request): Json<CreateEquipment>,
) -> Result<(StatusCode, Json<ApiResponse<equipment::Model>>), ServiceError> {
    let created = state.services.registry.create_equipment(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

#[utoipa::path(
    get,
    path = "/api/v1/equipamentos/{id}",
    params(("id" = Uuid, Path, description = "Equipment id")),
    responses(
        (status = 200, description = "Equipment", body = ApiResponse<equipment::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "equipamentos"
)]
pub async fn get_equipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<equipment::Model>>, ServiceError> {
    let item = state.services.registry.get_equipment(id).await?;
    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    put,
    path = "/api/v1/equipamentos/{id}",
    params(("id" = Uuid, Path, description = "Equipment id")),
    request_body = UpdateEquipment,
    responses(
        (status = 200, description = "Equipment updated", body = ApiResponse<equipment::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "equipamentos"
)]
pub async fn update_equipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateEquipment>,
) -> Result<Json<ApiResponse<equipment::Model>>, ServiceError> {
    let updated = state
        .services
        .registry
        .update_equipment(id, request)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Soft delete. Refused while the equipment is assigned to a site.
#[utoipa::path(
    delete,
    path = "/api/v1/equipamentos/{id}",
    params(("id" = Uuid, Path, description = "Equipment id")),
    responses(
        (status = 200, description = "Equipment deactivated", body = ApiResponse<serde_json::Value>),
        (status = 409, description = "Still assigned to a site", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "equipamentos"
)]
pub async fn delete_equipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    state.services.registry.delete_equipment(id).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": id }),
    )))
}

/// Flip the maintenance flag on an equipment item
#[utoipa::path(
    patch,
    path = "/api/v1/equipamentos/{id}/manutencao",
    params(("id" = Uuid, Path, description = "Equipment id")),
    request_body = MaintenanceRequest,
    responses(
        (status = 200, description = "Maintenance flag updated", body = ApiResponse<equipment::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "equipamentos"
)]
pub async fn set_equipment_maintenance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MaintenanceRequest>,
) -> Result<Json<ApiResponse<equipment::Model>>, ServiceError> {
    state
        .services
        .ledger
        .set_maintenance(SetMaintenanceCommand {
            resource_type: ResourceType::Equipamento,
            resource_id: id,
            em_manutencao: request.em_manutencao,
            motivo: request.motivo,
        })
        .await?;
    let item = state.services.registry.get_equipment(id).await?;
    Ok(Json(ApiResponse::success(item)))
}
