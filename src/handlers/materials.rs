use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::entities::material;
use crate::errors::ServiceError;
use crate::services::registry::{CreateMaterial, UpdateMaterial};
use crate::{ApiResponse, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, IntoParams)]
pub struct MaterialListQuery {
    pub ativo: Option<bool>,
    /// Only materials at or below their minimum stock
    pub abaixo_minimo: Option<bool>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/materiais",
    params(MaterialListQuery),
    responses(
        (status = 200, description = "Material list", body = ApiResponse<PaginatedResponse<material::Model>>)
    ),
    security(("bearer_auth" = [])),
    tag = "materiais"
)]
pub async fn list_materials(
    State(state): State<AppState>,
    Query(query): Query<MaterialListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<material::Model>>>, ServiceError> {
    let (page, limit) = state.page_params(query.page, query.limit);
    let (items, total) = state
        .services
        .registry
        .list_materials(query.ativo, query.abaixo_minimo.unwrap_or(false), page, limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

/// Register a material. The balance starts at zero; stock arrives through
/// entrada movements.
#[utoipa::path(
    post,
    path = "/api/v1/materiais",
    request_body = CreateMaterial,
    responses(
        (status = 201, description = "Material created", body = ApiResponse<material::Model>),
        (status = 409, description = "Duplicate codigo", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "materiais"
)]
pub async fn create_material(
    State(state): State<AppState>,
    Json(request): Json<CreateMaterial>,
) -> Result<(StatusCode, Json<ApiResponse<material::Model>>), ServiceError> {
    let created = state.services.registry.create_material(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

#[utoipa::path(
    get,
    path = "/api/v1/materiais/{id}",
    params(("id" = Uuid, Path, description = "Material id")),
    responses(
        (status = 200, description = "Material", body = ApiResponse<material::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "materiais"
)]
pub async fn get_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<material::Model>>, ServiceError> {
    let item = state.services.registry.get_material(id).await?;
    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    put,
    path = "/api/v1/materiais/{id}",
    params(("id" = Uuid, Path, description = "Material id")),
    request_body = UpdateMaterial,
    responses(
        (status = 200, description = "Material updated", body = ApiResponse<material::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "materiais"
)]
pub async fn update_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateMaterial>,
) -> Result<Json<ApiResponse<material::Model>>, ServiceError> {
    let updated = state.services.registry.update_material(id, request).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Soft delete; the movement history stays untouched.
#[utoipa::path(
    delete,
    path = "/api/v1/materiais/{id}",
    params(("id" = Uuid, Path, description = "Material id")),
    responses(
        (status = 200, description = "Material deactivated", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "materiais"
)]
pub async fn delete_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    state.services.registry.delete_material(id).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": id }),
    )))
}
