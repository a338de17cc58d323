use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::entities::site::{self, SiteState};
use crate::errors::ServiceError;
use crate::services::registry::{CreateSite, UpdateSite};
use crate::services::reports::SiteReport;
use crate::{ApiResponse, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, IntoParams)]
pub struct SiteListQuery {
    pub estado: Option<SiteState>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/obras",
    params(SiteListQuery),
    responses(
        (status = 200, description = "Site list", body = ApiResponse<PaginatedResponse<site::Model>>)
    ),
    security(("bearer_auth" = [])),
    tag = "obras"
)]
pub async fn list_sites(
    State(state): State<AppState>,
    Query(query): Query<SiteListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<site::Model>>>, ServiceError> {
    let (page, limit) = state.page_params(query.page, query.limit);
    let (items, total) = state
        .services
        .registry
        .list_sites(query.estado, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/obras",
    request_body = CreateSite,
    responses(
        (status = 201, description = "Site created", body = ApiResponse<site::Model>),
        (status = 409, description = "Duplicate codigo", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "obras"
)]
pub async fn create_site(
    State(state): State<AppState>,
    Json(request): Json<CreateSite>,
) -> Result<(StatusCode, Json<ApiResponse<site::Model>>), ServiceError> {
    let created = state.services.registry.create_site(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

#[utoipa::path(
    get,
    path = "/api/v1/obras/{id}",
    params(("id" = Uuid, Path, description = "Site id")),
    responses(
        (status = 200, description = "Site", body = ApiResponse<site::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "obras"
)]
pub async fn get_site(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<site::Model>>, ServiceError> {
    let site = state.services.registry.get_site(id).await?;
    Ok(Json(ApiResponse::success(site)))
}

#[utoipa::path(
    put,
    path = "/api/v1/obras/{id}",
    params(("id" = Uuid, Path, description = "Site id")),
    request_body = UpdateSite,
    responses(
        (status = 200, description = "Site updated", body = ApiResponse<site::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "obras"
)]
pub async fn update_site(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSite>,
) -> Result<Json<ApiResponse<site::Model>>, ServiceError> {
    let updated = state.services.registry.update_site(id, request).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Delete a site. Refused while resources are still assigned to it.
#[utoipa::path(
    delete,
    path = "/api/v1/obras/{id}",
    params(("id" = Uuid, Path, description = "Site id")),
    responses(
        (status = 200, description = "Site deleted", body = ApiResponse<serde_json::Value>),
        (status = 409, description = "Resources still assigned", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "obras"
)]
pub async fn delete_site(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    state.services.registry.delete_site(id).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": id }),
    )))
}

/// Everything currently at the site plus its material consumption
#[utoipa::path(
    get,
    path = "/api/v1/obras/{id}/recursos",
    params(("id" = Uuid, Path, description = "Site id")),
    responses(
        (status = 200, description = "Site resources", body = ApiResponse<SiteReport>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "obras"
)]
pub async fn get_site_resources(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SiteReport>>, ServiceError> {
    let report = state.services.reports.generate_site_report(id).await?;
    Ok(Json(ApiResponse::success(report)))
}
