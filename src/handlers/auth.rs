use axum::{
    extract::{Json, State},
    http::StatusCode,
};

use crate::auth::{AuthUser, LoginRequest, RefreshRequest, RegisterRequest, TokenPair, UserProfile};
use crate::errors::ServiceError;
use crate::{ApiResponse, AppState};

/// Create a user account and receive a token pair
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<TokenPair>),
        (status = 403, description = "Registration closed", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TokenPair>>), ServiceError> {
    let tokens = state.services.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(tokens))))
}

/// Exchange credentials for a token pair
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = ApiResponse<TokenPair>),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, ServiceError> {
    let tokens = state.services.auth.login(request).await?;
    Ok(Json(ApiResponse::success(tokens)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = ApiResponse<TokenPair>),
        (status = 401, description = "Invalid refresh token", body = crate::errors::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, ServiceError> {
    let tokens = state.services.auth.refresh(&request.refresh_token).await?;
    Ok(Json(ApiResponse::success(tokens)))
}

/// Profile of the authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserProfile>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<UserProfile>>, ServiceError> {
    let profile = state.services.auth.get_profile(auth_user.user_id).await?;
    Ok(Json(ApiResponse::success(profile)))
}
