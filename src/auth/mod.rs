use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AppConfig,
    db::DbPool,
    entities::user::{self, Entity as User},
    errors::ServiceError,
};

/// JWT claim set for access and refresh tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated user extracted from a validated token. Stored in the
/// request extensions by the bearer middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
    pub token_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub roles: Vec<String>,
}

/// JWT issuing and validation plus user account management.
pub struct AuthService {
    db_pool: Arc<DbPool>,
    jwt_secret: String,
    jwt_expiration: i64,
    refresh_token_expiration: i64,
    open_registration: bool,
}

impl AuthService {
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig) -> Self {
        Self {
            db_pool,
            jwt_secret: config.jwt_secret.clone(),
            jwt_expiration: config.jwt_expiration as i64,
            refresh_token_expiration: config.refresh_token_expiration as i64,
            open_registration: config.open_registration,
        }
    }

    /// Creates a user account. The first account ever created gets the
    /// admin role; later registrations require open registration.
    pub async fn register(&self, req: RegisterRequest) -> Result<TokenPair, ServiceError> {
        req.validate()?;
        let db = &*self.db_pool;

        let existing_users = User::find().count(db).await.map_err(ServiceError::db_error)?;
        if existing_users > 0 && !self.open_registration {
            return Err(ServiceError::Forbidden(
                "Registration is closed".to_string(),
            ));
        }

        let duplicate = User::find()
            .filter(user::Column::Email.eq(req.email.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "A user with email {} already exists",
                req.email
            )));
        }

        let roles = if existing_users == 0 {
            vec!["admin".to_string()]
        } else {
            vec!["user".to_string()]
        };

        let password_hash = hash_password(&req.password)?;
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(req.email.clone()),
            name: Set(req.name.clone()),
            password_hash: Set(password_hash),
            roles: Set(serde_json::to_string(&roles)
                .map_err(|e| ServiceError::InternalError(e.to_string()))?),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(ServiceError::db_error)?;

        info!(user_id = %model.id, email = %model.email, "User registered");
        self.issue_tokens(&model)
    }

    pub async fn login(&self, req: LoginRequest) -> Result<TokenPair, ServiceError> {
        req.validate()?;
        let db = &*self.db_pool;

        let user = User::find()
            .filter(user::Column::Email.eq(req.email.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::Unauthorized("Invalid credentials".to_string()))?;

        if !verify_password(&req.password, &user.password_hash)? {
            return Err(ServiceError::Unauthorized(
                "Invalid credentials".to_string(),
            ));
        }

        info!(user_id = %user.id, "User logged in");
        self.issue_tokens(&user)
    }

    /// Exchanges a valid refresh token for a new token pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ServiceError> {
        let claims = self.validate_token(refresh_token)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("Invalid token subject".to_string()))?;

        let user = User::find_by_id(user_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::Unauthorized("Unknown user".to_string()))?;

        self.issue_tokens(&user)
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserProfile, ServiceError> {
        let user = User::find_by_id(user_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))?;

        Ok(UserProfile {
            id: user.id,
            roles: serde_json::from_str(&user.roles).unwrap_or_default(),
            email: user.email,
            name: user.name,
        })
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                ServiceError::Unauthorized("Token expired".to_string())
            }
            _ => ServiceError::Unauthorized("Invalid token".to_string()),
        })
    }

    fn issue_tokens(&self, user: &user::Model) -> Result<TokenPair, ServiceError> {
        let now = Utc::now();
        let roles: Vec<String> = serde_json::from_str(&user.roles).unwrap_or_default();

        let access_claims = Claims {
            sub: user.id.to_string(),
            name: Some(user.name.clone()),
            email: Some(user.email.clone()),
            roles,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ChronoDuration::seconds(self.jwt_expiration)).timestamp(),
        };
        // Refresh tokens carry only the subject
        let refresh_claims = Claims {
            sub: user.id.to_string(),
            name: None,
            email: None,
            roles: vec![],
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ChronoDuration::seconds(self.refresh_token_expiration)).timestamp(),
        };

        let key = EncodingKey::from_secret(self.jwt_secret.as_bytes());
        let access_token = encode(&Header::new(Algorithm::HS256), &access_claims, &key)
            .map_err(|e| ServiceError::InternalError(format!("Token creation failed: {}", e)))?;
        let refresh_token = encode(&Header::new(Algorithm::HS256), &refresh_claims, &key)
            .map_err(|e| ServiceError::InternalError(format!("Token creation failed: {}", e)))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_expiration,
        })
    }
}

pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ServiceError::HashError(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, ServiceError> {
    let parsed = PasswordHash::new(hash).map_err(|e| ServiceError::HashError(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Bearer-token middleware. Validates the Authorization header and puts
/// an [`AuthUser`] into the request extensions for handlers to read.
pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    let token = match token {
        Some(t) => t,
        None => {
            return ServiceError::Unauthorized("Missing bearer token".to_string()).into_response()
        }
    };

    match auth_service.validate_token(&token) {
        Ok(claims) => {
            let user_id = match Uuid::parse_str(&claims.sub) {
                Ok(id) => id,
                Err(_) => {
                    return ServiceError::Unauthorized("Invalid token subject".to_string())
                        .into_response()
                }
            };
            request.extensions_mut().insert(AuthUser {
                user_id,
                name: claims.name,
                email: claims.email,
                roles: claims.roles,
                token_id: claims.jti,
            });
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| {
                ServiceError::Unauthorized("Missing bearer token".to_string()).into_response()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trips_through_argon2() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("segredo").unwrap();
        let b = hash_password("segredo").unwrap();
        assert_ne!(a, b);
    }
}
