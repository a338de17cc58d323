mod common;

use axum::{body, http::Method, http::StatusCode};
use serde_json::{json, Value};

use common::TestApp;

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn register_login_and_me_round_trip() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "email": "maria@armazem.pt",
                "password": "palavra-passe-segura",
                "name": "Maria"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({
                "email": "maria@armazem.pt",
                "password": "palavra-passe-segura"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let envelope = json_body(response).await;
    let token = envelope["data"]["access_token"].as_str().unwrap().to_string();

    let response = app
        .request(Method::GET, "/api/v1/auth/me", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let profile = json_body(response).await;
    assert_eq!(profile["data"]["email"], json!("maria@armazem.pt"));
    // The harness registered the first (admin) user; this one is not.
    assert_eq!(profile["data"]["roles"], json!(["user"]));
}

#[tokio::test]
async fn duplicate_email_registration_conflicts() {
    let app = TestApp::new().await;

    let payload = json!({
        "email": "repetido@armazem.pt",
        "password": "palavra-passe-segura",
        "name": "Primeiro"
    });
    let response = app
        .request(Method::POST, "/api/v1/auth/register", Some(payload.clone()), None)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(Method::POST, "/api/v1/auth/register", Some(payload), None)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({
                "email": "teste@armazem.pt",
                "password": "errada-mas-comprida"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_issues_a_new_token_pair() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({
                "email": "teste@armazem.pt",
                "password": "palavra-passe-segura"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let envelope = json_body(response).await;
    let refresh = envelope["data"]["refresh_token"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/refresh",
            Some(json!({ "refresh_token": refresh })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let envelope = json_body(response).await;
    assert!(envelope["data"]["access_token"].as_str().is_some());
}

#[tokio::test]
async fn garbage_tokens_are_rejected_with_the_error_envelope() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/v1/auth/me", None, Some("nao-e-um-jwt"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error = json_body(response).await;
    assert_eq!(error["error"], json!("Unauthorized"));
    assert!(error["timestamp"].as_str().is_some());
}
