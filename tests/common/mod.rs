use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    routing::get,
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use armazem_api::{
    auth::{AuthService, RegisterRequest},
    config::AppConfig,
    db,
    entities::site::SiteState,
    events::{self, EventSender},
    handlers::AppServices,
    services::registry::{CreateEquipment, CreateMaterial, CreateSite, CreateVehicle},
    AppState,
};

const TEST_JWT_SECRET: &str =
    "integration-test-secret-0123456789abcdefghijklmnopqrstuvwxyz-ABCDEFGH";

/// Test harness backed by a throwaway SQLite file per instance.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: String,
    db_file: std::path::PathBuf,
    _event_task: tokio::task::JoinHandle<()>,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_file);
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let db_file = std::env::temp_dir().join(format!("armazem_test_{}.db", Uuid::new_v4()));
        let _ = std::fs::remove_file(&db_file);

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_file.display()),
            TEST_JWT_SECRET.to_string(),
            3600,
            86_400,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_service = Arc::new(AuthService::new(db_arc.clone(), &cfg));
        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            auth_service.clone(),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .route("/health", get(armazem_api::health_check))
            .nest("/api/v1", armazem_api::api_v1_routes(auth_service.clone()))
            .with_state(state.clone());

        // First registered account; gets the admin role.
        let tokens = auth_service
            .register(RegisterRequest {
                email: "teste@armazem.pt".to_string(),
                password: "palavra-passe-segura".to_string(),
                name: "Utilizador Teste".to_string(),
            })
            .await
            .expect("register test user");

        Self {
            router,
            state,
            token: tokens.access_token,
            db_file,
            _event_task: event_task,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    // Seed helpers going straight through the services.

    pub async fn seed_site(
        &self,
        codigo: &str,
        estado: SiteState,
    ) -> armazem_api::entities::site::Model {
        self.state
            .services
            .registry
            .create_site(CreateSite {
                codigo: codigo.to_string(),
                nome: format!("Obra {}", codigo),
                endereco: None,
                cliente: None,
                estado: Some(estado),
            })
            .await
            .expect("seed site")
    }

    pub async fn seed_equipment(&self, codigo: &str) -> armazem_api::entities::equipment::Model {
        self.state
            .services
            .registry
            .create_equipment(CreateEquipment {
                codigo: codigo.to_string(),
                descricao: format!("Equipamento {}", codigo),
                marca: None,
                modelo: None,
                categoria: None,
                numero_serie: None,
                estado_conservacao: None,
                responsavel: None,
            })
            .await
            .expect("seed equipment")
    }

    pub async fn seed_vehicle(&self, matricula: &str) -> armazem_api::entities::vehicle::Model {
        self.state
            .services
            .registry
            .create_vehicle(CreateVehicle {
                matricula: matricula.to_string(),
                marca: None,
                modelo: None,
                combustivel: None,
                kms_atual: Some(10_000),
                proxima_revisao_kms: None,
                data_vistoria: None,
                data_seguro: None,
                data_proxima_revisao: None,
                apolice_seguro: None,
                observacoes: None,
            })
            .await
            .expect("seed vehicle")
    }

    pub async fn seed_material(
        &self,
        codigo: &str,
        stock_minimo: Decimal,
    ) -> armazem_api::entities::material::Model {
        self.state
            .services
            .registry
            .create_material(CreateMaterial {
                codigo: codigo.to_string(),
                descricao: format!("Material {}", codigo),
                unidade: Some("un".to_string()),
                stock_minimo: Some(stock_minimo),
            })
            .await
            .expect("seed material")
    }
}
