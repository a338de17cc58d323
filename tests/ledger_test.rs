mod common;

use axum::{body, http::Method, http::StatusCode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::{json, Value};

use armazem_api::{
    entities::movement::ResourceType,
    entities::stock_movement::{self, StockDirection},
    errors::ServiceError,
    services::ledger::{
        AssignResourceCommand, MoveStockCommand, RecordTripCommand, ReturnResourceCommand,
        SetMaintenanceCommand,
    },
};

use common::TestApp;
use armazem_api::entities::site::SiteState;

fn assign_cmd(resource_id: uuid::Uuid, obra_id: uuid::Uuid) -> AssignResourceCommand {
    AssignResourceCommand {
        resource_type: ResourceType::Equipamento,
        resource_id,
        obra_id,
        actor: Some("teste".to_string()),
        notas: None,
    }
}

#[tokio::test]
async fn stock_balance_follows_the_movement_ledger() {
    let app = TestApp::new().await;
    let material = app.seed_material("CIM-001", dec!(5)).await;
    let ledger = app.state.services.ledger.clone();

    let entrada = ledger
        .move_stock(MoveStockCommand {
            material_id: material.id,
            direcao: StockDirection::Entrada,
            quantidade: dec!(10),
            obra_id: None,
            actor: None,
            notas: None,
        })
        .await
        .expect("entrada of 10");
    assert_eq!(entrada.stock_atual, dec!(10));

    let obra = app.seed_site("OBR-001", SiteState::Ativa).await;
    let saida = ledger
        .move_stock(MoveStockCommand {
            material_id: material.id,
            direcao: StockDirection::Saida,
            quantidade: dec!(7),
            obra_id: Some(obra.id),
            actor: None,
            notas: None,
        })
        .await
        .expect("saida of 7");
    assert_eq!(saida.stock_atual, dec!(3));
    assert!(saida.below_minimum);

    let err = ledger
        .move_stock(MoveStockCommand {
            material_id: material.id,
            direcao: StockDirection::Saida,
            quantidade: dec!(5),
            obra_id: Some(obra.id),
            actor: None,
            notas: None,
        })
        .await
        .expect_err("saida of 5 with 3 in stock must fail");
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    // The failed movement must leave no ledger row behind.
    let refreshed = app
        .state
        .services
        .registry
        .get_material(material.id)
        .await
        .unwrap();
    assert_eq!(refreshed.stock_atual, dec!(3));
}

#[tokio::test]
async fn replaying_the_stock_ledger_reproduces_the_balance() {
    let app = TestApp::new().await;
    let material = app.seed_material("BRI-001", Decimal::ZERO).await;
    let ledger = app.state.services.ledger.clone();

    for (direcao, qty) in [
        (StockDirection::Entrada, dec!(25)),
        (StockDirection::Saida, dec!(4)),
        (StockDirection::Entrada, dec!(1.5)),
        (StockDirection::Saida, dec!(0.5)),
    ] {
        ledger
            .move_stock(MoveStockCommand {
                material_id: material.id,
                direcao,
                quantidade: qty,
                obra_id: None,
                actor: None,
                notas: None,
            })
            .await
            .expect("stock movement");
    }

    let rows = stock_movement::Entity::find()
        .filter(stock_movement::Column::MaterialId.eq(material.id))
        .all(&*app.state.db)
        .await
        .unwrap();
    let replayed = rows.iter().fold(Decimal::ZERO, |acc, row| {
        match StockDirection::from_str(&row.direcao).unwrap() {
            StockDirection::Entrada => acc + row.quantidade,
            StockDirection::Saida => acc - row.quantidade,
        }
    });

    let current = app
        .state
        .services
        .registry
        .get_material(material.id)
        .await
        .unwrap();
    assert_eq!(replayed, current.stock_atual);
    assert_eq!(current.stock_atual, dec!(22));
}

#[tokio::test]
async fn assigning_twice_without_a_return_is_rejected() {
    let app = TestApp::new().await;
    let obra = app.seed_site("OBR-010", SiteState::Ativa).await;
    let other = app.seed_site("OBR-011", SiteState::Ativa).await;
    let item = app.seed_equipment("EQ-010").await;
    let ledger = app.state.services.ledger.clone();

    ledger
        .assign(assign_cmd(item.id, obra.id))
        .await
        .expect("first assignment");

    let err = ledger
        .assign(assign_cmd(item.id, other.id))
        .await
        .expect_err("second assignment without return");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    ledger
        .return_resource(ReturnResourceCommand {
            resource_type: ResourceType::Equipamento,
            resource_id: item.id,
            actor: None,
            notas: None,
        })
        .await
        .expect("return");

    let err = ledger
        .return_resource(ReturnResourceCommand {
            resource_type: ResourceType::Equipamento,
            resource_id: item.id,
            actor: None,
            notas: None,
        })
        .await
        .expect_err("double return");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    // Free again, so a new assignment works.
    ledger
        .assign(assign_cmd(item.id, other.id))
        .await
        .expect("assignment after return");
}

#[tokio::test]
async fn maintenance_blocks_assignment_but_not_return() {
    let app = TestApp::new().await;
    let obra = app.seed_site("OBR-020", SiteState::Ativa).await;
    let item = app.seed_equipment("EQ-020").await;
    let ledger = app.state.services.ledger.clone();

    ledger.assign(assign_cmd(item.id, obra.id)).await.unwrap();

    ledger
        .set_maintenance(SetMaintenanceCommand {
            resource_type: ResourceType::Equipamento,
            resource_id: item.id,
            em_manutencao: true,
            motivo: Some("avaria hidraulica".to_string()),
        })
        .await
        .unwrap();

    // Returning while under maintenance is allowed.
    ledger
        .return_resource(ReturnResourceCommand {
            resource_type: ResourceType::Equipamento,
            resource_id: item.id,
            actor: None,
            notas: None,
        })
        .await
        .expect("return during maintenance");

    let err = ledger
        .assign(assign_cmd(item.id, obra.id))
        .await
        .expect_err("assignment during maintenance");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    ledger
        .set_maintenance(SetMaintenanceCommand {
            resource_type: ResourceType::Equipamento,
            resource_id: item.id,
            em_manutencao: false,
            motivo: None,
        })
        .await
        .unwrap();
    ledger
        .assign(assign_cmd(item.id, obra.id))
        .await
        .expect("assignment after maintenance is cleared");
}

#[tokio::test]
async fn assignment_requires_an_active_site() {
    let app = TestApp::new().await;
    let paused = app.seed_site("OBR-030", SiteState::Pausada).await;
    let item = app.seed_equipment("EQ-030").await;

    let err = app
        .state
        .services
        .ledger
        .assign(assign_cmd(item.id, paused.id))
        .await
        .expect_err("assignment to a paused site");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    let missing = uuid::Uuid::new_v4();
    let err = app
        .state
        .services
        .ledger
        .assign(assign_cmd(item.id, missing))
        .await
        .expect_err("assignment to an unknown site");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn concurrent_assignments_of_one_resource_admit_exactly_one_winner() {
    let app = TestApp::new().await;
    let obra_a = app.seed_site("OBR-040", SiteState::Ativa).await;
    let obra_b = app.seed_site("OBR-041", SiteState::Ativa).await;
    let item = app.seed_equipment("EQ-040").await;
    let ledger = app.state.services.ledger.clone();

    let (a, b) = tokio::join!(
        ledger.assign(assign_cmd(item.id, obra_a.id)),
        ledger.assign(assign_cmd(item.id, obra_b.id)),
    );

    assert_eq!(
        a.is_ok() as u8 + b.is_ok() as u8,
        1,
        "exactly one of the racing assignments may win"
    );

    let refreshed = app
        .state
        .services
        .registry
        .get_equipment(item.id)
        .await
        .unwrap();
    assert!(refreshed.obra_id == Some(obra_a.id) || refreshed.obra_id == Some(obra_b.id));
}

#[tokio::test]
async fn trips_advance_the_odometer_only_forward() {
    let app = TestApp::new().await;
    let vehicle = app.seed_vehicle("AA-01-BB").await;
    let ledger = app.state.services.ledger.clone();

    ledger
        .record_trip(RecordTripCommand {
            vehicle_id: vehicle.id,
            condutor: "Joao".to_string(),
            km_inicial: 10_000,
            km_final: 10_250,
            obra_id: None,
            notas: None,
        })
        .await
        .expect("trip");

    let refreshed = app
        .state
        .services
        .registry
        .get_vehicle(vehicle.id)
        .await
        .unwrap();
    assert_eq!(refreshed.kms_atual, 10_250);

    // A backdated trip is recorded but never rolls the odometer back.
    ledger
        .record_trip(RecordTripCommand {
            vehicle_id: vehicle.id,
            condutor: "Joao".to_string(),
            km_inicial: 9_000,
            km_final: 9_100,
            obra_id: None,
            notas: Some("registo em atraso".to_string()),
        })
        .await
        .expect("backdated trip");

    let refreshed = app
        .state
        .services
        .registry
        .get_vehicle(vehicle.id)
        .await
        .unwrap();
    assert_eq!(refreshed.kms_atual, 10_250);

    let err = ledger
        .record_trip(RecordTripCommand {
            vehicle_id: vehicle.id,
            condutor: "Joao".to_string(),
            km_inicial: 10_300,
            km_final: 10_200,
            obra_id: None,
            notas: None,
        })
        .await
        .expect_err("km_final below km_inicial");
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn stock_and_trip_ledgers_are_listable_over_http() {
    let app = TestApp::new().await;
    let material = app.seed_material("PRE-700", Decimal::ZERO).await;
    let vehicle = app.seed_vehicle("LM-70-OP").await;
    let obra = app.seed_site("OBR-700", SiteState::Ativa).await;
    let ledger = app.state.services.ledger.clone();

    ledger
        .move_stock(MoveStockCommand {
            material_id: material.id,
            direcao: StockDirection::Entrada,
            quantidade: dec!(12),
            obra_id: None,
            actor: None,
            notas: None,
        })
        .await
        .unwrap();
    ledger
        .move_stock(MoveStockCommand {
            material_id: material.id,
            direcao: StockDirection::Saida,
            quantidade: dec!(2),
            obra_id: Some(obra.id),
            actor: None,
            notas: None,
        })
        .await
        .unwrap();
    ledger
        .record_trip(RecordTripCommand {
            vehicle_id: vehicle.id,
            condutor: "Rui".to_string(),
            km_inicial: 10_000,
            km_final: 10_120,
            obra_id: Some(obra.id),
            notas: None,
        })
        .await
        .unwrap();

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/movimentos/stock?material_id={}", material.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let envelope: Value = serde_json::from_slice(&bytes).unwrap();
    let items = envelope["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(envelope["data"]["total"], json!(2));
    assert!(items.iter().any(|m| m["direcao"] == "entrada"));
    assert!(items.iter().any(|m| m["direcao"] == "saida"));

    // Only the saida carried a site, so the obra filter narrows to it.
    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/movimentos/stock?obra_id={}", obra.id),
            None,
        )
        .await;
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let envelope: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(envelope["data"]["total"], json!(1));
    assert_eq!(envelope["data"]["items"][0]["direcao"], json!("saida"));

    let response = app
        .request_authenticated(Method::GET, "/api/v1/movimentos/viaturas", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let envelope: Value = serde_json::from_slice(&bytes).unwrap();
    let trips = envelope["data"]["items"].as_array().unwrap();
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0]["condutor"], json!("Rui"));
    assert_eq!(trips[0]["km_final"], json!(10_120));

    let response = app
        .request(Method::GET, "/api/v1/movimentos/stock", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ledger_routes_enforce_authentication_and_status_codes() {
    let app = TestApp::new().await;
    let material = app.seed_material("ARE-001", Decimal::ZERO).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/movimentos/stock",
            Some(json!({
                "material_id": material.id,
                "direcao": "entrada",
                "quantidade": "10",
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movimentos/stock",
            Some(json!({
                "material_id": material.id,
                "direcao": "entrada",
                "quantidade": "10",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let envelope: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(envelope["success"], json!(true));
    assert_eq!(envelope["data"]["stock_atual"], json!("10"));

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movimentos/stock",
            Some(json!({
                "material_id": material.id,
                "direcao": "saida",
                "quantidade": "11",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let error: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(error["message"]
        .as_str()
        .unwrap()
        .to_lowercase()
        .contains("stock"));
}
