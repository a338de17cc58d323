mod common;

use axum::{body, http::Method, http::StatusCode};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;

use armazem_api::{
    entities::movement::ResourceType,
    entities::site::SiteState,
    entities::stock_movement::StockDirection,
    services::ledger::{
        AssignResourceCommand, MoveStockCommand, ReturnResourceCommand, SetMaintenanceCommand,
    },
    services::reports::MovementFilter,
};

use common::TestApp;

async fn seed_activity(app: &TestApp) -> (uuid::Uuid, uuid::Uuid) {
    let obra = app.seed_site("OBR-100", SiteState::Ativa).await;
    let item = app.seed_equipment("EQ-100").await;
    let vehicle = app.seed_vehicle("ZZ-10-ZZ").await;
    let material = app.seed_material("FER-100", dec!(20)).await;
    let ledger = &app.state.services.ledger;

    ledger
        .assign(AssignResourceCommand {
            resource_type: ResourceType::Equipamento,
            resource_id: item.id,
            obra_id: obra.id,
            actor: None,
            notas: None,
        })
        .await
        .unwrap();
    ledger
        .return_resource(ReturnResourceCommand {
            resource_type: ResourceType::Equipamento,
            resource_id: item.id,
            actor: None,
            notas: None,
        })
        .await
        .unwrap();
    ledger
        .assign(AssignResourceCommand {
            resource_type: ResourceType::Viatura,
            resource_id: vehicle.id,
            obra_id: obra.id,
            actor: None,
            notas: None,
        })
        .await
        .unwrap();

    ledger
        .move_stock(MoveStockCommand {
            material_id: material.id,
            direcao: StockDirection::Entrada,
            quantidade: dec!(50),
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
            quantidade: dec!(35),
            obra_id: Some(obra.id),
            actor: None,
            notas: None,
        })
        .await
        .unwrap();

    (obra.id, material.id)
}

#[tokio::test]
async fn movements_report_counts_per_kind_and_resource_type() {
    let app = TestApp::new().await;
    let (obra_id, _) = seed_activity(&app).await;

    let report = app
        .state
        .services
        .reports
        .generate_movements_report(MovementFilter {
            obra_id: Some(obra_id),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.por_tipo.get("atribuicao"), Some(&2));
    assert_eq!(report.por_tipo.get("devolucao"), Some(&1));
    assert_eq!(report.por_recurso.get("equipamento"), Some(&2));
    assert_eq!(report.por_recurso.get("viatura"), Some(&1));

    let filtered = app
        .state
        .services
        .reports
        .generate_movements_report(MovementFilter {
            tipo_recurso: Some(ResourceType::Viatura),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(filtered.total, 1);
}

#[tokio::test]
async fn movements_report_rejects_a_month_without_a_year() {
    let app = TestApp::new().await;

    let err = app
        .state
        .services
        .reports
        .generate_movements_report(MovementFilter {
            mes: Some(3),
            ..Default::default()
        })
        .await
        .expect_err("month without year");
    assert!(matches!(
        err,
        armazem_api::errors::ServiceError::ValidationError(_)
    ));
}

#[tokio::test]
async fn stock_report_totals_entradas_and_saidas_per_material() {
    let app = TestApp::new().await;
    let (_, material_id) = seed_activity(&app).await;

    let report = app
        .state
        .services
        .reports
        .generate_stock_report(None, None)
        .await
        .unwrap();

    let row = report
        .materiais
        .iter()
        .find(|r| r.material_id == material_id)
        .expect("material row");
    assert_eq!(row.total_entradas, dec!(50));
    assert_eq!(row.total_saidas, dec!(35));
    assert_eq!(row.stock_atual, dec!(15));
    assert!(row.abaixo_minimo);
    assert_eq!(report.abaixo_minimo, 1);
}

#[tokio::test]
async fn site_report_lists_assigned_resources_and_consumption() {
    let app = TestApp::new().await;
    let (obra_id, material_id) = seed_activity(&app).await;

    let report = app
        .state
        .services
        .reports
        .generate_site_report(obra_id)
        .await
        .unwrap();

    // The equipment was returned; only the vehicle is still on site.
    assert!(report.equipamentos.is_empty());
    assert_eq!(report.viaturas.len(), 1);
    let consumo = report
        .consumos
        .iter()
        .find(|c| c.material_id == material_id)
        .expect("consumption row");
    assert_eq!(consumo.total_consumido, dec!(35));
}

#[tokio::test]
async fn maintenance_report_includes_flagged_resources() {
    let app = TestApp::new().await;
    let item = app.seed_equipment("EQ-200").await;

    app.state
        .services
        .ledger
        .set_maintenance(SetMaintenanceCommand {
            resource_type: ResourceType::Equipamento,
            resource_id: item.id,
            em_manutencao: true,
            motivo: Some("revisao anual".to_string()),
        })
        .await
        .unwrap();

    let report = app
        .state
        .services
        .reports
        .generate_maintenance_report()
        .await
        .unwrap();
    assert_eq!(report.equipamentos.len(), 1);
    assert_eq!(report.equipamentos[0].id, item.id);
    assert!(report.viaturas.is_empty());
}

#[tokio::test]
async fn utilization_report_tracks_in_warehouse_versus_on_site() {
    let app = TestApp::new().await;
    let obra = app.seed_site("OBR-300", SiteState::Ativa).await;
    let on_site = app.seed_equipment("EQ-300").await;
    let _idle = app.seed_equipment("EQ-301").await;

    app.state
        .services
        .ledger
        .assign(AssignResourceCommand {
            resource_type: ResourceType::Equipamento,
            resource_id: on_site.id,
            obra_id: obra.id,
            actor: None,
            notas: None,
        })
        .await
        .unwrap();

    let report = app
        .state
        .services
        .reports
        .generate_utilization_report(MovementFilter::default())
        .await
        .unwrap();

    assert_eq!(report.equipamentos.total, 2);
    assert_eq!(report.equipamentos.em_obra, 1);
    assert_eq!(report.equipamentos.em_armazem, 1);
    assert!((report.equipamentos.taxa_utilizacao - 0.5).abs() < f64::EPSILON);
    assert_eq!(report.mais_movimentados[0].identificador, "EQ-300");
}

#[tokio::test]
async fn summary_surfaces_expiry_and_low_stock_alerts() {
    let app = TestApp::new().await;
    let vehicle = app.seed_vehicle("AL-55-RT").await;
    let material = app.seed_material("CIM-900", dec!(10)).await;

    // Insurance expiring in five days: inside the window and urgent.
    let mut active: armazem_api::entities::vehicle::ActiveModel = vehicle.into();
    active.data_seguro = Set(Some((Utc::now() + Duration::days(5)).date_naive()));
    active.update(&*app.state.db).await.unwrap();

    // Stock drops to zero, which makes the low-stock alert urgent.
    app.state
        .services
        .ledger
        .move_stock(MoveStockCommand {
            material_id: material.id,
            direcao: StockDirection::Entrada,
            quantidade: dec!(8),
            obra_id: None,
            actor: None,
            notas: None,
        })
        .await
        .unwrap();
    app.state
        .services
        .ledger
        .move_stock(MoveStockCommand {
            material_id: material.id,
            direcao: StockDirection::Saida,
            quantidade: dec!(8),
            obra_id: None,
            actor: None,
            notas: None,
        })
        .await
        .unwrap();

    let summary = app.state.services.reports.generate_summary().await.unwrap();

    assert_eq!(summary.viaturas.total, 1);
    assert_eq!(summary.total_materiais, 1);
    assert_eq!(summary.materiais_abaixo_minimo, 1);
    assert!(summary.movimentos_hoje >= 2);

    let insurance = summary
        .alertas
        .iter()
        .find(|a| matches!(a.tipo, armazem_api::services::alerts::AlertKind::Seguro))
        .expect("insurance alert");
    assert!(insurance.urgente);
    assert!(!insurance.expirado);

    let low_stock = summary
        .alertas
        .iter()
        .find(|a| matches!(a.tipo, armazem_api::services::alerts::AlertKind::StockBaixo))
        .expect("low stock alert");
    assert!(low_stock.urgente);
    assert_eq!(low_stock.stock_atual, Some(Decimal::ZERO));
}

#[tokio::test]
async fn alerts_endpoint_returns_the_full_sweep() {
    let app = TestApp::new().await;
    let vehicle = app.seed_vehicle("AL-77-KM").await;
    app.seed_material("GES-900", dec!(5)).await;

    // Inspection two days overdue: expired and urgent.
    let mut active: armazem_api::entities::vehicle::ActiveModel = vehicle.into();
    active.data_vistoria = Set(Some((Utc::now() - Duration::days(2)).date_naive()));
    active.update(&*app.state.db).await.unwrap();

    let response = app
        .request_authenticated(Method::GET, "/api/v1/relatorios/alertas", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let envelope: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(envelope["success"], Value::Bool(true));

    let alerts = envelope["data"].as_array().expect("alert list");
    let vistoria = alerts
        .iter()
        .find(|a| a["tipo"] == "vistoria")
        .expect("inspection alert");
    assert_eq!(vistoria["expirado"], Value::Bool(true));
    assert_eq!(vistoria["urgente"], Value::Bool(true));

    // The never-stocked material sits at zero with a minimum of 5.
    assert!(alerts.iter().any(|a| a["tipo"] == "stock_baixo"));

    let response = app
        .request(Method::GET, "/api/v1/relatorios/alertas", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn report_routes_return_the_standard_envelope() {
    let app = TestApp::new().await;
    seed_activity(&app).await;

    let response = app
        .request_authenticated(Method::GET, "/api/v1/summary", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let envelope: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(envelope["success"], Value::Bool(true));
    assert!(envelope["data"]["equipamentos"]["total"].is_number());

    let response = app
        .request(Method::GET, "/api/v1/relatorios/stock", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
