mod common;

use axum::{body, http::Method, http::StatusCode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use armazem_api::{
    entities::movement::ResourceType,
    entities::site::SiteState,
    errors::ServiceError,
    services::ledger::AssignResourceCommand,
    services::registry::{CreateMaterial, CreateSite, UpdateMaterial, UpdateSite},
};

use common::TestApp;

#[tokio::test]
async fn duplicate_business_codes_are_rejected() {
    let app = TestApp::new().await;
    let registry = &app.state.services.registry;

    app.seed_site("OBR-500", SiteState::Ativa).await;
    let err = registry
        .create_site(CreateSite {
            codigo: "OBR-500".to_string(),
            nome: "Outra obra".to_string(),
            endereco: None,
            cliente: None,
            estado: None,
        })
        .await
        .expect_err("duplicate codigo");
    assert!(matches!(err, ServiceError::Conflict(_)));

    app.seed_vehicle("XY-99-XY").await;
    let err = registry
        .create_vehicle(armazem_api::services::registry::CreateVehicle {
            matricula: "XY-99-XY".to_string(),
            marca: None,
            modelo: None,
            combustivel: None,
            kms_atual: None,
            proxima_revisao_kms: None,
            data_vistoria: None,
            data_seguro: None,
            data_proxima_revisao: None,
            apolice_seguro: None,
            observacoes: None,
        })
        .await
        .expect_err("duplicate matricula");
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn materials_start_with_zero_stock() {
    let app = TestApp::new().await;

    let material = app
        .state
        .services
        .registry
        .create_material(CreateMaterial {
            codigo: "TUB-001".to_string(),
            descricao: "Tubo PVC 50mm".to_string(),
            unidade: Some("m".to_string()),
            stock_minimo: Some(dec!(100)),
        })
        .await
        .unwrap();

    assert_eq!(material.stock_atual, Decimal::ZERO);
    assert_eq!(material.stock_minimo, dec!(100));

    // stock_minimo is editable; the balance only moves through the ledger.
    let updated = app
        .state
        .services
        .registry
        .update_material(
            material.id,
            UpdateMaterial {
                descricao: None,
                unidade: None,
                stock_minimo: Some(dec!(50)),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.stock_minimo, dec!(50));
    assert_eq!(updated.stock_atual, Decimal::ZERO);
}

#[tokio::test]
async fn deleting_a_resource_on_site_is_refused() {
    let app = TestApp::new().await;
    let obra = app.seed_site("OBR-510", SiteState::Ativa).await;
    let item = app.seed_equipment("EQ-510").await;

    app.state
        .services
        .ledger
        .assign(AssignResourceCommand {
            resource_type: ResourceType::Equipamento,
            resource_id: item.id,
            obra_id: obra.id,
            actor: None,
            notas: None,
        })
        .await
        .unwrap();

    let err = app
        .state
        .services
        .registry
        .delete_equipment(item.id)
        .await
        .expect_err("delete while assigned");
    assert!(matches!(err, ServiceError::Conflict(_)));

    let err = app
        .state
        .services
        .registry
        .delete_site(obra.id)
        .await
        .expect_err("delete site with assigned resources");
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn soft_deleted_equipment_disappears_from_active_listings() {
    let app = TestApp::new().await;
    let item = app.seed_equipment("EQ-520").await;

    app.state
        .services
        .registry
        .delete_equipment(item.id)
        .await
        .unwrap();

    let (active, _) = app
        .state
        .services
        .registry
        .list_equipment(
            armazem_api::services::registry::ResourceFilter {
                ativo: Some(true),
                ..Default::default()
            },
            1,
            20,
        )
        .await
        .unwrap();
    assert!(active.iter().all(|e| e.id != item.id));

    // The row itself survives for ledger history.
    let kept = app
        .state
        .services
        .registry
        .get_equipment(item.id)
        .await
        .unwrap();
    assert!(!kept.ativo);
}

#[tokio::test]
async fn site_state_transitions_are_persisted() {
    let app = TestApp::new().await;
    let obra = app.seed_site("OBR-530", SiteState::Ativa).await;

    let updated = app
        .state
        .services
        .registry
        .update_site(
            obra.id,
            UpdateSite {
                nome: None,
                endereco: None,
                cliente: None,
                estado: Some(SiteState::Concluida),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.estado, "Concluida");
}

#[tokio::test]
async fn registry_routes_create_and_paginate() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/obras",
            Some(json!({
                "codigo": "OBR-540",
                "nome": "Moradia Cascais",
                "cliente": "Familia Silva"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    for n in 0..3 {
        let response = app
            .request_authenticated(
                Method::POST,
                "/api/v1/equipamentos",
                Some(json!({
                    "codigo": format!("EQ-54{}", n),
                    "descricao": "Betoneira"
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .request_authenticated(Method::GET, "/api/v1/equipamentos?page=1&limit=2", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let envelope: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(envelope["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(envelope["data"]["total"], json!(3));
    assert_eq!(envelope["data"]["total_pages"], json!(2));
}
