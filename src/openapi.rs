use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Armazem API",
        version = "0.1.0",
        description = r#"
# Armazem - Asset & Stock Ledger

Warehouse ledger for a construction company: sites (obras), equipment,
vehicles and materials, with every location and stock change recorded as
an append-only movement.

## Authentication

All endpoints except `/auth/*` and `/health` require a bearer token:

```
Authorization: Bearer <your-jwt-token>
```

## Pagination

List endpoints accept `page` and `limit` query parameters
(default 20 per page, max 100).
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "auth", description = "Registration and token endpoints"),
        (name = "obras", description = "Construction site registry"),
        (name = "equipamentos", description = "Equipment registry"),
        (name = "viaturas", description = "Vehicle registry and trips"),
        (name = "materiais", description = "Material registry"),
        (name = "movimentos", description = "Movement ledger operations"),
        (name = "relatorios", description = "Reports and dashboard summary")
    ),
    paths(
        // Auth
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::refresh,
        crate::handlers::auth::me,

        // Sites
        crate::handlers::sites::list_sites,
        crate::handlers::sites::create_site,
        crate::handlers::sites::get_site,
        crate::handlers::sites::update_site,
        crate::handlers::sites::delete_site,
        crate::handlers::sites::get_site_resources,

        // Equipment
        crate::handlers::equipment::list_equipment,
        crate::handlers::equipment::create_equipment,
        crate::handlers::equipment::get_equipment,
        crate::handlers::equipment::update_equipment,
        crate::handlers::equipment::delete_equipment,
        crate::handlers::equipment::set_equipment_maintenance,

        // Vehicles
        crate::handlers::vehicles::list_vehicles,
        crate::handlers::vehicles::create_vehicle,
        crate::handlers::vehicles::get_vehicle,
        crate::handlers::vehicles::update_vehicle,
        crate::handlers::vehicles::delete_vehicle,
        crate::handlers::vehicles::set_vehicle_maintenance,
        crate::handlers::vehicles::record_trip,

        // Materials
        crate::handlers::materials::list_materials,
        crate::handlers::materials::create_material,
        crate::handlers::materials::get_material,
        crate::handlers::materials::update_material,
        crate::handlers::materials::delete_material,

        // Ledger
        crate::handlers::movements::assign_resource,
        crate::handlers::movements::return_resource,
        crate::handlers::movements::move_stock,
        crate::handlers::movements::list_stock_movements,
        crate::handlers::movements::list_vehicle_trips,

        // Reports
        crate::handlers::reports::movements_report,
        crate::handlers::reports::stock_report,
        crate::handlers::reports::alerts_report,
        crate::handlers::reports::maintenance_report,
        crate::handlers::reports::utilization_report,
        crate::handlers::reports::site_report,
        crate::handlers::reports::summary,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,

            crate::auth::RegisterRequest,
            crate::auth::LoginRequest,
            crate::auth::RefreshRequest,
            crate::auth::TokenPair,
            crate::auth::UserProfile,

            crate::entities::site::Model,
            crate::entities::site::SiteState,
            crate::entities::equipment::Model,
            crate::entities::vehicle::Model,
            crate::entities::material::Model,
            crate::entities::movement::Model,
            crate::entities::movement::ResourceType,
            crate::entities::movement::MovementKind,
            crate::entities::stock_movement::Model,
            crate::entities::stock_movement::StockDirection,
            crate::entities::vehicle_trip::Model,

            crate::services::registry::CreateSite,
            crate::services::registry::UpdateSite,
            crate::services::registry::CreateEquipment,
            crate::services::registry::UpdateEquipment,
            crate::services::registry::CreateVehicle,
            crate::services::registry::UpdateVehicle,
            crate::services::registry::CreateMaterial,
            crate::services::registry::UpdateMaterial,

            crate::handlers::equipment::MaintenanceRequest,
            crate::handlers::vehicles::RecordTripRequest,
            crate::handlers::movements::AssignRequest,
            crate::handlers::movements::ReturnRequest,
            crate::handlers::movements::StockMoveRequest,
            crate::handlers::movements::StockMoveResponse,

            crate::services::alerts::Alert,
            crate::services::alerts::AlertKind,
            crate::services::reports::MovementsReport,
            crate::services::reports::StockReport,
            crate::services::reports::StockReportRow,
            crate::services::reports::SiteReport,
            crate::services::reports::MaterialConsumption,
            crate::services::reports::MaintenanceReport,
            crate::services::reports::UtilizationReport,
            crate::services::reports::UtilizationBucket,
            crate::services::reports::MostMovedResource,
            crate::services::reports::DashboardSummary,

            crate::errors::ErrorResponse
        )
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDocV1;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
