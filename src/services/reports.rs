use crate::{
    db::DbPool,
    entities::{
        equipment::{self, Entity as Equipment},
        material::{self, Entity as Material},
        movement::{self, Entity as Movement, ResourceType},
        site::{self, Entity as Site},
        stock_movement::{self, Entity as StockMovement, StockDirection},
        vehicle::{self, Entity as Vehicle},
        vehicle_trip::{self, Entity as VehicleTrip},
    },
    errors::ServiceError,
    services::alerts::{self, Alert},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

/// Filters accepted by the movements report. An explicit date range wins
/// over mes/ano when both are present.
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub obra_id: Option<Uuid>,
    pub tipo_recurso: Option<ResourceType>,
    pub mes: Option<u32>,
    pub ano: Option<i32>,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MovementsReport {
    pub total: u64,
    pub por_tipo: HashMap<String, u64>,
    pub por_recurso: HashMap<String, u64>,
    pub movimentos: Vec<movement::Model>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StockReportRow {
    pub material_id: Uuid,
    pub codigo: String,
    pub descricao: String,
    pub unidade: String,
    pub stock_atual: Decimal,
    pub stock_minimo: Decimal,
    pub total_entradas: Decimal,
    pub total_saidas: Decimal,
    pub abaixo_minimo: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StockReport {
    pub total_materiais: u64,
    pub abaixo_minimo: u64,
    pub materiais: Vec<StockReportRow>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MaterialConsumption {
    pub material_id: Uuid,
    pub codigo: String,
    pub descricao: String,
    pub unidade: String,
    pub total_consumido: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SiteReport {
    pub obra: site::Model,
    pub equipamentos: Vec<equipment::Model>,
    pub viaturas: Vec<vehicle::Model>,
    pub consumos: Vec<MaterialConsumption>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MaintenanceReport {
    pub equipamentos: Vec<equipment::Model>,
    pub viaturas: Vec<vehicle::Model>,
    pub alertas_revisao: Vec<Alert>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UtilizationBucket {
    pub total: u64,
    pub em_armazem: u64,
    pub em_obra: u64,
    pub em_manutencao: u64,
    /// Fraction of active resources currently at a site
    pub taxa_utilizacao: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MostMovedResource {
    pub resource_type: String,
    pub resource_id: Uuid,
    pub identificador: String,
    pub movimentos: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UtilizationReport {
    pub equipamentos: UtilizationBucket,
    pub viaturas: UtilizationBucket,
    pub mais_movimentados: Vec<MostMovedResource>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardSummary {
    pub obras: HashMap<String, u64>,
    pub equipamentos: UtilizationBucket,
    pub viaturas: UtilizationBucket,
    pub total_materiais: u64,
    pub materiais_abaixo_minimo: u64,
    pub movimentos_hoje: u64,
    pub alertas: Vec<Alert>,
    pub alertas_urgentes: u64,
}

/// Read-only aggregation over the registry and the movement ledgers.
pub struct ReportService {
    db_pool: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Resolves a movement filter to a concrete UTC range, if any.
    fn resolve_range(
        filter: &MovementFilter,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, ServiceError> {
        if filter.data_inicio.is_some() || filter.data_fim.is_some() {
            let start = filter
                .data_inicio
                .unwrap_or(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
            let end = filter
                .data_fim
                .unwrap_or(NaiveDate::from_ymd_opt(9999, 12, 31).unwrap());
            if end < start {
                return Err(ServiceError::ValidationError(
                    "data_fim must not be before data_inicio".to_string(),
                ));
            }
            return Ok(Some((
                start.and_hms_opt(0, 0, 0).unwrap().and_utc(),
                end.succ_opt()
                    .unwrap_or(end)
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    .and_utc(),
            )));
        }

        match (filter.mes, filter.ano) {
            (Some(mes), Some(ano)) => {
                let start = NaiveDate::from_ymd_opt(ano, mes, 1).ok_or_else(|| {
                    ServiceError::ValidationError(format!("Invalid month {}/{}", mes, ano))
                })?;
                let end = if mes == 12 {
                    NaiveDate::from_ymd_opt(ano + 1, 1, 1).unwrap()
                } else {
                    NaiveDate::from_ymd_opt(ano, mes + 1, 1).unwrap()
                };
                Ok(Some((
                    start.and_hms_opt(0, 0, 0).unwrap().and_utc(),
                    end.and_hms_opt(0, 0, 0).unwrap().and_utc(),
                )))
            }
            (None, None) => Ok(None),
            _ => Err(ServiceError::ValidationError(
                "mes and ano must be provided together".to_string(),
            )),
        }
    }

    /// Movement history with totals per kind and per resource type.
    #[instrument(skip(self))]
    pub async fn generate_movements_report(
        &self,
        filter: MovementFilter,
    ) -> Result<MovementsReport, ServiceError> {
        let db = &*self.db_pool;

        let mut query = Movement::find().order_by_desc(movement::Column::CreatedAt);
        if let Some(obra_id) = filter.obra_id {
            query = query.filter(movement::Column::ObraId.eq(obra_id));
        }
        if let Some(tipo) = filter.tipo_recurso {
            query = query.filter(movement::Column::ResourceType.eq(tipo.as_str()));
        }
        if let Some((start, end)) = Self::resolve_range(&filter)? {
            query = query
                .filter(movement::Column::CreatedAt.gte(start))
                .filter(movement::Column::CreatedAt.lt(end));
        }

        let movimentos = query.all(db).await.map_err(ServiceError::db_error)?;

        let mut por_tipo: HashMap<String, u64> = HashMap::new();
        let mut por_recurso: HashMap<String, u64> = HashMap::new();
        for m in &movimentos {
            *por_tipo.entry(m.kind.clone()).or_insert(0) += 1;
            *por_recurso.entry(m.resource_type.clone()).or_insert(0) += 1;
        }

        Ok(MovementsReport {
            total: movimentos.len() as u64,
            por_tipo,
            por_recurso,
            movimentos,
        })
    }

    /// Raw stock ledger rows, newest first.
    pub async fn list_stock_movements(
        &self,
        material_id: Option<Uuid>,
        obra_id: Option<Uuid>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_movement::Model>, u64), ServiceError> {
        let db = &*self.db_pool;

        let mut query = StockMovement::find().order_by_desc(stock_movement::Column::CreatedAt);
        if let Some(material_id) = material_id {
            query = query.filter(stock_movement::Column::MaterialId.eq(material_id));
        }
        if let Some(obra_id) = obra_id {
            query = query.filter(stock_movement::Column::ObraId.eq(obra_id));
        }

        let paginator = query.paginate(db, limit);
        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items, total))
    }

    /// Recorded vehicle trips, newest first.
    pub async fn list_vehicle_trips(
        &self,
        vehicle_id: Option<Uuid>,
        obra_id: Option<Uuid>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<vehicle_trip::Model>, u64), ServiceError> {
        let db = &*self.db_pool;

        let mut query = VehicleTrip::find().order_by_desc(vehicle_trip::Column::CreatedAt);
        if let Some(vehicle_id) = vehicle_id {
            query = query.filter(vehicle_trip::Column::VehicleId.eq(vehicle_id));
        }
        if let Some(obra_id) = obra_id {
            query = query.filter(vehicle_trip::Column::ObraId.eq(obra_id));
        }

        let paginator = query.paginate(db, limit);
        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items, total))
    }

    /// Per-material balances with entrada/saida totals over an optional range.
    #[instrument(skip(self))]
    pub async fn generate_stock_report(
        &self,
        data_inicio: Option<NaiveDate>,
        data_fim: Option<NaiveDate>,
    ) -> Result<StockReport, ServiceError> {
        let db = &*self.db_pool;

        let materiais = Material::find()
            .filter(material::Column::Ativo.eq(true))
            .order_by_asc(material::Column::Codigo)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let range = Self::resolve_range(&MovementFilter {
            data_inicio,
            data_fim,
            ..Default::default()
        })?;

        let mut query = StockMovement::find();
        if let Some((start, end)) = range {
            query = query
                .filter(stock_movement::Column::CreatedAt.gte(start))
                .filter(stock_movement::Column::CreatedAt.lt(end));
        }
        let stock_moves = query.all(db).await.map_err(ServiceError::db_error)?;

        let mut entradas: HashMap<Uuid, Decimal> = HashMap::new();
        let mut saidas: HashMap<Uuid, Decimal> = HashMap::new();
        for m in &stock_moves {
            let bucket = match StockDirection::from_str(&m.direcao) {
                Some(StockDirection::Entrada) => &mut entradas,
                Some(StockDirection::Saida) => &mut saidas,
                None => continue,
            };
            *bucket.entry(m.material_id).or_insert(Decimal::ZERO) += m.quantidade;
        }

        let rows: Vec<StockReportRow> = materiais
            .iter()
            .map(|m| StockReportRow {
                material_id: m.id,
                codigo: m.codigo.clone(),
                descricao: m.descricao.clone(),
                unidade: m.unidade.clone(),
                stock_atual: m.stock_atual,
                stock_minimo: m.stock_minimo,
                total_entradas: entradas.get(&m.id).copied().unwrap_or(Decimal::ZERO),
                total_saidas: saidas.get(&m.id).copied().unwrap_or(Decimal::ZERO),
                abaixo_minimo: m.is_below_minimum(),
            })
            .collect();

        let abaixo_minimo = rows.iter().filter(|r| r.abaixo_minimo).count() as u64;

        Ok(StockReport {
            total_materiais: rows.len() as u64,
            abaixo_minimo,
            materiais: rows,
        })
    }

    /// Snapshot of one site: assigned resources and material consumption.
    #[instrument(skip(self))]
    pub async fn generate_site_report(&self, obra_id: Uuid) -> Result<SiteReport, ServiceError> {
        let db = &*self.db_pool;

        let obra = Site::find_by_id(obra_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Obra {} not found", obra_id)))?;

        let equipamentos = Equipment::find()
            .filter(equipment::Column::ObraId.eq(obra_id))
            .order_by_asc(equipment::Column::Codigo)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let viaturas = Vehicle::find()
            .filter(vehicle::Column::ObraId.eq(obra_id))
            .order_by_asc(vehicle::Column::Matricula)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let saidas = StockMovement::find()
            .filter(stock_movement::Column::ObraId.eq(obra_id))
            .filter(stock_movement::Column::Direcao.eq(StockDirection::Saida.as_str()))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut consumo_por_material: HashMap<Uuid, Decimal> = HashMap::new();
        for m in &saidas {
            *consumo_por_material
                .entry(m.material_id)
                .or_insert(Decimal::ZERO) += m.quantidade;
        }

        let mut consumos = Vec::with_capacity(consumo_por_material.len());
        for (material_id, total) in consumo_por_material {
            if let Some(mat) = Material::find_by_id(material_id)
                .one(db)
                .await
                .map_err(ServiceError::db_error)?
            {
                consumos.push(MaterialConsumption {
                    material_id,
                    codigo: mat.codigo,
                    descricao: mat.descricao,
                    unidade: mat.unidade,
                    total_consumido: total,
                });
            }
        }
        consumos.sort_by(|a, b| a.codigo.cmp(&b.codigo));

        Ok(SiteReport {
            obra,
            equipamentos,
            viaturas,
            consumos,
        })
    }

    /// Everything currently flagged for maintenance plus the service
    /// deadlines already urgent or past.
    #[instrument(skip(self))]
    pub async fn generate_maintenance_report(&self) -> Result<MaintenanceReport, ServiceError> {
        let db = &*self.db_pool;

        let equipamentos = Equipment::find()
            .filter(equipment::Column::Ativo.eq(true))
            .filter(equipment::Column::EmManutencao.eq(true))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let viaturas_manutencao = Vehicle::find()
            .filter(vehicle::Column::Ativo.eq(true))
            .filter(vehicle::Column::EmManutencao.eq(true))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let all_vehicles = Vehicle::find()
            .filter(vehicle::Column::Ativo.eq(true))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let today = Utc::now().date_naive();
        let alertas_revisao: Vec<Alert> = all_vehicles
            .iter()
            .flat_map(|v| alerts::evaluate_vehicle(v, today))
            .filter(|a| {
                matches!(
                    a.tipo,
                    alerts::AlertKind::Revisao | alerts::AlertKind::RevisaoKms
                ) && (a.urgente || a.expirado)
            })
            .collect();

        Ok(MaintenanceReport {
            equipamentos,
            viaturas: viaturas_manutencao,
            alertas_revisao,
        })
    }

    /// Fleet/equipment utilization and the most moved resources.
    #[instrument(skip(self))]
    pub async fn generate_utilization_report(
        &self,
        filter: MovementFilter,
    ) -> Result<UtilizationReport, ServiceError> {
        let db = &*self.db_pool;

        let equipamentos = Equipment::find()
            .filter(equipment::Column::Ativo.eq(true))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let viaturas = Vehicle::find()
            .filter(vehicle::Column::Ativo.eq(true))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let equipment_bucket = bucket(
            equipamentos.len() as u64,
            equipamentos.iter().filter(|e| e.obra_id.is_some()).count() as u64,
            equipamentos.iter().filter(|e| e.em_manutencao).count() as u64,
        );
        let vehicle_bucket = bucket(
            viaturas.len() as u64,
            viaturas.iter().filter(|v| v.obra_id.is_some()).count() as u64,
            viaturas.iter().filter(|v| v.em_manutencao).count() as u64,
        );

        let mut query = Movement::find();
        if let Some((start, end)) = Self::resolve_range(&filter)? {
            query = query
                .filter(movement::Column::CreatedAt.gte(start))
                .filter(movement::Column::CreatedAt.lt(end));
        }
        let movimentos = query.all(db).await.map_err(ServiceError::db_error)?;

        let mut counts: HashMap<(String, Uuid), u64> = HashMap::new();
        for m in &movimentos {
            *counts
                .entry((m.resource_type.clone(), m.resource_id))
                .or_insert(0) += 1;
        }

        let equipment_codes: HashMap<Uuid, String> = equipamentos
            .iter()
            .map(|e| (e.id, e.codigo.clone()))
            .collect();
        let vehicle_plates: HashMap<Uuid, String> = viaturas
            .iter()
            .map(|v| (v.id, v.matricula.clone()))
            .collect();

        let mut mais_movimentados: Vec<MostMovedResource> = counts
            .into_iter()
            .map(|((resource_type, resource_id), movimentos)| {
                let identificador = match ResourceType::from_str(&resource_type) {
                    Some(ResourceType::Equipamento) => equipment_codes.get(&resource_id).cloned(),
                    Some(ResourceType::Viatura) => vehicle_plates.get(&resource_id).cloned(),
                    None => None,
                }
                .unwrap_or_else(|| resource_id.to_string());
                MostMovedResource {
                    resource_type,
                    resource_id,
                    identificador,
                    movimentos,
                }
            })
            .collect();
        mais_movimentados.sort_by(|a, b| b.movimentos.cmp(&a.movimentos));
        mais_movimentados.truncate(5);

        Ok(UtilizationReport {
            equipamentos: equipment_bucket,
            viaturas: vehicle_bucket,
            mais_movimentados,
        })
    }

    /// Dashboard summary: counts, today's activity and the full alert sweep.
    #[instrument(skip(self))]
    /// Full alert sweep over active vehicles and materials, the same list
    /// the dashboard summary embeds.
    pub async fn generate_alerts(&self) -> Result<Vec<Alert>, ServiceError> {
        let db = &*self.db_pool;

        let viaturas = Vehicle::find()
            .filter(vehicle::Column::Ativo.eq(true))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let materiais = Material::find()
            .filter(material::Column::Ativo.eq(true))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(alerts::evaluate_all(
            &viaturas,
            &materiais,
            Utc::now().date_naive(),
        ))
    }

    pub async fn generate_summary(&self) -> Result<DashboardSummary, ServiceError> {
        let db = &*self.db_pool;

        let obras = Site::find().all(db).await.map_err(ServiceError::db_error)?;
        let mut obras_por_estado: HashMap<String, u64> = HashMap::new();
        for o in &obras {
            *obras_por_estado.entry(o.estado.clone()).or_insert(0) += 1;
        }

        let equipamentos = Equipment::find()
            .filter(equipment::Column::Ativo.eq(true))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let viaturas = Vehicle::find()
            .filter(vehicle::Column::Ativo.eq(true))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let materiais = Material::find()
            .filter(material::Column::Ativo.eq(true))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let today = Utc::now().date_naive();
        let day_start = today.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let movimentos_hoje = Movement::find()
            .filter(movement::Column::CreatedAt.gte(day_start))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?
            + StockMovement::find()
                .filter(stock_movement::Column::CreatedAt.gte(day_start))
                .count(db)
                .await
                .map_err(ServiceError::db_error)?;

        let alertas = alerts::evaluate_all(&viaturas, &materiais, today);
        let alertas_urgentes = alertas.iter().filter(|a| a.urgente).count() as u64;

        Ok(DashboardSummary {
            obras: obras_por_estado,
            equipamentos: bucket(
                equipamentos.len() as u64,
                equipamentos.iter().filter(|e| e.obra_id.is_some()).count() as u64,
                equipamentos.iter().filter(|e| e.em_manutencao).count() as u64,
            ),
            viaturas: bucket(
                viaturas.len() as u64,
                viaturas.iter().filter(|v| v.obra_id.is_some()).count() as u64,
                viaturas.iter().filter(|v| v.em_manutencao).count() as u64,
            ),
            total_materiais: materiais.len() as u64,
            materiais_abaixo_minimo: materiais.iter().filter(|m| m.is_below_minimum()).count()
                as u64,
            movimentos_hoje,
            alertas,
            alertas_urgentes,
        })
    }
}

fn bucket(total: u64, em_obra: u64, em_manutencao: u64) -> UtilizationBucket {
    UtilizationBucket {
        total,
        em_armazem: total.saturating_sub(em_obra),
        em_obra,
        em_manutencao,
        taxa_utilizacao: if total == 0 {
            0.0
        } else {
            em_obra as f64 / total as f64
        },
    }
}
