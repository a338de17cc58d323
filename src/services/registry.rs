use crate::{
    db::DbPool,
    entities::{
        equipment::{self, Entity as Equipment},
        material::{self, Entity as Material},
        site::{self, Entity as Site, SiteState},
        vehicle::{self, Entity as Vehicle},
    },
    errors::ServiceError,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSite {
    #[validate(length(min = 1))]
    pub codigo: String,
    #[validate(length(min = 1))]
    pub nome: String,
    pub endereco: Option<String>,
    pub cliente: Option<String>,
    pub estado: Option<SiteState>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateSite {
    pub nome: Option<String>,
    pub endereco: Option<String>,
    pub cliente: Option<String>,
    pub estado: Option<SiteState>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateEquipment {
    #[validate(length(min = 1))]
    pub codigo: String,
    #[validate(length(min = 1))]
    pub descricao: String,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub categoria: Option<String>,
    pub numero_serie: Option<String>,
    pub estado_conservacao: Option<String>,
    pub responsavel: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateEquipment {
    pub descricao: Option<String>,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub categoria: Option<String>,
    pub numero_serie: Option<String>,
    pub estado_conservacao: Option<String>,
    pub responsavel: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateVehicle {
    #[validate(length(min = 1))]
    pub matricula: String,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub combustivel: Option<String>,
    pub kms_atual: Option<i64>,
    pub proxima_revisao_kms: Option<i64>,
    pub data_vistoria: Option<NaiveDate>,
    pub data_seguro: Option<NaiveDate>,
    pub data_proxima_revisao: Option<NaiveDate>,
    pub apolice_seguro: Option<String>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateVehicle {
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub combustivel: Option<String>,
    pub proxima_revisao_kms: Option<i64>,
    pub data_vistoria: Option<NaiveDate>,
    pub data_seguro: Option<NaiveDate>,
    pub data_proxima_revisao: Option<NaiveDate>,
    pub apolice_seguro: Option<String>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMaterial {
    #[validate(length(min = 1))]
    pub codigo: String,
    #[validate(length(min = 1))]
    pub descricao: String,
    pub unidade: Option<String>,
    pub stock_minimo: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateMaterial {
    pub descricao: Option<String>,
    pub unidade: Option<String>,
    pub stock_minimo: Option<Decimal>,
}

/// Common list filters for registry resources
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    pub ativo: Option<bool>,
    pub obra_id: Option<Uuid>,
    pub em_manutencao: Option<bool>,
}

/// CRUD over sites, equipment, vehicles and materials.
///
/// Location and stock state never change here; those mutations go through
/// the ledger. Business codes are immutable after creation.
pub struct RegistryService {
    db_pool: Arc<DbPool>,
}

impl RegistryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    // ===== Sites =====

    pub async fn create_site(&self, input: CreateSite) -> Result<site::Model, ServiceError> {
        input.validate()?;
        let db = self.db_pool.as_ref();

        let existing = Site::find()
            .filter(site::Column::Codigo.eq(input.codigo.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Obra with codigo {} already exists",
                input.codigo
            )));
        }

        let estado = input.estado.unwrap_or(SiteState::Ativa);
        let model = site::ActiveModel {
            id: Set(Uuid::new_v4()),
            codigo: Set(input.codigo),
            nome: Set(input.nome),
            endereco: Set(input.endereco),
            cliente: Set(input.cliente),
            estado: Set(estado.as_str().to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(ServiceError::db_error)?;

        info!(obra_id = %model.id, codigo = %model.codigo, "Created obra");
        Ok(model)
    }

    pub async fn get_site(&self, id: Uuid) -> Result<site::Model, ServiceError> {
        Site::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Obra {} not found", id)))
    }

    pub async fn list_sites(
        &self,
        estado: Option<SiteState>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<site::Model>, u64), ServiceError> {
        let db = self.db_pool.as_ref();
        let mut query = Site::find().order_by_desc(site::Column::CreatedAt);
        if let Some(estado) = estado {
            query = query.filter(site::Column::Estado.eq(estado.as_str()));
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

    pub async fn update_site(
        &self,
        id: Uuid,
        input: UpdateSite,
    ) -> Result<site::Model, ServiceError> {
        input.validate()?;
        let existing = self.get_site(id).await?;

        let mut active: site::ActiveModel = existing.into();
        if let Some(nome) = input.nome {
            active.nome = Set(nome);
        }
        if let Some(endereco) = input.endereco {
            active.endereco = Set(Some(endereco));
        }
        if let Some(cliente) = input.cliente {
            active.cliente = Set(Some(cliente));
        }
        if let Some(estado) = input.estado {
            active.estado = Set(estado.as_str().to_string());
        }

        active
            .update(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Deletes a site. Refused while any resource is still assigned to it;
    /// ledger history referencing the site is kept.
    pub async fn delete_site(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = self.get_site(id).await?;

        let assigned_equipment = Equipment::find()
            .filter(equipment::Column::ObraId.eq(id))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;
        let assigned_vehicles = Vehicle::find()
            .filter(vehicle::Column::ObraId.eq(id))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;
        if assigned_equipment + assigned_vehicles > 0 {
            return Err(ServiceError::Conflict(format!(
                "Obra {} still has {} resource(s) assigned",
                existing.codigo,
                assigned_equipment + assigned_vehicles
            )));
        }

        Site::delete_by_id(id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;
        info!(obra_id = %id, "Deleted obra");
        Ok(())
    }

    // ===== Equipment =====

    pub async fn create_equipment(
        &self,
        input: CreateEquipment,
    ) -> Result<equipment::Model, ServiceError> {
        input.validate()?;
        let db = self.db_pool.as_ref();

        let existing = Equipment::find()
            .filter(equipment::Column::Codigo.eq(input.codigo.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Equipamento with codigo {} already exists",
                input.codigo
            )));
        }

        let model = equipment::ActiveModel {
            id: Set(Uuid::new_v4()),
            codigo: Set(input.codigo),
            descricao: Set(input.descricao),
            marca: Set(input.marca),
            modelo: Set(input.modelo),
            categoria: Set(input.categoria),
            numero_serie: Set(input.numero_serie),
            estado_conservacao: Set(input.estado_conservacao),
            responsavel: Set(input.responsavel),
            ativo: Set(true),
            em_manutencao: Set(false),
            motivo_manutencao: Set(None),
            obra_id: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(ServiceError::db_error)?;

        info!(equipment_id = %model.id, codigo = %model.codigo, "Created equipamento");
        Ok(model)
    }

    pub async fn get_equipment(&self, id: Uuid) -> Result<equipment::Model, ServiceError> {
        Equipment::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Equipamento {} not found", id)))
    }

    pub async fn list_equipment(
        &self,
        filter: ResourceFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<equipment::Model>, u64), ServiceError> {
        let db = self.db_pool.as_ref();
        let mut query = Equipment::find().order_by_desc(equipment::Column::CreatedAt);
        if let Some(ativo) = filter.ativo {
            query = query.filter(equipment::Column::Ativo.eq(ativo));
        }
        if let Some(obra_id) = filter.obra_id {
            query = query.filter(equipment::Column::ObraId.eq(obra_id));
        }
        if let Some(em_manutencao) = filter.em_manutencao {
            query = query.filter(equipment::Column::EmManutencao.eq(em_manutencao));
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

    pub async fn update_equipment(
        &self,
        id: Uuid,
        input: UpdateEquipment,
    ) -> Result<equipment::Model, ServiceError> {
        input.validate()?;
        let existing = self.get_equipment(id).await?;

        let mut active: equipment::ActiveModel = existing.into();
        if let Some(descricao) = input.descricao {
            active.descricao = Set(descricao);
        }
        if let Some(marca) = input.marca {
            active.marca = Set(Some(marca));
        }
        if let Some(modelo) = input.modelo {
            active.modelo = Set(Some(modelo));
        }
        if let Some(categoria) = input.categoria {
            active.categoria = Set(Some(categoria));
        }
        if let Some(numero_serie) = input.numero_serie {
            active.numero_serie = Set(Some(numero_serie));
        }
        if let Some(estado_conservacao) = input.estado_conservacao {
            active.estado_conservacao = Set(Some(estado_conservacao));
        }
        if let Some(responsavel) = input.responsavel {
            active.responsavel = Set(Some(responsavel));
        }

        active
            .update(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Soft delete. Refused while the item is assigned to a site.
    pub async fn delete_equipment(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_equipment(id).await?;
        if let Some(obra_id) = existing.obra_id {
            return Err(ServiceError::Conflict(format!(
                "Equipamento {} is assigned to obra {}; return it first",
                existing.codigo, obra_id
            )));
        }

        let mut active: equipment::ActiveModel = existing.into();
        active.ativo = Set(false);
        active
            .update(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        info!(equipment_id = %id, "Deactivated equipamento");
        Ok(())
    }

    // ===== Vehicles =====

    pub async fn create_vehicle(
        &self,
        input: CreateVehicle,
    ) -> Result<vehicle::Model, ServiceError> {
        input.validate()?;
        let db = self.db_pool.as_ref();

        let existing = Vehicle::find()
            .filter(vehicle::Column::Matricula.eq(input.matricula.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Viatura with matricula {} already exists",
                input.matricula
            )));
        }

        let model = vehicle::ActiveModel {
            id: Set(Uuid::new_v4()),
            matricula: Set(input.matricula),
            marca: Set(input.marca),
            modelo: Set(input.modelo),
            combustivel: Set(input.combustivel.unwrap_or_else(|| "Gasoleo".to_string())),
            ativo: Set(true),
            em_manutencao: Set(false),
            motivo_manutencao: Set(None),
            obra_id: Set(None),
            kms_atual: Set(input.kms_atual.unwrap_or(0)),
            proxima_revisao_kms: Set(input.proxima_revisao_kms),
            data_vistoria: Set(input.data_vistoria),
            data_seguro: Set(input.data_seguro),
            data_proxima_revisao: Set(input.data_proxima_revisao),
            apolice_seguro: Set(input.apolice_seguro),
            observacoes: Set(input.observacoes),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(ServiceError::db_error)?;

        info!(vehicle_id = %model.id, matricula = %model.matricula, "Created viatura");
        Ok(model)
    }

    pub async fn get_vehicle(&self, id: Uuid) -> Result<vehicle::Model, ServiceError> {
        Vehicle::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Viatura {} not found", id)))
    }

    pub async fn list_vehicles(
        &self,
        filter: ResourceFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<vehicle::Model>, u64), ServiceError> {
        let db = self.db_pool.as_ref();
        let mut query = Vehicle::find().order_by_desc(vehicle::Column::CreatedAt);
        if let Some(ativo) = filter.ativo {
            query = query.filter(vehicle::Column::Ativo.eq(ativo));
        }
        if let Some(obra_id) = filter.obra_id {
            query = query.filter(vehicle::Column::ObraId.eq(obra_id));
        }
        if let Some(em_manutencao) = filter.em_manutencao {
            query = query.filter(vehicle::Column::EmManutencao.eq(em_manutencao));
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

    pub async fn update_vehicle(
        &self,
        id: Uuid,
        input: UpdateVehicle,
    ) -> Result<vehicle::Model, ServiceError> {
        input.validate()?;
        let existing = self.get_vehicle(id).await?;

        let mut active: vehicle::ActiveModel = existing.into();
        if let Some(marca) = input.marca {
            active.marca = Set(Some(marca));
        }
        if let Some(modelo) = input.modelo {
            active.modelo = Set(Some(modelo));
        }
        if let Some(combustivel) = input.combustivel {
            active.combustivel = Set(combustivel);
        }
        if let Some(proxima_revisao_kms) = input.proxima_revisao_kms {
            active.proxima_revisao_kms = Set(Some(proxima_revisao_kms));
        }
        if let Some(data_vistoria) = input.data_vistoria {
            active.data_vistoria = Set(Some(data_vistoria));
        }
        if let Some(data_seguro) = input.data_seguro {
            active.data_seguro = Set(Some(data_seguro));
        }
        if let Some(data_proxima_revisao) = input.data_proxima_revisao {
            active.data_proxima_revisao = Set(Some(data_proxima_revisao));
        }
        if let Some(apolice_seguro) = input.apolice_seguro {
            active.apolice_seguro = Set(Some(apolice_seguro));
        }
        if let Some(observacoes) = input.observacoes {
            active.observacoes = Set(Some(observacoes));
        }

        active
            .update(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Soft delete. Refused while the vehicle is assigned to a site.
    pub async fn delete_vehicle(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_vehicle(id).await?;
        if let Some(obra_id) = existing.obra_id {
            return Err(ServiceError::Conflict(format!(
                "Viatura {} is assigned to obra {}; return it first",
                existing.matricula, obra_id
            )));
        }

        let mut active: vehicle::ActiveModel = existing.into();
        active.ativo = Set(false);
        active
            .update(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        info!(vehicle_id = %id, "Deactivated viatura");
        Ok(())
    }

    // ===== Materials =====

    /// Materials start with zero stock; the balance only moves through the
    /// stock ledger so the movement log always replays to the current value.
    pub async fn create_material(
        &self,
        input: CreateMaterial,
    ) -> Result<material::Model, ServiceError> {
        input.validate()?;
        let db = self.db_pool.as_ref();

        if let Some(minimo) = input.stock_minimo {
            if minimo < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "stock_minimo cannot be negative".to_string(),
                ));
            }
        }

        let existing = Material::find()
            .filter(material::Column::Codigo.eq(input.codigo.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Material with codigo {} already exists",
                input.codigo
            )));
        }

        let model = material::ActiveModel {
            id: Set(Uuid::new_v4()),
            codigo: Set(input.codigo),
            descricao: Set(input.descricao),
            unidade: Set(input.unidade.unwrap_or_else(|| "unidade".to_string())),
            stock_atual: Set(Decimal::ZERO),
            stock_minimo: Set(input.stock_minimo.unwrap_or(Decimal::ZERO)),
            ativo: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(ServiceError::db_error)?;

        info!(material_id = %model.id, codigo = %model.codigo, "Created material");
        Ok(model)
    }

    pub async fn get_material(&self, id: Uuid) -> Result<material::Model, ServiceError> {
        Material::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Material {} not found", id)))
    }

    pub async fn list_materials(
        &self,
        ativo: Option<bool>,
        below_minimum: bool,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<material::Model>, u64), ServiceError> {
        let db = self.db_pool.as_ref();
        let mut query = Material::find().order_by_desc(material::Column::CreatedAt);
        if let Some(ativo) = ativo {
            query = query.filter(material::Column::Ativo.eq(ativo));
        }

        if below_minimum {
            // Decimal comparison across columns is awkward in the query
            // builder; the dataset is small so filter in memory.
            let all = query.all(db).await.map_err(ServiceError::db_error)?;
            let filtered: Vec<material::Model> = all
                .into_iter()
                .filter(material::Model::is_below_minimum)
                .collect();
            let total = filtered.len() as u64;
            let start = ((page.saturating_sub(1)) * limit) as usize;
            let items = filtered.into_iter().skip(start).take(limit as usize).collect();
            return Ok((items, total));
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

    pub async fn update_material(
        &self,
        id: Uuid,
        input: UpdateMaterial,
    ) -> Result<material::Model, ServiceError> {
        input.validate()?;
        if let Some(minimo) = input.stock_minimo {
            if minimo < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "stock_minimo cannot be negative".to_string(),
                ));
            }
        }
        let existing = self.get_material(id).await?;

        let mut active: material::ActiveModel = existing.into();
        if let Some(descricao) = input.descricao {
            active.descricao = Set(descricao);
        }
        if let Some(unidade) = input.unidade {
            active.unidade = Set(unidade);
        }
        if let Some(stock_minimo) = input.stock_minimo {
            active.stock_minimo = Set(stock_minimo);
        }

        active
            .update(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Soft delete; the stock ledger keeps the material's history.
    pub async fn delete_material(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_material(id).await?;
        let mut active: material::ActiveModel = existing.into();
        active.ativo = Set(false);
        active
            .update(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        info!(material_id = %id, "Deactivated material");
        Ok(())
    }
}
