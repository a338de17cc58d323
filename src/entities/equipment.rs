use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A piece of company equipment (tools, machines, scaffolding).
///
/// `obra_id == None` means the item sits in the warehouse. The maintenance
/// flag is independent of location: an item can be flagged while at a site
/// and stays allocated there until it is explicitly returned.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "equipamentos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub codigo: String,
    pub descricao: String,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub categoria: Option<String>,
    pub numero_serie: Option<String>,
    pub estado_conservacao: Option<String>,
    pub responsavel: Option<String>,
    pub ativo: bool,
    pub em_manutencao: bool,
    pub motivo_manutencao: Option<String>,
    pub obra_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Model {
    /// In the warehouse and available for assignment.
    pub fn is_in_warehouse(&self) -> bool {
        self.obra_id.is_none()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.created_at {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}
