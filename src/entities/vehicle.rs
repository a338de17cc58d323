use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A company vehicle. Carries the deadline dates the alert evaluator
/// watches (inspection, insurance, next service) and the odometer driven
/// forward by recorded trips.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "viaturas")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub matricula: String,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub combustivel: String,
    pub ativo: bool,
    pub em_manutencao: bool,
    pub motivo_manutencao: Option<String>,
    pub obra_id: Option<Uuid>,
    pub kms_atual: i64,
    pub proxima_revisao_kms: Option<i64>,
    pub data_vistoria: Option<NaiveDate>,
    pub data_seguro: Option<NaiveDate>,
    pub data_proxima_revisao: Option<NaiveDate>,
    pub apolice_seguro: Option<String>,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Model {
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
