use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A consumable material tracked by quantity. `stock_atual` is the
/// materialized fold of the stock movement log and never goes negative.
/// A `stock_minimo` of zero disables the low-stock alert.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "materiais")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub codigo: String,
    pub descricao: String,
    pub unidade: String,
    pub stock_atual: Decimal,
    pub stock_minimo: Decimal,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn is_below_minimum(&self) -> bool {
        self.stock_minimo > Decimal::ZERO && self.stock_atual <= self.stock_minimo
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
