use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StockDirection {
    Entrada,
    Saida,
}

impl StockDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockDirection::Entrada => "entrada",
            StockDirection::Saida => "saida",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "entrada" => Some(StockDirection::Entrada),
            "saida" => Some(StockDirection::Saida),
            _ => None,
        }
    }
}

/// One immutable entry in the stock ledger. `previous_stock` and
/// `new_stock` capture the material balance around this movement so the
/// log can be audited without replaying it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "movimentos_stock")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub material_id: Uuid,
    /// Stored as string, converted through StockDirection
    pub direcao: String,
    pub quantidade: Decimal,
    pub obra_id: Option<Uuid>,
    pub actor: Option<String>,
    pub notas: Option<String>,
    pub previous_stock: Decimal,
    pub new_stock: Decimal,
    pub created_at: DateTime<Utc>,
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
