use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Which registry a movement refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Equipamento,
    Viatura,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Equipamento => "equipamento",
            ResourceType::Viatura => "viatura",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "equipamento" => Some(ResourceType::Equipamento),
            "viatura" => Some(ResourceType::Viatura),
            _ => None,
        }
    }
}

/// Direction of a resource movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Atribuicao,
    Devolucao,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Atribuicao => "atribuicao",
            MovementKind::Devolucao => "devolucao",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "atribuicao" => Some(MovementKind::Atribuicao),
            "devolucao" => Some(MovementKind::Devolucao),
            _ => None,
        }
    }
}

/// One immutable entry in the resource movement ledger. For assignments
/// `obra_id` is the destination site; for returns it is the site the
/// resource came back from.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "movimentos_ativos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Stored as string, converted through ResourceType
    pub resource_type: String,
    pub resource_id: Uuid,
    /// Stored as string, converted through MovementKind
    pub kind: String,
    pub obra_id: Uuid,
    pub actor: Option<String>,
    pub notas: Option<String>,
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
