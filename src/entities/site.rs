use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle states of a construction site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SiteState {
    Ativa,
    Pausada,
    Concluida,
}

impl SiteState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteState::Ativa => "Ativa",
            SiteState::Pausada => "Pausada",
            SiteState::Concluida => "Concluida",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Ativa" => Some(SiteState::Ativa),
            "Pausada" => Some(SiteState::Pausada),
            "Concluida" => Some(SiteState::Concluida),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "obras")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub codigo: String,
    pub nome: String,
    pub endereco: Option<String>,
    pub cliente: Option<String>,
    /// Stored as string, converted through SiteState
    pub estado: String,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn state(&self) -> Option<SiteState> {
        SiteState::from_str(&self.estado)
    }

    pub fn is_active(&self) -> bool {
        self.state() == Some(SiteState::Ativa)
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
