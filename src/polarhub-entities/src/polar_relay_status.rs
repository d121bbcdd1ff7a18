use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Relay lifecycle event from the persistence allow-list.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "polar_relay_status")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Epoch milliseconds.
    pub time: i64,
    pub category: String,
    pub event: String,
    pub source: Option<String>,
    pub device: Option<String>,
    pub fields: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
