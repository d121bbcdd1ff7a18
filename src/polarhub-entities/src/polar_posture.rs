use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Posture transition relayed by the mobile client.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "polar_posture")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Epoch milliseconds.
    pub time: i64,
    pub from_posture: String,
    pub to_posture: String,
    pub source: Option<String>,
    pub from_duration_seconds: Option<f64>,
    pub confidence: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
