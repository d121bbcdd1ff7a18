use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-beat HRV over the live 60-beat window, keyed by the last beat's
/// timestamp.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "polar_realtime")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub device: String,
    /// Epoch milliseconds.
    pub time: i64,
    pub rmssd: f64,
    pub sdnn: f64,
    pub pnn50: f64,
    pub hr: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
