use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per received R-peak. `(device, time)` is unique; later writers
/// merge fields into the existing row. Synthetic beats inserted by the
/// post-processor have no `rr_interval`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "polar_raw")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub device: String,
    /// Epoch milliseconds.
    pub time: i64,
    pub rr_interval: Option<f64>,
    pub heart_rate: Option<f64>,
    pub source: Option<String>,
    pub path: Option<String>,
    pub rr_clean: Option<f64>,
    pub hr_clean: Option<f64>,
    pub artifact_type: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
