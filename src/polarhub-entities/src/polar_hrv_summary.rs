use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Five-minute HRV summary over artifact-corrected intervals, keyed by the
/// window's end timestamp.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "polar_hrv_summary")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub device: String,
    pub posture: Option<String>,
    /// Epoch milliseconds, always a multiple of the summary interval.
    pub time: i64,
    pub rmssd: f64,
    pub sdnn: f64,
    pub pnn50: f64,
    pub heart_rate: f64,
    pub sample_count: i32,
    pub artifact_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
