use polarhub_entities::{polar_posture, polar_relay_status};
use sea_orm::{
    ActiveValue::{NotSet, Set},
    EntityTrait,
};

use crate::db::{with_deadline, DatabaseHandler};

#[derive(Clone, Debug, PartialEq)]
pub struct PostureRecord {
    pub time: i64,
    pub from_posture: String,
    pub to_posture: String,
    pub source: Option<String>,
    pub from_duration_seconds: Option<f64>,
    pub confidence: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatusRecord {
    pub time: i64,
    pub category: String,
    pub event: String,
    pub source: Option<String>,
    pub device: Option<String>,
    pub fields: Option<serde_json::Value>,
}

impl DatabaseHandler {
    pub async fn create_posture(&self, record: PostureRecord) -> anyhow::Result<()> {
        let model = polar_posture::ActiveModel {
            id: NotSet,
            time: Set(record.time),
            from_posture: Set(record.from_posture),
            to_posture: Set(record.to_posture),
            source: Set(record.source),
            from_duration_seconds: Set(record.from_duration_seconds),
            confidence: Set(record.confidence),
        };

        with_deadline(polar_posture::Entity::insert(model).exec(&self.db)).await?;
        Ok(())
    }

    pub async fn create_status(&self, record: StatusRecord) -> anyhow::Result<()> {
        let model = polar_relay_status::ActiveModel {
            id: NotSet,
            time: Set(record.time),
            category: Set(record.category),
            event: Set(record.event),
            source: Set(record.source),
            device: Set(record.device),
            fields: Set(record.fields),
        };

        with_deadline(polar_relay_status::Entity::insert(model).exec(&self.db)).await?;
        Ok(())
    }
}
