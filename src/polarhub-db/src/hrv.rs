use polarhub_entities::{polar_hrv_summary, polar_raw, polar_realtime};
use sea_orm::{
    sea_query::OnConflict,
    ActiveValue::{NotSet, Set},
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

use crate::db::{with_deadline, DatabaseHandler};

/// Per-beat HRV for the live dashboard.
#[derive(Clone, Debug, PartialEq)]
pub struct RealtimePoint {
    pub device: String,
    pub time: i64,
    pub rmssd: f64,
    pub sdnn: f64,
    pub pnn50: f64,
    pub hr: f64,
}

/// Five-minute summary over corrected intervals.
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryPoint {
    pub device: String,
    pub posture: Option<String>,
    pub time: i64,
    pub rmssd: f64,
    pub sdnn: f64,
    pub pnn50: f64,
    pub heart_rate: f64,
    pub sample_count: i32,
    pub artifact_count: i32,
}

impl DatabaseHandler {
    pub async fn write_realtime(&self, point: RealtimePoint) -> anyhow::Result<()> {
        let model = polar_realtime::ActiveModel {
            id: NotSet,
            device: Set(point.device),
            time: Set(point.time),
            rmssd: Set(point.rmssd),
            sdnn: Set(point.sdnn),
            pnn50: Set(point.pnn50),
            hr: Set(point.hr),
        };

        with_deadline(
            polar_realtime::Entity::insert(model)
                .on_conflict(
                    OnConflict::columns([
                        polar_realtime::Column::Device,
                        polar_realtime::Column::Time,
                    ])
                    .update_columns([
                        polar_realtime::Column::Rmssd,
                        polar_realtime::Column::Sdnn,
                        polar_realtime::Column::Pnn50,
                        polar_realtime::Column::Hr,
                    ])
                    .to_owned(),
                )
                .exec(&self.db),
        )
        .await?;

        Ok(())
    }

    pub async fn write_summary(&self, point: SummaryPoint) -> anyhow::Result<()> {
        let model = polar_hrv_summary::ActiveModel {
            id: NotSet,
            device: Set(point.device),
            posture: Set(point.posture),
            time: Set(point.time),
            rmssd: Set(point.rmssd),
            sdnn: Set(point.sdnn),
            pnn50: Set(point.pnn50),
            heart_rate: Set(point.heart_rate),
            sample_count: Set(point.sample_count),
            artifact_count: Set(point.artifact_count),
        };

        with_deadline(
            polar_hrv_summary::Entity::insert(model)
                .on_conflict(
                    OnConflict::columns([
                        polar_hrv_summary::Column::Device,
                        polar_hrv_summary::Column::Time,
                    ])
                    .update_columns([
                        polar_hrv_summary::Column::Posture,
                        polar_hrv_summary::Column::Rmssd,
                        polar_hrv_summary::Column::Sdnn,
                        polar_hrv_summary::Column::Pnn50,
                        polar_hrv_summary::Column::HeartRate,
                        polar_hrv_summary::Column::SampleCount,
                        polar_hrv_summary::Column::ArtifactCount,
                    ])
                    .to_owned(),
                )
                .exec(&self.db),
        )
        .await?;

        Ok(())
    }

    pub async fn get_summaries(
        &self,
        device: &str,
    ) -> anyhow::Result<Vec<polar_hrv_summary::Model>> {
        with_deadline(
            polar_hrv_summary::Entity::find()
                .filter(polar_hrv_summary::Column::Device.eq(device))
                .order_by_asc(polar_hrv_summary::Column::Time)
                .all(&self.db),
        )
        .await
    }

    /// Corrected intervals in `[from, to)`, in time order. Sentinel zeros
    /// (absorbed beats) and unclassified beats are excluded.
    pub async fn clean_rr_in(
        &self,
        device: &str,
        from: i64,
        to: i64,
    ) -> anyhow::Result<Vec<f64>> {
        let beats = with_deadline(
            polar_raw::Entity::find()
                .filter(polar_raw::Column::Device.eq(device))
                .filter(polar_raw::Column::Time.gte(from))
                .filter(polar_raw::Column::Time.lt(to))
                .filter(polar_raw::Column::RrClean.gt(0.0))
                .order_by_asc(polar_raw::Column::Time)
                .all(&self.db),
        )
        .await?;

        Ok(beats.into_iter().filter_map(|b| b.rr_clean).collect())
    }

    /// Beats in `[from, to)` classified as a real artifact.
    pub async fn count_artifacts_in(
        &self,
        device: &str,
        from: i64,
        to: i64,
    ) -> anyhow::Result<u64> {
        with_deadline(
            polar_raw::Entity::find()
                .filter(polar_raw::Column::Device.eq(device))
                .filter(polar_raw::Column::Time.gte(from))
                .filter(polar_raw::Column::Time.lt(to))
                .filter(polar_raw::Column::ArtifactType.is_not_null())
                .filter(polar_raw::Column::ArtifactType.ne("none"))
                .filter(polar_raw::Column::ArtifactType.ne("missed_inserted"))
                .count(&self.db),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BeatRecord;

    #[tokio::test]
    async fn realtime_point_overwrites_same_identity() {
        let db = DatabaseHandler::new("sqlite::memory:").await.unwrap();

        let mut point = RealtimePoint {
            device: "strap-1".to_string(),
            time: 1_000_000,
            rmssd: 42.0,
            sdnn: 51.0,
            pnn50: 20.0,
            hr: 61.0,
        };
        db.write_realtime(point.clone()).await.unwrap();

        point.rmssd = 45.5;
        db.write_realtime(point).await.unwrap();

        let rows = polar_realtime::Entity::find()
            .all(db.connection())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rmssd, 45.5);
    }

    #[tokio::test]
    async fn summary_upsert_and_fetch() {
        let db = DatabaseHandler::new("sqlite::memory:").await.unwrap();

        db.write_summary(SummaryPoint {
            device: "strap-1".to_string(),
            posture: Some("sitting".to_string()),
            time: 1_200_000,
            rmssd: 38.0,
            sdnn: 47.0,
            pnn50: 12.5,
            heart_rate: 64.0,
            sample_count: 280,
            artifact_count: 3,
        })
        .await
        .unwrap();

        let summaries = db.get_summaries("strap-1").await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].posture.as_deref(), Some("sitting"));
        assert_eq!(summaries[0].sample_count, 280);
    }

    #[tokio::test]
    async fn clean_window_filters_sentinels_and_bounds() {
        let db = DatabaseHandler::new("sqlite::memory:").await.unwrap();

        let beats = vec![
            // Before the window.
            clean_beat("strap-1", 999_000, 800.0),
            clean_beat("strap-1", 1_000_000, 810.0),
            clean_beat("strap-1", 1_000_810, 820.0),
            // Absorbed sentinel.
            BeatRecord {
                device: "strap-1".to_string(),
                time: 1_001_630,
                rr_interval: Some(400.0),
                rr_clean: Some(0.0),
                artifact_type: Some("extra_absorbed".to_string()),
                ..Default::default()
            },
            // Not yet classified.
            BeatRecord {
                device: "strap-1".to_string(),
                time: 1_002_030,
                rr_interval: Some(805.0),
                ..Default::default()
            },
            // At the exclusive upper bound.
            clean_beat("strap-1", 1_060_000, 830.0),
        ];
        db.upsert_beats(beats).await.unwrap();

        let clean = db
            .clean_rr_in("strap-1", 1_000_000, 1_060_000)
            .await
            .unwrap();
        assert_eq!(clean, vec![810.0, 820.0]);
    }

    #[tokio::test]
    async fn artifact_count_excludes_none_and_synthetic() {
        let db = DatabaseHandler::new("sqlite::memory:").await.unwrap();

        let labelled = |time, label: &str| BeatRecord {
            device: "strap-1".to_string(),
            time,
            rr_interval: Some(800.0),
            rr_clean: Some(800.0),
            artifact_type: Some(label.to_string()),
            ..Default::default()
        };

        db.upsert_beats(vec![
            labelled(1_000_000, "none"),
            labelled(1_001_000, "ectopic"),
            labelled(1_002_000, "missed"),
            labelled(1_003_000, "missed_inserted"),
            labelled(1_004_000, "longshort"),
        ])
        .await
        .unwrap();

        let count = db
            .count_artifacts_in("strap-1", 1_000_000, 1_100_000)
            .await
            .unwrap();
        assert_eq!(count, 3);
    }

    fn clean_beat(device: &str, time: i64, rr: f64) -> BeatRecord {
        BeatRecord {
            device: device.to_string(),
            time,
            rr_interval: Some(rr),
            rr_clean: Some(rr),
            artifact_type: Some("none".to_string()),
            ..Default::default()
        }
    }
}
