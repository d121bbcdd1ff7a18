use polarhub_entities::polar_raw;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveValue::{NotSet, Set},
    ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::db::{with_deadline, DatabaseHandler};

// SQLite limits a statement to 999 bind variables; polar_raw rows bind 9
// columns, so batches stay under 100 rows.
const BEAT_INSERT_BATCH: usize = 100;

/// One write to the raw measurement. Fields left `None` keep whatever an
/// earlier write stored for the same `(device, time)` identity, so the
/// real-time path, the batch path and the post-processor can each fill in
/// their share of the row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BeatRecord {
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

/// Range query over raw beats, bounds inclusive.
#[derive(Clone, Debug, Default)]
pub struct SearchBeats {
    pub device: String,
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub limit: Option<u64>,
}

impl SearchBeats {
    pub fn device(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    pub fn between(mut self, from: i64, to: i64) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    fn conditions(self) -> Condition {
        Condition::all()
            .add(polar_raw::Column::Device.eq(self.device))
            .add_option(self.from.map(|from| polar_raw::Column::Time.gte(from)))
            .add_option(self.to.map(|to| polar_raw::Column::Time.lte(to)))
    }
}

impl DatabaseHandler {
    pub async fn upsert_beat(&self, beat: BeatRecord) -> anyhow::Result<()> {
        self.upsert_beats(vec![beat]).await
    }

    pub async fn upsert_beats(&self, beats: Vec<BeatRecord>) -> anyhow::Result<()> {
        if beats.is_empty() {
            return Ok(());
        }

        for chunk in beats.chunks(BEAT_INSERT_BATCH) {
            let models: Vec<polar_raw::ActiveModel> = chunk
                .iter()
                .cloned()
                .map(|b| polar_raw::ActiveModel {
                    id: NotSet,
                    device: Set(b.device),
                    time: Set(b.time),
                    rr_interval: Set(b.rr_interval),
                    heart_rate: Set(b.heart_rate),
                    source: Set(b.source),
                    path: Set(b.path),
                    rr_clean: Set(b.rr_clean),
                    hr_clean: Set(b.hr_clean),
                    artifact_type: Set(b.artifact_type),
                })
                .collect();

            with_deadline(
                polar_raw::Entity::insert_many(models)
                    .on_conflict(
                        OnConflict::columns([polar_raw::Column::Device, polar_raw::Column::Time])
                            .value(
                                polar_raw::Column::RrInterval,
                                Expr::cust("COALESCE(excluded.rr_interval, polar_raw.rr_interval)"),
                            )
                            .value(
                                polar_raw::Column::HeartRate,
                                Expr::cust("COALESCE(excluded.heart_rate, polar_raw.heart_rate)"),
                            )
                            .value(
                                polar_raw::Column::Source,
                                Expr::cust("COALESCE(excluded.source, polar_raw.source)"),
                            )
                            .value(
                                polar_raw::Column::Path,
                                Expr::cust("COALESCE(excluded.path, polar_raw.path)"),
                            )
                            .value(
                                polar_raw::Column::RrClean,
                                Expr::cust("COALESCE(excluded.rr_clean, polar_raw.rr_clean)"),
                            )
                            .value(
                                polar_raw::Column::HrClean,
                                Expr::cust("COALESCE(excluded.hr_clean, polar_raw.hr_clean)"),
                            )
                            .value(
                                polar_raw::Column::ArtifactType,
                                Expr::cust(
                                    "COALESCE(excluded.artifact_type, polar_raw.artifact_type)",
                                ),
                            )
                            .to_owned(),
                    )
                    .exec(&self.db),
            )
            .await?;
        }

        Ok(())
    }

    pub async fn search_beats(&self, options: SearchBeats) -> anyhow::Result<Vec<polar_raw::Model>> {
        let limit = options.limit;
        with_deadline(
            polar_raw::Entity::find()
                .filter(options.conditions())
                .order_by_asc(polar_raw::Column::Time)
                .limit(limit)
                .all(&self.db),
        )
        .await
    }

    /// Most recent beats strictly before `ts` that carry a measured
    /// interval, oldest first. Synthetic inserted beats have no interval
    /// and are excluded so the classifier's input stays well-formed.
    pub async fn context_before(
        &self,
        device: &str,
        ts: i64,
        limit: u64,
    ) -> anyhow::Result<Vec<polar_raw::Model>> {
        let mut beats = with_deadline(
            polar_raw::Entity::find()
                .filter(polar_raw::Column::Device.eq(device))
                .filter(polar_raw::Column::Time.lt(ts))
                .filter(polar_raw::Column::RrInterval.gt(0.0))
                .order_by_desc(polar_raw::Column::Time)
                .limit(limit)
                .all(&self.db),
        )
        .await?;

        beats.reverse();
        Ok(beats)
    }

    /// Oldest beats strictly after `ts` with a measured interval.
    pub async fn context_after(
        &self,
        device: &str,
        ts: i64,
        limit: u64,
    ) -> anyhow::Result<Vec<polar_raw::Model>> {
        with_deadline(
            polar_raw::Entity::find()
                .filter(polar_raw::Column::Device.eq(device))
                .filter(polar_raw::Column::Time.gt(ts))
                .filter(polar_raw::Column::RrInterval.gt(0.0))
                .order_by_asc(polar_raw::Column::Time)
                .limit(limit)
                .all(&self.db),
        )
        .await
    }

    /// Timestamp of the newest beat with a non-sentinel corrected interval.
    /// Seeds the post-processor watermark across process restarts.
    pub async fn latest_clean_ts(&self, device: &str) -> anyhow::Result<Option<i64>> {
        let beat = with_deadline(
            polar_raw::Entity::find()
                .filter(polar_raw::Column::Device.eq(device))
                .filter(polar_raw::Column::RrClean.gt(0.0))
                .order_by_desc(polar_raw::Column::Time)
                .one(&self.db),
        )
        .await?;

        Ok(beat.map(|b| b.time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_beat(device: &str, time: i64, rr: f64) -> BeatRecord {
        BeatRecord {
            device: device.to_string(),
            time,
            rr_interval: Some(rr),
            path: Some("realtime".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn upsert_and_search() {
        let db = DatabaseHandler::new("sqlite::memory:").await.unwrap();

        let beats: Vec<BeatRecord> = (0..5)
            .map(|i| raw_beat("strap-1", 1_000_000 + i * 1000, 1000.0))
            .collect();
        db.upsert_beats(beats).await.unwrap();

        let found = db
            .search_beats(SearchBeats::device("strap-1"))
            .await
            .unwrap();
        assert_eq!(found.len(), 5);
        assert_eq!(found[0].time, 1_000_000);
        assert_eq!(found[4].time, 1_004_000);

        let bounded = db
            .search_beats(SearchBeats::device("strap-1").between(1_001_000, 1_003_000))
            .await
            .unwrap();
        assert_eq!(bounded.len(), 3);
    }

    #[tokio::test]
    async fn upsert_merges_fields_on_same_identity() {
        let db = DatabaseHandler::new("sqlite::memory:").await.unwrap();

        db.upsert_beat(raw_beat("strap-1", 1_000_000, 812.0))
            .await
            .unwrap();

        // Canonical pass writes only the corrected fields.
        db.upsert_beat(BeatRecord {
            device: "strap-1".to_string(),
            time: 1_000_000,
            rr_clean: Some(812.0),
            hr_clean: Some(73.89),
            artifact_type: Some("none".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

        let found = db
            .search_beats(SearchBeats::device("strap-1"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        let beat = &found[0];
        assert_eq!(beat.rr_interval, Some(812.0));
        assert_eq!(beat.path.as_deref(), Some("realtime"));
        assert_eq!(beat.rr_clean, Some(812.0));
        assert_eq!(beat.artifact_type.as_deref(), Some("none"));
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let db = DatabaseHandler::new("sqlite::memory:").await.unwrap();

        let beats: Vec<BeatRecord> = (0..3)
            .map(|i| raw_beat("strap-1", 1_000_000 + i * 1000, 900.0))
            .collect();
        db.upsert_beats(beats.clone()).await.unwrap();
        db.upsert_beats(beats).await.unwrap();

        let found = db
            .search_beats(SearchBeats::device("strap-1"))
            .await
            .unwrap();
        assert_eq!(found.len(), 3);
    }

    #[tokio::test]
    async fn devices_are_isolated() {
        let db = DatabaseHandler::new("sqlite::memory:").await.unwrap();

        db.upsert_beat(raw_beat("strap-1", 1_000_000, 800.0))
            .await
            .unwrap();
        db.upsert_beat(raw_beat("strap-2", 1_000_000, 700.0))
            .await
            .unwrap();

        let found = db
            .search_beats(SearchBeats::device("strap-2"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rr_interval, Some(700.0));
    }

    #[tokio::test]
    async fn context_queries_skip_synthetic_beats() {
        let db = DatabaseHandler::new("sqlite::memory:").await.unwrap();

        for i in 0..5 {
            db.upsert_beat(raw_beat("strap-1", 1_000_000 + i * 1000, 1000.0))
                .await
                .unwrap();
        }
        // Synthetic inserted beat: no rr_interval.
        db.upsert_beat(BeatRecord {
            device: "strap-1".to_string(),
            time: 1_002_500,
            rr_clean: Some(500.0),
            artifact_type: Some("missed_inserted".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

        let before = db.context_before("strap-1", 1_003_000, 91).await.unwrap();
        assert_eq!(
            before.iter().map(|b| b.time).collect::<Vec<_>>(),
            vec![1_000_000, 1_001_000, 1_002_000]
        );

        let after = db.context_after("strap-1", 1_002_000, 91).await.unwrap();
        assert_eq!(
            after.iter().map(|b| b.time).collect::<Vec<_>>(),
            vec![1_003_000, 1_004_000]
        );
    }

    #[tokio::test]
    async fn context_before_honors_limit_keeping_newest() {
        let db = DatabaseHandler::new("sqlite::memory:").await.unwrap();

        for i in 0..10 {
            db.upsert_beat(raw_beat("strap-1", 1_000_000 + i * 1000, 1000.0))
                .await
                .unwrap();
        }

        let before = db.context_before("strap-1", 2_000_000, 3).await.unwrap();
        assert_eq!(
            before.iter().map(|b| b.time).collect::<Vec<_>>(),
            vec![1_007_000, 1_008_000, 1_009_000]
        );
    }

    #[tokio::test]
    async fn latest_clean_ts_ignores_sentinel_zero() {
        let db = DatabaseHandler::new("sqlite::memory:").await.unwrap();

        assert_eq!(db.latest_clean_ts("strap-1").await.unwrap(), None);

        db.upsert_beat(BeatRecord {
            device: "strap-1".to_string(),
            time: 1_000_000,
            rr_interval: Some(800.0),
            rr_clean: Some(800.0),
            ..Default::default()
        })
        .await
        .unwrap();
        // Absorbed beat: sentinel zero marks "no real beat here".
        db.upsert_beat(BeatRecord {
            device: "strap-1".to_string(),
            time: 1_001_000,
            rr_interval: Some(400.0),
            rr_clean: Some(0.0),
            artifact_type: Some("extra_absorbed".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(db.latest_clean_ts("strap-1").await.unwrap(), Some(1_000_000));
    }
}
