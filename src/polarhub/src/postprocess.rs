use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use polarhub_algos::{analyze_rr, ArtifactType, HrvMetrics, MIN_SERIES_LEN};
use polarhub_db::{BeatRecord, DatabaseHandler, SearchBeats, SummaryPoint};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::hub::now_ms;
use crate::registry::DeviceRegistry;

const TICK_INTERVAL: Duration = Duration::from_secs(60);
/// The classifier wants up to 91 beats of look-ahead; at resting heart
/// rates that is about 91 seconds, so two minutes of buffer guarantees the
/// right context exists before a beat is classified.
const BUFFER_MS: i64 = 120_000;
const CONTEXT_BEATS: u64 = 91;
const MIN_SUMMARY_SAMPLES: usize = 10;
pub(crate) const DEFAULT_SUMMARY_INTERVAL_MS: i64 = 300_000;

/// Deferred classification loop. Re-runs the artifact classifier with full
/// left/right context over beats old enough to be stable, merges the
/// canonical fields into the raw measurement, and maintains the five-minute
/// summaries.
///
/// Watermark per device: every beat older than it has been classified. It
/// only moves backwards through [`PostProcessor::trigger_reprocess`].
pub struct PostProcessor {
    db: DatabaseHandler,
    registry: DeviceRegistry,
    summary_interval_ms: i64,
    watermarks: Mutex<HashMap<String, i64>>,
}

impl PostProcessor {
    pub fn new(db: DatabaseHandler, registry: DeviceRegistry, summary_interval_ms: i64) -> Self {
        Self {
            db,
            registry,
            summary_interval_ms,
            watermarks: Mutex::new(HashMap::new()),
        }
    }

    /// Idempotent. Seeds the watermark from the store so a restarted hub
    /// does not re-classify history, falling back to "now" for devices
    /// that never produced a corrected beat.
    pub async fn register_device(&self, device: &str) {
        if self.watermarks.lock().await.contains_key(device) {
            return;
        }

        let loaded = match self.db.latest_clean_ts(device).await {
            Ok(Some(ts)) => ts,
            Ok(None) => now_ms(),
            Err(error) => {
                warn!("failed to load watermark for {device}: {error:#}");
                now_ms()
            }
        };

        self.watermarks
            .lock()
            .await
            .entry(device.to_string())
            .or_insert(loaded);
    }

    pub async fn unregister_device(&self, device: &str) {
        self.watermarks.lock().await.remove(device);
    }

    pub async fn watermark(&self, device: &str) -> Option<i64> {
        self.watermarks.lock().await.get(device).copied()
    }

    /// Batch uploads rewind the watermark; it never moves forward here.
    pub async fn trigger_reprocess(&self, device: &str, from_ms: i64) {
        let mut marks = self.watermarks.lock().await;
        match marks.get_mut(device) {
            Some(mark) => {
                if from_ms < *mark {
                    *mark = from_ms;
                }
            }
            None => {
                marks.insert(device.to_string(), from_ms);
            }
        }
    }

    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.tick(now_ms()).await;
            }
        })
    }

    /// One pass over every registered device. A failing device is logged
    /// and skipped; it never stalls the rest of the tick.
    pub async fn tick(&self, now_ms: i64) {
        let devices: Vec<String> = self.watermarks.lock().await.keys().cloned().collect();
        for device in devices {
            if let Err(error) = self.process_device(&device, now_ms).await {
                error!("post-processing failed for {device}: {error:#}");
            }
        }
    }

    pub async fn process_device(&self, device: &str, now_ms: i64) -> anyhow::Result<()> {
        let cutoff = now_ms - BUFFER_MS;
        let Some(start) = self.watermark(device).await else {
            return Ok(());
        };
        if start >= cutoff {
            return Ok(());
        }

        // Per-device exclusion against both ingest paths.
        let (entry, _created) = self.registry.get_or_create(device);
        let state = entry.state.lock().await;
        let posture = state.last_posture.clone();

        let (left, target, right) = tokio::try_join!(
            self.db.context_before(device, start, CONTEXT_BEATS),
            self.db
                .search_beats(SearchBeats::device(device).between(start, cutoff)),
            self.db.context_after(device, cutoff, CONTEXT_BEATS),
        )?;

        // Drop previously-inserted synthetic beats so the classifier sees
        // measured intervals only.
        let target: Vec<_> = target
            .into_iter()
            .filter(|b| b.rr_interval.is_some_and(|rr| rr > 0.0))
            .collect();

        if left.len() + target.len() + right.len() < MIN_SERIES_LEN {
            self.advance(device, cutoff).await;
            return Ok(());
        }

        let mut rr = Vec::with_capacity(left.len() + target.len() + right.len());
        rr.extend(left.iter().filter_map(|b| b.rr_interval));
        rr.extend(target.iter().filter_map(|b| b.rr_interval));
        rr.extend(right.iter().filter_map(|b| b.rr_interval));

        let analysis = analyze_rr(&rr);
        let results = &analysis.results[left.len()..left.len() + target.len()];

        let mut canonical: Vec<BeatRecord> = Vec::with_capacity(target.len() + 4);
        for (beat, class) in target.iter().zip(results) {
            match (class.artifact, class.rr_clean) {
                (ArtifactType::Missed, Some(half)) => {
                    canonical.push(canonical_record(device, beat.time, half, ArtifactType::Missed));
                    // The second half of the split interval becomes its own
                    // beat, placed where the missing R-peak was.
                    canonical.push(canonical_record(
                        device,
                        beat.time + half.round() as i64,
                        half,
                        ArtifactType::MissedInserted,
                    ));
                }
                (ArtifactType::ExtraAbsorbed, _) => {
                    // Sentinel zero: no real beat here.
                    canonical.push(BeatRecord {
                        device: device.to_string(),
                        time: beat.time,
                        rr_clean: Some(0.0),
                        hr_clean: Some(0.0),
                        artifact_type: Some(ArtifactType::ExtraAbsorbed.as_str().to_string()),
                        ..Default::default()
                    });
                }
                (artifact, Some(value)) => {
                    canonical.push(canonical_record(device, beat.time, value, artifact));
                }
                (_, None) => {}
            }
        }

        // Best-effort: a failed write here is repaired by the next rewind,
        // and must not block the watermark.
        if let Err(error) = self.db.upsert_beats(canonical).await {
            warn!("canonical write failed for {device}: {error:#}");
        }

        self.advance(device, cutoff).await;
        drop(state);

        self.recompute_summaries(device, start, cutoff, now_ms, posture)
            .await
    }

    async fn advance(&self, device: &str, cutoff: i64) {
        if let Some(mark) = self.watermarks.lock().await.get_mut(device) {
            *mark = cutoff;
        }
    }

    /// Rebuilds every summary window touched by `[start, end]` whose end
    /// has already passed.
    async fn recompute_summaries(
        &self,
        device: &str,
        start: i64,
        end: i64,
        now_ms: i64,
        posture: Option<String>,
    ) -> anyhow::Result<()> {
        let interval = self.summary_interval_ms;
        let mut window_start = start.div_euclid(interval) * interval;
        let last_window_start = end.div_euclid(interval) * interval;

        while window_start <= last_window_start {
            let window_end = window_start + interval;
            if window_end > now_ms {
                break;
            }

            let clean = self.db.clean_rr_in(device, window_start, window_end).await?;
            if clean.len() >= MIN_SUMMARY_SAMPLES {
                if let Some(hrv) = HrvMetrics::from_rr(&clean) {
                    let artifact_count = self
                        .db
                        .count_artifacts_in(device, window_start, window_end)
                        .await? as i32;

                    let point = SummaryPoint {
                        device: device.to_string(),
                        posture: posture.clone(),
                        time: window_end,
                        rmssd: hrv.rmssd,
                        sdnn: hrv.sdnn,
                        pnn50: hrv.pnn50,
                        heart_rate: hrv.heart_rate_bpm().round(),
                        sample_count: clean.len() as i32,
                        artifact_count,
                    };
                    if let Err(error) = self.db.write_summary(point).await {
                        warn!("summary write failed for {device}: {error:#}");
                    }
                }
            }

            window_start += interval;
        }

        Ok(())
    }
}

fn canonical_record(device: &str, time: i64, rr_clean: f64, artifact: ArtifactType) -> BeatRecord {
    BeatRecord {
        device: device.to_string(),
        time,
        rr_clean: Some(rr_clean),
        hr_clean: Some(clean_bpm(rr_clean)),
        artifact_type: Some(artifact.as_str().to_string()),
        ..Default::default()
    }
}

/// Heart rate implied by a corrected interval, at the 0.01 bpm precision
/// the canonical record carries.
fn clean_bpm(rr_clean: f64) -> f64 {
    (60_000.0 / rr_clean * 100.0).round() / 100.0
}
