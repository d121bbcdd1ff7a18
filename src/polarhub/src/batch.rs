use std::fmt;

use polarhub_db::{BeatRecord, SearchBeats};
use serde::Serialize;

use crate::hub::PolarHub;

// Boundary RR lengths can push a beat past the range edges; pad the
// existing-beat query accordingly.
const QUERY_PAD_MS: i64 = 2000;
// Slack for timestamp jitter between the real-time and batch renderings of
// the same beat.
const GAP_TOLERANCE_MS: i64 = 300;

/// Accepted `/beats/batch` payload.
#[derive(Clone, Debug)]
pub struct BatchIngest {
    pub device: String,
    pub source: Option<String>,
    pub beats: Vec<BatchBeat>,
}

#[derive(Clone, Debug)]
pub struct BatchBeat {
    /// Epoch milliseconds of the first interval of this beat.
    pub timestamp: i64,
    pub heart_rate: Option<f64>,
    pub rr_intervals: Vec<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub received: usize,
    pub new: usize,
    pub duplicates: usize,
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received {}, new {}, duplicates {}",
            self.received, self.new, self.duplicates
        )
    }
}

/// A span of time the store has no beat coverage for. `start` is where the
/// last covered interval ended, `end` is the next stored beat (or a padded
/// bound at the edges).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Gap {
    pub start: i64,
    pub end: i64,
}

/// Gap detection over stored beats `(time, rr)` sorted ascending, for an
/// incoming range `[first_ts, last_ts]`.
pub(crate) fn detect_gaps(existing: &[(i64, f64)], first_ts: i64, last_ts: i64) -> Vec<Gap> {
    if existing.is_empty() {
        return vec![Gap {
            start: first_ts,
            end: last_ts + QUERY_PAD_MS,
        }];
    }

    let mut gaps = Vec::new();

    if first_ts < existing[0].0 - GAP_TOLERANCE_MS {
        gaps.push(Gap {
            start: first_ts,
            end: existing[0].0,
        });
    }

    for pair in existing.windows(2) {
        let (ts, rr) = pair[0];
        let (next_ts, _) = pair[1];
        let covered_until = ts + rr.round() as i64;
        if next_ts - covered_until > GAP_TOLERANCE_MS {
            gaps.push(Gap {
                start: covered_until,
                end: next_ts,
            });
        }
    }

    if let Some(&(last_e_ts, last_e_rr)) = existing.last() {
        let covered_until = last_e_ts + last_e_rr.round() as i64;
        if last_ts > covered_until + GAP_TOLERANCE_MS {
            gaps.push(Gap {
                start: covered_until,
                end: last_ts + QUERY_PAD_MS,
            });
        }
    }

    gaps
}

/// A point is a fill only when it lands inside a gap. The gap's right edge
/// is an existing beat's timestamp; a point landing exactly there is that
/// beat, not a fill.
pub(crate) fn in_gap(gaps: &[Gap], ts: i64) -> bool {
    gaps.iter()
        .any(|gap| ts >= gap.start - GAP_TOLERANCE_MS && ts < gap.end)
}

impl PolarHub {
    /// Batch ingest: gap-detect the retroactive upload against stored
    /// beats, write only the missing points, and rewind the post-processor
    /// over the uploaded range.
    ///
    /// Unlike the real-time path, store failures surface to the caller so
    /// the client retries the upload.
    pub async fn handle_batch(&self, ingest: BatchIngest) -> anyhow::Result<BatchReport> {
        let (entry, _created) = self.registry.get_or_create(&ingest.device);
        self.postprocessor.register_device(&ingest.device).await;

        // Exclude the real-time path and the post-processor for this
        // device while deduplicating.
        let _state = entry.state.lock().await;

        let mut incoming: Vec<BeatRecord> = Vec::new();
        for beat in &ingest.beats {
            if beat.rr_intervals.is_empty() {
                incoming.push(BeatRecord {
                    device: ingest.device.clone(),
                    time: beat.timestamp,
                    heart_rate: beat.heart_rate,
                    source: ingest.source.clone(),
                    path: Some("batch".to_string()),
                    ..Default::default()
                });
                continue;
            }

            let mut offset: f64 = 0.0;
            for &rr in &beat.rr_intervals {
                incoming.push(BeatRecord {
                    device: ingest.device.clone(),
                    time: beat.timestamp + offset.round() as i64,
                    rr_interval: Some(rr),
                    heart_rate: beat.heart_rate,
                    source: ingest.source.clone(),
                    path: Some("batch".to_string()),
                    ..Default::default()
                });
                offset += rr;
            }
        }
        incoming.sort_by_key(|b| b.time);

        let received = incoming.len();
        if incoming.is_empty() {
            return Ok(BatchReport {
                received: 0,
                new: 0,
                duplicates: 0,
            });
        }

        let first_ts = incoming[0].time;
        let last_ts = incoming[incoming.len() - 1].time;

        let existing: Vec<(i64, f64)> = self
            .db
            .search_beats(
                SearchBeats::device(&ingest.device)
                    .between(first_ts - QUERY_PAD_MS, last_ts + QUERY_PAD_MS),
            )
            .await?
            .into_iter()
            .map(|b| (b.time, b.rr_interval.unwrap_or(0.0)))
            .collect();

        let gaps = detect_gaps(&existing, first_ts, last_ts);
        let fresh: Vec<BeatRecord> = incoming
            .into_iter()
            .filter(|b| in_gap(&gaps, b.time))
            .collect();
        let new = fresh.len();

        self.db.upsert_beats(fresh).await?;

        // Rewind so the filled range is re-classified with full context.
        self.postprocessor
            .trigger_reprocess(&ingest.device, first_ts)
            .await;

        let report = BatchReport {
            received,
            new,
            duplicates: received - new,
        };
        info!("batch for {}: {report}", ingest.device);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::BeatsIngest;
    use polarhub_db::DatabaseHandler;

    #[test]
    fn no_existing_means_one_full_gap() {
        let gaps = detect_gaps(&[], 1_000_000, 1_060_000);
        assert_eq!(gaps.len(), 1);
        assert!(in_gap(&gaps, 1_000_000));
        assert!(in_gap(&gaps, 1_060_000));
    }

    #[test]
    fn contiguous_coverage_has_no_gaps() {
        let existing: Vec<(i64, f64)> = (0..10).map(|i| (i * 1000, 1000.0)).collect();
        assert!(detect_gaps(&existing, 0, 9000).is_empty());
    }

    #[test]
    fn hole_between_beats_is_a_gap() {
        // Beat at 29000 covers until 30000; next stored beat is 31000.
        let existing = vec![(29_000, 1000.0), (31_000, 1000.0)];
        let gaps = detect_gaps(&existing, 29_000, 31_000);
        assert_eq!(
            gaps,
            vec![Gap {
                start: 30_000,
                end: 31_000
            }]
        );
        assert!(in_gap(&gaps, 30_000));
        // The right edge is the existing beat itself.
        assert!(!in_gap(&gaps, 31_000));
    }

    #[test]
    fn leading_and_trailing_gaps() {
        let existing = vec![(10_000, 1000.0), (11_000, 1000.0)];
        let gaps = detect_gaps(&existing, 5_000, 20_000);
        assert_eq!(gaps.len(), 2);
        assert_eq!(
            gaps[0],
            Gap {
                start: 5_000,
                end: 10_000
            }
        );
        assert_eq!(
            gaps[1],
            Gap {
                start: 12_000,
                end: 22_000
            }
        );
    }

    #[test]
    fn tolerance_admits_slightly_early_points() {
        let gaps = vec![Gap {
            start: 30_000,
            end: 31_000,
        }];
        assert!(in_gap(&gaps, 29_700));
        assert!(!in_gap(&gaps, 29_699));
    }

    async fn hub() -> PolarHub {
        PolarHub::new(DatabaseHandler::new("sqlite::memory:").await.unwrap())
    }

    fn batch_of(device: &str, timestamps: &[i64]) -> BatchIngest {
        BatchIngest {
            device: device.to_string(),
            source: Some("phone".to_string()),
            beats: timestamps
                .iter()
                .map(|&timestamp| BatchBeat {
                    timestamp,
                    heart_rate: None,
                    rr_intervals: vec![1000.0],
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn pure_duplicate_batch_writes_nothing() {
        let hub = hub().await;

        // 60 beats through the real-time path at t, t+1000, ...
        for i in 0..60 {
            hub.handle_beats(BeatsIngest {
                device: "strap-1".to_string(),
                timestamp: 1_000_000 + i * 1000,
                heart_rate: None,
                rr_intervals: vec![1000.0],
                posture: None,
                source: None,
            })
            .await;
        }

        let timestamps: Vec<i64> = (0..60).map(|i| 1_000_000 + i * 1000).collect();
        let report = hub
            .handle_batch(batch_of("strap-1", &timestamps))
            .await
            .unwrap();

        assert_eq!(
            report,
            BatchReport {
                received: 60,
                new: 0,
                duplicates: 60
            }
        );

        let stored = hub
            .database()
            .search_beats(SearchBeats::device("strap-1"))
            .await
            .unwrap();
        assert_eq!(stored.len(), 60);
    }

    #[tokio::test]
    async fn batch_fills_a_single_gap() {
        let hub = hub().await;

        // 59 beats, skipping index 30.
        for i in (0..60).filter(|&i| i != 30) {
            hub.handle_beats(BeatsIngest {
                device: "strap-1".to_string(),
                timestamp: 1_000_000 + i * 1000,
                heart_rate: None,
                rr_intervals: vec![1000.0],
                posture: None,
                source: None,
            })
            .await;
        }

        let timestamps: Vec<i64> = (0..60).map(|i| 1_000_000 + i * 1000).collect();
        let report = hub
            .handle_batch(batch_of("strap-1", &timestamps))
            .await
            .unwrap();

        assert_eq!(
            report,
            BatchReport {
                received: 60,
                new: 1,
                duplicates: 59
            }
        );

        let stored = hub
            .database()
            .search_beats(SearchBeats::device("strap-1"))
            .await
            .unwrap();
        assert_eq!(stored.len(), 60);
        assert!(stored.iter().any(|b| b.time == 1_030_000));
    }

    #[tokio::test]
    async fn reupload_is_idempotent() {
        let hub = hub().await;

        let timestamps: Vec<i64> = (0..20).map(|i| 1_000_000 + i * 1000).collect();
        let first = hub
            .handle_batch(batch_of("strap-1", &timestamps))
            .await
            .unwrap();
        assert_eq!(first.new, 20);

        let second = hub
            .handle_batch(batch_of("strap-1", &timestamps))
            .await
            .unwrap();
        assert_eq!(
            second,
            BatchReport {
                received: 20,
                new: 0,
                duplicates: 20
            }
        );

        let stored = hub
            .database()
            .search_beats(SearchBeats::device("strap-1"))
            .await
            .unwrap();
        assert_eq!(stored.len(), 20);
    }

    #[tokio::test]
    async fn multi_interval_beats_flatten_head_to_tail() {
        let hub = hub().await;

        let report = hub
            .handle_batch(BatchIngest {
                device: "strap-1".to_string(),
                source: None,
                beats: vec![BatchBeat {
                    timestamp: 1_000_000,
                    heart_rate: Some(70.0),
                    rr_intervals: vec![850.0, 860.0, 840.0],
                }],
            })
            .await
            .unwrap();
        assert_eq!(report.received, 3);
        assert_eq!(report.new, 3);

        let stored = hub
            .database()
            .search_beats(SearchBeats::device("strap-1"))
            .await
            .unwrap();
        assert_eq!(
            stored.iter().map(|b| b.time).collect::<Vec<_>>(),
            vec![1_000_000, 1_000_850, 1_001_710]
        );
        assert!(stored.iter().all(|b| b.path.as_deref() == Some("batch")));
    }

    #[tokio::test]
    async fn batch_rewinds_post_processor() {
        let hub = hub().await;

        hub.postprocessor().register_device("strap-1").await;
        let before = hub.postprocessor().watermark("strap-1").await.unwrap();

        let timestamps: Vec<i64> = (0..5).map(|i| 1_000_000 + i * 1000).collect();
        hub.handle_batch(batch_of("strap-1", &timestamps))
            .await
            .unwrap();

        let after = hub.postprocessor().watermark("strap-1").await.unwrap();
        assert!(after <= before);
        assert_eq!(after, 1_000_000);
    }
}
