use polarhub_algos::{analyze_rr, HrvMetrics, MIN_SERIES_LEN};
use polarhub_db::{BeatRecord, RealtimePoint};

use crate::hub::PolarHub;

/// Accepted `/beats` payload, validation already done at the edge.
#[derive(Clone, Debug)]
pub struct BeatsIngest {
    pub device: String,
    /// Epoch milliseconds of the first interval in the payload.
    pub timestamp: i64,
    pub heart_rate: Option<f64>,
    pub rr_intervals: Vec<f64>,
    pub posture: Option<String>,
    pub source: Option<String>,
}

impl PolarHub {
    /// Real-time ingest: persist each interval as a raw beat, slide the
    /// live window, and refresh the dashboard stream.
    ///
    /// Store failures are logged and swallowed; the relay retries through
    /// the batch path later, so a flaky store must not turn into 5xx noise.
    pub async fn handle_beats(&self, ingest: BeatsIngest) -> usize {
        let (entry, _created) = self.registry.get_or_create(&ingest.device);
        self.postprocessor.register_device(&ingest.device).await;

        let mut state = entry.state.lock().await;

        if let Some(posture) = &ingest.posture {
            state.last_posture = Some(posture.clone());
        }

        // Intervals lie head-to-tail from the payload timestamp: beat k
        // lands at timestamp + rr[0] + ... + rr[k-1].
        let mut beats = Vec::with_capacity(ingest.rr_intervals.len());
        let mut offset: f64 = 0.0;
        let mut last_ts = ingest.timestamp;
        for &rr in &ingest.rr_intervals {
            last_ts = ingest.timestamp + offset.round() as i64;
            beats.push(BeatRecord {
                device: ingest.device.clone(),
                time: last_ts,
                rr_interval: Some(rr),
                heart_rate: ingest.heart_rate,
                source: ingest.source.clone(),
                path: Some("realtime".to_string()),
                ..Default::default()
            });
            state.push_rr(rr);
            offset += rr;
        }
        let received = beats.len();

        if let Err(error) = self.db.upsert_beats(beats).await {
            error!("raw write failed for {}: {error:#}", ingest.device);
        }

        if received > 0 && state.rr_window.len() >= MIN_SERIES_LEN {
            let window: Vec<f64> = state.rr_window.iter().copied().collect();
            let analysis = analyze_rr(&window);

            if analysis.clean_series.len() >= 2 {
                match HrvMetrics::from_rr(&analysis.clean_series) {
                    Some(hrv) if hrv.is_finite() => {
                        state.push_rmssd(hrv.rmssd);

                        let point = RealtimePoint {
                            device: ingest.device.clone(),
                            time: last_ts,
                            rmssd: hrv.rmssd,
                            sdnn: hrv.sdnn,
                            pnn50: hrv.pnn50,
                            hr: hrv.heart_rate_bpm().round(),
                        };
                        if let Err(error) = self.db.write_realtime(point).await {
                            error!("realtime HRV write failed for {}: {error:#}", ingest.device);
                        }
                    }
                    // Degenerate window: skip this tick only.
                    _ => debug!("no HRV for {} this tick", ingest.device),
                }
            }
        }

        drop(state);
        self.broadcast_snapshot().await;

        received
    }
}
