use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use polarhub_db::{DatabaseHandler, PostureRecord, StatusRecord};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::postprocess::{PostProcessor, DEFAULT_SUMMARY_INTERVAL_MS};
use crate::registry::{DeviceRegistry, DeviceSnapshot};

/// Status events worth a time-series point; everything else is log-only.
const PERSISTED_STATUS_EVENTS: [&str; 10] = [
    "ble.connected",
    "ble.disconnected",
    "ble.pmd_locked",
    "session.recording",
    "session.download_complete",
    "session.error",
    "stream.hr_interrupted",
    "stream.hr_recovered",
    "upload.server_online",
    "upload.server_offline",
];

const EVENTS_CHANNEL_CAPACITY: usize = 64;

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Full status snapshot fanned out to SSE listeners after each real-time
/// ingest.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub timestamp: i64,
    pub uptime_ms: i64,
    pub devices: Vec<DeviceSnapshot>,
}

#[derive(Clone, Debug)]
pub struct PostureInput {
    pub device: Option<String>,
    pub source: Option<String>,
    pub from_posture: String,
    pub to_posture: String,
    pub from_duration_seconds: Option<f64>,
    pub confidence: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct StatusEventInput {
    pub category: String,
    pub event: String,
    pub description: Option<String>,
    pub fields: Option<serde_json::Value>,
    pub source: Option<String>,
    pub device: Option<String>,
}

/// Owns everything a single hub process shares: the store handle, the
/// per-device state map, the post-processor and the SSE broadcast channel.
pub struct PolarHub {
    pub(crate) db: DatabaseHandler,
    pub(crate) registry: DeviceRegistry,
    pub(crate) postprocessor: Arc<PostProcessor>,
    events_tx: broadcast::Sender<StatusSnapshot>,
    started_at_ms: i64,
}

impl PolarHub {
    pub fn new(db: DatabaseHandler) -> Self {
        Self::with_summary_interval(db, DEFAULT_SUMMARY_INTERVAL_MS)
    }

    pub fn with_summary_interval(db: DatabaseHandler, summary_interval_ms: i64) -> Self {
        let registry = DeviceRegistry::new();
        let postprocessor = Arc::new(PostProcessor::new(
            db.clone(),
            registry.clone(),
            summary_interval_ms,
        ));
        let (events_tx, _) = broadcast::channel(EVENTS_CHANNEL_CAPACITY);

        Self {
            db,
            registry,
            postprocessor,
            events_tx,
            started_at_ms: now_ms(),
        }
    }

    pub fn database(&self) -> &DatabaseHandler {
        &self.db
    }

    pub fn postprocessor(&self) -> &Arc<PostProcessor> {
        &self.postprocessor
    }

    pub fn device_count(&self) -> usize {
        self.registry.len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusSnapshot> {
        self.events_tx.subscribe()
    }

    pub async fn snapshot(&self) -> StatusSnapshot {
        let now = now_ms();
        StatusSnapshot {
            timestamp: now,
            uptime_ms: now - self.started_at_ms,
            devices: self.registry.snapshot_devices().await,
        }
    }

    /// One-way notification; listeners that lag or disappear never block
    /// ingest.
    pub(crate) async fn broadcast_snapshot(&self) {
        let snapshot = self.snapshot().await;
        let _ = self.events_tx.send(snapshot);
    }

    pub async fn handle_posture(&self, input: PostureInput) -> anyhow::Result<()> {
        if let Some(device) = &input.device {
            if let Some(entry) = self.registry.get(device) {
                entry.state.lock().await.last_posture = Some(input.to_posture.clone());
            }
        }

        self.db
            .create_posture(PostureRecord {
                time: now_ms(),
                from_posture: input.from_posture,
                to_posture: input.to_posture,
                source: input.source,
                from_duration_seconds: input.from_duration_seconds,
                confidence: input.confidence,
            })
            .await
    }

    pub async fn handle_status(&self, input: StatusEventInput) -> anyhow::Result<()> {
        let event_key = format!("{}.{}", input.category, input.event);

        if event_key == "ble.disconnected" {
            if let Some(device) = &input.device {
                if self.registry.remove(device) {
                    info!("cleared in-memory state for {device}");
                }
                // The next beat re-reads the watermark from the store.
                self.postprocessor.unregister_device(device).await;
            }
        }

        if !PERSISTED_STATUS_EVENTS.contains(&event_key.as_str()) {
            debug!("status event {event_key} is log-only");
            return Ok(());
        }

        let mut fields = match input.fields {
            Some(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        if let Some(description) = input.description {
            fields.insert("description".to_string(), description.into());
        }
        if fields.is_empty() {
            fields.insert("value".to_string(), 1.into());
        }

        self.db
            .create_status(StatusRecord {
                time: now_ms(),
                category: input.category,
                event: input.event,
                source: input.source,
                device: input.device,
                fields: Some(serde_json::Value::Object(fields)),
            })
            .await
    }

    /// Rewinds one device and processes the backlog in a single foreground
    /// pass.
    pub async fn reprocess(&self, device: &str, from_ms: i64) -> anyhow::Result<()> {
        self.postprocessor.register_device(device).await;
        self.postprocessor.trigger_reprocess(device, from_ms).await;
        self.postprocessor.process_device(device, now_ms()).await
    }

    pub async fn serve(self: Arc<Self>, port: u16) -> anyhow::Result<()> {
        self.postprocessor.clone().spawn();

        let app = crate::api::create_router(self.clone());
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("listening on {addr}");
        axum::serve(listener, app).await?;

        Ok(())
    }
}
