//! Request and response bodies for the ingest surface. Payloads are
//! camelCase JSON as emitted by the relay and the mobile client.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatsRequest {
    pub source: Option<String>,
    pub device: Option<String>,
    /// Epoch milliseconds; defaults to arrival time.
    pub timestamp: Option<i64>,
    pub heart_rate: Option<f64>,
    pub rr_intervals: Option<Vec<f64>>,
    pub posture: Option<String>,
    #[allow(dead_code)]
    pub rssi: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub source: Option<String>,
    pub device: Option<String>,
    pub beats: Option<Vec<BatchBeatBody>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchBeatBody {
    pub timestamp: Option<i64>,
    pub heart_rate: Option<f64>,
    pub rr_intervals: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostureRequest {
    pub source: Option<String>,
    pub device: Option<String>,
    pub from_posture: Option<String>,
    pub to_posture: Option<String>,
    pub from_duration_seconds: Option<f64>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub source: Option<String>,
    pub device: Option<String>,
    pub category: Option<String>,
    pub event: Option<String>,
    pub description: Option<String>,
    pub fields: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct BeatsResponse {
    pub ok: bool,
    pub received: usize,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub ok: bool,
    pub received: usize,
    pub new: usize,
    pub duplicates: usize,
}

#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub devices: usize,
}
