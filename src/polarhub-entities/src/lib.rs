pub mod polar_hrv_summary;
pub mod polar_posture;
pub mod polar_raw;
pub mod polar_realtime;
pub mod polar_relay_status;
