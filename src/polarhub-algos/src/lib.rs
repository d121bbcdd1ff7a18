pub(crate) mod artifact;
pub use artifact::{analyze_rr, ArtifactType, BeatClass, RrAnalysis, MIN_SERIES_LEN};

pub(crate) mod hrv;
pub use hrv::HrvMetrics;
