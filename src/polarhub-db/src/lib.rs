mod db;
pub use db::DatabaseHandler;

mod beats;
pub use beats::{BeatRecord, SearchBeats};

mod hrv;
pub use hrv::{RealtimePoint, SummaryPoint};

mod events;
pub use events::{PostureRecord, StatusRecord};
