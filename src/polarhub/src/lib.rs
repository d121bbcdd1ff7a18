#[macro_use]
extern crate log;

pub mod api;

mod hub;
pub use hub::{now_ms, PolarHub, PostureInput, StatusEventInput, StatusSnapshot};

mod registry;
pub use registry::{DeviceRegistry, DeviceSnapshot, DeviceState};

mod realtime;
pub use realtime::BeatsIngest;

mod batch;
pub use batch::{BatchBeat, BatchIngest, BatchReport};

mod postprocess;
pub use postprocess::PostProcessor;
