mod live_state;
mod telemetry_normalizer;
mod uplink_ingestion_service;

pub use live_state::*;
pub use telemetry_normalizer::*;
pub use uplink_ingestion_service::*;
