//! Shared building blocks of the uplink ingestion service: the envelope and
//! record model, the storage seam, the ClickHouse client and telemetry setup.

mod clickhouse;
mod domain;
mod garde;
mod telemetry;

pub use crate::clickhouse::*;
pub use domain::*;
pub use crate::garde::*;
pub use telemetry::*;

// Re-export mocks when testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub use domain::MockTelemetryRepository;
