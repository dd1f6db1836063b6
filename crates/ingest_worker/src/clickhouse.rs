mod schema;
mod telemetry_repository;

pub use schema::*;
pub use telemetry_repository::*;
