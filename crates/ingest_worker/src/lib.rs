pub mod clickhouse;
pub mod domain;
pub mod http;
pub mod ingest_worker;

pub use crate::clickhouse::*;
pub use domain::*;
pub use http::*;
pub use ingest_worker::*;
