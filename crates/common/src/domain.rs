mod envelope;
mod result;
mod telemetry;

pub use envelope::*;
pub use result::*;
pub use telemetry::*;
