//! Codec for CayenneLPP sensor payloads carried in LoRaWAN uplinks.
//!
//! [`CayenneLppDecoder`] turns a binary buffer into [`ChannelReading`]s in
//! buffer order, [`ChannelMap`] folds them per channel, and
//! [`CayenneLppEncoder`] writes readings back into the wire format.

pub mod cayenne_lpp;
pub mod channel;
pub mod channel_map;
mod error;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub use cayenne_lpp::{CayenneLppDecoder, CayenneLppEncoder};
pub use channel::{ChannelReading, ChannelValue, SensorKind};
pub use channel_map::ChannelMap;
pub use error::{PayloadError, Result};

/// Trait for decoding binary payload formats into channel readings
pub trait PayloadDecoder {
    /// Decode a binary payload into readings, in buffer order
    fn decode(&self, bytes: &[u8]) -> Result<Vec<ChannelReading>>;
}

/// Decode the base64 text of a `frm_payload` field into raw bytes.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(encoded.trim())?)
}
