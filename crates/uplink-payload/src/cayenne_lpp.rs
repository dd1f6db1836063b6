//! Cayenne LPP (Low Power Payload) codec.
//!
//! Each entry in a payload is laid out as:
//!
//! ```text
//! | channel (1 byte) | type (1 byte) | value (type-dependent width) |
//! ```
//!
//! Multi-byte values are big-endian. The resolution of each type follows the
//! published Cayenne LPP table:
//!
//! | Type            | ID  | Size | Resolution            |
//! |-----------------|-----|------|-----------------------|
//! | Digital input   | 0   | 1    | 1, unsigned           |
//! | Digital output  | 1   | 1    | 1, unsigned           |
//! | Analog input    | 2   | 2    | 0.01, signed          |
//! | Analog output   | 3   | 2    | 0.01, signed          |
//! | Illuminance     | 101 | 2    | 1 lux, unsigned       |
//! | Presence        | 102 | 1    | 1                     |
//! | Temperature     | 103 | 2    | 0.1 °C, signed        |
//! | Humidity        | 104 | 1    | 0.5 %, unsigned       |
//! | Accelerometer   | 113 | 6    | 0.001 G per axis      |
//! | Barometer       | 115 | 2    | 0.1 hPa, unsigned     |
//! | Gyrometer       | 134 | 6    | 0.01 °/s per axis     |
//! | GPS             | 136 | 9    | 0.0001° lat/lon, 0.01 m alt |

use crate::channel::{ChannelReading, ChannelValue, SensorKind};
use crate::{PayloadDecoder, PayloadError, Result};

const ANALOG_SCALE: f64 = 100.0;
const TEMPERATURE_SCALE: f64 = 10.0;
const HUMIDITY_SCALE: f64 = 2.0;
const ACCELEROMETER_SCALE: f64 = 1000.0;
const BAROMETER_SCALE: f64 = 10.0;
const GYROMETER_SCALE: f64 = 100.0;
const GPS_COORDINATE_SCALE: f64 = 10000.0;
const GPS_ALTITUDE_SCALE: f64 = 100.0;

const I24_MIN: i64 = -(1 << 23);
const I24_MAX: i64 = (1 << 23) - 1;

#[derive(Debug, Clone, Copy, Default)]
pub struct CayenneLppDecoder;

impl CayenneLppDecoder {
    pub fn new() -> Self {
        Self
    }

    fn read_i16_be(data: &[u8]) -> i16 {
        i16::from_be_bytes([data[0], data[1]])
    }

    fn read_u16_be(data: &[u8]) -> u16 {
        u16::from_be_bytes([data[0], data[1]])
    }

    fn read_i24_be(data: &[u8]) -> i32 {
        // Sign-extend 24-bit to 32-bit
        let value = (i32::from(data[0]) << 24)
            | (i32::from(data[1]) << 16)
            | (i32::from(data[2]) << 8);
        value >> 8
    }

    fn read_vector(data: &[u8], scale: f64) -> ChannelValue {
        ChannelValue::Vector3(
            f64::from(Self::read_i16_be(&data[0..2])) / scale,
            f64::from(Self::read_i16_be(&data[2..4])) / scale,
            f64::from(Self::read_i16_be(&data[4..6])) / scale,
        )
    }

    /// `data` is exactly `kind.data_size()` bytes long.
    fn decode_value(kind: SensorKind, data: &[u8]) -> ChannelValue {
        match kind {
            SensorKind::DigitalInput | SensorKind::DigitalOutput => {
                ChannelValue::Scalar(f64::from(data[0]))
            }
            SensorKind::AnalogInput | SensorKind::AnalogOutput => {
                ChannelValue::Scalar(f64::from(Self::read_i16_be(data)) / ANALOG_SCALE)
            }
            SensorKind::Illuminance => ChannelValue::Scalar(f64::from(Self::read_u16_be(data))),
            SensorKind::Presence => ChannelValue::Boolean(data[0] != 0),
            SensorKind::Temperature => {
                ChannelValue::Scalar(f64::from(Self::read_i16_be(data)) / TEMPERATURE_SCALE)
            }
            SensorKind::Humidity => ChannelValue::Scalar(f64::from(data[0]) / HUMIDITY_SCALE),
            SensorKind::Accelerometer => Self::read_vector(data, ACCELEROMETER_SCALE),
            SensorKind::Barometer => {
                ChannelValue::Scalar(f64::from(Self::read_u16_be(data)) / BAROMETER_SCALE)
            }
            SensorKind::Gyrometer => Self::read_vector(data, GYROMETER_SCALE),
            SensorKind::Gps => ChannelValue::Vector3(
                f64::from(Self::read_i24_be(&data[0..3])) / GPS_COORDINATE_SCALE,
                f64::from(Self::read_i24_be(&data[3..6])) / GPS_COORDINATE_SCALE,
                f64::from(Self::read_i24_be(&data[6..9])) / GPS_ALTITUDE_SCALE,
            ),
        }
    }
}

impl PayloadDecoder for CayenneLppDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<ChannelReading>> {
        let mut readings = Vec::new();
        let mut offset = 0;

        while offset < bytes.len() {
            // Need at least 2 bytes for channel + type
            if offset + 2 > bytes.len() {
                return Err(PayloadError::InsufficientData {
                    offset,
                    expected: 2,
                    actual: bytes.len() - offset,
                });
            }

            let channel = bytes[offset];
            let type_id = bytes[offset + 1];
            offset += 2;

            let kind = SensorKind::from_type_id(type_id)
                .ok_or(PayloadError::UnsupportedType { channel, type_id })?;
            let data_size = kind.data_size();

            if offset + data_size > bytes.len() {
                return Err(PayloadError::InsufficientData {
                    offset,
                    expected: data_size,
                    actual: bytes.len() - offset,
                });
            }

            let value = Self::decode_value(kind, &bytes[offset..offset + data_size]);
            offset += data_size;

            readings.push(ChannelReading::new(channel, kind, value));
        }

        Ok(readings)
    }
}

/// Writes channel readings in the Cayenne LPP wire format.
///
/// Values are rounded to the nearest raw unit of their kind, so encoding a
/// decoded reading reproduces the original bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CayenneLppEncoder;

impl CayenneLppEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, readings: &[ChannelReading]) -> Result<Vec<u8>> {
        let mut buffer = Vec::with_capacity(
            readings
                .iter()
                .map(|reading| 2 + reading.kind.data_size())
                .sum(),
        );

        for reading in readings {
            buffer.push(reading.channel);
            buffer.push(reading.kind.type_id());
            Self::encode_value(reading, &mut buffer)?;
        }

        Ok(buffer)
    }

    fn encode_value(reading: &ChannelReading, buffer: &mut Vec<u8>) -> Result<()> {
        let kind = reading.kind;
        match (kind, reading.value) {
            (SensorKind::DigitalInput | SensorKind::DigitalOutput, ChannelValue::Scalar(v)) => {
                buffer.push(Self::to_u8(reading, v, 1.0)?);
            }
            (SensorKind::AnalogInput | SensorKind::AnalogOutput, ChannelValue::Scalar(v)) => {
                buffer.extend_from_slice(&Self::to_i16(reading, v, ANALOG_SCALE)?.to_be_bytes());
            }
            (SensorKind::Illuminance, ChannelValue::Scalar(v)) => {
                buffer.extend_from_slice(&Self::to_u16(reading, v, 1.0)?.to_be_bytes());
            }
            (SensorKind::Presence, ChannelValue::Boolean(present)) => {
                buffer.push(u8::from(present));
            }
            (SensorKind::Temperature, ChannelValue::Scalar(v)) => {
                buffer
                    .extend_from_slice(&Self::to_i16(reading, v, TEMPERATURE_SCALE)?.to_be_bytes());
            }
            (SensorKind::Humidity, ChannelValue::Scalar(v)) => {
                buffer.push(Self::to_u8(reading, v, HUMIDITY_SCALE)?);
            }
            (SensorKind::Barometer, ChannelValue::Scalar(v)) => {
                buffer.extend_from_slice(&Self::to_u16(reading, v, BAROMETER_SCALE)?.to_be_bytes());
            }
            (SensorKind::Accelerometer, ChannelValue::Vector3(x, y, z)) => {
                for axis in [x, y, z] {
                    buffer.extend_from_slice(
                        &Self::to_i16(reading, axis, ACCELEROMETER_SCALE)?.to_be_bytes(),
                    );
                }
            }
            (SensorKind::Gyrometer, ChannelValue::Vector3(x, y, z)) => {
                for axis in [x, y, z] {
                    buffer.extend_from_slice(
                        &Self::to_i16(reading, axis, GYROMETER_SCALE)?.to_be_bytes(),
                    );
                }
            }
            (SensorKind::Gps, ChannelValue::Vector3(lat, lon, alt)) => {
                buffer.extend_from_slice(&Self::to_i24(reading, lat, GPS_COORDINATE_SCALE)?);
                buffer.extend_from_slice(&Self::to_i24(reading, lon, GPS_COORDINATE_SCALE)?);
                buffer.extend_from_slice(&Self::to_i24(reading, alt, GPS_ALTITUDE_SCALE)?);
            }
            (_, value) => {
                return Err(Self::invalid(
                    reading,
                    format!("value {:?} does not match the sensor type", value),
                ))
            }
        }
        Ok(())
    }

    fn raw(reading: &ChannelReading, value: f64, scale: f64, min: i64, max: i64) -> Result<i64> {
        let raw = (value * scale).round();
        if !raw.is_finite() || raw < min as f64 || raw > max as f64 {
            return Err(Self::invalid(
                reading,
                format!("{} is outside the encodable range", value),
            ));
        }
        Ok(raw as i64)
    }

    fn to_u8(reading: &ChannelReading, value: f64, scale: f64) -> Result<u8> {
        Ok(Self::raw(reading, value, scale, 0, i64::from(u8::MAX))? as u8)
    }

    fn to_u16(reading: &ChannelReading, value: f64, scale: f64) -> Result<u16> {
        Ok(Self::raw(reading, value, scale, 0, i64::from(u16::MAX))? as u16)
    }

    fn to_i16(reading: &ChannelReading, value: f64, scale: f64) -> Result<i16> {
        Ok(Self::raw(
            reading,
            value,
            scale,
            i64::from(i16::MIN),
            i64::from(i16::MAX),
        )? as i16)
    }

    fn to_i24(reading: &ChannelReading, value: f64, scale: f64) -> Result<[u8; 3]> {
        let raw = Self::raw(reading, value, scale, I24_MIN, I24_MAX)? as i32;
        let bytes = raw.to_be_bytes();
        Ok([bytes[1], bytes[2], bytes[3]])
    }

    fn invalid(reading: &ChannelReading, reason: String) -> PayloadError {
        PayloadError::InvalidValue {
            channel: reading.channel,
            kind: reading.kind,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(payload: &[u8]) -> Result<Vec<ChannelReading>> {
        CayenneLppDecoder::new().decode(payload)
    }

    fn single(payload: &[u8]) -> ChannelReading {
        let readings = decode(payload).unwrap();
        assert_eq!(readings.len(), 1);
        readings[0]
    }

    #[test]
    fn test_empty_payload() {
        assert!(decode(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_digital_input() {
        // Channel 3, Digital Input (type 0), Value 100
        let reading = single(&[0x03, 0x00, 0x64]);
        assert_eq!(reading.channel, 3);
        assert_eq!(reading.kind, SensorKind::DigitalInput);
        assert_eq!(reading.value, ChannelValue::Scalar(100.0));
    }

    #[test]
    fn test_digital_output() {
        // Channel 5, Digital Output (type 1), Value 255
        let reading = single(&[0x05, 0x01, 0xFF]);
        assert_eq!(reading.kind, SensorKind::DigitalOutput);
        assert_eq!(reading.value, ChannelValue::Scalar(255.0));
    }

    #[test]
    fn test_analog_input() {
        // Channel 3, Analog Input (type 2), Value 0.1 (raw: 10)
        let reading = single(&[0x03, 0x02, 0x00, 0x0A]);
        assert_eq!(reading.value, ChannelValue::Scalar(0.1));
    }

    #[test]
    fn test_analog_output_negative() {
        // Channel 7, Analog Output (type 3), Value -1.5 (raw: -150)
        let reading = single(&[0x07, 0x03, 0xFF, 0x6A]);
        assert_eq!(reading.kind, SensorKind::AnalogOutput);
        assert_eq!(reading.value, ChannelValue::Scalar(-1.5));
    }

    #[test]
    fn test_temperature_21_5_is_exact() {
        // Channel 3, Temperature (type 103), Value 21.5°C (raw: 215)
        let reading = single(&[0x03, 0x67, 0x00, 0xD7]);
        assert_eq!(reading.kind, SensorKind::Temperature);
        assert_eq!(reading.value, ChannelValue::Scalar(21.5));
    }

    #[test]
    fn test_temperature_negative() {
        // Channel 5, Temperature (type 103), Value -0.1°C (raw: -1)
        let reading = single(&[0x05, 0x67, 0xFF, 0xFF]);
        assert_eq!(reading.value, ChannelValue::Scalar(-0.1));
    }

    #[test]
    fn test_humidity() {
        // Channel 5, Humidity (type 104), Value 50% (raw: 100)
        let reading = single(&[0x05, 0x68, 0x64]);
        assert_eq!(reading.kind, SensorKind::Humidity);
        assert_eq!(reading.value, ChannelValue::Scalar(50.0));
    }

    #[test]
    fn test_humidity_half_step() {
        // Channel 1, Humidity (type 104), Value 60.5% (raw: 121)
        let reading = single(&[0x01, 0x68, 0x79]);
        assert_eq!(reading.value, ChannelValue::Scalar(60.5));
    }

    #[test]
    fn test_illuminance() {
        // Channel 2, Illuminance (type 101), Value 1000 lux
        let reading = single(&[0x02, 0x65, 0x03, 0xE8]);
        assert_eq!(reading.value, ChannelValue::Scalar(1000.0));
    }

    #[test]
    fn test_presence() {
        assert_eq!(single(&[0x05, 0x66, 0x01]).value, ChannelValue::Boolean(true));
        assert_eq!(single(&[0x05, 0x66, 0x00]).value, ChannelValue::Boolean(false));
    }

    #[test]
    fn test_accelerometer_negative() {
        // Channel 2, Accelerometer (type 113), X=-0.5, Y=0.0, Z=1.0
        let reading = single(&[0x02, 0x71, 0xFE, 0x0C, 0x00, 0x00, 0x03, 0xE8]);
        assert_eq!(reading.kind, SensorKind::Accelerometer);
        assert_eq!(reading.value, ChannelValue::Vector3(-0.5, 0.0, 1.0));
    }

    #[test]
    fn test_barometer() {
        // Channel 3, Barometer (type 115), Value 1013.2 hPa (raw: 10132)
        let reading = single(&[0x03, 0x73, 0x27, 0x94]);
        assert_eq!(reading.value, ChannelValue::Scalar(1013.2));
    }

    #[test]
    fn test_gyrometer_negative() {
        // Channel 4, Gyrometer (type 134), X=-10.5, Y=5.25, Z=0.0
        let reading = single(&[0x04, 0x86, 0xFB, 0xE6, 0x02, 0x0D, 0x00, 0x00]);
        assert_eq!(reading.kind, SensorKind::Gyrometer);
        assert_eq!(reading.value, ChannelValue::Vector3(-10.5, 5.25, 0.0));
    }

    #[test]
    fn test_gps() {
        // Channel 1, GPS (type 136)
        // Lat: 42.3519° (raw: 423519), Lon: -87.9094° (raw: -879094), Alt: 10m (raw: 1000)
        let reading = single(&[
            0x01, 0x88, 0x06, 0x76, 0x5F, 0xF2, 0x96, 0x0A, 0x00, 0x03, 0xE8,
        ]);
        assert_eq!(reading.kind, SensorKind::Gps);
        assert_eq!(reading.value, ChannelValue::Vector3(42.3519, -87.9094, 10.0));
    }

    #[test]
    fn test_readings_keep_buffer_order() {
        // Channel 5 Humidity 50% followed by Channel 3 Temperature 27.2°C
        let readings = decode(&[0x05, 0x68, 0x64, 0x03, 0x67, 0x01, 0x10]).unwrap();
        let channels: Vec<u8> = readings.iter().map(|r| r.channel).collect();
        assert_eq!(channels, vec![5, 3]);
        assert_eq!(readings[1].value, ChannelValue::Scalar(27.2));
    }

    #[test]
    fn test_repeated_channel_is_not_deduplicated() {
        let readings = decode(&[0x03, 0x67, 0x01, 0x10, 0x03, 0x67, 0x00, 0xD7]).unwrap();
        assert_eq!(readings.len(), 2);
    }

    #[test]
    fn test_insufficient_data_for_header() {
        // Only 1 byte (need 2 for channel + type)
        let result = decode(&[0x03]);
        assert!(matches!(
            result,
            Err(PayloadError::InsufficientData {
                offset: 0,
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_insufficient_data_for_sensor() {
        // Channel 3, Temperature (type 103) but only 1 byte of data (need 2)
        let result = decode(&[0x03, 0x67, 0x01]);
        assert!(matches!(
            result,
            Err(PayloadError::InsufficientData {
                offset: 2,
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_truncation_after_valid_entry_discards_everything() {
        // Valid humidity entry followed by a GPS entry missing its last byte
        let payload = [
            0x01, 0x68, 0x64, 0x02, 0x88, 0x06, 0x76, 0x5F, 0xF2, 0x96, 0x0A, 0x00, 0x03,
        ];
        assert!(matches!(
            decode(&payload),
            Err(PayloadError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_unsupported_type() {
        // Channel 3, Invalid type 99
        let result = decode(&[0x03, 0x63, 0x01, 0x02]);
        assert!(matches!(
            result,
            Err(PayloadError::UnsupportedType {
                channel: 3,
                type_id: 99
            })
        ));
    }

    #[test]
    fn test_encode_temperature() {
        let readings = [ChannelReading::new(
            3,
            SensorKind::Temperature,
            ChannelValue::Scalar(21.5),
        )];
        let bytes = CayenneLppEncoder::new().encode(&readings).unwrap();
        assert_eq!(bytes, vec![0x03, 0x67, 0x00, 0xD7]);
    }

    #[test]
    fn test_encode_gps_negative_coordinates() {
        // -100000 = 0xFE7960, 205000 = 0x0320C8, -1525 = 0xFFFA0B
        let readings = [ChannelReading::new(
            2,
            SensorKind::Gps,
            ChannelValue::Vector3(-10.0, 20.5, -15.25),
        )];
        let bytes = CayenneLppEncoder::new().encode(&readings).unwrap();
        assert_eq!(
            bytes,
            vec![0x02, 0x88, 0xFE, 0x79, 0x60, 0x03, 0x20, 0xC8, 0xFF, 0xFA, 0x0B]
        );
    }

    #[test]
    fn test_encode_rejects_mismatched_value() {
        let readings = [ChannelReading::new(
            1,
            SensorKind::Temperature,
            ChannelValue::Boolean(true),
        )];
        let result = CayenneLppEncoder::new().encode(&readings);
        assert!(matches!(
            result,
            Err(PayloadError::InvalidValue {
                channel: 1,
                kind: SensorKind::Temperature,
                ..
            })
        ));
    }

    #[test]
    fn test_encode_rejects_out_of_range() {
        // Humidity is a single unsigned byte at 0.5% steps, so 200% does not fit
        let readings = [ChannelReading::new(
            1,
            SensorKind::Humidity,
            ChannelValue::Scalar(200.0),
        )];
        assert!(matches!(
            CayenneLppEncoder::new().encode(&readings),
            Err(PayloadError::InvalidValue { .. })
        ));
    }
}
