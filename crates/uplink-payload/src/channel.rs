use serde_json::{json, Value};
use std::fmt;

// Sensor type IDs from the Cayenne LPP specification
pub const TYPE_DIGITAL_INPUT: u8 = 0;
pub const TYPE_DIGITAL_OUTPUT: u8 = 1;
pub const TYPE_ANALOG_INPUT: u8 = 2;
pub const TYPE_ANALOG_OUTPUT: u8 = 3;
pub const TYPE_ILLUMINANCE: u8 = 101;
pub const TYPE_PRESENCE: u8 = 102;
pub const TYPE_TEMPERATURE: u8 = 103;
pub const TYPE_HUMIDITY: u8 = 104;
pub const TYPE_ACCELEROMETER: u8 = 113;
pub const TYPE_BAROMETER: u8 = 115;
pub const TYPE_GYROMETER: u8 = 134;
pub const TYPE_GPS: u8 = 136;

/// The fixed catalog of sensor kinds a payload can carry.
///
/// The kind alone decides how many value bytes follow the type tag and how
/// they are scaled, see [`SensorKind::data_size`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    DigitalInput,
    DigitalOutput,
    AnalogInput,
    AnalogOutput,
    Illuminance,
    Presence,
    Temperature,
    Humidity,
    Accelerometer,
    Barometer,
    Gyrometer,
    Gps,
}

impl SensorKind {
    pub fn from_type_id(type_id: u8) -> Option<Self> {
        let kind = match type_id {
            TYPE_DIGITAL_INPUT => Self::DigitalInput,
            TYPE_DIGITAL_OUTPUT => Self::DigitalOutput,
            TYPE_ANALOG_INPUT => Self::AnalogInput,
            TYPE_ANALOG_OUTPUT => Self::AnalogOutput,
            TYPE_ILLUMINANCE => Self::Illuminance,
            TYPE_PRESENCE => Self::Presence,
            TYPE_TEMPERATURE => Self::Temperature,
            TYPE_HUMIDITY => Self::Humidity,
            TYPE_ACCELEROMETER => Self::Accelerometer,
            TYPE_BAROMETER => Self::Barometer,
            TYPE_GYROMETER => Self::Gyrometer,
            TYPE_GPS => Self::Gps,
            _ => return None,
        };
        Some(kind)
    }

    pub fn type_id(self) -> u8 {
        match self {
            Self::DigitalInput => TYPE_DIGITAL_INPUT,
            Self::DigitalOutput => TYPE_DIGITAL_OUTPUT,
            Self::AnalogInput => TYPE_ANALOG_INPUT,
            Self::AnalogOutput => TYPE_ANALOG_OUTPUT,
            Self::Illuminance => TYPE_ILLUMINANCE,
            Self::Presence => TYPE_PRESENCE,
            Self::Temperature => TYPE_TEMPERATURE,
            Self::Humidity => TYPE_HUMIDITY,
            Self::Accelerometer => TYPE_ACCELEROMETER,
            Self::Barometer => TYPE_BAROMETER,
            Self::Gyrometer => TYPE_GYROMETER,
            Self::Gps => TYPE_GPS,
        }
    }

    /// Name used as the prefix of storage keys, e.g. `temperature_3`.
    pub fn name(self) -> &'static str {
        match self {
            Self::DigitalInput => "digital_input",
            Self::DigitalOutput => "digital_output",
            Self::AnalogInput => "analog_input",
            Self::AnalogOutput => "analog_output",
            Self::Illuminance => "illuminance",
            Self::Presence => "presence",
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Accelerometer => "accelerometer",
            Self::Barometer => "barometer",
            Self::Gyrometer => "gyrometer",
            Self::Gps => "gps",
        }
    }

    /// Number of value bytes following the channel and type bytes.
    pub fn data_size(self) -> usize {
        match self {
            Self::DigitalInput | Self::DigitalOutput | Self::Presence | Self::Humidity => 1,
            Self::AnalogInput
            | Self::AnalogOutput
            | Self::Illuminance
            | Self::Temperature
            | Self::Barometer => 2,
            Self::Accelerometer | Self::Gyrometer => 6,
            Self::Gps => 9,
        }
    }

    /// Kinds whose raw unit is a whole number and are stored as JSON integers.
    fn is_integral(self) -> bool {
        matches!(
            self,
            Self::DigitalInput | Self::DigitalOutput | Self::Illuminance
        )
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded value of a single channel entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelValue {
    Scalar(f64),
    /// Three-axis value. GPS readings hold latitude, longitude and altitude.
    Vector3(f64, f64, f64),
    Boolean(bool),
}

impl ChannelValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(value) => Some(*value),
            _ => None,
        }
    }
}

/// One decoded `channel | type | value` entry of a payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelReading {
    pub channel: u8,
    pub kind: SensorKind,
    pub value: ChannelValue,
}

impl ChannelReading {
    pub fn new(channel: u8, kind: SensorKind, value: ChannelValue) -> Self {
        Self {
            channel,
            kind,
            value,
        }
    }

    /// Storage key in the form `{kind}_{channel}`.
    pub fn field_name(&self) -> String {
        format!("{}_{}", self.kind.name(), self.channel)
    }

    /// JSON representation used in stored records.
    pub fn to_json(&self) -> Value {
        match (self.kind, self.value) {
            (kind, ChannelValue::Scalar(value)) if kind.is_integral() => json!(value as i64),
            (_, ChannelValue::Scalar(value)) => json!(value),
            (_, ChannelValue::Boolean(value)) => json!(value),
            (SensorKind::Gps, ChannelValue::Vector3(x, y, z)) => json!({
                "latitude": x,
                "longitude": y,
                "altitude": z,
            }),
            (_, ChannelValue::Vector3(x, y, z)) => json!({ "x": x, "y": y, "z": z }),
        }
    }
}
