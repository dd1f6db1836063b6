use crate::channel::{ChannelReading, SensorKind};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Readings of one payload keyed by channel.
///
/// A payload may repeat a channel identifier; the reading that appears last in
/// the buffer wins. Iteration is in ascending channel order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelMap {
    readings: BTreeMap<u8, ChannelReading>,
}

impl ChannelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold readings in order, later readings for a channel replacing earlier ones.
    pub fn aggregate<I>(readings: I) -> Self
    where
        I: IntoIterator<Item = ChannelReading>,
    {
        let mut map = Self::new();
        map.extend(readings);
        map
    }

    /// Insert a reading, returning the one it replaced for the same channel.
    pub fn insert(&mut self, reading: ChannelReading) -> Option<ChannelReading> {
        self.readings.insert(reading.channel, reading)
    }

    pub fn get(&self, channel: u8) -> Option<&ChannelReading> {
        self.readings.get(&channel)
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelReading> {
        self.readings.values()
    }

    /// First reading of the given kind, by ascending channel.
    pub fn first_of_kind(&self, kind: SensorKind) -> Option<&ChannelReading> {
        self.iter().find(|reading| reading.kind == kind)
    }

    /// Semantic `{kind}_{channel} -> value` mapping used for storage.
    pub fn to_json_map(&self) -> Map<String, Value> {
        self.iter()
            .map(|reading| (reading.field_name(), reading.to_json()))
            .collect()
    }
}

impl Extend<ChannelReading> for ChannelMap {
    fn extend<T: IntoIterator<Item = ChannelReading>>(&mut self, iter: T) {
        for reading in iter {
            self.insert(reading);
        }
    }
}

impl FromIterator<ChannelReading> for ChannelMap {
    fn from_iter<T: IntoIterator<Item = ChannelReading>>(iter: T) -> Self {
        Self::aggregate(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelValue;
    use serde_json::json;

    fn temperature(channel: u8, value: f64) -> ChannelReading {
        ChannelReading::new(channel, SensorKind::Temperature, ChannelValue::Scalar(value))
    }

    #[test]
    fn test_empty_input_yields_empty_map() {
        let map = ChannelMap::aggregate(Vec::new());
        assert!(map.is_empty());
        assert_eq!(map.to_json_map(), Map::new());
    }

    #[test]
    fn test_last_write_wins() {
        let map = ChannelMap::aggregate(vec![temperature(3, 27.2), temperature(3, 21.5)]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(3).unwrap().value, ChannelValue::Scalar(21.5));
    }

    #[test]
    fn test_same_kind_on_different_channels_is_kept() {
        let map = ChannelMap::aggregate(vec![temperature(3, 27.2), temperature(5, -0.1)]);
        assert_eq!(
            Value::Object(map.to_json_map()),
            json!({"temperature_3": 27.2, "temperature_5": -0.1})
        );
    }

    #[test]
    fn test_later_kind_replaces_earlier_kind_on_same_channel() {
        let humidity = ChannelReading::new(3, SensorKind::Humidity, ChannelValue::Scalar(50.0));
        let map = ChannelMap::aggregate(vec![temperature(3, 27.2), humidity]);
        assert_eq!(map.get(3).unwrap().kind, SensorKind::Humidity);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let readings = vec![
            temperature(3, 27.2),
            ChannelReading::new(5, SensorKind::Humidity, ChannelValue::Scalar(50.0)),
            temperature(3, 21.5),
        ];
        let once = ChannelMap::aggregate(readings.clone());
        let twice = ChannelMap::aggregate(readings.iter().chain(readings.iter()).copied());
        assert_eq!(once, twice);

        let reaggregated: ChannelMap = once.iter().copied().collect();
        assert_eq!(once, reaggregated);
    }

    #[test]
    fn test_first_of_kind_uses_lowest_channel() {
        let map = ChannelMap::aggregate(vec![temperature(9, 10.0), temperature(2, 20.0)]);
        assert_eq!(map.first_of_kind(SensorKind::Temperature).unwrap().channel, 2);
        assert!(map.first_of_kind(SensorKind::Gps).is_none());
    }
}
