// keep in sync with the gateway's wire format
use chrono::{DateTime, Utc};

pub type DeviceId = i64;

/// One monitored IoT endpoint as the gateway reports it.
///
/// `name` and `location` are the only fields a client may edit; the rest is
/// server-assigned. `battery_level` and `signal_strength` are percentages.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: DeviceId, // unique, key
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub location: String,
    pub active: bool,
    pub battery_level: Option<u8>,   // 0-100
    pub signal_strength: Option<u8>, // 0-100
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceType {
    TrafficLight,
    AirQuality,
    StreetLight,
    WaterLevel,
    NoiseSensor,
    WeatherSensor,
    SecurityCamera,
    ParkingSensor,
    WasteSensor,
    SolarPanel,
}

impl DeviceType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::TrafficLight => "Traffic light",
            Self::AirQuality => "Air quality",
            Self::StreetLight => "Street light",
            Self::WaterLevel => "Water level",
            Self::NoiseSensor => "Noise sensor",
            Self::WeatherSensor => "Weather sensor",
            Self::SecurityCamera => "Security camera",
            Self::ParkingSensor => "Parking sensor",
            Self::WasteSensor => "Waste sensor",
            Self::SolarPanel => "Solar panel",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::TrafficLight => "🚦",
            Self::AirQuality => "🌬️",
            Self::StreetLight => "💡",
            Self::WaterLevel => "💧",
            Self::NoiseSensor => "🔊",
            Self::WeatherSensor => "🌤️",
            Self::SecurityCamera => "📹",
            Self::ParkingSensor => "🅿️",
            Self::WasteSensor => "🗑️",
            Self::SolarPanel => "☀️",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorType {
    Temperature,
    Humidity,
    AirQuality,
    Noise,
    Light,
    Motion,
}

impl SensorType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Temperature => "Temperature",
            Self::Humidity => "Humidity",
            Self::AirQuality => "Air quality",
            Self::Noise => "Noise",
            Self::Light => "Light",
            Self::Motion => "Motion",
        }
    }

    /// Display unit. Derived from the type; the wire `unit` field is an
    /// informational echo and never authoritative.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Humidity => "%",
            Self::AirQuality => "ppm",
            Self::Noise => "dB",
            Self::Light => "lx",
            Self::Motion => "",
        }
    }

    /// Path segment for the devices-by-type endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temperature => "TEMPERATURE",
            Self::Humidity => "HUMIDITY",
            Self::AirQuality => "AIR_QUALITY",
            Self::Noise => "NOISE",
            Self::Light => "LIGHT",
            Self::Motion => "MOTION",
        }
    }
}

impl std::fmt::Display for SensorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped measurement for a `(device_id, sensor_type)` series.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub id: i64,
    pub device_id: DeviceId,
    pub sensor_type: SensorType,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Partial device edit. Only these two fields are user-editable.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DevicePatch {
    pub name: String,
    pub location: String,
}

/// Bounded reading-range query for one device/type pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadingQuery {
    pub device_id: DeviceId,
    pub sensor_type: SensorType,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn device_wire_names_are_camel_case() {
        let json = r#"{
            "id": 7,
            "name": "Semaforo Centro",
            "type": "TRAFFIC_LIGHT",
            "location": "Av. Principal",
            "active": true,
            "batteryLevel": 85,
            "signalStrength": 90,
            "lastSeen": "2024-05-01T12:00:00Z"
        }"#;
        let dev: Device = serde_json::from_str(json).unwrap();
        assert_eq!(dev.id, 7);
        assert_eq!(dev.device_type, DeviceType::TrafficLight);
        assert_eq!(dev.battery_level, Some(85));

        let back = serde_json::to_string(&dev).unwrap();
        assert!(back.contains("\"batteryLevel\":85"));
        assert!(back.contains("\"type\":\"TRAFFIC_LIGHT\""));
    }

    #[test]
    fn reading_wire_names() {
        let json = r#"{
            "id": 1,
            "deviceId": 7,
            "sensorType": "TEMPERATURE",
            "value": 21.5,
            "unit": "CELSIUS",
            "timestamp": "2024-05-01T12:00:00Z"
        }"#;
        let reading: SensorReading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.device_id, 7);
        assert_eq!(reading.sensor_type, SensorType::Temperature);
        assert_eq!(
            reading.timestamp,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn units_derive_from_type() {
        assert_eq!(SensorType::Temperature.unit(), "°C");
        assert_eq!(SensorType::Humidity.unit(), "%");
        assert_eq!(SensorType::Noise.unit(), "dB");
    }
}
