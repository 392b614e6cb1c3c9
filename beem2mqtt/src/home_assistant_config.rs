use serde::Serialize;

use crate::home_assistant::SensorKind;

static DEVICE_MANUFACTURER: &str = "Beem Energy";
static DEVICE_MODEL: &str = "Solar Panel";

/// `DeviceConfig` is used to define the configuration for a Home Assistant device
/// in the MQTT discovery protocol and is used to group entities together.
///
#[derive(Serialize, Clone)]
pub struct DeviceConfig {
    name: String,
    model: String,
    identifiers: Vec<String>,
    manufacturer: String,
    sw_version: String, // Software version of the application that supplies the discovered MQTT item.
}

impl DeviceConfig {
    pub fn new(name: String, identifiers: Vec<String>) -> Self {
        Self {
            name,
            model: DEVICE_MODEL.to_string(),
            identifiers,
            manufacturer: DEVICE_MANUFACTURER.to_string(),
            // Rust compiler sets the CARGO_PKG_VERSION environment from the Cargo.toml .
            sw_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.identifiers[0]
    }
}

/// `SensorConfig` is used to define the configuration for a Home Assistant sensor entity
/// in the MQTT discovery protocol.
///
/// More information about the MQTT discovery protocol can be found here:
/// https://www.home-assistant.io/docs/mqtt/discovery/
///
/// More information about the Home assistant sensor entities can be found here:
/// https://developers.home-assistant.io/docs/core/entity/sensor/
///
#[derive(Serialize)]
pub struct SensorConfig {
    pub unique_id: String, //  A globally unique identifier for the sensor.
    name: String,          // The name of the sensor.
    state_topic: String,   // The MQTT topic where sensor readings will be published.
    device: DeviceConfig, // The device that the sensor belongs to, used to group entities together.
    // exclude optional if they are not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    unit_of_measurement: Option<String>, // The unit of measurement of the sensor.
    #[serde(skip_serializing_if = "Option::is_none")]
    device_class: Option<String>, // The type/class of the sensor, e.g. energy, power, temperature, etc.
    #[serde(skip_serializing_if = "Option::is_none")]
    state_class: Option<String>, // The type/class of the state, e.g. measurement, total_increasing, etc.
}

impl SensorConfig {
    pub fn new(kind: SensorKind, state_topic: &str, device_config: &DeviceConfig) -> Self {
        let (device_class, state_class) = match kind {
            SensorKind::Power => (Some("power"), Some("measurement")),
            SensorKind::EnergyDaily => (Some("energy"), Some("total_increasing")),
            SensorKind::EnergyMonth => (Some("energy"), Some("total_increasing")),
            SensorKind::SignalStrength => (Some("signal_strength"), Some("measurement")),
        };

        SensorConfig {
            unique_id: format!("{}_{}", device_config.device_id(), kind.slug()),
            name: kind.display_name().to_string(),
            state_topic: state_topic.to_string(),
            device: device_config.clone(),
            unit_of_measurement: Some(kind.unit().to_string()),
            device_class: device_class.map(str::to_string),
            state_class: state_class.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_payload_carries_identity_and_unit() {
        let device = DeviceConfig::new(
            "Beem Energy Roof".to_string(),
            Vec::from(["beem_energy_abc123".to_string()]),
        );
        let sensor = SensorConfig::new(
            SensorKind::Power,
            "homeassistant/sensor/beem_energy_abc123/power/state",
            &device,
        );

        let json = serde_json::to_value(&sensor).unwrap();
        assert_eq!(json["unique_id"], "beem_energy_abc123_power");
        assert_eq!(json["name"], "Current Power");
        assert_eq!(
            json["state_topic"],
            "homeassistant/sensor/beem_energy_abc123/power/state"
        );
        assert_eq!(json["unit_of_measurement"], "W");
        assert_eq!(json["device"]["manufacturer"], "Beem Energy");
        assert_eq!(json["device"]["model"], "Solar Panel");
        assert_eq!(json["device"]["identifiers"][0], "beem_energy_abc123");
    }
}
