use crate::beem_api::BeemBox;
use crate::home_assistant_config::{DeviceConfig, SensorConfig};
use crate::metric_collector::MetricCollector;
use crate::mqtt_config::MqttConfig;
use crate::mqtt_wrapper::{MqttWrapper, QoS};

use log::{debug, error, warn};

static DISCOVERY_PREFIX: &str = "homeassistant";
static BASE_TOPIC: &str = "homeassistant";

/// The four sensors every Beem box exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorKind {
    Power,
    EnergyDaily,
    EnergyMonth,
    SignalStrength,
}

impl SensorKind {
    pub const ALL: [SensorKind; 4] = [
        SensorKind::Power,
        SensorKind::EnergyDaily,
        SensorKind::EnergyMonth,
        SensorKind::SignalStrength,
    ];

    /// Topic segment and unique-id suffix of this sensor.
    pub fn slug(self) -> &'static str {
        match self {
            SensorKind::Power => "power",
            SensorKind::EnergyDaily => "energy_daily",
            SensorKind::EnergyMonth => "energy_month",
            SensorKind::SignalStrength => "signal_strength",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SensorKind::Power => "Current Power",
            SensorKind::EnergyDaily => "Daily Energy",
            SensorKind::EnergyMonth => "Monthly Energy",
            SensorKind::SignalStrength => "Signal Strength",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            SensorKind::Power => "W",
            SensorKind::EnergyDaily => "Wh",
            SensorKind::EnergyMonth => "Wh",
            SensorKind::SignalStrength => "dBm",
        }
    }
}

/// One value of one sensor of one box, as published in a single cycle.
#[derive(Clone, Copy, Debug)]
pub struct SensorReading {
    pub kind: SensorKind,
    pub value: f64,
}

pub struct HomeAssistant<MQTT: MqttWrapper> {
    client: MQTT,
}

impl<MQTT: MqttWrapper> HomeAssistant<MQTT> {
    pub fn new(config: &MqttConfig) -> Self {
        let client = MQTT::new(config, "-ha");
        Self { client }
    }

    fn publish_retained<V>(&mut self, topic: &str, payload: V)
    where
        V: Clone + Into<Vec<u8>>,
    {
        if let Err(e) = self.client.publish(topic, QoS::AtMostOnce, true, payload) {
            error!("Failed to publish message: {e:?}");
        }
    }

    fn publish_config(
        &mut self,
        device_config: &DeviceConfig,
        state_topic: &str,
        kind: SensorKind,
    ) {
        // configs let home assistant know what sensors are available and where to find them
        let config_topic = format!(
            "{DISCOVERY_PREFIX}/sensor/{}/{}/config",
            device_config.device_id(),
            kind.slug()
        );
        let sensor_config = SensorConfig::new(kind, state_topic, device_config);

        let payload = serde_json::to_string(&sensor_config).unwrap();
        debug!("Publishing to {config_topic} with payload {payload}");
        self.publish_retained(&config_topic, payload);
    }

    fn publish_state(&mut self, state_topic: &str, value: f64) {
        // states contain the actual data, published as a plain scalar
        let payload = value.to_string();
        debug!("Publishing to {state_topic} with payload {payload}");
        self.publish_retained(state_topic, payload);
    }
}

impl<MQTT: MqttWrapper> MetricCollector for HomeAssistant<MQTT> {
    fn publish(&mut self, boxes: &[BeemBox]) {
        for device in boxes {
            let device_config =
                DeviceConfig::new(device.device_name(), Vec::from([device.device_id()]));
            // the config goes out before the state so that the entity exists
            // by the time its first value arrives
            for reading in device.sensor_readings() {
                let state_topic = device.state_topic(reading.kind);
                self.publish_config(&device_config, &state_topic, reading.kind);
                self.publish_state(&state_topic, reading.value);
            }
        }
    }

    fn disconnect(&mut self) {
        if let Err(e) = self.client.disconnect() {
            warn!("Failed to disconnect from broker: {e:?}");
        }
    }
}

/// `BeemBox` is one solar box as reported by the cloud summary.
///
/// Provide utility functions to derive its MQTT identity and readings.
impl BeemBox {
    pub fn device_id(&self) -> String {
        format!("beem_energy_{}", self.serial_number.to_lowercase())
    }

    pub fn device_name(&self) -> String {
        format!("Beem Energy {}", self.name)
    }

    pub fn state_topic(&self, kind: SensorKind) -> String {
        format!(
            "{BASE_TOPIC}/sensor/{}/{}/state",
            self.device_id(),
            kind.slug()
        )
    }

    pub fn sensor_readings(&self) -> [SensorReading; 4] {
        SensorKind::ALL.map(|kind| SensorReading {
            kind,
            value: match kind {
                SensorKind::Power => self.watt_hour,
                SensorKind::EnergyDaily => self.total_day,
                SensorKind::EnergyMonth => self.total_month,
                SensorKind::SignalStrength => self.last_dbm,
            },
        })
    }
}
