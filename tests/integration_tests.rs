use std::cell::RefCell;

use beem2mqtt::beem_api::BeemBox;
use beem2mqtt::home_assistant::HomeAssistant;
use beem2mqtt::metric_collector::MetricCollector;
use beem2mqtt::mqtt_config::MqttConfig;
use beem2mqtt::mqtt_wrapper::MqttWrapper;

#[derive(Clone, Debug)]
struct Message {
    topic: String,
    payload: Vec<u8>,
    retain: bool,
}

thread_local! {
    // each #[test] runs on its own thread, so the recordings never mix
    static PUBLISHED: RefCell<Vec<Message>> = const { RefCell::new(Vec::new()) };
    static DISCONNECTED: RefCell<bool> = const { RefCell::new(false) };
}

fn take_published() -> Vec<Message> {
    PUBLISHED.with(|published| published.borrow_mut().drain(..).collect())
}

struct MqttTester;

impl MqttWrapper for MqttTester {
    fn subscribe(&mut self, _topic: &str, _qos: beem2mqtt::mqtt_wrapper::QoS) -> anyhow::Result<()> {
        Ok(())
    }

    fn publish<S, V>(
        &mut self,
        topic: S,
        _qos: beem2mqtt::mqtt_wrapper::QoS,
        retain: bool,
        payload: V,
    ) -> anyhow::Result<()>
    where
        S: Clone + Into<String>,
        V: Clone + Into<Vec<u8>>,
    {
        PUBLISHED.with(|published| {
            published.borrow_mut().push(Message {
                topic: topic.into(),
                payload: payload.into(),
                retain,
            })
        });
        Ok(())
    }

    fn disconnect(&mut self) -> anyhow::Result<()> {
        DISCONNECTED.with(|disconnected| *disconnected.borrow_mut() = true);
        Ok(())
    }

    fn new(_config: &MqttConfig, _suffix: &str) -> Self {
        Self
    }
}

fn test_config() -> MqttConfig {
    MqttConfig {
        host: "localhost".to_owned(),
        port: Some(1883),
        username: None,
        password: None,
        client_id: Some("beem-energy-client".to_string()),
        tls: None,
    }
}

fn roof_box() -> BeemBox {
    BeemBox {
        serial_number: "ABC123".into(),
        name: "Roof".into(),
        watt_hour: 150.0,
        total_day: 900.0,
        total_month: 20000.0,
        last_dbm: -60.0,
    }
}

#[test]
fn publish_one_message() {
    let mut mqtt = MqttTester::new(&test_config(), "-test");
    let result = mqtt.publish(
        "foo",
        beem2mqtt::mqtt_wrapper::QoS::AtMostOnce,
        true,
        "Hooray".to_string(),
    );
    assert!(result.is_ok());
    assert_eq!(take_published().len(), 1);
}

#[test]
fn one_box_yields_discovery_and_state_for_four_sensors() {
    let mut publisher = HomeAssistant::<MqttTester>::new(&test_config());
    publisher.publish(&[roof_box()]);

    let messages = take_published();
    assert_eq!(messages.len(), 8);

    let expected = [
        ("power", "150"),
        ("energy_daily", "900"),
        ("energy_month", "20000"),
        ("signal_strength", "-60"),
    ];
    for (i, (sensor_type, value)) in expected.iter().enumerate() {
        let config = &messages[2 * i];
        let state = &messages[2 * i + 1];

        // the discovery config must precede the state on every cycle
        assert_eq!(
            config.topic,
            format!("homeassistant/sensor/beem_energy_abc123/{sensor_type}/config")
        );
        assert_eq!(
            state.topic,
            format!("homeassistant/sensor/beem_energy_abc123/{sensor_type}/state")
        );
        assert_eq!(String::from_utf8(state.payload.clone()).unwrap(), *value);
    }

    // everything is retained so late subscribers catch up immediately
    assert!(messages.iter().all(|message| message.retain));
}

#[test]
fn discovery_payload_references_the_state_topic() {
    let mut publisher = HomeAssistant::<MqttTester>::new(&test_config());
    publisher.publish(&[roof_box()]);

    let messages = take_published();
    let config: serde_json::Value = serde_json::from_slice(&messages[0].payload).unwrap();

    assert_eq!(config["name"], "Current Power");
    assert_eq!(config["unique_id"], "beem_energy_abc123_power");
    assert_eq!(
        config["state_topic"],
        "homeassistant/sensor/beem_energy_abc123/power/state"
    );
    assert_eq!(config["unit_of_measurement"], "W");
    assert_eq!(config["device"]["name"], "Beem Energy Roof");
    assert_eq!(config["device"]["manufacturer"], "Beem Energy");
    assert_eq!(config["device"]["model"], "Solar Panel");
}

#[test]
fn empty_summary_publishes_nothing() {
    let mut publisher = HomeAssistant::<MqttTester>::new(&test_config());
    publisher.publish(&[]);
    assert!(take_published().is_empty());
}

#[test]
fn two_boxes_publish_independent_devices() {
    let second = BeemBox {
        serial_number: "XYZ789".into(),
        name: "Garden".into(),
        watt_hour: 42.0,
        total_day: 100.0,
        total_month: 5000.0,
        last_dbm: -71.0,
    };

    let mut publisher = HomeAssistant::<MqttTester>::new(&test_config());
    publisher.publish(&[roof_box(), second]);

    let messages = take_published();
    assert_eq!(messages.len(), 16);
    assert!(messages[0].topic.contains("beem_energy_abc123"));
    assert!(messages[8].topic.contains("beem_energy_xyz789"));
}

#[test]
fn disconnect_reaches_the_wrapped_client() {
    let mut publisher = HomeAssistant::<MqttTester>::new(&test_config());
    publisher.disconnect();
    assert!(DISCONNECTED.with(|disconnected| *disconnected.borrow()));
}
