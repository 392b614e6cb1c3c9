use std::time::Duration;
use std::{env, fs};

use log::{error, warn};
use serde_derive::Deserialize;

use crate::mqtt_config::MqttConfig;

static OPTIONS_PATH: &str = "/data/options.json";
static SUPERVISOR_MQTT_URL: &str = "http://supervisor/services/mqtt";
static SUPERVISOR_TOKEN_VAR: &str = "SUPERVISOR_TOKEN";

static DEFAULT_MQTT_HOST: &str = "localhost";
static DEFAULT_MQTT_PORT: u16 = 1883;
static DEFAULT_START_DELAY_SECONDS: u64 = 0;
static DEFAULT_REFRESH_INTERVAL_MINUTES: u64 = 1;
static MQTT_CLIENT_ID: &str = "beem-energy-client";

/// Add-on options as written by the user, plus the broker info merged in from
/// the supervisor. Loaded once at startup and immutable afterwards.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub beem_email: String,
    #[serde(default)]
    pub beem_password: String,
    pub mqtt_host: Option<String>,
    pub mqtt_port: Option<u16>,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub start_delayseconds: Option<u64>,
    pub refresh_interval: Option<u64>,
    pub debug: Option<bool>,
    // only ever set by the supervisor merge, never by the options file
    #[serde(skip)]
    mqtt_tls: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct MqttService {
    data: BrokerInfo,
}

/// Broker connection details handed out by the supervisor sidecar.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BrokerInfo {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl: Option<bool>,
}

impl Config {
    /// Load the add-on configuration. Never fails: a missing or malformed
    /// options file and an unreachable supervisor both degrade to defaults.
    pub fn load() -> Config {
        let contents = match fs::read_to_string(OPTIONS_PATH) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Could not read {OPTIONS_PATH}: {e}. Using empty configuration.");
                "".into()
            }
        };
        let mut config = Config::from_json(&contents);

        if let Some(broker_info) = fetch_broker_info() {
            config.merge_broker_info(broker_info);
        }

        config.warn_on_missing_credentials();
        config
    }

    pub fn from_json(contents: &str) -> Config {
        if contents.is_empty() {
            return Config::default();
        }
        match serde_json::from_str::<Config>(contents) {
            Ok(config) => config,
            Err(e) => {
                error!("Invalid JSON in add-on options: {e}");
                Config::default()
            }
        }
    }

    /// Merge the supervisor-provided broker details over the options file.
    /// Host and port always win; empty credential strings from the supervisor
    /// do not clobber values the user wrote into the options file.
    pub fn merge_broker_info(&mut self, broker_info: BrokerInfo) {
        self.mqtt_host = Some(broker_info.host);
        self.mqtt_port = Some(broker_info.port);
        if let Some(username) = broker_info.username.filter(|u| !u.is_empty()) {
            self.mqtt_username = Some(username);
        }
        if let Some(password) = broker_info.password.filter(|p| !p.is_empty()) {
            self.mqtt_password = Some(password);
        }
        if broker_info.ssl.is_some() {
            self.mqtt_tls = broker_info.ssl;
        }
    }

    fn warn_on_missing_credentials(&self) {
        if self.beem_email.is_empty() {
            error!("Beem Energy email not provided");
        }
        if self.beem_password.is_empty() {
            error!("Beem Energy password not provided");
        }
    }

    pub fn mqtt_config(&self) -> MqttConfig {
        MqttConfig {
            host: self
                .mqtt_host
                .clone()
                .unwrap_or_else(|| DEFAULT_MQTT_HOST.into()),
            port: Some(self.mqtt_port.unwrap_or(DEFAULT_MQTT_PORT)),
            username: self.mqtt_username.clone(),
            password: self.mqtt_password.clone(),
            client_id: Some(MQTT_CLIENT_ID.into()),
            tls: self.mqtt_tls,
        }
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_secs(self.start_delayseconds.unwrap_or(DEFAULT_START_DELAY_SECONDS))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(
            self.refresh_interval
                .unwrap_or(DEFAULT_REFRESH_INTERVAL_MINUTES)
                * 60,
        )
    }

    pub fn debug_mode(&self) -> bool {
        self.debug.unwrap_or(false)
    }
}

/// Ask the supervisor for the broker connection details. Every failure mode
/// (missing token, transport error, non-2xx, malformed payload) is logged and
/// yields `None` so that the configuration falls back to its defaults.
fn fetch_broker_info() -> Option<BrokerInfo> {
    let supervisor_token = match env::var(SUPERVISOR_TOKEN_VAR) {
        Ok(token) if !token.is_empty() => token,
        _ => {
            error!("{SUPERVISOR_TOKEN_VAR} not set");
            return None;
        }
    };

    let response = ureq::get(SUPERVISOR_MQTT_URL)
        .set("Authorization", &format!("Bearer {supervisor_token}"))
        .call();
    let response = match response {
        Ok(response) => response,
        Err(e) => {
            error!("Failed to retrieve MQTT info: {e}");
            return None;
        }
    };

    match response.into_json::<MqttService>() {
        Ok(service) => Some(service.data),
        Err(e) => {
            error!("Malformed MQTT info from supervisor: {e}");
            None
        }
    }
}
