// TODO: renew the access token instead of failing until restart once it expires

mod logging;
mod rumqttc_wrapper;

use beem2mqtt::beem_api::BeemApi;
use beem2mqtt::config::Config;
use beem2mqtt::home_assistant::HomeAssistant;
use beem2mqtt::metric_collector::MetricCollector;
use rumqttc_wrapper::RumqttcWrapper;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{error, info};

/// Granularity at which the sleeps observe the stop flag.
static SLEEP_SLICE: Duration = Duration::from_secs(1);

/// Sleep for `duration`, waking up once per slice to check the stop flag.
/// Returns true when the flag was raised before the full duration elapsed.
fn sleep_until_stopped(stop: &AtomicBool, duration: Duration) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if stop.load(Ordering::Relaxed) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        thread::sleep((deadline - now).min(SLEEP_SLICE));
    }
}

fn main() {
    logging::init_logger();
    info!("Running revision: {}", env!("GIT_HASH"));
    if std::env::args().len() > 1 {
        error!("Arguments passed. Add-on is configured by /data/options.json");
    }

    let config = Config::load();
    logging::set_debug(config.debug_mode());

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        if let Err(e) = ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed)) {
            error!("Could not install the signal handler: {e}");
        }
    }

    let start_delay = config.start_delay();
    if !start_delay.is_zero() {
        info!("Waiting {} seconds before starting", start_delay.as_secs());
        if sleep_until_stopped(&stop, start_delay) {
            info!("Addon stopped by user");
            return;
        }
    }

    let mut api = BeemApi::new();
    if !api.login(&config.beem_email, &config.beem_password) {
        error!("Authentication failed. Exiting.");
        return;
    }

    // the broker connection is only opened after a successful login
    let mut publisher: Box<dyn MetricCollector> =
        Box::new(HomeAssistant::<RumqttcWrapper>::new(&config.mqtt_config()));

    let refresh_interval = config.refresh_interval();
    info!(
        "Publishing box summary every {} seconds",
        refresh_interval.as_secs()
    );
    loop {
        // a failed fetch skips this cycle but keeps the loop alive
        if let Some(boxes) = api.fetch_summary() {
            publisher.publish(&boxes);
        }
        if sleep_until_stopped(&stop, refresh_interval) {
            break;
        }
    }

    info!("Addon stopped by user");
    publisher.disconnect();
}
