use std::io::Write;

use chrono::Local;
use env_logger::Builder;
use log::LevelFilter;

/// Install the logger at `Info`. The add-on's `debug` option is only known
/// after the configuration has been read, so the level is raised later via
/// `set_debug` instead of being baked into the filter.
pub fn init_logger() {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, LevelFilter::Debug)
        .init();

    log::set_max_level(LevelFilter::Info);
}

pub fn set_debug(debug: bool) {
    if debug {
        log::set_max_level(LevelFilter::Debug);
    }
}
