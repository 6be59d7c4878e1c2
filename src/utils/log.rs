use log::LevelFilter;

pub struct Logger;

impl Logger {
    pub fn init(level: LevelFilter) {
        let mut builder: env_logger::Builder = colog::default_builder();

        builder
            .filter_level(level)
            // chrome devtools chatter drowns everything else at debug
            .filter_module("headless_chrome", LevelFilter::Warn)
            .filter_module("tungstenite", LevelFilter::Warn)
            .filter_module("html5ever", LevelFilter::Warn)
            .filter_module("selectors", LevelFilter::Warn);

        if builder.try_init().is_err() {
            log::debug!("logger already initialized");
        }
    }
}
