use crate::config::Config;
use log::LevelFilter;
use simplelog::{self, ConfigBuilder};

/// Dependencies whose internals flood the output below Trace.
const FILTERED_MODULES: &[&str] = &["sqlx", "sea_orm", "hyper", "reqwest", "rustls"];

pub struct Logger {}

impl Logger {
    /// Installs the global terminal logger at the configured level.
    ///
    /// Dependency logs are shown only at Trace. Fails if a logger is already installed.
    pub fn init_logger(config: &Config) -> Result<(), log::SetLoggerError> {
        let level = config.log_level_filter;

        simplelog::TermLogger::init(
            Self::convert_level_filter(level),
            Self::build_log_config(level),
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        )
    }

    fn convert_level_filter(level: LevelFilter) -> simplelog::LevelFilter {
        match level {
            LevelFilter::Off => simplelog::LevelFilter::Off,
            LevelFilter::Error => simplelog::LevelFilter::Error,
            LevelFilter::Warn => simplelog::LevelFilter::Warn,
            LevelFilter::Info => simplelog::LevelFilter::Info,
            LevelFilter::Debug => simplelog::LevelFilter::Debug,
            LevelFilter::Trace => simplelog::LevelFilter::Trace,
        }
    }

    /// Module prefixes suppressed at `level`.
    fn ignored_modules(level: LevelFilter) -> &'static [&'static str] {
        if level == LevelFilter::Trace {
            &[]
        } else {
            FILTERED_MODULES
        }
    }

    fn build_log_config(level: LevelFilter) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();
        // Show the emitting module on every line
        builder.set_target_level(simplelog::LevelFilter::Error);
        builder.set_thread_level(simplelog::LevelFilter::Off);

        for module in Self::ignored_modules(level) {
            builder.add_filter_ignore_str(module);
        }

        builder.build()
    }
}
