// Copyright (c) Microsoft. All rights reserved.

#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

const LOG_LEVEL_ENV_VAR: &str = "IOTC_LOG";

/// Initializes logging to stderr. `IOTC_LOG` (`env_logger` filter syntax)
/// overrides `default_level`.
pub fn try_init(default_level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    builder(default_level).try_init()
}

fn builder(default_level: log::LevelFilter) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();

    builder
        .format(|fmt, record| {
            use std::io::Write;

            let level = match record.level() {
                log::Level::Trace => "TRCE",
                log::Level::Debug => "DBUG",
                log::Level::Info => "INFO",
                log::Level::Warn => "WARN",
                log::Level::Error => "ERR!",
            };
            let timestamp = fmt.timestamp();

            if record.level() >= log::Level::Debug {
                writeln!(
                    fmt,
                    "<{}>{} [{}] - [{}] {}",
                    to_syslog_level(record.level()),
                    timestamp,
                    level,
                    record.target(),
                    record.args()
                )
            } else {
                writeln!(
                    fmt,
                    "<{}>{} [{}] - {}",
                    to_syslog_level(record.level()),
                    timestamp,
                    level,
                    record.args()
                )
            }
        })
        .target(env_logger::Target::Stderr)
        .filter_level(default_level)
        .parse_env(LOG_LEVEL_ENV_VAR);

    builder
}

fn to_syslog_level(level: log::Level) -> i8 {
    match level {
        log::Level::Error => 3,
        log::Level::Warn => 4,
        log::Level::Info => 6,
        log::Level::Debug | log::Level::Trace => 7,
    }
}
