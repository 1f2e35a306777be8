//! Logger setup on top of `log4rs`.
//!
//! Crates log through the `log` facade. Binaries and tests pick the output with
//! [`init_logger`] or [`try_init_logger`], using filter expressions such as
//! `info,puzzle_txscript=trace`. The `RUST_LOG` environment variable is applied first,
//! so the explicit filters take precedence over it.

mod appender;
mod consts;
mod logger;

pub use consts::{DEFAULT_LOGGER_ENV, ERR_LOG_FILE_NAME, LOG_FILE_NAME};
pub use logger::LogError;

use appender::AppenderSpec;
use log::LevelFilter;
use log4rs::{
    config::{Config, Root},
    Handle,
};
use logger::Builder;

const CONSOLE_APPENDER: &str = "stdout";
const LOG_FILE_APPENDER: &str = "log_file";
const ERR_LOG_FILE_APPENDER: &str = "err_log_file";

fn build_config(log_dir: Option<&str>, filters: &str) -> Result<Config, LogError> {
    let loggers = Builder::new().root_level(LevelFilter::Info).parse_env(DEFAULT_LOGGER_ENV).parse_expression(filters).build();

    let mut appenders = vec![AppenderSpec::console(CONSOLE_APPENDER, None)];
    if let Some(log_dir) = log_dir {
        appenders.push(AppenderSpec::roller(LOG_FILE_APPENDER, None, log_dir, LOG_FILE_NAME)?);
        appenders.push(AppenderSpec::roller(ERR_LOG_FILE_APPENDER, Some(LevelFilter::Warn), log_dir, ERR_LOG_FILE_NAME)?);
    }
    let names: Vec<_> = appenders.iter().map(|x| x.name).collect();

    Config::builder()
        .appenders(appenders.into_iter().map(|x| x.appender()))
        .loggers(loggers.items())
        .build(Root::builder().appenders(names).build(loggers.root_level()))
        .map_err(|err| LogError::Config(err.to_string()))
}

/// Installs the global logger, writing to stdout and, when `log_dir` is set, to a rolling
/// log file plus a warnings-and-errors file in that directory.
pub fn init_logger(log_dir: Option<&str>, filters: &str) -> Result<Handle, LogError> {
    let config = build_config(log_dir, filters)?;
    log4rs::init_config(config).map_err(|err| LogError::SetLogger(err.to_string()))
}

/// Installs a stdout-only logger unless one is already installed. Meant for tests, which may
/// race to initialize logging.
pub fn try_init_logger(filters: &str) {
    if let Ok(config) = build_config(None, filters) {
        let _ = log4rs::init_config(config);
    }
}
