use log::LevelFilter;
use log4rs::config::Logger;
use std::{collections::BTreeMap, env, mem, str::FromStr};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LogError {
    #[error("Logger spec parsing error: {0}")]
    ParseLoggerSpecError(String),

    #[error("Log appender error: {0}")]
    Appender(String),

    #[error("Log config error: {0}")]
    Config(String),

    #[error("A logger is already set: {0}")]
    SetLogger(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct LoggerSpec {
    pub name: String,
    pub level: LevelFilter,
}

impl LoggerSpec {
    pub fn new(name: String, level: LevelFilter) -> Self {
        Self { name, level }
    }

    pub fn logger(&self) -> Logger {
        Logger::builder().build(self.name.clone(), self.level)
    }
}

pub(super) struct Loggers {
    loggers: Vec<LoggerSpec>,
    root_level: LevelFilter,
}

impl Loggers {
    pub fn root_level(&self) -> LevelFilter {
        self.root_level
    }

    pub fn items(&self) -> impl IntoIterator<Item = Logger> + '_ {
        self.loggers.iter().map(|x| x.logger())
    }
}

/// Collects per-module levels from `RUST_LOG`-like expressions, e.g. `info,puzzle_txscript=trace`.
/// Later specs override earlier ones.
pub(super) struct Builder {
    loggers: BTreeMap<String, LevelFilter>,
    root_level: Option<LevelFilter>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder { loggers: BTreeMap::new(), root_level: None }
    }

    pub fn parse_env(&mut self, env: &str) -> &mut Self {
        self.parse_expression(&env::var(env).unwrap_or_default())
    }

    pub fn from_expression(expression: &str) -> Self {
        let mut builder = Self::new();
        builder.parse_expression(expression);
        builder
    }

    pub fn parse_expression(&mut self, expression: &str) -> &mut Self {
        for spec in expression.split(',').map(|x| x.trim()) {
            if spec.is_empty() {
                continue;
            }
            match Self::parse_spec(spec) {
                Ok((level, Some(name))) => {
                    self.logger(name.to_string(), level);
                }
                Ok((level, None)) => {
                    self.root_level(level);
                }
                Err(err) => println!("Ignoring invalid logging spec '{}'", err),
            }
        }
        self
    }

    fn parse_spec(spec: &str) -> Result<(LevelFilter, Option<&str>), LogError> {
        let mut parts = spec.split('=');
        match (parts.next(), parts.next().map(|x| x.trim()), parts.next()) {
            // A single level string or number defines the root level, a single name enables everything for that module
            (Some(part0), None, None) => match part0.parse() {
                Ok(level) => Ok((level, None)),
                Err(_) => Ok((LevelFilter::max(), Some(part0))),
            },
            (Some(part0), Some(""), None) => Ok((LevelFilter::max(), Some(part0))),
            (Some(part0), Some(part1), None) => match part1.parse() {
                Ok(level) => Ok((level, Some(part0))),
                Err(_) => Err(LogError::ParseLoggerSpecError(part1.to_string())),
            },
            _ => Err(LogError::ParseLoggerSpecError(spec.to_string())),
        }
    }

    pub fn root_level(&mut self, root_level: LevelFilter) -> &mut Self {
        self.root_level.replace(root_level);
        self
    }

    pub fn logger(&mut self, name: String, level: LevelFilter) -> &mut Self {
        self.loggers.insert(name, level);
        self
    }

    pub fn build(&mut self) -> Loggers {
        let loggers = mem::take(&mut self.loggers).into_iter().map(|(name, level)| LoggerSpec::new(name, level)).collect();
        Loggers { loggers, root_level: self.root_level.take().unwrap_or(LevelFilter::Error) }
    }
}

impl FromStr for Builder {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_expression(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expression() {
        let loggers = Builder::from_expression("info, puzzle_txscript=trace,puzzle_core=,bogus=loud,a=b=c,puzzle_hashes").build();
        assert_eq!(loggers.root_level(), LevelFilter::Info);
        assert_eq!(
            loggers.loggers,
            vec![
                LoggerSpec::new("puzzle_core".to_string(), LevelFilter::Trace),
                LoggerSpec::new("puzzle_hashes".to_string(), LevelFilter::Trace),
                LoggerSpec::new("puzzle_txscript".to_string(), LevelFilter::Trace),
            ]
        );
    }

    #[test]
    fn test_later_specs_override() {
        let mut builder: Builder = "debug,puzzle_txscript=warn".parse().unwrap();
        let loggers = builder.parse_expression("puzzle_txscript=off,error").build();
        assert_eq!(loggers.root_level(), LevelFilter::Error);
        assert_eq!(loggers.loggers, vec![LoggerSpec::new("puzzle_txscript".to_string(), LevelFilter::Off)]);
        assert_eq!(Builder::new().build().root_level(), LevelFilter::Error);
    }

    #[test]
    fn test_invalid_specs() {
        assert_eq!(Builder::parse_spec("x=loud"), Err(LogError::ParseLoggerSpecError("loud".to_string())));
        assert_eq!(Builder::parse_spec("a=b=c"), Err(LogError::ParseLoggerSpecError("a=b=c".to_string())));
        assert_eq!(Builder::parse_spec("warn"), Ok((LevelFilter::Warn, None)));
    }
}
