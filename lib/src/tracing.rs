use std::str::FromStr;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::field::MakeExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

use yansi::Paint;

use crate::error::{ErrorKind, Result};
use crate::Config;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Json output shipped to loki.
    Production,
    #[default]
    Formatted,
    Json,
}

impl FromStr for Mode {
    type Err = ErrorKind;

    fn from_str(input: &str) -> std::result::Result<Self, Self::Err> {
        match input {
            "prod" | "production" => Ok(Self::Production),
            "formatted" => Ok(Self::Formatted),
            "json" => Ok(Self::Json),
            _ => Err(ErrorKind::ParsingError(format!("unknown log mode: {input}"))),
        }
    }
}

#[derive(PartialEq, Eq, Default, Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Only shows errors and warnings
    Critical,
    /// Shows errors, warnings, and some informational messages that are likely
    /// to be relevant when troubleshooting such as configuration
    Support,
    /// Shows everything except debug and trace information
    #[default]
    Normal,
    /// Shows debug information
    Debug,
    /// Shows everything
    Trace,
    /// Shows nothing
    Off,
}

impl FromStr for Level {
    type Err = ErrorKind;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match &*s.to_ascii_lowercase() {
            "critical" | "error" => Ok(Level::Critical),
            "support" | "warn" => Ok(Level::Support),
            "normal" | "info" => Ok(Level::Normal),
            "debug" | "dbg" => Ok(Level::Debug),
            "trace" => Ok(Level::Trace),
            "off" | "none" => Ok(Level::Off),
            _ => Err(ErrorKind::ParsingError(format!(
                "expected a log level (off, trace, debug, normal, support, critical), got: {s}"
            ))),
        }
    }
}

pub fn filter_layer(level: Level) -> EnvFilter {
    let filter_str = match level {
        Level::Critical => "warn,rustls=off,hyper=off",
        Level::Support => "warn,rustls=off,hyper=off",
        Level::Normal => "info,rustls=off,hyper=off",
        Level::Debug => "debug,sled=info,hyper=info",
        Level::Trace => "trace,sled=info,hyper=info,mio=debug,want=off",
        Level::Off => "off",
    };

    EnvFilter::new(filter_str)
}

pub fn default_logging_layer<S>() -> impl Layer<S>
where
    S: tracing::Subscriber,
    S: for<'span> LookupSpan<'span>,
{
    let field_format = tracing_subscriber::fmt::format::debug_fn(|writer, field, value| {
        // We'll format the field name and value separated with a colon.
        if field.name() == "message" {
            write!(writer, "{:?}", Paint::new(value).bold())
        } else {
            write!(writer, "{}: {:?}", field, Paint::default(value).bold())
        }
    })
    .delimited(", ")
    .display_messages();

    tracing_subscriber::fmt::layer()
        .fmt_fields(field_format)
        // Configure the formatter to use `print!` rather than
        // `stdout().write_str(...)`, so that logs are captured by libtest's test
        // capturing.
        .with_test_writer()
}

pub fn json_logging_layer<
    S: for<'a> tracing_subscriber::registry::LookupSpan<'a> + tracing::Subscriber,
>() -> impl tracing_subscriber::Layer<S> {
    Paint::disable();

    tracing_subscriber::fmt::layer().json().with_test_writer()
}

/// Layer writing plain lines into a daily rotated file in `directory`.
pub fn file_logging_layer<S>(directory: &str) -> (impl Layer<S>, WorkerGuard)
where
    S: tracing::Subscriber,
    S: for<'span> LookupSpan<'span>,
{
    let appender = tracing_appender::rolling::daily(directory, "beacon.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer);
    (layer, guard)
}

/// Initializes the global subscriber based on the tracing section of the
/// config.
///
/// When a log directory is configured the returned guard must be held for
/// as long as logs should be flushed to the file.
pub fn init(config: &Config) -> Result<Option<WorkerGuard>> {
    use tracing_log::LogTracer;
    use tracing_subscriber::prelude::*;

    if !config.tracing.enabled {
        return Ok(None);
    }

    LogTracer::init().map_err(|e| ErrorKind::Other(e.to_string()))?;

    let (file_layer, guard) = match &config.tracing.directory {
        Some(directory) => {
            let (layer, guard) = file_logging_layer(directory);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    match config.tracing.mode {
        Mode::Production => {
            use tracing_loki::url::Url;
            let (loki_layer, task) = tracing_loki::layer(
                Url::parse(&config.tracing.loki_address)?,
                vec![
                    ("host".into(), config.address.to_string()),
                    ("app".into(), config.name.clone()),
                ]
                .into_iter()
                .collect(),
                vec![].into_iter().collect(),
            )
            .map_err(|e| ErrorKind::Other(format!("tracing_loki failed making new layer: {e}")))?;
            // The background task needs to be spawned so the logs actually get
            // delivered to loki.
            tokio::spawn(task);

            tracing::subscriber::set_global_default(
                tracing_subscriber::registry()
                    .with(file_layer)
                    .with(loki_layer)
                    .with(json_logging_layer())
                    .with(filter_layer(config.tracing.level)),
            )
            .map_err(|e| ErrorKind::Other(e.to_string()))?;
        }
        Mode::Formatted => {
            tracing::subscriber::set_global_default(
                tracing_subscriber::registry()
                    .with(file_layer)
                    .with(default_logging_layer())
                    .with(filter_layer(config.tracing.level)),
            )
            .map_err(|e| ErrorKind::Other(e.to_string()))?;
        }
        Mode::Json => {
            tracing::subscriber::set_global_default(
                tracing_subscriber::registry()
                    .with(file_layer)
                    .with(json_logging_layer())
                    .with(filter_layer(config.tracing.level)),
            )
            .map_err(|e| ErrorKind::Other(e.to_string()))?;
        }
    };

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parses_aliases() {
        assert_eq!("warn".parse::<Level>().unwrap(), Level::Support);
        assert_eq!("INFO".parse::<Level>().unwrap(), Level::Normal);
        assert_eq!("none".parse::<Level>().unwrap(), Level::Off);
        assert!("loud".parse::<Level>().is_err());
    }

    #[test]
    fn every_level_builds_a_filter() {
        for level in [
            Level::Critical,
            Level::Support,
            Level::Normal,
            Level::Debug,
            Level::Trace,
            Level::Off,
        ] {
            let _ = filter_layer(level);
        }
    }

    #[test]
    fn mode_rejects_unknown_input() {
        assert_eq!("prod".parse::<Mode>().unwrap(), Mode::Production);
        assert!("xml".parse::<Mode>().is_err());
    }
}
