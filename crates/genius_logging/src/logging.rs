use std::io;
use std::str::FromStr;

use genius_error::LoggingError;
use tracing::Level;
use tracing_subscriber::fmt::time::UtcTime;

const DEFAULT_TIME_PATTERN: &str =
    "[year]-[month]-[day]T[hour repr:24]:[minute]:[second]::[subsecond digits:4]";

/// Parse a log level name, falling back to `INFO` for anything unrecognized.
pub fn parse_level(level: &str) -> Level {
    Level::from_str(level.trim()).unwrap_or(Level::INFO)
}

pub async fn setup_logging(level: &str) -> Result<(), LoggingError> {
    let time_format = time::format_description::parse(DEFAULT_TIME_PATTERN).map_err(|e| {
        LoggingError::Error(format!(
            "Failed to parse time format: {} with error: {}",
            DEFAULT_TIME_PATTERN, e
        ))
    })?;

    tracing_subscriber::fmt()
        .json()
        .with_max_level(parse_level(level))
        .with_target(false)
        .flatten_event(true)
        .with_thread_ids(true)
        .with_timer(UtcTime::new(time_format))
        .with_writer(io::stdout)
        .try_init()
        .map_err(|e| LoggingError::Error(format!("Failed to setup logging with error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("WARN"), Level::WARN);
        assert_eq!(parse_level("nonsense"), Level::INFO);
    }

    #[tokio::test]
    async fn test_setup_logging_twice() {
        // the second call fails because a global subscriber is already set
        let _ = setup_logging("info").await;
        let second = setup_logging("info").await;
        assert!(second.is_err());
    }
}
