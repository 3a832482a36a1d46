use crate::error::{Result, SignalError};
use crate::global_variables::{
    AMQP_URL, ANALYSIS_TIMEOUT_SECS, EVENT_LOG_CAPACITY, TICK_INTERVAL_MS,
};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Runtime settings for the controller binaries.
/// Defaults come from `global_variables`; each can be overridden from the environment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub amqp_url: String,
    pub tick_interval: Duration,
    pub event_csv_path: Option<String>,
    pub log_capacity: usize,
    pub analysis_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            amqp_url: AMQP_URL.to_string(),
            tick_interval: Duration::from_millis(TICK_INTERVAL_MS),
            event_csv_path: None,
            log_capacity: EVENT_LOG_CAPACITY,
            analysis_timeout: Duration::from_secs(ANALYSIS_TIMEOUT_SECS),
        }
    }
}

impl ControllerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Split out so tests do not have to touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup("SIGNAL_AMQP_URL") {
            config.amqp_url = url;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "SIGNAL_TICK_MS")? {
            if ms == 0 {
                return Err(SignalError::Config(
                    "SIGNAL_TICK_MS must be greater than zero".to_string(),
                ));
            }
            config.tick_interval = Duration::from_millis(ms);
        }
        config.event_csv_path = lookup("SIGNAL_EVENT_CSV").filter(|p| !p.trim().is_empty());
        if let Some(capacity) = parse_var::<usize>(&lookup, "SIGNAL_LOG_CAPACITY")? {
            config.log_capacity = capacity;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "SIGNAL_ANALYSIS_TIMEOUT_SECS")? {
            config.analysis_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| SignalError::Config(format!("{} has invalid value '{}'", key, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = ControllerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.amqp_url, AMQP_URL);
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.log_capacity, 50);
        assert!(config.event_csv_path.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = ControllerConfig::from_lookup(lookup_from(&[
            ("SIGNAL_AMQP_URL", "amqp://signal:pw@broker:5672"),
            ("SIGNAL_TICK_MS", "250"),
            ("SIGNAL_EVENT_CSV", "events.csv"),
            ("SIGNAL_LOG_CAPACITY", "10"),
        ]))
        .unwrap();
        assert_eq!(config.amqp_url, "amqp://signal:pw@broker:5672");
        assert_eq!(config.tick_interval, Duration::from_millis(250));
        assert_eq!(config.event_csv_path.as_deref(), Some("events.csv"));
        assert_eq!(config.log_capacity, 10);
    }

    #[test]
    fn bad_numbers_are_config_errors() {
        let err = ControllerConfig::from_lookup(lookup_from(&[("SIGNAL_TICK_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, SignalError::Config(_)));

        let err =
            ControllerConfig::from_lookup(lookup_from(&[("SIGNAL_TICK_MS", "0")])).unwrap_err();
        assert!(matches!(err, SignalError::Config(_)));
    }
}
