//! The service contract and the configuration records services are built from.
use super::{
    dispatch::StatusTable,
    outcome::{Error, LongUrl},
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;
use thiserror::Error;

/// Fatal construction-time errors. These are never retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown service {0}")]
    UnknownService(String),
    #[error("Invalid URL {value}: {source}")]
    InvalidUrl {
        value: String,
        source: url::ParseError,
    },
    #[error("Unknown scheme {0}")]
    UnsupportedScheme(String),
    #[error("Unknown host {0}")]
    UnknownHost(String),
    #[error("Bad value for Yourls URL conversion base: {0}")]
    InvalidBase(u32),
    #[error("HTTP status {0} appears in more than one status set")]
    OverlappingStatus(u16),
    #[error("Invalid HTTP header {0}")]
    InvalidHeader(String),
    #[error("HTTP client error: {0:?}")]
    Client(#[from] reqwest::Error),
    #[error("Runtime error: {0:?}")]
    Runtime(#[from] std::io::Error),
}

/// Advisory request budget: at most `requests` calls per `period`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RateLimit {
    pub requests: u32,
    pub period: Duration,
}

impl RateLimit {
    pub const fn new(requests: u32, period_secs: u64) -> Self {
        Self {
            requests,
            period: Duration::from_secs(period_secs),
        }
    }

    /// The minimum spacing between calls that stays within this limit.
    pub fn interval(&self) -> Duration {
        if self.requests == 0 {
            self.period
        } else {
            self.period / self.requests
        }
    }
}

/// Applied when a service does not declare its own limit.
pub const DEFAULT_RATE_LIMIT: RateLimit = RateLimit::new(2, 1);

/// Whether the connection is reused across exchanges.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeepAlive {
    Enabled,
    /// The connection is closed after every exchange.
    Disabled,
}

impl KeepAlive {
    pub fn header_value(&self) -> &'static str {
        match self {
            KeepAlive::Enabled => "keep-alive",
            KeepAlive::Disabled => "close",
        }
    }
}

/// Static description of a URL shortener.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub name: String,
    pub url: String,
    pub charset: String,
    pub statuses: StatusTable,
    pub keep_alive: KeepAlive,
    pub headers: Vec<(String, String)>,
    pub rate_limit: Option<RateLimit>,
}

impl ServiceConfig {
    pub fn new<N: Into<String>, U: Into<String>, C: Into<String>>(
        name: N,
        url: U,
        charset: C,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            charset: charset.into(),
            statuses: StatusTable::default(),
            keep_alive: KeepAlive::Enabled,
            headers: vec![],
            rate_limit: Some(DEFAULT_RATE_LIMIT),
        }
    }

    pub fn with_statuses(mut self, statuses: StatusTable) -> Self {
        self.statuses = statuses;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: KeepAlive) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn with_header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: Option<RateLimit>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Check the parts of the record that do not need the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.statuses.validate()?;
        self.header_map().map(|_| ())
    }

    pub(crate) fn header_map(&self) -> Result<HeaderMap, ConfigError> {
        let mut headers = HeaderMap::new();

        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ConfigError::InvalidHeader(name.clone()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ConfigError::InvalidHeader(name.to_string()))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }
}

/// A URL shortener client.
///
/// An instance owns a single connection and handles one call at a time.
pub trait Service: Send {
    fn name(&self) -> &str;

    /// Characters that may appear in a code. Never interpreted by the service
    /// itself.
    fn charset(&self) -> &str;

    fn rate_limit(&self) -> Option<RateLimit>;

    /// Resolve a code into its long URL.
    fn fetch(&mut self, code: &str) -> Result<LongUrl, Error>;
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, KeepAlive, RateLimit, ServiceConfig, DEFAULT_RATE_LIMIT};
    use crate::dispatch::StatusTable;
    use std::time::Duration;

    #[test]
    fn rate_limit_interval() {
        assert_eq!(DEFAULT_RATE_LIMIT.interval(), Duration::from_millis(500));
        assert_eq!(RateLimit::new(60, 60).interval(), Duration::from_secs(1));
        assert_eq!(RateLimit::new(1, 5).interval(), Duration::from_secs(5));
    }

    #[test]
    fn config_defaults() {
        let config = ServiceConfig::new("example", "http://example.org/", "abc");

        assert_eq!(config.keep_alive, KeepAlive::Enabled);
        assert_eq!(config.rate_limit, Some(DEFAULT_RATE_LIMIT));
        assert_eq!(config.statuses, StatusTable::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_header() {
        let config = ServiceConfig::new("example", "http://example.org/", "abc")
            .with_header("User-Agent", "bad\nvalue");

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidHeader(_))
        ));
    }
}
