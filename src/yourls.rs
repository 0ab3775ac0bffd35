//! Client for installations of Yourls (http://yourls.org).
//!
//! Yourls exposes an API endpoint, typically at `/yourls-api.php`, that
//! expands a code in plain text.
use super::{
    charset,
    exchange::{Exchange, HttpExchange},
    outcome::{Error, LongUrl},
    service::{ConfigError, KeepAlive, RateLimit, Service, DEFAULT_RATE_LIMIT},
};
use reqwest::header::HeaderMap;

const NOT_FOUND: &[u8] = b"not found";

/// Static description of a Yourls installation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct YourlsConfig {
    pub name: String,
    pub api_url: String,
    /// The installation's `YOURLS_URL_CONVERT` setting (36 or 62).
    pub url_convert: u32,
}

impl YourlsConfig {
    pub fn new<N: Into<String>, U: Into<String>>(name: N, api_url: U, url_convert: u32) -> Self {
        Self {
            name: name.into(),
            api_url: api_url.into(),
            url_convert,
        }
    }

    pub fn charset(&self) -> Result<&'static str, ConfigError> {
        match self.url_convert {
            36 => Ok(charset::LOWER_ALNUM),
            62 => Ok(charset::ALNUM),
            other => Err(ConfigError::InvalidBase(other)),
        }
    }
}

pub struct YourlsService<E = HttpExchange> {
    config: YourlsConfig,
    charset: &'static str,
    exchange: E,
}

impl YourlsService<HttpExchange> {
    pub fn new(config: YourlsConfig) -> Result<Self, ConfigError> {
        config.charset()?;
        let exchange = HttpExchange::for_url(&config.api_url, KeepAlive::Enabled, HeaderMap::new())?;

        Self::with_exchange(config, exchange)
    }
}

impl<E: Exchange> YourlsService<E> {
    pub fn with_exchange(config: YourlsConfig, exchange: E) -> Result<Self, ConfigError> {
        let charset = config.charset()?;

        Ok(Self {
            config,
            charset,
            exchange,
        })
    }

    fn query(code: &str) -> String {
        let params = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("action", "expand")
            .append_pair("shorturl", code)
            .append_pair("format", "simple")
            .finish();

        format!("?{}", params)
    }
}

impl<E: Exchange> Service for YourlsService<E> {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn charset(&self) -> &str {
        self.charset
    }

    fn rate_limit(&self) -> Option<RateLimit> {
        Some(DEFAULT_RATE_LIMIT)
    }

    fn fetch(&mut self, code: &str) -> Result<LongUrl, Error> {
        let response = self.exchange.get(&Self::query(code))?;

        match response.status {
            200 if &response.body[..] == NOT_FOUND => Err(Error::NoRedirect),
            200 => Ok(LongUrl::from(response.body)),
            other => Err(Error::service(format!("Unexpected HTTP status {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{YourlsConfig, YourlsService};
    use crate::{
        charset,
        exchange::testing::{reply, ScriptedExchange},
        outcome::Error,
        service::{ConfigError, Service},
    };

    const QUERY: &str = "?action=expand&shorturl=abc&format=simple";

    fn service(exchange: ScriptedExchange) -> YourlsService<ScriptedExchange> {
        let config = YourlsConfig::new("example", "http://example.org/yourls-api.php", 36);
        YourlsService::with_exchange(config, exchange).unwrap()
    }

    #[test]
    fn expanded_url() {
        let exchange =
            ScriptedExchange::new().get(QUERY, reply(200).with_body("http://long.example/path"));

        assert_eq!(
            service(exchange).fetch("abc").unwrap(),
            "http://long.example/path"
        );
    }

    #[test]
    fn not_found() {
        let exchange = ScriptedExchange::new().get(QUERY, reply(200).with_body("not found"));

        assert_eq!(service(exchange).fetch("abc"), Err(Error::NoRedirect));
    }

    #[test]
    fn body_is_returned_verbatim() {
        let exchange = ScriptedExchange::new().get(QUERY, reply(200).with_body("not found\n"));

        assert_eq!(service(exchange).fetch("abc").unwrap(), "not found\n");
    }

    #[test]
    fn unexpected_status() {
        let exchange = ScriptedExchange::new().get(QUERY, reply(500).with_body("not found"));

        assert_eq!(
            service(exchange).fetch("abc"),
            Err(Error::service("Unexpected HTTP status 500"))
        );
    }

    #[test]
    fn code_is_encoded() {
        let exchange = ScriptedExchange::new().get(
            "?action=expand&shorturl=a+b%26c&format=simple",
            reply(200).with_body("http://long.example/"),
        );

        assert!(service(exchange).fetch("a b&c").is_ok());
    }

    #[test]
    fn charset_from_base() {
        let config = |base| YourlsConfig::new("example", "http://example.org/api.php", base);

        assert_eq!(config(36).charset().unwrap(), charset::LOWER_ALNUM);
        assert_eq!(config(62).charset().unwrap(), charset::ALNUM);
        assert!(matches!(
            YourlsService::with_exchange(config(16), ScriptedExchange::new()),
            Err(ConfigError::InvalidBase(16))
        ));
    }
}
