//! http://goo.gl/
//!
//! Resolved through the Google URL Shortener API instead of redirects.
use crate::{
    charset,
    exchange::{Exchange, HttpExchange},
    outcome::{Error, LongUrl},
    service::{ConfigError, KeepAlive, RateLimit, Service},
};
use reqwest::header::HeaderMap;
use serde_derive::Deserialize;
use serde_json::Value;

pub const NAME: &str = "googl";

const API_URL: &str = "https://www.googleapis.com/urlshortener/v1/url";
const URL_KIND: &str = "urlshortener#url";

#[derive(Deserialize)]
struct UrlResource {
    kind: Option<Value>,
    status: Option<Value>,
    #[serde(rename = "longUrl")]
    long_url: Option<String>,
}

pub struct Googl<E = HttpExchange> {
    exchange: E,
}

impl Googl<HttpExchange> {
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self::with_exchange(HttpExchange::for_url(
            API_URL,
            KeepAlive::Enabled,
            HeaderMap::new(),
        )?))
    }
}

impl<E: Exchange> Googl<E> {
    pub fn with_exchange(exchange: E) -> Self {
        Self { exchange }
    }

    fn parse_json(data: &[u8]) -> Result<LongUrl, Error> {
        let resource = serde_json::from_slice::<UrlResource>(data)
            .map_err(|_| Error::service("Could not decode response"))?;

        if resource.kind.as_ref().and_then(Value::as_str) != Some(URL_KIND) {
            return Err(Error::service("No/bad type given"));
        }

        let status = match resource.status {
            Some(Value::String(status)) => status,
            Some(other) => other.to_string(),
            None => return Err(Error::service("No status given")),
        };

        resource
            .long_url
            .map(LongUrl::from)
            .ok_or_else(|| Error::code_blocked(format!("Status: {}", status)))
    }
}

pub fn build() -> Result<Box<dyn Service>, ConfigError> {
    Ok(Box::new(Googl::new()?))
}

impl<E: Exchange> Service for Googl<E> {
    fn name(&self) -> &str {
        NAME
    }

    fn charset(&self) -> &str {
        charset::ALNUM
    }

    fn rate_limit(&self) -> Option<RateLimit> {
        Some(RateLimit::new(1, 5))
    }

    fn fetch(&mut self, code: &str) -> Result<LongUrl, Error> {
        let response = self
            .exchange
            .get(&format!("?shortUrl=http://goo.gl/{}", code))?;

        match response.status {
            200 => Self::parse_json(&response.body),
            403 => Err(Error::ServiceBlocked(None)),
            404 => Err(Error::NoRedirect),
            other => Err(Error::service(format!("Unexpected HTTP status {}", other))),
        }
    }
}
