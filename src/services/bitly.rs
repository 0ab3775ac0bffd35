//! http://bit.ly/
//!
//! A normal redirect is a 301 with the reason phrase "Moved". Bundles answer
//! 301 "Moved Permanently" and drop the connection; those codes are treated
//! as blocked. Flagged links redirect with a 302 to a warning page that
//! carries the real target in its query string.
use crate::{
    charset,
    dispatch::{unexpected_status, Hooks, StatusService, StatusTable},
    exchange::{Exchange, Response},
    outcome::{Error, LongUrl},
    service::{ConfigError, Service, ServiceConfig},
    util::query,
};

pub const NAME: &str = "bitly";

pub fn config() -> ServiceConfig {
    ServiceConfig::new(NAME, "http://bit.ly/", charset::ALNUM_DASH_UNDERSCORE).with_statuses(
        StatusTable {
            redirect: &[301],
            no_redirect: &[404],
            code_blocked: &[410],
            service_blocked: &[403],
        },
    )
}

pub fn hooks() -> Hooks {
    Hooks {
        on_redirect,
        on_unexpected,
        ..Hooks::default()
    }
}

pub fn build() -> Result<Box<dyn Service>, ConfigError> {
    Ok(Box::new(StatusService::new(config(), hooks())?))
}

fn on_redirect(
    _code: &str,
    response: &Response,
    location: LongUrl,
    exchange: &mut dyn Exchange,
) -> Result<LongUrl, Error> {
    match response.reason.as_deref() {
        Some("Moved") => Ok(location),
        Some("Moved Permanently") => {
            exchange.close();
            Err(Error::CodeBlocked(None))
        }
        other => Err(Error::service(format!(
            "Unknown HTTP reason {} after HTTP status 301",
            other.unwrap_or("")
        ))),
    }
}

fn on_unexpected(
    code: &str,
    response: &Response,
    exchange: &mut dyn Exchange,
) -> Result<LongUrl, Error> {
    if response.status != 302 {
        return unexpected_status(code, response, exchange);
    }

    let location = response
        .location()
        .ok_or_else(|| Error::service("No Location header after HTTP status 302"))?;

    parse_warning_url(code, &location)
}

fn parse_warning_url(code: &str, location: &LongUrl) -> Result<LongUrl, Error> {
    let unexpected = || Error::service("Unexpected Location header after HTTP status 302");
    let url = query::parse(location.as_bytes(), "Location header after HTTP status 302")?;

    if !query::is_location(&url, "bit.ly", "/a/warning") {
        return Err(unexpected());
    }

    let target = query::single(&url, "url").ok_or_else(unexpected)?;
    let hash = query::single(&url, "hash").ok_or_else(unexpected)?;

    if hash != code {
        Err(Error::service("Hash mismatch for HTTP status 302"))
    } else {
        Ok(LongUrl::from(target))
    }
}
