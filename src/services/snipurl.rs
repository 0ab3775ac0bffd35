//! http://snipurl.com
//!
//! The server misbehaves with persistent connections, so every exchange uses
//! a fresh one.
use crate::{
    charset,
    dispatch::{refetch, unexpected_status, Hooks, StatusService, StatusTable},
    exchange::{Exchange, Response},
    outcome::{Error, LongUrl},
    service::{ConfigError, KeepAlive, Service, ServiceConfig},
    util::html,
};
use regex::bytes::Regex;

pub const NAME: &str = "snipurl";

lazy_static::lazy_static! {
    static ref PREVIEW_RE: Regex = Regex::new(
        r#"<p>You clicked on a snipped URL, which will take you to the following looong URL: </p> <div class="quote"><span class="quotet"></span><br/>(.*?)</div> <br />"#,
    )
    .unwrap();
}

pub fn config() -> ServiceConfig {
    ServiceConfig::new(
        NAME,
        "http://snipurl.com",
        charset::LOWER_ALNUM_DASH_UNDERSCORE_TILDE,
    )
    .with_statuses(StatusTable {
        no_redirect: &[410],
        code_blocked: &[],
        ..StatusTable::DEFAULT
    })
    .with_keep_alive(KeepAlive::Disabled)
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

/// Private snips redirect to a password form on the service itself.
fn on_redirect(
    code: &str,
    _response: &Response,
    location: LongUrl,
    _exchange: &mut dyn Exchange,
) -> Result<LongUrl, Error> {
    if location.as_bytes() == format!("/site/getprivate?snip={}", code).as_bytes() {
        Err(Error::code_blocked("Private key required"))
    } else {
        Ok(location)
    }
}

/// A 500 is served together with a preview page naming the target.
fn on_unexpected(
    code: &str,
    response: &Response,
    exchange: &mut dyn Exchange,
) -> Result<LongUrl, Error> {
    if response.status != 500 {
        return unexpected_status(code, response, exchange);
    }

    let page = refetch(exchange, code, 500)?;

    html::extract_url(
        &PREVIEW_RE,
        &page.body,
        "Could not find target URL on preview page",
    )
}
