//! http://ow.ly/
use crate::{
    charset,
    dispatch::{refetch, unexpected_status, Hooks, StatusService},
    exchange::{Exchange, Response},
    outcome::{Error, LongUrl},
    service::{ConfigError, Service, ServiceConfig},
    util::html,
};
use regex::bytes::Regex;

pub const NAME: &str = "owly";

lazy_static::lazy_static! {
    static ref SAFETY_WARNING_RE: Regex =
        Regex::new(r#"<a class="btn ignore" href="(.*?)" title="#).unwrap();
}

pub fn config() -> ServiceConfig {
    ServiceConfig::new(NAME, "http://ow.ly/", charset::ALNUM)
}

pub fn hooks() -> Hooks {
    Hooks {
        on_unexpected,
        ..Hooks::default()
    }
}

pub fn build() -> Result<Box<dyn Service>, ConfigError> {
    Ok(Box::new(StatusService::new(config(), hooks())?))
}

/// A 200 is a safety warning page that links to the target.
fn on_unexpected(
    code: &str,
    response: &Response,
    exchange: &mut dyn Exchange,
) -> Result<LongUrl, Error> {
    if response.status != 200 {
        return unexpected_status(code, response, exchange);
    }

    let page = refetch(exchange, code, 200)?;

    html::extract_url(
        &SAFETY_WARNING_RE,
        &page.body,
        "Could not find target URL in safety warning",
    )
}
