//! http://is.gd/
//!
//! Rate limiting, disabled links and preview links are all served as HTML
//! pages with status 200.
use crate::{
    charset,
    dispatch::{refetch, unexpected_status, Hooks, StatusService, StatusTable},
    exchange::{Exchange, Response},
    outcome::{Error, LongUrl},
    service::{ConfigError, RateLimit, Service, ServiceConfig},
    util::html,
};
use regex::bytes::Regex;

pub const NAME: &str = "isgd";

const RATE_LIMIT_BANNER: &str = "<div id=\"main\"><p>Rate limit exceeded - please wait 1 minute before accessing more shortened URLs</p></div>";
const DISABLED_MARKER: &str = "<div id=\"disabled\"><h2>Link Disabled</h2>";
const PREVIEW_MARKER: &str = "<p>The full original link is shown below. <b>Click the link</b> if you'd like to proceed to the destination shown:";

lazy_static::lazy_static! {
    static ref DISABLED_RE: Regex = Regex::new(
        r"<p>For reference and to help those fighting spam the original destination of this URL is given below \(we strongly recommend you don't visit it since it may damage your PC\): -<br />(.*)</p><h2>is\.gd</h2><p>is\.gd is a free service used to shorten long URLs\.",
    )
    .unwrap();
    static ref PREVIEW_RE: Regex = Regex::new(
        r#"<b>Click the link</b> if you'd like to proceed to the destination shown: -<br /><a href="(.*)" class="biglink">"#,
    )
    .unwrap();
}

pub fn config() -> ServiceConfig {
    ServiceConfig::new(NAME, "http://is.gd/", charset::ALNUM_UNDERSCORE)
        .with_statuses(StatusTable {
            code_blocked: &[502],
            ..StatusTable::DEFAULT
        })
        .with_rate_limit(Some(RateLimit::new(60, 60)))
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

fn on_unexpected(
    code: &str,
    response: &Response,
    exchange: &mut dyn Exchange,
) -> Result<LongUrl, Error> {
    if response.status != 200 {
        return unexpected_status(code, response, exchange);
    }

    let page = refetch(exchange, code, 200)?;
    let body = &page.body[..];

    if body.is_empty() {
        Err(Error::code_blocked("Empty response on status 200"))
    } else if html::contains(body, RATE_LIMIT_BANNER) {
        Err(Error::ServiceBlocked(None))
    } else if html::contains(body, DISABLED_MARKER) {
        parse_disabled(body)
    } else if html::contains(body, PREVIEW_MARKER) {
        html::extract_url(
            &PREVIEW_RE,
            body,
            "Could not find target URL in 'Preview' page",
        )
    } else {
        Err(Error::service("No redirect on unrecognized page on HTTP status 200"))
    }
}

/// Disabled links still name their original destination.
fn parse_disabled(body: &[u8]) -> Result<LongUrl, Error> {
    let url = html::extract_url(
        &DISABLED_RE,
        body,
        "Could not find target URL in 'Link Disabled' page",
    )?;

    if url.is_empty() {
        Err(Error::code_blocked("Empty URL on preview"))
    } else {
        Ok(url)
    }
}
