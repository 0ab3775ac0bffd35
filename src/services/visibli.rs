//! Visibli (later SharedBy) shorteners.
//!
//! `visiblihex` is the old share shortener (`http://links.visibli.com/links/fbc5fa`),
//! `visibli` the newer one served from several hosts (`http://vsb.li/AHbpFG`,
//! `http://sharedby.co/AHbpFG`, `http://shrd.by/AHbpFG`, ...).
use crate::{
    charset,
    dispatch::{refetch, unexpected_status, Hooks, StatusService, StatusTable},
    exchange::{Exchange, Response},
    outcome::{Error, LongUrl},
    service::{ConfigError, RateLimit, Service, ServiceConfig},
    util::html,
};
use regex::bytes::Regex;

pub const HEX_NAME: &str = "visiblihex";
pub const NAME: &str = "visibli";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.8.3) Gecko/20120431 Firefox/18.0";
const BROKEN_USER_AGENT_MARKER: &str = "Undefined index:  HTTP_USER_AGENT";

lazy_static::lazy_static! {
    static ref IFRAME_RE: Regex = Regex::new(r#"<iframe id="[^"]+" src="([^"]+)">"#).unwrap();
}

fn base_config(name: &str, url: &str, charset: &str) -> ServiceConfig {
    ServiceConfig::new(name, url, charset)
        .with_statuses(StatusTable {
            redirect: &[301],
            no_redirect: &[],
            ..StatusTable::DEFAULT
        })
        .with_rate_limit(Some(RateLimit::new(1, 5)))
        .with_header("User-Agent", USER_AGENT)
}

pub fn hex_config() -> ServiceConfig {
    base_config(HEX_NAME, "http://links.sharedby.co/links/", charset::HEX)
}

pub fn config() -> ServiceConfig {
    base_config(NAME, "http://sharedby.co/", charset::ALNUM)
}

pub fn hooks() -> Hooks {
    Hooks {
        on_unexpected,
        ..Hooks::default()
    }
}

pub fn build_hex() -> Result<Box<dyn Service>, ConfigError> {
    Ok(Box::new(StatusService::new(hex_config(), hooks())?))
}

pub fn build() -> Result<Box<dyn Service>, ConfigError> {
    Ok(Box::new(StatusService::new(config(), hooks())?))
}

fn on_unexpected(
    code: &str,
    response: &Response,
    exchange: &mut dyn Exchange,
) -> Result<LongUrl, Error> {
    match response.status {
        302 => classify_found(response),
        200 => parse_frame(code, exchange),
        _ => unexpected_status(code, response, exchange),
    }
}

/// A 302 either points back at the service (no redirect), at the page the
/// service sends banned clients to, or at a site that breaks out of frames.
fn classify_found(response: &Response) -> Result<LongUrl, Error> {
    let location = response
        .location()
        .ok_or_else(|| Error::service("No Location header after HTTP status 302"))?;
    let bytes = location.as_bytes();

    if html::contains(bytes, "sharedby") || html::contains(bytes, "visibli") {
        log::debug!("Self redirect to {}", location);
        Err(Error::NoRedirect)
    } else if bytes.starts_with(b"http://yahoo.com") {
        Err(Error::service_blocked(format!("Banned (location={})", location)))
    } else {
        Ok(location)
    }
}

fn parse_frame(code: &str, exchange: &mut dyn Exchange) -> Result<LongUrl, Error> {
    let page = refetch(exchange, code, 200)?;

    match html::capture(&IFRAME_RE, &page.body) {
        Some(url) => Ok(LongUrl::from(html::unescape(url?))),
        None if html::contains(&page.body, BROKEN_USER_AGENT_MARKER) => {
            Err(Error::service("Website broken about user-agent"))
        }
        None => Err(Error::service("No iframe url found")),
    }
}
