//! http://tinyurl.com/
//!
//! Every status other than 302 and 404 needs special handling, so the
//! redirect set is empty and the work happens in the unexpected-status hook.
use crate::{
    charset,
    dispatch::{refetch, Hooks, StatusService, StatusTable},
    exchange::{Exchange, Response},
    outcome::{Error, LongUrl},
    service::{ConfigError, Service, ServiceConfig},
    util::{html, query},
};
use regex::bytes::Regex;

pub const NAME: &str = "tinyurl";

const ERRORHELP_MARKER: &str = "<title>Redirecting...</title>";
const TINYURL_REDIRECT_MARKER: &str = "Error: TinyURL redirects to a TinyURL.";

lazy_static::lazy_static! {
    static ref ERRORHELP_RE: Regex =
        Regex::new(r#"<meta http-equiv="refresh" content="0;url=(.*?)">"#).unwrap();
    static ref TINYURL_REDIRECT_RE: Regex = Regex::new(
        r#"(?s)<p class="intro">The URL you followed redirects back to a TinyURL and therefore we can't directly send you to the site\. The URL it redirects to is <a href="(.*?)">"#,
    )
    .unwrap();
    static ref PREVIEW_RE: Regex =
        Regex::new(r#"(?s)<a id="redirecturl" href="(.*?)">Proceed to this site.</a>"#).unwrap();
}

pub fn config() -> ServiceConfig {
    ServiceConfig::new(NAME, "http://tinyurl.com/", charset::LOWER_ALNUM).with_statuses(
        StatusTable {
            redirect: &[],
            no_redirect: &[404],
            code_blocked: &[302],
            service_blocked: &[],
        },
    )
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
    match response.status {
        200 => fetch_page(code, exchange),
        301 => {
            let location = response
                .location()
                .ok_or_else(|| Error::code_blocked("No Location header after HTTP status 301"))?;

            let affiliate = response
                .header("x-tiny")
                .map_or(false, |value| value.starts_with(b"aff"));

            if affiliate {
                preview(code, location, exchange)
            } else {
                Ok(location)
            }
        }
        // Some "errorhelp" codes fail with a 500 that goes away on another server.
        500 => {
            exchange.close();
            Err(Error::service("HTTP status 500"))
        }
        other => Err(Error::service(format!("Unknown HTTP status {}", other))),
    }
}

fn fetch_page(code: &str, exchange: &mut dyn Exchange) -> Result<LongUrl, Error> {
    let page = refetch(exchange, code, 200)?;

    if html::contains(&page.body, ERRORHELP_MARKER) {
        parse_errorhelp(code, &page.body)
    } else if html::contains(&page.body, TINYURL_REDIRECT_MARKER) {
        html::extract_url(
            &TINYURL_REDIRECT_RE,
            &page.body,
            "No redirect on \"tinyurl redirect\" page on HTTP status 200",
        )
    } else {
        Err(Error::service("Unexpected response on status 200"))
    }
}

fn parse_errorhelp(code: &str, body: &[u8]) -> Result<LongUrl, Error> {
    let unexpected = || Error::service("Unexpected redirect on \"errorhelp\" page on HTTP status 200");
    let refresh = html::capture(&ERRORHELP_RE, body).ok_or_else(|| {
        Error::service("No redirect on \"errorhelp\" page on HTTP status 200")
    })??;
    let url = query::parse(refresh.as_bytes(), "redirect on \"errorhelp\" page")?;

    if !query::is_location(&url, "tinyurl.com", "/errorb.php") {
        return Err(unexpected());
    }

    let target = query::single(&url, "url").ok_or_else(unexpected)?;
    let path = query::single(&url, "path").ok_or_else(unexpected)?;

    if path != format!("/{}", code) {
        Err(Error::service(
            "Code mismatch on \"errorhelp\" on HTTP status 200",
        ))
    } else {
        Ok(LongUrl::from(target))
    }
}

/// Monetized links go through a preview page that names the real target.
fn preview(code: &str, affiliate: LongUrl, exchange: &mut dyn Exchange) -> Result<LongUrl, Error> {
    let page = exchange.get(&format!("preview.php?num={}", code))?;

    if page.status != 200 {
        return Err(Error::service(format!(
            "Unexpected HTTP status {} on preview page",
            page.status
        )));
    }

    let url = html::extract_url(&PREVIEW_RE, &page.body, "No redirect on preview page")?;

    if url.is_empty() {
        scrub_affiliate(affiliate)
    } else {
        Ok(url)
    }
}

/// Strip the click-tracking redirector from an affiliate URL.
fn scrub_affiliate(affiliate: LongUrl) -> Result<LongUrl, Error> {
    let url = match affiliate.to_str().and_then(|value| url::Url::parse(value).ok()) {
        Some(url) => url,
        None => return Ok(affiliate),
    };

    if url.host_str() == Some("redirect.tinyurl.com") && url.path() == "/api/click" {
        url.query_pairs()
            .find(|(name, value)| name == "out" && !value.is_empty())
            .map(|(_, value)| LongUrl::from(value.into_owned()))
            .ok_or_else(|| Error::service("No target in affiliate redirect"))
    } else {
        Ok(affiliate)
    }
}
