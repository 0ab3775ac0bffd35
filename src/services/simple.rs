//! Services that only differ from the generic dispatcher in their settings.
use crate::{
    charset,
    dispatch::{Hooks, StatusService, StatusTable},
    exchange::{Exchange, Response},
    outcome::{Error, LongUrl},
    service::{ConfigError, KeepAlive, RateLimit, Service, ServiceConfig},
};

pub const UR1CA: &str = "ur1ca";
pub const POSTLY: &str = "postly";
pub const WPME: &str = "wpme";
pub const TWITTER: &str = "twitter";
pub const PIXORIAL: &str = "pixorial";

const PIXORIAL_HOME: &str = "http://myhub.pixorial.com/";

/// http://ur1.ca/ answers 200 for unknown codes.
pub fn ur1ca_config() -> ServiceConfig {
    ServiceConfig::new(UR1CA, "http://ur1.ca/", charset::LOWER_ALNUM)
        .with_statuses(StatusTable {
            no_redirect: &[200],
            ..StatusTable::DEFAULT
        })
        .with_rate_limit(None)
}

pub fn postly_config() -> ServiceConfig {
    ServiceConfig::new(POSTLY, "https://post.ly/", charset::ALNUM)
        .with_statuses(StatusTable {
            redirect: &[301],
            no_redirect: &[302],
            ..StatusTable::DEFAULT
        })
        .with_rate_limit(None)
}

/// Wordpress.com's shortener.
pub fn wpme_config() -> ServiceConfig {
    ServiceConfig::new(WPME, "http://wp.me/", charset::ALNUM_DASH_UNDERSCORE)
}

/// Twitter's t.co wrapper for links in tweets.
pub fn twitter_config() -> ServiceConfig {
    ServiceConfig::new(TWITTER, "http://t.co/", charset::ALNUM)
        .with_rate_limit(Some(RateLimit::new(20, 1)))
        .with_keep_alive(KeepAlive::Disabled)
}

pub fn pixorial_config() -> ServiceConfig {
    ServiceConfig::new(PIXORIAL, "http://myhub.pixorial.com/s/", charset::LOWER_ALNUM)
        .with_rate_limit(Some(RateLimit::new(20, 1)))
        .with_keep_alive(KeepAlive::Disabled)
}

pub fn pixorial_hooks() -> Hooks {
    Hooks {
        on_redirect: pixorial_on_redirect,
        ..Hooks::default()
    }
}

fn pixorial_on_redirect(
    _code: &str,
    _response: &Response,
    location: LongUrl,
    _exchange: &mut dyn Exchange,
) -> Result<LongUrl, Error> {
    if location == PIXORIAL_HOME {
        log::debug!("Redirected to home page");
        Err(Error::NoRedirect)
    } else {
        Ok(location)
    }
}

fn build_with(config: ServiceConfig, hooks: Hooks) -> Result<Box<dyn Service>, ConfigError> {
    Ok(Box::new(StatusService::new(config, hooks)?))
}

pub fn build_ur1ca() -> Result<Box<dyn Service>, ConfigError> {
    build_with(ur1ca_config(), Hooks::default())
}

pub fn build_postly() -> Result<Box<dyn Service>, ConfigError> {
    build_with(postly_config(), Hooks::default())
}

pub fn build_wpme() -> Result<Box<dyn Service>, ConfigError> {
    build_with(wpme_config(), Hooks::default())
}

pub fn build_twitter() -> Result<Box<dyn Service>, ConfigError> {
    build_with(twitter_config(), Hooks::default())
}

pub fn build_pixorial() -> Result<Box<dyn Service>, ConfigError> {
    build_with(pixorial_config(), pixorial_hooks())
}
