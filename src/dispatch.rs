//! The default `fetch` strategy: classify a HEAD response by its status code.
use super::{
    exchange::{Exchange, HttpExchange, Response},
    outcome::{Error, LongUrl},
    service::{ConfigError, RateLimit, Service, ServiceConfig},
};

/// Which classification a status code maps to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatusClass {
    Redirect,
    NoRedirect,
    CodeBlocked,
    ServiceBlocked,
}

/// Four disjoint sets of HTTP status codes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusTable {
    pub redirect: &'static [u16],
    pub no_redirect: &'static [u16],
    pub code_blocked: &'static [u16],
    pub service_blocked: &'static [u16],
}

impl StatusTable {
    pub const DEFAULT: StatusTable = StatusTable {
        redirect: &[301, 302],
        no_redirect: &[404],
        code_blocked: &[410],
        service_blocked: &[403, 420, 429],
    };

    /// Look up a status, checking the sets in precedence order.
    pub fn classify(&self, status: u16) -> Option<StatusClass> {
        if self.redirect.contains(&status) {
            Some(StatusClass::Redirect)
        } else if self.no_redirect.contains(&status) {
            Some(StatusClass::NoRedirect)
        } else if self.code_blocked.contains(&status) {
            Some(StatusClass::CodeBlocked)
        } else if self.service_blocked.contains(&status) {
            Some(StatusClass::ServiceBlocked)
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sets = [
            self.redirect,
            self.no_redirect,
            self.code_blocked,
            self.service_blocked,
        ];

        for (i, set) in sets.iter().enumerate() {
            for status in set.iter() {
                if sets[i + 1..].iter().any(|other| other.contains(status)) {
                    return Err(ConfigError::OverlappingStatus(*status));
                }
            }
        }

        Ok(())
    }
}

impl Default for StatusTable {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Runs before any request is made; returning an error short-circuits the call.
pub type Precheck = fn(&str) -> Result<(), Error>;

/// Sees every redirect-ok response together with its `Location` value.
pub type RedirectHook = fn(&str, &Response, LongUrl, &mut dyn Exchange) -> Result<LongUrl, Error>;

/// Handles any status outside the four configured sets.
pub type UnexpectedHook = fn(&str, &Response, &mut dyn Exchange) -> Result<LongUrl, Error>;

/// Per-service overrides for the status dispatcher.
#[derive(Clone, Copy)]
pub struct Hooks {
    pub precheck: Precheck,
    pub on_redirect: RedirectHook,
    pub on_unexpected: UnexpectedHook,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            precheck: no_precheck,
            on_redirect: follow_location,
            on_unexpected: unexpected_status,
        }
    }
}

pub fn no_precheck(_code: &str) -> Result<(), Error> {
    Ok(())
}

pub fn follow_location(
    _code: &str,
    _response: &Response,
    location: LongUrl,
    _exchange: &mut dyn Exchange,
) -> Result<LongUrl, Error> {
    Ok(location)
}

pub fn unexpected_status(
    _code: &str,
    response: &Response,
    _exchange: &mut dyn Exchange,
) -> Result<LongUrl, Error> {
    Err(Error::service(format!(
        "Unexpected HTTP status {}",
        response.status
    )))
}

/// Repeat the request as a GET and insist that the status is unchanged.
pub fn refetch(
    exchange: &mut dyn Exchange,
    code: &str,
    expected_status: u16,
) -> Result<Response, Error> {
    let response = exchange.get(code)?;

    if response.status != expected_status {
        Err(Error::service(format!(
            "HTTP status changed from {} to {} on second request",
            expected_status, response.status
        )))
    } else {
        Ok(response)
    }
}

/// A service resolved by HEAD requests and a `StatusTable`.
pub struct StatusService<E = HttpExchange> {
    config: ServiceConfig,
    hooks: Hooks,
    exchange: E,
}

impl StatusService<HttpExchange> {
    pub fn new(config: ServiceConfig, hooks: Hooks) -> Result<Self, ConfigError> {
        config.validate()?;
        let exchange = HttpExchange::new(&config)?;

        Ok(Self {
            config,
            hooks,
            exchange,
        })
    }
}

impl<E: Exchange> StatusService<E> {
    pub fn with_exchange(config: ServiceConfig, hooks: Hooks, exchange: E) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            hooks,
            exchange,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn exchange(&self) -> &E {
        &self.exchange
    }
}

impl<E: Exchange> Service for StatusService<E> {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn charset(&self) -> &str {
        &self.config.charset
    }

    fn rate_limit(&self) -> Option<RateLimit> {
        self.config.rate_limit
    }

    fn fetch(&mut self, code: &str) -> Result<LongUrl, Error> {
        (self.hooks.precheck)(code)?;

        let response = self.exchange.head(code)?;

        match self.config.statuses.classify(response.status) {
            Some(StatusClass::Redirect) => {
                let location = response.location().ok_or_else(|| {
                    Error::service(format!(
                        "No Location header after HTTP status {}",
                        response.status
                    ))
                })?;
                (self.hooks.on_redirect)(code, &response, location, &mut self.exchange)
            }
            Some(StatusClass::NoRedirect) => Err(Error::NoRedirect),
            Some(StatusClass::CodeBlocked) => Err(Error::CodeBlocked(None)),
            Some(StatusClass::ServiceBlocked) => Err(Error::ServiceBlocked(None)),
            None => (self.hooks.on_unexpected)(code, &response, &mut self.exchange),
        }
    }
}
