//! http://tr.im/
//!
//! Unknown codes redirect to the service's own `/404` page. `trimnew` is the
//! relaunched service, which answers 404 only when it is blocking us and
//! reserves the code `500` for its error page.
use crate::{
    charset,
    dispatch::{Hooks, StatusService, StatusTable},
    exchange::{Exchange, Response},
    outcome::{Error, LongUrl},
    service::{ConfigError, RateLimit, Service, ServiceConfig},
};

pub const NAME: &str = "trim";
pub const NEW_NAME: &str = "trimnew";

const URL: &str = "http://tr.im/";
const NOT_FOUND_PAGE: &str = "http://tr.im/404";

pub fn config() -> ServiceConfig {
    ServiceConfig::new(NAME, URL, charset::LOWER_ALNUM).with_rate_limit(Some(RateLimit::new(20, 1)))
}

pub fn hooks() -> Hooks {
    Hooks {
        on_redirect,
        ..Hooks::default()
    }
}

pub fn new_config() -> ServiceConfig {
    ServiceConfig::new(NEW_NAME, URL, charset::LOWER_ALNUM).with_statuses(StatusTable {
        redirect: &[301],
        no_redirect: &[],
        code_blocked: &[],
        service_blocked: &[404],
    })
}

pub fn new_hooks() -> Hooks {
    Hooks {
        precheck: new_precheck,
        on_redirect: new_on_redirect,
        ..Hooks::default()
    }
}

pub fn build() -> Result<Box<dyn Service>, ConfigError> {
    Ok(Box::new(StatusService::new(config(), hooks())?))
}

pub fn build_new() -> Result<Box<dyn Service>, ConfigError> {
    Ok(Box::new(StatusService::new(new_config(), new_hooks())?))
}

fn on_redirect(
    code: &str,
    _response: &Response,
    location: LongUrl,
    _exchange: &mut dyn Exchange,
) -> Result<LongUrl, Error> {
    if code != "404" && location == NOT_FOUND_PAGE {
        log::debug!("Redirected to 404 page");
        Err(Error::NoRedirect)
    } else {
        Ok(location)
    }
}

fn new_precheck(code: &str) -> Result<(), Error> {
    if code == "500" {
        Err(Error::CodeBlocked(None))
    } else {
        Ok(())
    }
}

fn new_on_redirect(
    _code: &str,
    _response: &Response,
    location: LongUrl,
    _exchange: &mut dyn Exchange,
) -> Result<LongUrl, Error> {
    if location == NOT_FOUND_PAGE {
        Err(Error::NoRedirect)
    } else {
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        dispatch::StatusService,
        exchange::testing::{reply, ScriptedExchange},
        outcome::Error,
        service::Service,
    };

    #[test]
    fn redirect_to_not_found_page() {
        let exchange = ScriptedExchange::new()
            .head("abc", reply(301).with_header("location", "http://tr.im/404"))
            .head("404", reply(301).with_header("location", "http://tr.im/404"));
        let mut service =
            StatusService::with_exchange(super::config(), super::hooks(), exchange).unwrap();

        assert_eq!(service.fetch("abc"), Err(Error::NoRedirect));
        assert_eq!(service.fetch("404").unwrap(), "http://tr.im/404");
    }

    #[test]
    fn new_service_statuses() {
        let exchange = ScriptedExchange::new()
            .head("a", reply(301).with_header("location", "http://example.org/"))
            .head("b", reply(301).with_header("location", "http://tr.im/404"))
            .head("c", reply(404))
            .head("d", reply(302).with_header("location", "http://example.org/"));
        let mut service =
            StatusService::with_exchange(super::new_config(), super::new_hooks(), exchange)
                .unwrap();

        assert_eq!(service.fetch("a").unwrap(), "http://example.org/");
        assert_eq!(service.fetch("b"), Err(Error::NoRedirect));
        assert_eq!(service.fetch("c"), Err(Error::ServiceBlocked(None)));
        assert_eq!(
            service.fetch("d"),
            Err(Error::service("Unexpected HTTP status 302"))
        );
    }

    #[test]
    fn new_service_error_code() {
        let mut service = StatusService::with_exchange(
            super::new_config(),
            super::new_hooks(),
            ScriptedExchange::new(),
        )
        .unwrap();

        assert_eq!(service.fetch("500"), Err(Error::CodeBlocked(None)));
        assert!(service.exchange().is_done());
    }
}
