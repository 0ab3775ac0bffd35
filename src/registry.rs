//! Lookup of services by their canonical name.
use super::{
    service::{ConfigError, Service},
    services::{self, bitly, googl, isgd, owly, simple, snipurl, tinyurl, trim, visibli},
};

type Constructor = fn() -> Result<Box<dyn Service>, ConfigError>;

const SERVICES: &[(&str, Constructor)] = &[
    (bitly::NAME, bitly::build),
    (isgd::NAME, isgd::build),
    (owly::NAME, owly::build),
    (tinyurl::NAME, tinyurl::build),
    (simple::UR1CA, simple::build_ur1ca),
    (snipurl::NAME, snipurl::build),
    (googl::NAME, googl::build),
    (trim::NEW_NAME, trim::build_new),
    (simple::POSTLY, simple::build_postly),
    (simple::WPME, simple::build_wpme),
    (visibli::HEX_NAME, visibli::build_hex),
    (visibli::NAME, visibli::build),
    (services::VBLY, services::build_vbly),
    (services::ARSEHAT, services::build_arsehat),
    (simple::PIXORIAL, simple::build_pixorial),
    (simple::TWITTER, simple::build_twitter),
    (trim::NAME, trim::build),
];

/// Canonical names of all known services.
pub fn names() -> impl Iterator<Item = &'static str> {
    SERVICES.iter().map(|(name, _)| *name)
}

pub fn contains(name: &str) -> bool {
    SERVICES.iter().any(|(candidate, _)| *candidate == name)
}

/// Construct a new instance of the named service.
///
/// Every call opens a fresh connection target; instances are never shared.
pub fn build(name: &str) -> Result<Box<dyn Service>, ConfigError> {
    let (_, constructor) = SERVICES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .ok_or_else(|| ConfigError::UnknownService(name.to_string()))?;

    log::debug!("Constructing service {}", name);

    constructor()
}

#[cfg(test)]
mod tests {
    use super::{build, contains, names};
    use crate::service::ConfigError;

    #[test]
    fn all_names() {
        let all = names().collect::<Vec<_>>();

        assert_eq!(
            all,
            vec![
                "bitly",
                "isgd",
                "owly",
                "tinyurl",
                "ur1ca",
                "snipurl",
                "googl",
                "trimnew",
                "postly",
                "wpme",
                "visiblihex",
                "visibli",
                "vbly",
                "arsehat",
                "pixorial",
                "twitter",
                "trim",
            ]
        );
    }

    #[test]
    fn unknown_service() {
        assert!(matches!(
            build("nosuchservice"),
            Err(ConfigError::UnknownService(name)) if name == "nosuchservice"
        ));
    }

    #[test]
    fn names_are_case_sensitive() {
        assert!(contains("bitly"));
        assert!(!contains("Bitly"));
        assert!(matches!(build("BITLY"), Err(ConfigError::UnknownService(_))));
    }
}
