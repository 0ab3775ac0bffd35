//! Concrete shortener clients.
use crate::{
    service::{ConfigError, Service},
    yourls::{YourlsConfig, YourlsService},
};

pub mod bitly;
pub mod googl;
pub mod isgd;
pub mod owly;
pub mod simple;
pub mod snipurl;
pub mod tinyurl;
pub mod trim;
pub mod visibli;

pub const VBLY: &str = "vbly";
pub const ARSEHAT: &str = "arsehat";

/// http://vbly.us/
pub fn vbly_config() -> YourlsConfig {
    YourlsConfig::new(VBLY, "http://vbly.us/yourls-api.php", 36)
}

/// http://arseh.at/
pub fn arsehat_config() -> YourlsConfig {
    YourlsConfig::new(ARSEHAT, "http://arseh.at/api.php", 36)
}

pub fn build_vbly() -> Result<Box<dyn Service>, ConfigError> {
    Ok(Box::new(YourlsService::new(vbly_config())?))
}

pub fn build_arsehat() -> Result<Box<dyn Service>, ConfigError> {
    Ok(Box::new(YourlsService::new(arsehat_config())?))
}
