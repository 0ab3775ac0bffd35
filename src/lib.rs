pub mod charset;
pub mod dispatch;
pub mod exchange;
pub mod outcome;
pub mod registry;
pub mod service;
pub mod services;
pub mod util;
pub mod yourls;

pub use dispatch::{Hooks, StatusService, StatusTable};
pub use exchange::{Exchange, HttpExchange};
pub use outcome::{Error, LongUrl, Outcome};
pub use service::{ConfigError, KeepAlive, RateLimit, Service, ServiceConfig};
pub use yourls::{YourlsConfig, YourlsService};
