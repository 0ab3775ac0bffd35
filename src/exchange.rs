//! A single owned HTTP/1 connection to a shortener host.
use super::{
    outcome::{Error, LongUrl},
    service::{ConfigError, KeepAlive, ServiceConfig},
};
use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONNECTION, HOST, LOCATION},
    redirect, Client, Method,
};
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;
use tokio::runtime::Runtime;
use url::Url;

const REQUEST_TIMEOUT_DURATION: Duration = Duration::from_secs(30);
const TCP_KEEPALIVE_DURATION: Duration = Duration::from_secs(20);

/// Status, reason phrase, headers and body of one exchange.
#[derive(Clone, Debug, Default)]
pub struct Response {
    pub status: u16,
    pub reason: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers.get(name).map(HeaderValue::as_bytes)
    }

    /// The `Location` header, if present and non-empty.
    pub fn location(&self) -> Option<LongUrl> {
        self.headers
            .get(LOCATION)
            .map(HeaderValue::as_bytes)
            .filter(|value| !value.is_empty())
            .map(LongUrl::from)
    }
}

/// Request/response capability consumed by services.
///
/// Paths are relative to the base path the exchange was built for.
/// Transport failures are reported as `Error::Service`.
pub trait Exchange: Send {
    fn request(&mut self, method: Method, path: &str) -> Result<Response, Error>;

    /// Drop the current connection. The next request opens a new one.
    fn close(&mut self);

    fn head(&mut self, path: &str) -> Result<Response, Error> {
        self.request(Method::HEAD, path)
    }

    fn get(&mut self, path: &str) -> Result<Response, Error> {
        self.request(Method::GET, path)
    }
}

/// Where a service lives: scheme, host, optional port and base path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Target {
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
}

impl Target {
    pub fn parse(value: &str) -> Result<Target, ConfigError> {
        let url = Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
            value: value.to_string(),
            source,
        })?;

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        }

        let host = url
            .host_str()
            .ok_or_else(|| ConfigError::UnknownHost(value.to_string()))?
            .to_string();

        let path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        Ok(Target {
            scheme: url.scheme().to_string(),
            host,
            port: url.port(),
            path,
        })
    }

    pub fn port_or_default(&self) -> u16 {
        self.port
            .unwrap_or(if self.scheme == "https" { 443 } else { 80 })
    }

    /// The value sent in the `Host` header.
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    /// Look up the host once; the first IPv4 or IPv6 address wins.
    pub fn resolve(&self) -> Result<SocketAddr, ConfigError> {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');

        (host, self.port_or_default())
            .to_socket_addrs()
            .map_err(|_| ConfigError::UnknownHost(self.authority()))?
            .find(|addr| addr.is_ipv4() || addr.is_ipv6())
            .ok_or_else(|| ConfigError::UnknownHost(self.authority()))
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}://{}{}{}", self.scheme, self.authority(), self.path, path)
    }
}

/// The production `Exchange`, backed by `reqwest`.
///
/// Each instance owns a current-thread runtime, so calls block the caller
/// and no work happens between them.
pub struct HttpExchange {
    runtime: Runtime,
    client: Client,
    target: Target,
    address: SocketAddr,
    keep_alive: KeepAlive,
    headers: HeaderMap,
}

impl HttpExchange {
    pub fn new(config: &ServiceConfig) -> Result<Self, ConfigError> {
        Self::for_url(&config.url, config.keep_alive, config.header_map()?)
    }

    pub fn for_url(
        url: &str,
        keep_alive: KeepAlive,
        headers: HeaderMap,
    ) -> Result<Self, ConfigError> {
        let target = Target::parse(url)?;
        let address = target.resolve()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let client = Self::build_client(&runtime, &target, address, keep_alive)?;

        log::debug!("Resolved {} to {}", target.authority(), address);

        Ok(Self {
            runtime,
            client,
            target,
            address,
            keep_alive,
            headers,
        })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    fn build_client(
        runtime: &Runtime,
        target: &Target,
        address: SocketAddr,
        keep_alive: KeepAlive,
    ) -> reqwest::Result<Client> {
        let _guard = runtime.enter();
        let builder = Client::builder()
            .http1_only()
            .read_timeout(REQUEST_TIMEOUT_DURATION)
            .connect_timeout(REQUEST_TIMEOUT_DURATION)
            .redirect(redirect::Policy::none())
            .resolve(&target.host, address);

        let builder = match keep_alive {
            KeepAlive::Enabled => builder
                .pool_max_idle_per_host(1)
                .pool_idle_timeout(REQUEST_TIMEOUT_DURATION)
                .tcp_keepalive(Some(TCP_KEEPALIVE_DURATION)),
            KeepAlive::Disabled => builder.pool_max_idle_per_host(0),
        };

        builder.build()
    }

    fn request_headers(&self) -> HeaderMap {
        let mut headers = self.headers.clone();

        if let Ok(host) = HeaderValue::from_str(&self.target.authority()) {
            headers.insert(HOST, host);
        }
        headers.insert(
            CONNECTION,
            HeaderValue::from_static(self.keep_alive.header_value()),
        );

        headers
    }
}

impl Exchange for HttpExchange {
    fn request(&mut self, method: Method, path: &str) -> Result<Response, Error> {
        let url = self.target.url_for(path);
        let request = self
            .client
            .request(method.clone(), &url)
            .headers(self.request_headers());

        let result = self.runtime.block_on(async {
            let response = request.send().await?;
            let status = response.status();
            let reason = response
                .extensions()
                .get::<hyper::ext::ReasonPhrase>()
                .map(|reason| String::from_utf8_lossy(reason.as_bytes()).into_owned())
                .or_else(|| status.canonical_reason().map(str::to_string));
            let headers = response.headers().clone();
            let body = response.bytes().await?;

            Ok::<_, reqwest::Error>(Response {
                status: status.as_u16(),
                reason,
                headers,
                body,
            })
        });

        match result {
            Ok(response) => {
                log::debug!("{} {} -> {}", method, url, response.status);
                if self.keep_alive == KeepAlive::Disabled {
                    self.close();
                }
                Ok(response)
            }
            Err(error) => {
                log::warn!("{} {} failed: {}", method, url, error);
                self.close();
                Err(Error::service(format!("HTTP exception: {}", error)))
            }
        }
    }

    fn close(&mut self) {
        match Self::build_client(&self.runtime, &self.target, self.address, self.keep_alive) {
            Ok(client) => self.client = client,
            Err(error) => log::warn!("Could not reset connection: {}", error),
        }
    }
}
