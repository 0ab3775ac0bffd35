use shorturl_rs::{
    charset, services::owly, Error, Hooks, KeepAlive, Service, ServiceConfig, StatusService,
    YourlsConfig, YourlsService,
};
use std::net::TcpListener;
use tokio::runtime::Runtime;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The services block on their own runtime, so the mock server runs on a
/// separate one.
fn start_server() -> (Runtime, MockServer) {
    let runtime = Runtime::new().unwrap();
    let server = runtime.block_on(MockServer::start());

    (runtime, server)
}

fn mount(runtime: &Runtime, server: &MockServer, mock: Mock) {
    runtime.block_on(mock.mount(server));
}

fn local_config(server: &MockServer) -> ServiceConfig {
    ServiceConfig::new("local", format!("{}/", server.uri()), charset::ALNUM)
}

#[test]
fn head_redirect() {
    let (runtime, server) = start_server();
    mount(
        &runtime,
        &server,
        Mock::given(method("HEAD")).and(path("/abc")).respond_with(
            ResponseTemplate::new(301).insert_header("Location", "http://example.org/target"),
        ),
    );

    let mut service = StatusService::new(local_config(&server), Hooks::default()).unwrap();

    assert_eq!(service.fetch("abc").unwrap(), "http://example.org/target");
}

#[test]
fn head_not_found() {
    let (runtime, server) = start_server();
    mount(
        &runtime,
        &server,
        Mock::given(method("HEAD"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404)),
    );

    let mut service = StatusService::new(local_config(&server), Hooks::default()).unwrap();

    assert_eq!(service.fetch("missing"), Err(Error::NoRedirect));
}

#[test]
fn repeated_calls_reuse_service() {
    let (runtime, server) = start_server();
    mount(
        &runtime,
        &server,
        Mock::given(method("HEAD"))
            .and(path("/a"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "http://a.example/")),
    );
    mount(
        &runtime,
        &server,
        Mock::given(method("HEAD"))
            .and(path("/b"))
            .respond_with(ResponseTemplate::new(403)),
    );

    let mut service = StatusService::new(local_config(&server), Hooks::default()).unwrap();

    assert_eq!(service.fetch("a").unwrap(), "http://a.example/");
    assert_eq!(service.fetch("b"), Err(Error::ServiceBlocked(None)));
    assert_eq!(service.fetch("a").unwrap(), "http://a.example/");
}

#[test]
fn warning_page_is_fetched() {
    let (runtime, server) = start_server();
    mount(
        &runtime,
        &server,
        Mock::given(method("HEAD"))
            .and(path("/warn"))
            .respond_with(ResponseTemplate::new(200)),
    );
    mount(
        &runtime,
        &server,
        Mock::given(method("GET"))
            .and(path("/warn"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<p>Warning</p><a class="btn ignore" href="http://example.org/risky" title="Continue">"#,
            )),
    );

    let mut service = StatusService::new(local_config(&server), owly::hooks()).unwrap();

    assert_eq!(service.fetch("warn").unwrap(), "http://example.org/risky");
}

#[test]
fn yourls_api() {
    let (runtime, server) = start_server();
    mount(
        &runtime,
        &server,
        Mock::given(method("GET"))
            .and(path("/yourls-api.php"))
            .and(query_param("action", "expand"))
            .and(query_param("shorturl", "abc"))
            .and(query_param("format", "simple"))
            .respond_with(ResponseTemplate::new(200).set_body_string("http://example.org/long")),
    );
    mount(
        &runtime,
        &server,
        Mock::given(method("GET"))
            .and(path("/yourls-api.php"))
            .and(query_param("shorturl", "zzz"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not found")),
    );

    let config = YourlsConfig::new("local", format!("{}/yourls-api.php", server.uri()), 36);
    let mut service = YourlsService::new(config).unwrap();

    assert_eq!(service.charset(), charset::LOWER_ALNUM);
    assert_eq!(service.fetch("abc").unwrap(), "http://example.org/long");
    assert_eq!(service.fetch("zzz"), Err(Error::NoRedirect));
}

#[test]
fn connection_headers() {
    let (runtime, server) = start_server();
    let host = server.address().to_string();
    mount(
        &runtime,
        &server,
        Mock::given(method("HEAD"))
            .and(path("/open"))
            .and(header("connection", "keep-alive"))
            .and(header("host", host.as_str()))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "http://a.example/")),
    );
    mount(
        &runtime,
        &server,
        Mock::given(method("HEAD"))
            .and(path("/closed"))
            .and(header("connection", "close"))
            .and(header("host", host.as_str()))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "http://b.example/")),
    );

    let mut keep_alive = StatusService::new(local_config(&server), Hooks::default()).unwrap();
    let mut close = StatusService::new(
        local_config(&server).with_keep_alive(KeepAlive::Disabled),
        Hooks::default(),
    )
    .unwrap();

    assert_eq!(keep_alive.fetch("open").unwrap(), "http://a.example/");
    assert_eq!(close.fetch("closed").unwrap(), "http://b.example/");
    assert_eq!(close.fetch("closed").unwrap(), "http://b.example/");
    // Without the expected header the server falls back to a 404.
    assert_eq!(keep_alive.fetch("closed"), Err(Error::NoRedirect));
}

#[test]
fn static_headers_are_sent() {
    let (runtime, server) = start_server();
    mount(
        &runtime,
        &server,
        Mock::given(method("HEAD"))
            .and(path("/abc"))
            .and(header("user-agent", "Example/1.0"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "http://a.example/")),
    );

    let config = local_config(&server).with_header("User-Agent", "Example/1.0");
    let mut service = StatusService::new(config, Hooks::default()).unwrap();

    assert_eq!(service.fetch("abc").unwrap(), "http://a.example/");
}

#[test]
fn transport_failure_is_service_error() {
    let address = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let config = ServiceConfig::new("closed", format!("http://{}/", address), charset::ALNUM);
    let mut service = StatusService::new(config, Hooks::default()).unwrap();

    let result = service.fetch("abc");

    assert!(matches!(
        &result,
        Err(Error::Service(message)) if message.starts_with("HTTP exception")
    ));
    // The failed connection is replaced, so the next call fails the same way.
    assert!(matches!(service.fetch("abc"), Err(Error::Service(_))));
}
