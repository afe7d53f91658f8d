use std::io;
use std::time::Duration;

use http::header::{CONTENT_TYPE, LOCATION};
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use strand_http::parser::ResponseParser;
use strand_http::protocol::{BoxError, ClientError, Request, Response};
use strand_runtime::stream::{IoStream, MemoryConnector, SendingStream, memory_host};
use strand_runtime::{Channel, Deadline, spawn};
use strand_web::content::content_response;
use strand_web::middleware::RedirectMiddleware;
use strand_web::responder::responder_fn;
use strand_web::router::{Router, Routes};
use strand_web::server::Server;
use tokio::io::DuplexStream;

struct Client {
    stream: IoStream<DuplexStream>,
    parser: ResponseParser,
}

impl Client {
    async fn connect(connector: &MemoryConnector) -> Self {
        let stream = connector.connect(Deadline::after(Duration::from_secs(5))).await.unwrap();
        Self { stream, parser: ResponseParser::default() }
    }

    /// `None` once the server has closed the connection.
    async fn send(&mut self, raw: &str) -> Option<Response> {
        self.stream.send(raw.as_bytes(), Deadline::never()).await.ok()?;
        self.stream.flush(Deadline::never()).await.ok()?;
        self.receive().await
    }

    async fn receive(&mut self) -> Option<Response> {
        self.parser.parse(&mut self.stream, Deadline::after(Duration::from_secs(5))).await.ok()
    }
}

fn body(response: &Response) -> &str {
    std::str::from_utf8(response.bytes().unwrap()).unwrap()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct User {
    name: String,
}

fn router() -> Router {
    let mut users = Routes::new();
    users
        .get(
            "/:id",
            responder_fn(|request: Request| async move {
                let id: u32 = request.path_parameter("id")?;
                Ok::<_, BoxError>(content_response(StatusCode::OK, &json!({"id": id}))?)
            }),
        )
        .add_content(Method::POST, "/", Vec::new(), |_request: Request, user: User| async move {
            content_response(StatusCode::CREATED, &user)
        });

    let mut routes = Routes::new();
    routes
        .get(
            "/hello/:city/a",
            responder_fn(|request: Request| async move {
                let city: String = request.path_parameter("city")?;
                assert!(request.path_parameters().get("country").is_none());
                Ok::<_, BoxError>(Response::with_body(StatusCode::OK, format!("hello {city}")))
            }),
        )
        .get(
            "/hello/:country/b",
            responder_fn(|request: Request| async move {
                let country: String = request.path_parameter("country")?;
                Ok::<_, BoxError>(Response::with_body(StatusCode::OK, format!("welcome to {country}")))
            }),
        )
        .get(
            "/boom",
            responder_fn(|_request: Request| async { Err::<Response, _>(io::Error::other("boom")) }),
        )
        .compose("/api/users", Vec::new(), Router::new(users));

    Router::builder()
        .middleware(RedirectMiddleware::new("/hello/venice/a", |request: &Request| request.path() == "/").unwrap())
        .routes(routes)
        .build()
}

async fn start() -> MemoryConnector {
    let (host, connector) = memory_host();
    let server = Server::builder().with_default_middleware(true).responder(router()).build().unwrap();
    spawn(server.serve(host));
    connector
}

#[tokio::test]
async fn matches_only_the_route_parameters() {
    let connector = start().await;
    let mut client = Client::connect(&connector).await;

    let response = client.send("GET /hello/venice/a HTTP/1.1\r\n\r\n").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(&response), "hello venice");

    let response = client.send("GET /hello/italy/b HTTP/1.1\r\n\r\n").await.unwrap();
    assert_eq!(body(&response), "welcome to italy");
}

#[tokio::test]
async fn keep_alive_and_pipelining() {
    let connector = start().await;
    let mut client = Client::connect(&connector).await;

    let first = client.send("GET /hello/a/a HTTP/1.1\r\n\r\nGET /hello/b/a HTTP/1.1\r\n\r\n").await.unwrap();
    assert_eq!(body(&first), "hello a");
    let second = client.receive().await.unwrap();
    assert_eq!(body(&second), "hello b");

    let third = client.send("GET /hello/c/a HTTP/1.1\r\nConnection: close\r\n\r\n").await.unwrap();
    assert_eq!(body(&third), "hello c");
    assert!(client.send("GET /hello/d/a HTTP/1.1\r\n\r\n").await.is_none());
}

#[tokio::test]
async fn missing_routes_and_methods() {
    let connector = start().await;
    let mut client = Client::connect(&connector).await;

    let response = client.send("GET /nowhere HTTP/1.1\r\n\r\n").await.unwrap();
    assert_eq!(response.status(), ClientError::NotFound.status());

    let response = client.send("DELETE /hello/venice/a HTTP/1.1\r\n\r\n").await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = client.send("GET /api/users/not-a-number HTTP/1.1\r\n\r\n").await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn mounted_router_negotiates_content() {
    let connector = start().await;
    let mut client = Client::connect(&connector).await;

    let response = client.send("GET /api/users/7 HTTP/1.1\r\nAccept: application/json\r\n\r\n").await.unwrap();
    assert_eq!(response.headers()[CONTENT_TYPE], "application/json; charset=utf-8");
    assert_eq!(body(&response), r#"{"id":7}"#);

    let payload = r#"{"name":"zewo"}"#;
    let raw = format!(
        "POST /api/users HTTP/1.1\r\nContent-Type: application/json\r\nAccept: application/x-www-form-urlencoded\r\nContent-Length: {}\r\n\r\n{payload}",
        payload.len()
    );
    let response = client.send(&raw).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/x-www-form-urlencoded; charset=utf-8");
    assert_eq!(body(&response), "name=zewo");

    let raw = "POST /api/users HTTP/1.1\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: 7\r\n\r\nnick=me";
    let response = client.send(raw).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn router_middleware_redirects() {
    let connector = start().await;
    let mut client = Client::connect(&connector).await;

    let response = client.send("GET / HTTP/1.1\r\n\r\n").await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[LOCATION], "/hello/venice/a");
}

#[tokio::test]
async fn unknown_errors_close_the_connection_after_a_500() {
    let connector = start().await;
    let mut client = Client::connect(&connector).await;

    let response = client.send("GET /boom HTTP/1.1\r\n\r\n").await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(client.send("GET /hello/venice/a HTTP/1.1\r\n\r\n").await.is_none());

    let mut other = Client::connect(&connector).await;
    let response = other.send("GET /hello/venice/a HTTP/1.1\r\n\r\n").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn panics_reach_the_failure_handler() {
    let failures = Channel::with_capacity(1);
    let reported = failures.clone();
    let server = Server::builder()
        .responder(responder_fn(|request: Request| async move {
            if request.path() == "/panic" {
                panic!("kaboom");
            }
            Ok::<_, BoxError>(Response::new(StatusCode::OK))
        }))
        .failure_handler(move |e| {
            let _ = reported.try_send(e.to_string());
        })
        .build()
        .unwrap();

    let (host, connector) = memory_host();
    spawn(server.serve(host));
    let mut client = Client::connect(&connector).await;

    let response = client.send("GET /panic HTTP/1.1\r\n\r\n").await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(client.send("GET / HTTP/1.1\r\n\r\n").await.is_none());

    let failure: String = failures.receive(Deadline::after(Duration::from_secs(5))).await.unwrap();
    assert!(failure.contains("kaboom"), "{failure}");

    let mut other = Client::connect(&connector).await;
    let response = other.send("GET / HTTP/1.1\r\n\r\n").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
