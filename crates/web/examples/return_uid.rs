use http::StatusCode;
use strand_http::protocol::{BoxError, Request, Response};
use strand_web::middleware::{LogMiddleware, RecoveryMiddleware};
use strand_web::router::Router;
use strand_web::server::Server;
use strand_web::responder_fn;
use tracing::{Level, error};
use tracing_subscriber::FmtSubscriber;

async fn empty_body(_request: Request) -> Result<Response, BoxError> {
    Ok(Response::new(StatusCode::OK))
}

// curl -v http://127.0.0.1:3000/user/42
async fn echo_uid(request: Request) -> Result<Response, BoxError> {
    let id: u64 = request.path_parameter("id")?;
    Ok(Response::with_body(StatusCode::OK, id.to_string()))
}

async fn not_found(_request: Request) -> Result<Response, BoxError> {
    Ok(Response::with_body(StatusCode::NOT_FOUND, "404 not found"))
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let router = Router::builder()
        .middleware(RecoveryMiddleware::new())
        .configure(|routes| {
            routes
                .get("/", responder_fn(empty_body))
                .post("/user", responder_fn(empty_body))
                .get("/user/:id", responder_fn(echo_uid))
                .fallback(Vec::new(), responder_fn(not_found));
        })
        .build();

    let mut config = strand_web::config::ServerConfig::default();
    config.port = 3000;

    let server = Server::builder()
        .config(config)
        .middleware(LogMiddleware::new(true))
        .responder(router)
        .build()
        .expect("responder is set");
    if let Err(e) = server.start().await {
        error!(cause = %e, "server stopped");
    }
}
