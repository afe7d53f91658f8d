use http::StatusCode;
use strand_http::protocol::{BoxError, Request, Response};
use strand_web::router::Router;
use strand_web::server::Server;
use strand_web::responder_fn;
use tracing::{Level, error};
use tracing_subscriber::FmtSubscriber;

async fn hello_world(_request: Request) -> Result<Response, BoxError> {
    Ok(Response::with_body(StatusCode::OK, "hello world"))
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let router = Router::builder().configure(|routes| {
        routes.get("/", responder_fn(hello_world));
    });

    let server = Server::builder().responder(router.build()).build().expect("responder is set");
    if let Err(e) = server.start().await {
        error!(cause = %e, "server stopped");
    }
}
