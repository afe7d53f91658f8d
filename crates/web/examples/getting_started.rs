use std::sync::Arc;

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use strand_http::protocol::{BoxError, Request, Response};
use strand_web::config::Configuration;
use strand_web::content::content_response;
use strand_web::middleware::{Middleware, RecoveryMiddleware};
use strand_web::router::{Router, Routes};
use strand_web::server::Server;
use strand_web::responder_fn;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct User {
    name: String,
    zip: String,
}

async fn simple_get(request: Request) -> Result<Response, BoxError> {
    Ok(Response::with_body(StatusCode::OK, format!("receive from method: {}\r\n", request.method())))
}

// curl -v -H 'Content-Type: application/json' -d '{"name":"hello","zip":"world"}' http://127.0.0.1:8080/users
// curl -v -H 'Accept: application/x-www-form-urlencoded' -d 'name=hello&zip=world' http://127.0.0.1:8080/users
async fn create_user(_request: Request, user: User) -> Result<Response, BoxError> {
    info!(?user, "creating user");
    Ok(content_response(StatusCode::CREATED, &user)?)
}

async fn find_user(request: Request) -> Result<Response, BoxError> {
    let name: String = request.path_parameter("name")?;
    Ok(content_response(StatusCode::OK, &User { name, zip: "00000".to_string() })?)
}

fn users() -> Router {
    let mut routes = Routes::new();
    routes
        .add_content(Method::POST, "/", Vec::new(), create_user)
        .get("/:name", responder_fn(find_user));
    Router::new(routes)
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut configuration = Configuration::new();
    if let Err(e) = configuration.set_raw("server.log", "true") {
        error!(cause = %e, "invalid configuration");
        return;
    }

    let mut routes = Routes::new();
    routes.get("/", responder_fn(simple_get)).compose("/users", Vec::new(), users());
    let router = Router::new(routes);

    let middleware: Vec<Arc<dyn Middleware>> = vec![Arc::new(RecoveryMiddleware::new())];
    let server = match Server::from_configuration(&configuration, middleware, router) {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "can't build server");
            return;
        }
    };

    if let Err(e) = server.start().await {
        error!(cause = %e, "server stopped");
    }
}
