use std::any::Any;
use std::fmt;
use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use strand_http::connection::HttpConnection;
use strand_http::handler::Handler;
use strand_http::parser::DEFAULT_BUFFER_SIZE;
use strand_http::protocol::{BoxError, HttpError, Request, Response};
use strand_runtime::stream::{Host, StreamError, TcpHost};
use strand_runtime::{Deadline, Task, spawn, spawn_with_failure_handler};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{ConfigError, Configuration, ServerConfig};
use crate::middleware::{ContentNegotiationMiddleware, LogMiddleware, Middleware, chain};
use crate::responder::Responder;

type FailureHandler = Arc<dyn Fn(HttpError) + Send + Sync>;

pub struct ServerBuilder {
    config: ServerConfig,
    middleware: Vec<Arc<dyn Middleware>>,
    responder: Option<Arc<dyn Responder>>,
    failure_handler: FailureHandler,
    buffer_size: usize,
    timeout: Option<Duration>,
    default_middleware: bool,
}

impl ServerBuilder {
    fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            middleware: Vec::new(),
            responder: None,
            failure_handler: Arc::new(log_failure),
            buffer_size: DEFAULT_BUFFER_SIZE,
            timeout: None,
            default_middleware: false,
        }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Appends middleware; the first one added sees the request first.
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn responder(mut self, responder: impl Responder + 'static) -> Self {
        self.responder = Some(Arc::new(responder));
        self
    }

    /// Receives the error of every connection that ends with one.
    pub fn failure_handler<F>(mut self, failure_handler: F) -> Self
    where
        F: Fn(HttpError) + Send + Sync + 'static,
    {
        self.failure_handler = Arc::new(failure_handler);
        self
    }

    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Bounds every read and write on a connection.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Runs request logging (when the config asks for it) and content
    /// negotiation in front of the configured middleware.
    pub fn with_default_middleware(mut self, enabled: bool) -> Self {
        self.default_middleware = enabled;
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let responder = self.responder.ok_or(ServerBuildError::MissingResponder)?;

        let mut middleware: Vec<Arc<dyn Middleware>> = Vec::new();
        if self.default_middleware {
            if self.config.log {
                middleware.push(Arc::new(LogMiddleware::default()));
            }
            middleware.push(Arc::new(ContentNegotiationMiddleware::default()));
        }
        middleware.extend(self.middleware);

        Ok(Server {
            config: self.config,
            entry: chain(middleware, responder),
            failure_handler: self.failure_handler,
            buffer_size: self.buffer_size,
            timeout: self.timeout,
        })
    }
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("responder must be set")]
    MissingResponder,

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// A responder or connection task panicked.
#[derive(Error, Debug)]
#[error("panicked: {message}")]
pub struct PanicError {
    message: String,
}

impl PanicError {
    fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => payload.downcast_ref::<&str>().map_or("unknown cause", |message| *message).to_string(),
        };
        Self { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Accepts connections and answers each request with the middleware chain
/// in front of the responder.
pub struct Server {
    config: ServerConfig,
    entry: Arc<dyn Responder>,
    failure_handler: FailureHandler,
    buffer_size: usize,
    timeout: Option<Duration>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// A server reading its settings from the `server` section, with the
    /// default middleware in front of `middleware`.
    pub fn from_configuration(
        configuration: &Configuration,
        middleware: Vec<Arc<dyn Middleware>>,
        responder: impl Responder + 'static,
    ) -> Result<Self, ServerBuildError> {
        let mut builder = Self::builder().config(configuration.server()?).with_default_middleware(true).responder(responder);
        builder.middleware = middleware;
        builder.build()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds the configured address and serves until accepting fails for good.
    pub async fn start(self) -> io::Result<()> {
        let host = TcpHost::bind(&self.config.host, self.config.port, self.config.reuse_port).await?;
        info!(address = %host.local_addr()?, reuse_port = self.config.reuse_port, "start listening");
        self.serve(host).await;
        Ok(())
    }

    pub fn start_in_background(self) -> Task<io::Result<()>> {
        spawn(self.start())
    }

    /// Serves every stream `host` accepts, each on its own task, until the
    /// host is closed.
    pub async fn serve<H: Host>(self, host: H) {
        let server = Arc::new(self);
        loop {
            let stream = match host.accept(Deadline::never()).await {
                Ok(stream) => stream,
                Err(StreamError::Closed) => {
                    info!("host closed, stop accepting");
                    return;
                }
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let connection_server = Arc::clone(&server);
            let failure_handler = Arc::clone(&server.failure_handler);
            spawn_with_failure_handler(
                async move {
                    let mut connection = HttpConnection::with_buffer_size(stream, connection_server.buffer_size);
                    if let Some(timeout) = connection_server.timeout {
                        connection = connection.timeout(timeout);
                    }
                    AssertUnwindSafe(connection.process(connection_server.as_ref()))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|payload| Err(HttpError::HandlerError { source: PanicError::from_payload(payload).into() }))
                },
                move |e| failure_handler(e),
            );
        }
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("buffer_size", &self.buffer_size)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Handler for Server {
    /// A panicking responder fails the request like an unknown error.
    async fn call(&self, request: Request) -> Result<Response, BoxError> {
        match AssertUnwindSafe(self.entry.respond(request)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let e = PanicError::from_payload(payload);
                error!(cause = %e, "responder panicked");
                Err(e.into())
            }
        }
    }
}

fn log_failure(e: HttpError) {
    error!(cause = %e, "connection failed");
}
