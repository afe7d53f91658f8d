use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use strand_http::connection::HttpConnection;
use strand_http::handler::make_handler;
use strand_http::protocol::{BoxError, Request, Response};
use strand_runtime::stream::{Host, SendingStream, TcpHost};
use strand_runtime::{Deadline, Ticker, spawn};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

// curl -N http://127.0.0.1:8080/ticks
async fn ticks(request: Request) -> Result<Response, BoxError> {
    info!(path = request.path(), "streaming ticks");
    Ok(Response::with_sender(StatusCode::OK, |mut sink| async move {
        let ticker = Ticker::new(Duration::from_secs(1));
        for i in 0..5 {
            ticker.tick(Deadline::never()).await.ok();
            sink.send(format!("tick {i}\n").as_bytes(), Deadline::never()).await?;
        }
        ticker.stop();
        Ok(())
    }))
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!(port = 8080, "start listening");
    let host = match TcpHost::bind("127.0.0.1", 8080, false).await {
        Ok(host) => host,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    let handler = Arc::new(make_handler(ticks));
    loop {
        let stream = match host.accept(Deadline::never()).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        let handler = handler.clone();
        spawn(async move {
            match HttpConnection::new(stream).process(handler.as_ref()).await {
                Ok(()) => info!("finished process, connection shutdown"),
                Err(e) => error!(cause = %e, "service has error, connection shutdown"),
            }
        });
    }
}
