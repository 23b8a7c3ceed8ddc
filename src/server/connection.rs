// Connection handling module
// Serves one accepted TCP connection with hyper's HTTP/1 implementation

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Spawn a task that serves `stream` until the client is done with it.
///
/// Errors stay inside the task: a malformed request or reset connection
/// is logged and only ends this connection.
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
) {
    tokio::spawn(serve_connection(stream, peer_addr, Arc::clone(state)));
}

/// Serve a single connection.
///
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Configures HTTP/1.1 keep-alive
/// 3. Serves requests with the redirect handler
/// 4. Applies the optional connection timeout
pub async fn serve_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) {
    let io = TokioIo::new(stream);

    let performance = &state.config.performance;
    let timeout = (performance.connection_timeout > 0)
        .then(|| Duration::from_secs(performance.connection_timeout));

    let mut builder = http1::Builder::new();
    builder.keep_alive(performance.keep_alive);

    let service_state = Arc::clone(&state);
    let conn = builder.serve_connection(
        io,
        service_fn(move |req| {
            handler::handle_request(req, Arc::clone(&service_state), Some(peer_addr))
        }),
    );

    let result = match timeout {
        Some(duration) => match tokio::time::timeout(duration, conn).await {
            Ok(result) => result,
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    duration.as_secs()
                ));
                return;
            }
        },
        None => conn.await,
    };

    if let Err(err) = result {
        logger::log_connection_error(&err);
    }
}
