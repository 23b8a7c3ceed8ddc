use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

mod config;
mod handler;
mod http;
mod logger;
mod routing;
mod server;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load_from(config::DEFAULT_CONFIG_PATH)?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.performance.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr();
    serve(addr, &cfg).await
}

/// Bind `addr` and serve until the process is killed.
///
/// A bind failure ends startup here; nothing is left listening.
async fn serve(addr: SocketAddr, cfg: &config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let listener = server::create_listener(addr)?;
    let state = Arc::new(config::AppState::new(cfg));

    logger::log_server_start(&addr);

    server::start_server_loop(listener, state).await;
    Ok(())
}
