//! # Resource Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor. Lee la configuración de la línea de
//! comandos y del entorno, instala el logging y los handlers de señales, y
//! bloquea en el loop de accept hasta recibir SIGINT o SIGTERM.

use resource_server::config::Config;
use resource_server::server::Server;
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();

    let config = Config::new();

    info!("=================================");
    info!("  Multi-threaded HTTP Server");
    info!("=================================");
    info!(
        address = %config.address(),
        max_threads = config.max_threads,
        resources = %config.resource_dir.display(),
        keep_alive_timeout = config.keep_alive_timeout_secs,
        "configuration loaded"
    );

    let server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    };

    let shutdown = server.shutdown_handle();
    for signal in [SIGINT, SIGTERM] {
        if let Err(e) = signal_hook::flag::register(signal, shutdown.clone()) {
            error!(signal, error = %e, "failed to register signal handler");
            std::process::exit(1);
        }
    }
    info!("press Ctrl+C to stop");

    if let Err(e) = server.run() {
        error!(error = %e, "fatal server error");
        std::process::exit(1);
    }
    info!("server stopped");
}
