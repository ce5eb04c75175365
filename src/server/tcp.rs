//! # Servidor TCP
//! src/server/tcp.rs
//!
//! Dueño del socket de escucha y del ciclo de vida del servidor. El accept
//! no bloquea: cuando no hay conexiones pendientes el loop duerme un tick
//! corto y vuelve a revisar la bandera de apagado.
//!
//! Cada conexión aceptada se entrega al [`WorkerPool`], que decide si entra a
//! un slot o espera en la cola de desborde.

use super::connection::{handle_connection, ConnectionContext};
use super::pool::{Admission, Handler, PoolError, WorkerPool};
use crate::config::Config;
use crate::error::{Result, ServerError};
use crate::resources::{PathSandbox, StaticFiles, UploadWriter};
use socket2::{Domain, Socket, Type};
use std::fs;
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Backlog del socket de escucha
pub const LISTEN_BACKLOG: i32 = 50;

/// Tick del loop de accept para revisar la bandera de apagado
pub const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Servidor HTTP con pool acotado
pub struct Server {
    config: Config,
    listener: TcpListener,
    local_addr: SocketAddr,
    pool: WorkerPool<(TcpStream, SocketAddr)>,
    context: Arc<ConnectionContext>,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Prepara el directorio de recursos, enlaza el socket y arranca el pool
    pub fn bind(config: Config) -> Result<Self> {
        config.validate()?;

        let uploads_dir = config.uploads_dir();
        fs::create_dir_all(&uploads_dir).map_err(|source| ServerError::Resources {
            path: uploads_dir.display().to_string(),
            source,
        })?;
        let sandbox = PathSandbox::new(&config.resource_dir).map_err(|source| {
            ServerError::Resources {
                path: config.resource_dir.display().to_string(),
                source,
            }
        })?;

        let listener = Self::listen(&config.address())?;
        let local_addr = listener.local_addr()?;

        let context = Arc::new(ConnectionContext {
            expected_host: format!("{}:{}", config.host, local_addr.port()),
            keep_alive_timeout: config.keep_alive_timeout(),
            files: StaticFiles::new(sandbox),
            uploads: UploadWriter::new(uploads_dir),
        });

        let handler_ctx = Arc::clone(&context);
        let handler: Handler<(TcpStream, SocketAddr)> =
            Arc::new(move |(stream, peer)| handle_connection(stream, peer, &handler_ctx));
        let pool = WorkerPool::new(config.max_threads, handler)?;

        Ok(Self {
            config,
            listener,
            local_addr,
            pool,
            context,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Socket con SO_REUSEADDR y backlog fijo, en modo no bloqueante
    fn listen(address: &str) -> Result<TcpListener> {
        let bind_error = |source: io::Error| ServerError::Bind {
            addr: address.to_string(),
            source,
        };

        let addr = address
            .to_socket_addrs()
            .map_err(bind_error)?
            .next()
            .ok_or_else(|| {
                bind_error(io::Error::new(io::ErrorKind::InvalidInput, "no address resolved"))
            })?;

        let socket =
            Socket::new(Domain::for_address(addr), Type::STREAM, None).map_err(bind_error)?;
        socket.set_reuse_address(true).map_err(bind_error)?;
        socket.bind(&addr.into()).map_err(bind_error)?;
        socket.listen(LISTEN_BACKLOG).map_err(bind_error)?;

        let listener: TcpListener = socket.into();
        listener.set_nonblocking(true)?;
        Ok(listener)
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Valor de `Host` que aceptará el servidor
    pub fn expected_host(&self) -> &str {
        &self.context.expected_host
    }

    /// Bandera compartida; ponerla en `true` detiene el loop de accept
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Loop de accept hasta recibir la señal de apagado
    ///
    /// Al apagar se cierra el socket de escucha y se espera a que terminen
    /// las conexiones en curso y las encoladas (hasta `shutdown_grace`).
    pub fn run(self) -> Result<()> {
        let Server {
            config,
            listener,
            local_addr,
            mut pool,
            shutdown,
            ..
        } = self;

        info!(addr = %local_addr, "HTTP server started on http://{}", local_addr);
        info!(max_threads = pool.max_threads(), "thread pool ready");

        while !shutdown.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, peer)) => Self::admit(&pool, stream, peer),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    error!(error = %e, "accept failed");
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        info!("server shutting down");
        drop(listener);

        let stats = pool.stats();
        info!(active = stats.active, queued = stats.queued, "draining connections");
        if pool.shutdown(config.shutdown_grace()) {
            info!("all connections drained");
        } else {
            warn!("shutdown finished with connections still open");
        }
        Ok(())
    }

    fn admit(pool: &WorkerPool<(TcpStream, SocketAddr)>, stream: TcpStream, peer: SocketAddr) {
        // El socket aceptado puede heredar el modo no bloqueante del listener
        if let Err(e) = stream.set_nonblocking(false) {
            warn!(peer = %peer, error = %e, "dropping connection: cannot switch to blocking mode");
            return;
        }

        match pool.submit_or_queue((stream, peer)) {
            Ok(Admission::Dispatched) => debug!(peer = %peer, "connection dispatched"),
            Ok(Admission::Queued { position }) => {
                debug!(peer = %peer, position, "connection waiting for a worker");
            }
            Err(PoolError::ShutDown((_stream, peer))) => {
                warn!(peer = %peer, "dropping connection: pool is shutting down");
            }
        }
    }
}
