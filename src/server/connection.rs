//! # Manejador de Conexiones
//! src/server/connection.rs
//!
//! Lleva una conexión aceptada por la máquina de estados del protocolo:
//!
//! ```text
//!   ┌─────────┐  bytes   ┌─────────┐  ok   ┌───────────┐  ok   ┌──────────┐
//!   │ Reading │ ───────▶ │ Parsing │ ────▶ │ HostCheck │ ────▶ │ Dispatch │
//!   └─────────┘          └─────────┘       └───────────┘       └──────────┘
//!     ▲   │ EOF/timeout       │ 400             │ 403                │
//!     │   ▼                   ▼                 ▼                    ▼
//!     │ Closed ◀──────── Responding ◀──────────────────────── GET/POST/405
//!     └────────── keep-alive && requests < 100 ─┘
//! ```
//!
//! Ningún error sale de aquí: cada falla termina con una respuesta (o sin
//! ella, si el cliente se fue) y el socket se cierra al soltar la conexión.

use crate::http::{Method, Request, Response, StatusCode, MAX_PERSISTENT_REQUESTS};
use crate::resources::{StaticFiles, UploadReceipt, UploadWriter};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tamaño de cada lectura del socket
pub const READ_CHUNK_SIZE: usize = 8192;

/// Estados de la máquina de protocolo
#[derive(Debug)]
pub enum ConnectionState {
    Reading,
    Parsing(Vec<u8>),
    HostCheck(Request),
    Dispatch(Request),
    Responding(Response),
    Closed,
}

/// Todo lo que una conexión necesita del servidor; se comparte entre workers
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    /// Valor exacto esperado en el header `Host` (`host:puerto`)
    pub expected_host: String,
    pub keep_alive_timeout: Duration,
    pub files: StaticFiles,
    pub uploads: UploadWriter,
}

/// Una conexión en curso
pub struct Connection<'a> {
    stream: TcpStream,
    peer: SocketAddr,
    ctx: &'a ConnectionContext,
    persistent_requests: usize,
}

impl<'a> Connection<'a> {
    pub fn new(stream: TcpStream, peer: SocketAddr, ctx: &'a ConnectionContext) -> Self {
        Self {
            stream,
            peer,
            ctx,
            persistent_requests: 0,
        }
    }

    /// Ejecuta la máquina de estados hasta cerrar la conexión
    pub fn run(&mut self) {
        info!(peer = %self.peer, "connection opened");
        if let Err(e) = self.stream.set_read_timeout(Some(self.ctx.keep_alive_timeout)) {
            warn!(peer = %self.peer, error = %e, "failed to set read timeout");
            return;
        }

        let mut state = ConnectionState::Reading;
        loop {
            state = match state {
                ConnectionState::Reading => self.read(),
                ConnectionState::Parsing(bytes) => self.parse(&bytes),
                ConnectionState::HostCheck(request) => self.check_host(request),
                ConnectionState::Dispatch(request) => self.dispatch(request),
                ConnectionState::Responding(response) => self.respond(response),
                ConnectionState::Closed => break,
            };
        }

        info!(
            peer = %self.peer,
            requests = self.persistent_requests,
            "connection closed"
        );
    }

    fn read(&mut self) -> ConnectionState {
        let mut buffer = vec![0u8; READ_CHUNK_SIZE];
        match self.stream.read(&mut buffer) {
            Ok(0) => ConnectionState::Closed,
            Ok(n) => {
                buffer.truncate(n);
                ConnectionState::Parsing(buffer)
            }
            Err(e) if is_timeout(&e) => {
                debug!(peer = %self.peer, "idle timeout");
                ConnectionState::Closed
            }
            Err(e) => {
                debug!(peer = %self.peer, error = %e, "read failed");
                ConnectionState::Closed
            }
        }
    }

    fn parse(&self, bytes: &[u8]) -> ConnectionState {
        match Request::parse(bytes) {
            Ok(request) => {
                info!(
                    peer = %self.peer,
                    method = %request.method(),
                    path = request.path(),
                    version = request.version(),
                    "request received"
                );
                ConnectionState::HostCheck(request)
            }
            Err(e) => {
                warn!(peer = %self.peer, error = %e, "malformed request");
                ConnectionState::Responding(Response::closing(StatusCode::BadRequest))
            }
        }
    }

    fn check_host(&self, request: Request) -> ConnectionState {
        let host = request.header("Host");
        if host == Some(self.ctx.expected_host.as_str()) {
            debug!(host = ?host, "host validation passed");
            ConnectionState::Dispatch(request)
        } else {
            warn!(peer = %self.peer, host = ?host, "host validation failed");
            ConnectionState::Responding(Response::closing(StatusCode::Forbidden))
        }
    }

    fn dispatch(&self, request: Request) -> ConnectionState {
        let keep_alive = request.wants_keep_alive();
        let response = match request.method() {
            Method::Get => self.handle_get(request.path(), keep_alive),
            Method::Post => self.handle_post(&request, keep_alive),
            Method::Other(method) => {
                warn!(peer = %self.peer, method = %method, "method not allowed");
                Response::closing(StatusCode::MethodNotAllowed)
            }
        };
        ConnectionState::Responding(response)
    }

    fn handle_get(&self, path: &str, keep_alive: bool) -> Response {
        let file = match self.ctx.files.resolve(path) {
            Ok(file) => file,
            Err(e) => {
                info!(path, error = %e, "resource unavailable");
                return Response::closing(e.status());
            }
        };

        let name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string());
        if file.is_download() {
            info!(file = %name, bytes = file.body.len(), "sending binary file");
        } else {
            info!(file = %name, bytes = file.body.len(), "sending HTML file");
        }

        let mut response =
            Response::new(StatusCode::Ok).with_header("Content-Type", file.content_type);
        if let Some(disposition) = &file.disposition {
            response.add_header("Content-Disposition", disposition);
        }
        response
            .with_body(file.body)
            .with_keep_alive(keep_alive, self.ctx.keep_alive_timeout)
    }

    fn handle_post(&self, request: &Request, keep_alive: bool) -> Response {
        let filepath = match self.ctx.uploads.save(request.header("Content-Type"), request.body()) {
            Ok(filepath) => filepath,
            Err(e) => {
                warn!(peer = %self.peer, error = %e, "upload rejected");
                return Response::closing(e.status());
            }
        };

        let body = match serde_json::to_vec(&UploadReceipt::new(filepath)) {
            Ok(body) => body,
            Err(e) => {
                warn!(peer = %self.peer, error = %e, "failed to encode upload receipt");
                return Response::closing(StatusCode::InternalServerError);
            }
        };

        Response::new(StatusCode::Created)
            .with_header("Content-Type", "application/json; charset=utf-8")
            .with_body(body)
            .with_keep_alive(keep_alive, self.ctx.keep_alive_timeout)
    }

    fn respond(&mut self, response: Response) -> ConnectionState {
        let bytes = response.to_bytes();
        let written = self
            .stream
            .write_all(&bytes)
            .and_then(|_| self.stream.flush());
        if let Err(e) = written {
            debug!(peer = %self.peer, error = %e, "write failed");
            return ConnectionState::Closed;
        }

        self.persistent_requests += 1;
        let keep_alive = response.keeps_alive();
        info!(
            status = response.status().as_u16(),
            bytes = response.body().len(),
            connection = if keep_alive { "keep-alive" } else { "close" },
            "response sent"
        );

        if keep_alive && self.persistent_requests < MAX_PERSISTENT_REQUESTS {
            ConnectionState::Reading
        } else {
            ConnectionState::Closed
        }
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

/// Punto de entrada usado por el pool para cada conexión aceptada
pub fn handle_connection(stream: TcpStream, peer: SocketAddr, ctx: &ConnectionContext) {
    Connection::new(stream, peer, ctx).run();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::PathSandbox;
    use std::fs;
    use std::net::TcpListener;
    use std::thread;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> ConnectionContext {
        let root = dir.path();
        fs::create_dir_all(root.join("uploads")).unwrap();
        fs::write(root.join("index.html"), "<h1>hola</h1>").unwrap();
        ConnectionContext {
            expected_host: "127.0.0.1:8080".to_string(),
            keep_alive_timeout: Duration::from_secs(2),
            files: StaticFiles::new(PathSandbox::new(root).unwrap()),
            uploads: UploadWriter::new(root.join("uploads")),
        }
    }

    /// Atiende una sola conexión con `handle_connection` y retorna lo que
    /// recibió el cliente
    fn exchange(ctx: ConnectionContext, raw: &[u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, peer) = listener.accept().unwrap();
            handle_connection(stream, peer, &ctx);
        });

        let mut client = TcpStream::connect(addr).unwrap();
        client.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        client.write_all(raw).unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        server.join().unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[test]
    fn test_get_index_http10_closes() {
        let dir = TempDir::new().unwrap();
        let text = exchange(
            context(&dir),
            b"GET / HTTP/1.0\r\nHost: 127.0.0.1:8080\r\n\r\n",
        );

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: text/html; charset=utf-8\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(!text.contains("Keep-Alive:"));
        assert!(text.ends_with("\r\n\r\n<h1>hola</h1>"));
    }

    #[test]
    fn test_bad_request_line() {
        let dir = TempDir::new().unwrap();
        let text = exchange(context(&dir), b"NONSENSE\r\n\r\n");
        assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(text.contains("Content-Length: 0\r\n"));
    }

    #[test]
    fn test_host_mismatch() {
        let dir = TempDir::new().unwrap();
        let text = exchange(context(&dir), b"GET / HTTP/1.1\r\nHost: localhost:8080\r\n\r\n");
        assert!(text.starts_with("HTTP/1.1 403 Forbidden\r\n"));
        assert!(text.contains("Connection: close\r\n"));
    }

    #[test]
    fn test_method_not_allowed() {
        let dir = TempDir::new().unwrap();
        let text = exchange(context(&dir), b"PUT / HTTP/1.1\r\nHost: 127.0.0.1:8080\r\n\r\n");
        assert!(text.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
    }

    #[test]
    fn test_not_found_closes_even_with_keep_alive() {
        let dir = TempDir::new().unwrap();
        let text = exchange(
            context(&dir),
            b"GET /missing.html HTTP/1.1\r\nHost: 127.0.0.1:8080\r\nConnection: keep-alive\r\n\r\n",
        );
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("Connection: close\r\n"));
    }

    #[test]
    fn test_post_creates_upload() {
        let dir = TempDir::new().unwrap();
        let text = exchange(
            context(&dir),
            b"POST /anything HTTP/1.0\r\nHost: 127.0.0.1:8080\r\nContent-Type: application/json\r\n\r\n{\"k\": [1, 2]}",
        );

        assert!(text.starts_with("HTTP/1.1 201 Created\r\n"));
        assert!(text.contains("Content-Type: application/json; charset=utf-8\r\n"));
        let body = text.split_once("\r\n\r\n").unwrap().1;
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "File created successfully");
        assert!(json["filepath"].as_str().unwrap().starts_with("/uploads/upload_"));
        assert_eq!(fs::read_dir(dir.path().join("uploads")).unwrap().count(), 1);
    }

    #[test]
    fn test_idle_connection_closes_without_response() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        ctx.keep_alive_timeout = Duration::from_millis(200);
        let text = exchange(ctx, b"");
        assert!(text.is_empty());
    }
}
