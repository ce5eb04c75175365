//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! API para construir respuestas HTTP/1.1 y convertirlas a bytes.
//!
//! ## Formato en el cable
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Length: 5\r\n
//! Content-Type: text/html; charset=utf-8\r\n
//! Connection: keep-alive\r\n
//! Keep-Alive: timeout=30, max=100\r\n
//! Date: Fri, 16 Oct 2026 10:00:00 GMT\r\n
//! Server: Multi-threaded HTTP Server\r\n
//! \r\n
//! hello
//! ```
//!
//! Los headers del llamador salen en orden de inserción, seguidos de `Date` y
//! `Server`. `Content-Length` siempre es explícito y exacto; nunca se usa
//! chunked encoding.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use resource_server::http::{Response, StatusCode};
//!
//! let response = Response::new(StatusCode::Ok)
//!     .with_header("Content-Type", "text/html; charset=utf-8")
//!     .with_body(b"<h1>hola</h1>".to_vec());
//!
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.1 200 OK\r\n"));
//! ```

use super::StatusCode;
use chrono::Utc;
use std::time::Duration;

/// Máximo de requests atendidos en una misma conexión (`Keep-Alive: max=`)
pub const MAX_PERSISTENT_REQUESTS: usize = 100;

/// Valor fijo del header `Server`
pub const SERVER_NAME: &str = "Multi-threaded HTTP Server";

/// Formato RFC 1123 en GMT para el header `Date`
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Representa una respuesta HTTP/1.1 completa
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,

    /// Headers en orden de inserción
    headers: Vec<(String, String)>,

    body: Vec<u8>,
}

impl Response {
    /// Crea una respuesta sin body (`Content-Length: 0`)
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: vec![("Content-Length".to_string(), "0".to_string())],
            body: Vec::new(),
        }
    }

    /// Agrega un header a la respuesta
    ///
    /// Si el header ya existe se sobrescribe en su posición original.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Versión mutable de [`Response::with_header`]
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self.headers.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Establece el body y recalcula `Content-Length`
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        let length = self.body.len().to_string();
        self.add_header("Content-Length", &length);
        self
    }

    /// Agrega `Connection` y, si corresponde, `Keep-Alive`
    ///
    /// ```
    /// use resource_server::http::{Response, StatusCode};
    /// use std::time::Duration;
    ///
    /// let response = Response::new(StatusCode::Ok)
    ///     .with_keep_alive(true, Duration::from_secs(30));
    /// assert_eq!(response.header("Keep-Alive"), Some("timeout=30, max=100"));
    /// ```
    pub fn with_keep_alive(self, keep_alive: bool, timeout: Duration) -> Self {
        if keep_alive {
            let keep_alive_value = format!(
                "timeout={}, max={}",
                timeout.as_secs(),
                MAX_PERSISTENT_REQUESTS
            );
            self.with_header("Connection", "keep-alive")
                .with_header("Keep-Alive", &keep_alive_value)
        } else {
            self.with_header("Connection", "close")
        }
    }

    /// Respuesta terminal sin body que cierra la conexión
    pub fn closing(status: StatusCode) -> Self {
        Self::new(status).with_header("Connection", "close")
    }

    /// Convierte la respuesta a bytes listos para el socket
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!("HTTP/1.1 {}\r\n", self.status);

        for (name, value) in &self.headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        head.push_str(&format!("Date: {}\r\n", Utc::now().format(HTTP_DATE_FORMAT)));
        head.push_str(&format!("Server: {}\r\n", SERVER_NAME));
        head.push_str("\r\n");

        let mut result = head.into_bytes();
        result.extend_from_slice(&self.body);
        result
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Busca un header por nombre exacto
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Indica si la respuesta deja la conexión abierta
    pub fn keeps_alive(&self) -> bool {
        self.header("Connection") == Some("keep-alive")
    }
}
