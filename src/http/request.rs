//! # Parsing de Requests HTTP/1.1
//! src/http/request.rs
//!
//! Parser mínimo que trabaja sobre los bytes de una sola lectura del socket.
//!
//! ## Formato de un Request
//!
//! ```text
//! POST /upload HTTP/1.1\r\n
//! Host: 127.0.0.1:8080\r\n
//! Content-Type: application/json\r\n
//! \r\n
//! {"name": "demo"}
//! ```
//!
//! ## Limitaciones conocidas
//!
//! - No se usa `Content-Length` para delimitar el body: todo lo que viene
//!   después de la línea vacía es el body.
//! - Un body que no cabe en una lectura (8 KiB) llega truncado; no se
//!   reensambla entre lecturas.
//! - El path se entrega crudo, sin decodificar ni normalizar.

use std::collections::HashMap;
use thiserror::Error;

/// Método HTTP del request
///
/// Solo GET y POST tienen handler; el resto se conserva tal cual para
/// poder loguearlo y responder 405.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Descargar un recurso del sandbox
    Get,

    /// POST - Subir un documento JSON
    Post,

    /// Cualquier otro token (PUT, DELETE, HEAD, basura...)
    Other(String),
}

impl Method {
    fn parse(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "POST" => Method::Post,
            other => Method::Other(other.to_string()),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Other(token) => token,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errores que pueden ocurrir durante el parsing
///
/// Ambos terminan en `400 Bad Request`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// El buffer no contiene nada legible
    #[error("Empty request")]
    EmptyRequest,

    /// La primera línea no tiene exactamente METHOD PATH VERSION
    #[error("Invalid request line: {0:?}")]
    InvalidRequestLine(String),
}

/// Representa un request HTTP parseado
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,

    /// Path crudo tal como llegó (ej: "/images/../index.html")
    path: String,

    /// Versión HTTP (ej: "HTTP/1.1")
    version: String,

    /// Headers con las llaves tal como llegaron; duplicados: gana el último
    headers: HashMap<String, String>,

    body: String,
}

impl Request {
    /// Parsea un request desde los bytes de una lectura
    ///
    /// Los bytes se decodifican como UTF-8 con reemplazo, igual que cualquier
    /// cliente tolerante.
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use resource_server::http::{Method, Request};
    ///
    /// let raw = b"GET /index.html HTTP/1.1\r\nHost: 127.0.0.1:8080\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.method(), &Method::Get);
    /// assert_eq!(request.header("Host"), Some("127.0.0.1:8080"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        let text = String::from_utf8_lossy(buffer);
        if text.is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        let lines: Vec<&str> = text.split("\r\n").collect();

        // 1. Request line: exactamente tres campos
        let parts: Vec<&str> = lines[0].split_whitespace().collect();
        let [method, path, version] = parts[..] else {
            return Err(ParseError::InvalidRequestLine(lines[0].to_string()));
        };

        // 2. Headers hasta la primera línea vacía
        let mut headers = HashMap::new();
        let mut idx = 1;
        while idx < lines.len() && !lines[idx].is_empty() {
            if let Some((key, value)) = lines[idx].split_once(": ") {
                headers.insert(key.trim().to_string(), value.trim().to_string());
            }
            idx += 1;
        }

        // 3. Body: todo lo que sigue a la línea vacía, verbatim
        let body = if idx + 1 < lines.len() {
            lines[idx + 1..].join("\r\n")
        } else {
            String::new()
        };

        Ok(Request {
            method: Method::parse(method),
            path: path.to_string(),
            version: version.to_string(),
            headers,
            body,
        })
    }

    // === Accesores ===

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Obtiene un header específico (la llave distingue mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Decide si el cliente pidió mantener la conexión abierta
    ///
    /// `Connection: keep-alive` (sin importar mayúsculas) o HTTP/1.1.
    /// Un `Connection: close` en HTTP/1.1 no cambia el resultado.
    pub fn wants_keep_alive(&self) -> bool {
        let header = self
            .header("Connection")
            .is_some_and(|v| v.eq_ignore_ascii_case("keep-alive"));
        header || self.version == "HTTP/1.1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_get() {
        let raw = b"GET / HTTP/1.1\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.method(), &Method::Get);
        assert_eq!(request.path(), "/");
        assert_eq!(request.version(), "HTTP/1.1");
        assert!(request.headers().is_empty());
        assert_eq!(request.body(), "");
    }

    #[test]
    fn test_parse_keeps_raw_path() {
        let raw = b"GET /a/../b%20c.html?x=1 HTTP/1.0\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.path(), "/a/../b%20c.html?x=1");
    }

    #[test]
    fn test_parse_headers_case_sensitive_last_wins() {
        let raw = b"GET / HTTP/1.1\r\nHost: a:1\r\nhost: b:2\r\nHost: c:3\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.header("Host"), Some("c:3"));
        assert_eq!(request.header("host"), Some("b:2"));
    }

    #[test]
    fn test_header_without_separator_is_ignored() {
        let raw = b"GET / HTTP/1.1\r\nGarbage\r\nX-Test:nospace\r\nX-Ok: yes\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.headers().len(), 1);
        assert_eq!(request.header("X-Ok"), Some("yes"));
    }

    #[test]
    fn test_parse_post_body_verbatim() {
        let raw = b"POST /x HTTP/1.1\r\nContent-Type: application/json\r\n\r\n{\"a\":\r\n1}";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.method(), &Method::Post);
        assert_eq!(request.body(), "{\"a\":\r\n1}");
    }

    #[test]
    fn test_parse_other_method() {
        let request = Request::parse(b"DELETE /x HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(request.method(), &Method::Other("DELETE".to_string()));
        assert_eq!(request.method().as_str(), "DELETE");
    }

    #[test]
    fn test_invalid_request_line() {
        assert!(matches!(
            Request::parse(b"GET\r\n\r\n"),
            Err(ParseError::InvalidRequestLine(_))
        ));
        assert!(matches!(
            Request::parse(b"GET / HTTP/1.1 extra\r\n\r\n"),
            Err(ParseError::InvalidRequestLine(_))
        ));
        assert!(matches!(
            Request::parse(b"\r\n\r\n"),
            Err(ParseError::InvalidRequestLine(_))
        ));
    }

    #[test]
    fn test_empty_request() {
        assert_eq!(Request::parse(b"").unwrap_err(), ParseError::EmptyRequest);
    }

    #[test]
    fn test_keep_alive_negotiation() {
        let http11 = Request::parse(b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n").unwrap();
        assert!(http11.wants_keep_alive());

        let http10 = Request::parse(b"GET / HTTP/1.0\r\n\r\n").unwrap();
        assert!(!http10.wants_keep_alive());

        let http10_ka =
            Request::parse(b"GET / HTTP/1.0\r\nConnection: Keep-Alive\r\n\r\n").unwrap();
        assert!(http10_ka.wants_keep_alive());
    }
}
