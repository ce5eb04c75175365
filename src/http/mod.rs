//! # Módulo HTTP
//!
//! Implementa el subconjunto de HTTP/1.1 que necesita el servidor, sin
//! librerías de alto nivel:
//!
//! - Parsing de requests a partir de una lectura del socket
//! - Construcción de responses con `Content-Length` explícito
//! - Códigos de estado
//!
//! No hay chunked transfer encoding ni pipelining; una conexión persistente
//! procesa un request por lectura.

pub mod request; // Parsing de HTTP requests
pub mod response; // Construcción de HTTP responses
pub mod status; // Códigos de estado HTTP

pub use request::{Method, ParseError, Request};
pub use response::{Response, MAX_PERSISTENT_REQUESTS};
pub use status::StatusCode;
