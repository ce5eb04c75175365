//! # Resource Server
//! src/lib.rs
//!
//! Servidor HTTP/1.1 concurrente con un pool acotado de workers. Sirve
//! archivos estáticos de un directorio de recursos y guarda documentos JSON
//! recibidos por POST.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `config`: argumentos CLI y variables de entorno
//! - `error`: errores de arranque y de I/O del servidor
//! - `http`: parsing de requests y serialización de responses
//! - `resources`: sandbox de paths, archivos estáticos y uploads
//! - `server`: socket de escucha, pool de workers y conexiones keep-alive
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use resource_server::config::Config;
//! use resource_server::server::Server;
//!
//! let server = Server::bind(Config::default()).expect("bind failed");
//! server.run().expect("server failed");
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod resources;
pub mod server;
