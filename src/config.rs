//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor con soporte para argumentos CLI y variables de
//! entorno. Los tres primeros parámetros son posicionales para conservar la
//! forma clásica de invocación `server [PORT] [HOST] [MAX_THREADS]`.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./resource_server 8080 127.0.0.1 10 --resources ./resources
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=9000 MAX_THREADS=4 ./resource_server
//! ```

use crate::error::ServerError;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Configuración del servidor HTTP
#[derive(Debug, Clone, Parser)]
#[command(name = "resource_server")]
#[command(about = "Multi-threaded HTTP Server")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha; también es el valor esperado en `Host`
    #[arg(default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Tamaño del pool de workers (conexiones atendidas en paralelo)
    #[arg(default_value = "10", env = "MAX_THREADS")]
    pub max_threads: usize,

    /// Directorio raíz de los recursos servidos por GET
    #[arg(long = "resources", default_value = "resources", env = "RESOURCE_DIR")]
    pub resource_dir: PathBuf,

    /// Timeout de inactividad de una conexión keep-alive, en segundos
    #[arg(long = "keep-alive-timeout", default_value = "30", env = "KEEP_ALIVE_TIMEOUT")]
    pub keep_alive_timeout_secs: u64,

    /// Tiempo máximo de drenado al apagar el servidor, en segundos
    #[arg(long = "shutdown-grace", default_value = "60", env = "SHUTDOWN_GRACE")]
    pub shutdown_grace_secs: u64,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use resource_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Subdirectorio donde se escriben los uploads
    pub fn uploads_dir(&self) -> PathBuf {
        self.resource_dir.join("uploads")
    }

    pub fn keep_alive_timeout(&self) -> Duration {
        Duration::from_secs(self.keep_alive_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.host.trim().is_empty() {
            return Err(ServerError::InvalidConfig("host must not be empty".to_string()));
        }
        if self.max_threads == 0 {
            return Err(ServerError::InvalidConfig("max threads must be >= 1".to_string()));
        }
        if self.keep_alive_timeout_secs == 0 {
            return Err(ServerError::InvalidConfig(
                "keep-alive timeout must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            max_threads: 10,
            resource_dir: PathBuf::from("resources"),
            keep_alive_timeout_secs: 30,
            shutdown_grace_secs: 60,
        }
    }
}
