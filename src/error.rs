//! # Errores del Servidor
//! src/error.rs
//!
//! Errores que pueden detener el arranque o el ciclo de vida del servidor.
//! Los errores de una conexión individual nunca llegan aquí: se resuelven
//! dentro del manejador de conexiones con una respuesta terminal.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// No se pudo enlazar el socket de escucha
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Configuración inválida (workers en cero, host vacío, ...)
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No se pudo crear un thread del pool
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),

    /// El directorio de recursos no existe o no se pudo preparar
    #[error("resource directory {path}: {source}")]
    Resources {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
