//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Escucha en un puerto con un socket no bloqueante
//! 2. Entrega cada conexión aceptada al pool de workers
//! 3. Encola en orden FIFO las conexiones que no caben en el pool
//! 4. Atiende cada conexión con la máquina de estados keep-alive

pub mod connection;
pub mod pool;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use crate::http::MAX_PERSISTENT_REQUESTS;
pub use connection::{handle_connection, ConnectionContext};
pub use pool::{Admission, PoolError, PoolStats, WorkerPool};
pub use tcp::Server;
