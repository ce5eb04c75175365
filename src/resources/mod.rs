//! # Recursos del Servidor
//! src/resources/mod.rs
//!
//! Todo lo que toca el sistema de archivos:
//!
//! - `sandbox`: confina los paths de los requests al directorio de recursos
//! - `static_files`: lectura y clasificación de archivos para GET
//! - `upload`: persistencia de documentos JSON para POST

pub mod sandbox;
pub mod static_files;
pub mod upload;

pub use sandbox::{PathSandbox, SandboxError};
pub use static_files::{ResolveError, StaticFile, StaticFiles};
pub use upload::{UploadError, UploadReceipt, UploadWriter};
