//! # Sandbox de Paths
//! src/resources/sandbox.rs
//!
//! Traduce el path de un request a un path canónico dentro del directorio de
//! recursos. La verificación se hace después de `canonicalize`, así que `..`
//! y los symlinks que salen de la raíz quedan rechazados.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Archivo servido cuando el path es exactamente `/`
pub const INDEX_FILE: &str = "index.html";

#[derive(Debug, Error)]
pub enum SandboxError {
    /// El path canónico no queda estrictamente bajo la raíz
    #[error("path {0:?} resolves outside the resource root")]
    OutsideRoot(String),

    /// `canonicalize` falló (archivo inexistente, symlink roto, ...)
    #[error("path {path:?} cannot be resolved: {source}")]
    Unresolvable {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Resolver confinado a un directorio raíz
#[derive(Debug, Clone)]
pub struct PathSandbox {
    /// Raíz canónica (sin symlinks)
    root: PathBuf,
}

impl PathSandbox {
    /// Crea el sandbox canonicalizando la raíz una sola vez
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            root: root.as_ref().canonicalize()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resuelve un path de request a un archivo dentro de la raíz
    ///
    /// `/` se sirve como `index.html`; el resto pierde las `/` iniciales y
    /// se une a la raíz.
    pub fn resolve(&self, request_path: &str) -> Result<PathBuf, SandboxError> {
        let relative = if request_path == "/" {
            INDEX_FILE
        } else {
            request_path.trim_start_matches('/')
        };

        let canonical = self
            .root
            .join(relative)
            .canonicalize()
            .map_err(|source| SandboxError::Unresolvable {
                path: request_path.to_string(),
                source,
            })?;

        // La raíz misma tampoco cuenta: debe ser un descendiente estricto
        if canonical == self.root || !canonical.starts_with(&self.root) {
            warn!(path = %request_path, "path escapes resource root");
            return Err(SandboxError::OutsideRoot(request_path.to_string()));
        }

        Ok(canonical)
    }
}
