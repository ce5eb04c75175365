//! # Archivos Estáticos
//! src/resources/static_files.rs
//!
//! Localiza un archivo a través del [`PathSandbox`] y lo clasifica por
//! extensión:
//!
//! | Extensión                    | Content-Type                 | Disposition |
//! |------------------------------|------------------------------|-------------|
//! | `.html`                      | `text/html; charset=utf-8`   | inline      |
//! | `.txt` `.png` `.jpg` `.jpeg` | `application/octet-stream`   | attachment  |
//! | cualquier otra               | 415                          | -           |
//!
//! El archivo se lee completo en memoria; no hay rangos.

use super::sandbox::{PathSandbox, SandboxError};
use crate::http::StatusCode;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

const HTML_EXTENSIONS: &[&str] = &["html"];
const DOWNLOAD_EXTENSIONS: &[&str] = &["txt", "png", "jpg", "jpeg"];

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
pub const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Inexistente, no es archivo regular o fuera del sandbox.
    /// Los tres casos son indistinguibles para el cliente.
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("unsupported file extension: {0:?}")]
    UnsupportedMediaType(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl ResolveError {
    pub fn status(&self) -> StatusCode {
        match self {
            ResolveError::NotFound(_) => StatusCode::NotFound,
            ResolveError::UnsupportedMediaType(_) => StatusCode::UnsupportedMediaType,
            ResolveError::Io { .. } => StatusCode::InternalServerError,
        }
    }
}

impl From<SandboxError> for ResolveError {
    fn from(err: SandboxError) -> Self {
        match err {
            SandboxError::OutsideRoot(path) | SandboxError::Unresolvable { path, .. } => {
                ResolveError::NotFound(path)
            }
        }
    }
}

/// Un archivo listo para enviarse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFile {
    pub body: Vec<u8>,
    pub content_type: &'static str,
    /// `Some(..)` fuerza la descarga (`Content-Disposition: attachment`)
    pub disposition: Option<String>,
}

impl StaticFile {
    pub fn is_download(&self) -> bool {
        self.disposition.is_some()
    }
}

/// Resolver de archivos del directorio de recursos
#[derive(Debug, Clone)]
pub struct StaticFiles {
    sandbox: PathSandbox,
}

impl StaticFiles {
    pub fn new(sandbox: PathSandbox) -> Self {
        Self { sandbox }
    }

    /// Resuelve y lee el archivo correspondiente a `request_path`
    pub fn resolve(&self, request_path: &str) -> Result<StaticFile, ResolveError> {
        let path = self.sandbox.resolve(request_path)?;
        if !path.is_file() {
            return Err(ResolveError::NotFound(request_path.to_string()));
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        let (content_type, disposition) = if HTML_EXTENSIONS.contains(&extension.as_str()) {
            (HTML_CONTENT_TYPE, None)
        } else if DOWNLOAD_EXTENSIONS.contains(&extension.as_str()) {
            (BINARY_CONTENT_TYPE, Some(attachment(&path)))
        } else {
            return Err(ResolveError::UnsupportedMediaType(extension));
        };

        let body = fs::read(&path).map_err(|source| ResolveError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Ok(StaticFile {
            body,
            content_type,
            disposition,
        })
    }
}

fn attachment(path: &Path) -> String {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("attachment; filename=\"{}\"", filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn files() -> (TempDir, StaticFiles) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("images")).unwrap();
        fs::write(root.join("index.html"), "<h1>home</h1>").unwrap();
        fs::write(root.join("notes.TXT"), "upper").unwrap();
        fs::write(root.join("images/logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
        fs::write(root.join("photo.jpg"), [0xFF, 0xD8, 0xFF, 0xE0, 0x00]).unwrap();
        fs::write(root.join("photo.JPEG"), [0xFF, 0xD8, 0xFF, 0xDB, 0x01]).unwrap();
        fs::write(root.join("tool.exe"), "MZ").unwrap();
        fs::write(root.join("data.json"), "{}").unwrap();
        fs::write(root.join("Makefile"), "all:").unwrap();
        let files = StaticFiles::new(PathSandbox::new(root).unwrap());
        (dir, files)
    }

    #[test]
    fn test_html_is_inline() {
        let (_dir, files) = files();
        let file = files.resolve("/").unwrap();
        assert_eq!(file.content_type, HTML_CONTENT_TYPE);
        assert_eq!(file.body, b"<h1>home</h1>");
        assert!(!file.is_download());
    }

    #[test]
    fn test_image_is_attachment() {
        let (_dir, files) = files();
        let file = files.resolve("/images/logo.png").unwrap();
        assert_eq!(file.content_type, BINARY_CONTENT_TYPE);
        assert_eq!(file.disposition.as_deref(), Some("attachment; filename=\"logo.png\""));
        assert_eq!(file.body, [0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_jpeg_variants_are_attachments() {
        let (_dir, files) = files();
        let cases: [(&str, &str, &[u8]); 2] = [
            ("/photo.jpg", "photo.jpg", &[0xFF, 0xD8, 0xFF, 0xE0, 0x00]),
            ("/photo.JPEG", "photo.JPEG", &[0xFF, 0xD8, 0xFF, 0xDB, 0x01]),
        ];
        for (path, name, bytes) in cases {
            let file = files.resolve(path).unwrap();
            assert_eq!(file.content_type, BINARY_CONTENT_TYPE, "{}", path);
            assert_eq!(
                file.disposition,
                Some(format!("attachment; filename=\"{}\"", name))
            );
            assert_eq!(file.body, bytes);
        }
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let (_dir, files) = files();
        let file = files.resolve("/notes.TXT").unwrap();
        assert_eq!(file.disposition.as_deref(), Some("attachment; filename=\"notes.TXT\""));
    }

    #[test]
    fn test_unsupported_extensions() {
        let (_dir, files) = files();
        for path in ["/tool.exe", "/data.json", "/Makefile"] {
            let err = files.resolve(path).unwrap_err();
            assert_eq!(err.status(), StatusCode::UnsupportedMediaType, "{}", path);
        }
    }

    #[test]
    fn test_missing_and_directories_are_not_found() {
        let (_dir, files) = files();
        assert_eq!(files.resolve("/nope.html").unwrap_err().status(), StatusCode::NotFound);
        assert_eq!(files.resolve("/images").unwrap_err().status(), StatusCode::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_is_server_error() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, files) = files();
        let locked = dir.path().join("locked.html");
        fs::write(&locked, "<p>secret</p>").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // root ignora los permisos; no hay forma de provocar el error
        if fs::read(&locked).is_ok() {
            return;
        }

        let err = files.resolve("/locked.html").unwrap_err();
        assert!(matches!(err, ResolveError::Io { .. }));
        assert_eq!(err.status(), StatusCode::InternalServerError);

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
    }

    #[test]
    fn test_traversal_is_not_found() {
        let (_dir, files) = files();
        let err = files.resolve("/../../../../etc/passwd").unwrap_err();
        assert_eq!(err.status(), StatusCode::NotFound);
    }
}
