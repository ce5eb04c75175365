//! # Uploads JSON
//! src/resources/upload.rs
//!
//! Valida y persiste documentos JSON enviados por POST. Cada upload se
//! escribe una sola vez con un nombre `upload_<timestamp UTC>_<id>.json`; el
//! servidor nunca los modifica ni los borra después.
//!
//! Dos uploads concurrentes nunca comparten archivo salvo colisión del sufijo
//! aleatorio en el mismo segundo, que no se previene.

use crate::http::StatusCode;
use chrono::Utc;
use rand::distributions::Uniform;
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

const JSON_CONTENT_TYPE: &str = "application/json";
const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ID_LENGTH: usize = 4;

/// Prefijo público con el que se reporta la ruta de un upload
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("unsupported content type: {0:?}")]
    UnsupportedMediaType(String),

    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::UnsupportedMediaType(_) => StatusCode::UnsupportedMediaType,
            UploadError::InvalidJson(_) => StatusCode::BadRequest,
            UploadError::Io { .. } => StatusCode::InternalServerError,
        }
    }
}

/// Cuerpo JSON de la response 201
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub status: &'static str,
    pub message: &'static str,
    pub filepath: String,
}

impl UploadReceipt {
    pub fn new(filepath: String) -> Self {
        Self {
            status: "success",
            message: "File created successfully",
            filepath,
        }
    }
}

/// Escritor de uploads sobre un directorio
#[derive(Debug, Clone)]
pub struct UploadWriter {
    dir: PathBuf,
}

impl UploadWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Valida y guarda un upload
    ///
    /// Retorna la ruta pública (`/uploads/<archivo>`).
    ///
    /// # Errores
    ///
    /// - `Content-Type` distinto de `application/json` → 415
    /// - body que no es JSON → 400
    /// - falla al escribir → 500
    pub fn save(&self, content_type: Option<&str>, body: &str) -> Result<String, UploadError> {
        let content_type = content_type.unwrap_or_default();
        if !content_type.eq_ignore_ascii_case(JSON_CONTENT_TYPE) {
            return Err(UploadError::UnsupportedMediaType(content_type.to_string()));
        }

        let payload: Value = serde_json::from_str(body)?;
        let pretty = serde_json::to_string_pretty(&payload)?;

        let filename = generate_filename();
        let path = self.dir.join(&filename);
        fs::write(&path, pretty).map_err(|source| UploadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!(file = %path.display(), "upload written");

        Ok(format!("{}/{}", UPLOADS_URL_PREFIX, filename))
    }
}

/// `upload_<%Y%m%d_%H%M%S>_<4 alfanuméricos en minúscula>.json`
fn generate_filename() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    format!("upload_{}_{}.json", timestamp, generate_id(ID_LENGTH))
}

fn generate_id(length: usize) -> String {
    let alphabet = Uniform::from(0..ID_ALPHABET.len());
    rand::thread_rng()
        .sample_iter(alphabet)
        .take(length)
        .map(|idx| ID_ALPHABET[idx] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn writer() -> (TempDir, UploadWriter) {
        let dir = TempDir::new().unwrap();
        let writer = UploadWriter::new(dir.path());
        (dir, writer)
    }

    #[test]
    fn test_generated_filename_shape() {
        let name = generate_filename();
        let rest = name.strip_prefix("upload_").unwrap();
        let stem = rest.strip_suffix(".json").unwrap();
        let parts: Vec<&str> = stem.split('_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 8);
        assert_eq!(parts[1].len(), 6);
        assert!(parts[0].chars().chain(parts[1].chars()).all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), ID_LENGTH);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_save_writes_pretty_json() {
        let (dir, writer) = writer();
        let filepath = writer
            .save(Some("application/json"), r#"{"name":"ñandú","tags":[1,2]}"#)
            .unwrap();

        let filename = filepath.strip_prefix("/uploads/").unwrap();
        let written = fs::read_to_string(dir.path().join(filename)).unwrap();

        assert_eq!(
            written,
            "{\n  \"name\": \"ñandú\",\n  \"tags\": [\n    1,\n    2\n  ]\n}"
        );
    }

    #[test]
    fn test_content_type_case_insensitive() {
        let (_dir, writer) = writer();
        assert!(writer.save(Some("Application/JSON"), "[]").is_ok());
    }

    #[test]
    fn test_wrong_content_type() {
        let (dir, writer) = writer();
        for content_type in [None, Some("text/plain"), Some("application/json; charset=utf-8")] {
            let err = writer.save(content_type, "{}").unwrap_err();
            assert_eq!(err.status(), StatusCode::UnsupportedMediaType);
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_receipt_field_order() {
        let receipt = UploadReceipt::new("/uploads/upload_20240101_000000_abcd.json".to_string());
        assert_eq!(
            serde_json::to_string(&receipt).unwrap(),
            r#"{"status":"success","message":"File created successfully","filepath":"/uploads/upload_20240101_000000_abcd.json"}"#
        );
    }

    #[test]
    fn test_malformed_json() {
        let (dir, writer) = writer();
        let err = writer.save(Some("application/json"), "{\"a\": ").unwrap_err();
        assert_eq!(err.status(), StatusCode::BadRequest);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_directory_is_server_error() {
        let (dir, _) = writer();
        let writer = UploadWriter::new(dir.path().join("does/not/exist"));
        let err = writer.save(Some("application/json"), "{}").unwrap_err();
        assert_eq!(err.status(), StatusCode::InternalServerError);
    }
}
