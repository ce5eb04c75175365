//! # Códigos de Estado HTTP
//! src/http/status.rs
//!
//! Códigos de estado que puede emitir el servidor. La tabla es corta a
//! propósito: cada código corresponde a un caso concreto del manejador de
//! conexiones (archivo servido, upload creado o alguna condición de error
//! terminal).
//!
//! - **2xx**: Éxito (200, 201)
//! - **4xx**: Error del cliente (400, 403, 404, 405, 415)
//! - **5xx**: Error del servidor (500)

/// Representa los códigos de estado HTTP que soporta nuestro servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK - Archivo servido
    Ok = 200,

    /// 201 Created - Upload JSON persistido
    Created = 201,

    /// 400 Bad Request - Request line inválida o JSON malformado
    BadRequest = 400,

    /// 403 Forbidden - Header `Host` ausente o distinto al configurado
    Forbidden = 403,

    /// 404 Not Found - Archivo inexistente o fuera del sandbox
    NotFound = 404,

    /// 405 Method Not Allowed - Cualquier método que no sea GET o POST
    MethodNotAllowed = 405,

    /// 415 Unsupported Media Type - Extensión o Content-Type no soportados
    UnsupportedMediaType = 415,

    /// 500 Internal Server Error - Falla de I/O al leer o escribir
    InternalServerError = 500,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use resource_server::http::StatusCode;
    /// assert_eq!(StatusCode::Created.as_u16(), 201);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    ///
    /// # Ejemplo
    /// ```
    /// use resource_server::http::StatusCode;
    /// assert_eq!(StatusCode::UnsupportedMediaType.reason_phrase(), "Unsupported Media Type");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::UnsupportedMediaType => "Unsupported Media Type",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    /// Verifica si el código indica éxito (2xx)
    pub fn is_success(&self) -> bool {
        matches!(self, StatusCode::Ok | StatusCode::Created)
    }

    /// Verifica si el código indica error del cliente (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.as_u16())
    }

    /// Verifica si el código indica error del servidor (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
