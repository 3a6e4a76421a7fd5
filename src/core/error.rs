//! Typed error handling for coursehub
//!
//! # Error Categories
//!
//! - [`DependencyResolutionError`]: a data-access failure while cascading
//! - [`ValidationError`]: malformed identifiers, ids lists or entity names
//! - [`ConfigError`]: configuration parsing and validation
//! - [`RequestError`]: request-level problems (missing actor identity)
//! - [`StorageError`]: backend connection problems outside a cascade
//!
//! [`AppError`] wraps them all and renders the uniform response envelope
//! `{status, message, data: null}` with the matching HTTP status.
//!
//! # Example
//!
//! ```rust,ignore
//! match resolver.delete(EntityType::Course, &filter).await {
//!     Ok(summary) => println!("affected: {:?}", summary),
//!     Err(err) => eprintln!("cascade stopped at {}: {}", err.step, err.message),
//! }
//! ```

use crate::cascade::CascadeMode;
use crate::core::entity::EntityType;
use crate::core::response::ApiResponse;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;

/// The main error type for coursehub
#[derive(Debug)]
pub enum AppError {
    /// A cascade failed part-way
    Resolution(DependencyResolutionError),

    /// Validation errors
    Validation(ValidationError),

    /// Configuration errors
    Config(ConfigError),

    /// HTTP/Request errors
    Request(RequestError),

    /// Storage backend errors
    Storage(StorageError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Resolution(e) => write!(f, "{}", e),
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Request(e) => write!(f, "{}", e),
            AppError::Storage(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Resolution(e) => Some(e),
            AppError::Validation(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Request(e) => Some(e),
            AppError::Storage(e) => Some(e),
            AppError::Internal(_) => None,
        }
    }
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Resolution(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(e) => e.status_code(),
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Request(e) => e.status_code(),
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Envelope `status` string for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Resolution(_) => "FAILURE",
            AppError::Validation(e) => e.error_code(),
            AppError::Config(_) => "FAILURE",
            AppError::Request(e) => e.error_code(),
            AppError::Storage(_) => "FAILURE",
            AppError::Internal(_) => "FAILURE",
        }
    }

    /// Message shown to the caller
    ///
    /// Resolution failures surface the underlying cause only, the same
    /// message the data-access layer produced.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Resolution(e) => e.message.clone(),
            other => other.to_string(),
        }
    }

    /// Convert to an envelope
    pub fn to_response(&self) -> ApiResponse<serde_json::Value> {
        ApiResponse {
            status: self.error_code().to_string(),
            message: self.client_message(),
            data: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self.status_code(), StatusCode::INTERNAL_SERVER_ERROR) {
            tracing::warn!(error = %self, "request failed");
        }
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Dependency resolution errors
// =============================================================================

/// A data-access failure during a cascade
///
/// Steps that ran before the failing one stay applied: cascades are not
/// atomic. The caller only learns that the operation as a whole did not
/// complete.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Failed to {mode} {root} cascade at step '{step}': {message}")]
pub struct DependencyResolutionError {
    /// Root type of the cascade
    pub root: EntityType,
    /// Mode the cascade was running in
    pub mode: CascadeMode,
    /// Entity type whose data-access call failed
    pub step: EntityType,
    /// Underlying cause
    pub message: String,
}

impl DependencyResolutionError {
    pub fn new(
        root: EntityType,
        mode: CascadeMode,
        step: EntityType,
        cause: impl fmt::Display,
    ) -> Self {
        Self {
            root,
            mode,
            step,
            message: cause.to_string(),
        }
    }
}

impl From<DependencyResolutionError> for AppError {
    fn from(err: DependencyResolutionError) -> Self {
        AppError::Resolution(err)
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug)]
pub enum ValidationError {
    /// Identifier is not a valid document id
    InvalidId { value: String },

    /// A list of ids was required but missing or empty
    EmptyIds,

    /// Entity name not known to the backend
    UnknownEntityType { name: String },

    /// Invalid JSON format
    InvalidJson { message: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidId { value } => {
                write!(f, "invalid objectId: '{}'", value)
            }
            ValidationError::EmptyIds => {
                write!(f, "Insufficient request parameters! ids is required.")
            }
            ValidationError::UnknownEntityType { name } => {
                write!(f, "Unknown entity type: {}", name)
            }
            ValidationError::InvalidJson { message } => {
                write!(f, "Invalid JSON: {}", message)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ValidationError::InvalidId { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ValidationError::EmptyIds => StatusCode::BAD_REQUEST,
            ValidationError::UnknownEntityType { .. } => StatusCode::BAD_REQUEST,
            ValidationError::InvalidJson { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::InvalidId { .. } => "VALIDATION_ERROR",
            ValidationError::EmptyIds => "BAD_REQUEST",
            ValidationError::UnknownEntityType { .. } => "BAD_REQUEST",
            ValidationError::InvalidJson { .. } => "BAD_REQUEST",
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// IO error while reading configuration
    IoError { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::InvalidValue {
                field,
                value,
                message,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, message
                )
            }
            ConfigError::IoError { message } => {
                write!(f, "IO error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to HTTP requests
#[derive(Debug)]
pub enum RequestError {
    /// The upstream auth layer did not provide an actor identity
    MissingActor { header: String },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::MissingActor { header } => {
                write!(f, "Unauthorized: missing '{}' header", header)
            }
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::MissingActor { .. } => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::MissingActor { .. } => "UNAUTHORIZED",
        }
    }
}

impl From<RequestError> for AppError {
    fn from(err: RequestError) -> Self {
        AppError::Request(err)
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to storage backends
#[derive(Debug)]
pub enum StorageError {
    /// Connection error
    ConnectionError { backend: String, message: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConnectionError { backend, message } => {
                write!(f, "Failed to connect to {}: {}", backend, message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(ValidationError::InvalidJson {
            message: err.to_string(),
        })
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// A specialized Result type for coursehub operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn resolution_error() -> DependencyResolutionError {
        DependencyResolutionError::new(
            EntityType::Course,
            CascadeMode::Delete,
            EntityType::Instructor,
            "connection reset",
        )
    }

    #[test]
    fn test_resolution_error_display() {
        let err = resolution_error();
        let display = err.to_string();
        assert!(display.contains("delete"));
        assert!(display.contains("course"));
        assert!(display.contains("instructor"));
        assert!(display.contains("connection reset"));
    }

    #[test]
    fn test_resolution_error_maps_to_failure() {
        let err: AppError = resolution_error().into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "FAILURE");

        let response = err.to_response();
        assert_eq!(response.message, "connection reset");
        assert!(response.data.is_none());
    }

    #[test]
    fn test_validation_error_status_codes() {
        let err = ValidationError::InvalidId {
            value: "xyz".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        assert_eq!(ValidationError::EmptyIds.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_missing_actor_is_unauthorized() {
        let err: AppError = RequestError::MissingActor {
            header: "x-user-id".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.error_code(), "UNAUTHORIZED");
    }

    #[test]
    fn test_config_error_from_yaml() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("a: [").unwrap_err();
        let err: ConfigError = yaml_err.into();
        assert!(matches!(err, ConfigError::ParseError { file: None, .. }));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: AppError = json_err.into();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::InvalidJson { .. })
        ));
    }
}
