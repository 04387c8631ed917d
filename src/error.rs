// src/error.rs - Client error type shared by the REST client and the stores

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    Configuration {
        key: Option<String>,
        validation_errors: Vec<String>,
    },
    Manager {
        manager_name: String,
        operation: ManagerOperation,
    },
    Platform {
        platform: String,
        feature: String,
    },
    /// The server answered with a non-2xx status.
    Network {
        status_code: Option<u16>,
        endpoint: Option<String>,
    },
    Validation {
        field: Option<String>,
        rules: Vec<String>,
    },
    /// No usable credentials; raised before any request leaves the client.
    Authentication {
        reason: String,
    },
    Authorization {
        resource: String,
        action: String,
        user_id: Option<i64>,
    },
    Application,
    Io,
    Serialization,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManagerOperation {
    Initialize,
    Shutdown,
    Operation(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Error {
    pub id: Uuid,
    pub kind: ErrorKind,
    pub message: String,
    pub severity: ErrorSeverity,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub causes: Vec<String>,
}

impl Error {
    /// Creates a new error with the specified kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            severity: ErrorSeverity::Medium,
            source: "unknown".to_string(),
            timestamp: crate::utils::Time::now(),
            causes: Vec::new(),
        }
    }

    /// Sets the error severity
    pub fn severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets the error source
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Adds a cause to the error chain
    pub fn caused_by(mut self, cause: impl fmt::Display) -> Self {
        self.causes.push(cause.to_string());
        self
    }

    /// The text shown to the user in a store's `error` field.
    pub fn user_message(&self) -> String {
        self.message.clone()
    }

    pub fn is_not_authenticated(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication { .. })
    }

    pub fn status_code(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Network { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// Creates a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Configuration {
                key: None,
                validation_errors: Vec::new(),
            },
            message,
        )
        .severity(ErrorSeverity::High)
    }

    /// Creates a manager operation error
    pub fn manager(
        manager_name: impl Into<String>,
        operation: ManagerOperation,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorKind::Manager {
                manager_name: manager_name.into(),
                operation,
            },
            message,
        )
        .severity(ErrorSeverity::High)
    }

    /// Creates a platform-specific error
    pub fn platform(
        platform: impl Into<String>,
        feature: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorKind::Platform {
                platform: platform.into(),
                feature: feature.into(),
            },
            message,
        )
    }

    /// Creates an HTTP status error for `endpoint`
    pub fn http(status_code: u16, endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Network {
                status_code: Some(status_code),
                endpoint: Some(endpoint.into()),
            },
            message,
        )
    }

    /// Creates a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let msg = message.into();
        Self::new(
            ErrorKind::Validation {
                field: Some(field.into()),
                rules: vec![msg.clone()],
            },
            msg,
        )
        .severity(ErrorSeverity::Low)
    }

    /// Creates an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        let msg = message.into();
        Self::new(
            ErrorKind::Authentication {
                reason: msg.clone(),
            },
            msg,
        )
        .severity(ErrorSeverity::High)
    }

    /// The error every authenticated operation fails with when no token is held.
    pub fn not_authenticated() -> Self {
        Self::authentication("Not authenticated: token not found, please log in")
    }

    /// Creates an authorization error
    pub fn authorization(
        resource: impl Into<String>,
        action: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorKind::Authorization {
                resource: resource.into(),
                action: action.into(),
                user_id: None,
            },
            message,
        )
        .severity(ErrorSeverity::High)
    }

    /// Creates a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.severity, self.source, self.id, self.message
        )
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let mut error = Error::new(ErrorKind::Io, err.to_string());
        error.source = "std::io::Error".to_string();
        error.severity = ErrorSeverity::High;
        error
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(format!("Malformed JSON payload: {}", err)).source("serde_json")
    }
}

/// Extension trait for Results to add context
pub trait ResultExt<T> {
    /// Adds context to an error
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Sets the error source
    fn with_source(self, source: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| Error::new(ErrorKind::Application, f()).caused_by(e))
    }

    fn with_source(self, source: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            Error::new(ErrorKind::Application, e.to_string())
                .source(source)
                .caused_by(e)
        })
    }
}
