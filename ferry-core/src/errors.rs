//! # Errors
//!
//! Structured, HTTP-aware errors:
//! - consistent status codes + class names
//! - can be carried through `anyhow::Error`
//! - transport-agnostic (the server crate decides how to serialize)
//!
//! With feature `serde`, [`FerryError::to_json`] renders the client payload.

use std::fmt;

use anyhow::Error as AnyError;

/// A convenience result type for Ferry APIs that flow through `anyhow`.
pub type FerryResult<T> = std::result::Result<T, AnyError>;

/// Error class names + status codes surfaced by the delivery service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,          // 400
    NotFound,            // 404
    RangeNotSatisfiable, // 416
    GeneralError,        // 500
    Unavailable,         // 503
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::RangeNotSatisfiable => 416,
            ErrorKind::GeneralError => 500,
            ErrorKind::Unavailable => 503,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::RangeNotSatisfiable => "RangeNotSatisfiable",
            ErrorKind::GeneralError => "GeneralError",
            ErrorKind::Unavailable => "Unavailable",
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::NotFound => "not-found",
            ErrorKind::RangeNotSatisfiable => "range-not-satisfiable",
            ErrorKind::GeneralError => "general-error",
            ErrorKind::Unavailable => "unavailable",
        }
    }
}

/// A structured error that can live inside `anyhow::Error`.
#[derive(Debug)]
pub struct FerryError {
    pub kind: ErrorKind,
    pub message: String,
    pub source: Option<AnyError>,
}

impl FerryError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Turn any error into a FerryError:
    /// - if it's already a FerryError, keep it (lossless)
    /// - otherwise wrap as GeneralError
    pub fn normalize(err: AnyError) -> FerryError {
        match err.downcast::<FerryError>() {
            Ok(ferry) => ferry,
            Err(other) => {
                FerryError::new(ErrorKind::GeneralError, other.to_string()).with_source(other)
            }
        }
    }

    /// Copy without the inner `source`, safe to hand to clients.
    pub fn sanitize_for_client(&self) -> FerryError {
        FerryError {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn range_not_satisfiable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::RangeNotSatisfiable, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, msg)
    }
}

impl fmt::Display for FerryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for FerryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(feature = "serde")]
impl FerryError {
    /// JSON payload for HTTP error bodies.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        })
    }
}
