//! # Errors
//!
//! Structured, Feathers-shaped errors for the workspace service.
//! - consistent status codes + class names
//! - carried through `anyhow::Error` so hooks and services can use `?`
//! - transport-agnostic (`ws-axum` decides how to serialize)

use std::fmt;

use anyhow::Error as AnyError;
use serde_json::Value;

/// Error class names + status codes used by the workspace API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,       // 400
    NotFound,         // 404
    MethodNotAllowed, // 405
    Conflict,         // 409
    Unprocessable,    // 422
    GeneralError,     // 500
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::MethodNotAllowed => 405,
            ErrorKind::Conflict => 409,
            ErrorKind::Unprocessable => 422,
            ErrorKind::GeneralError => 500,
        }
    }

    /// Error `name` (e.g. "NotFound")
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::MethodNotAllowed => "MethodNotAllowed",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Unprocessable => "Unprocessable",
            ErrorKind::GeneralError => "GeneralError",
        }
    }

    /// Error `className` (kebab-cased)
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::NotFound => "not-found",
            ErrorKind::MethodNotAllowed => "method-not-allowed",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unprocessable => "unprocessable",
            ErrorKind::GeneralError => "general-error",
        }
    }

    /// Reverse lookup used by clients decoding an error body.
    pub fn from_status(code: u16) -> Option<Self> {
        match code {
            400 => Some(ErrorKind::BadRequest),
            404 => Some(ErrorKind::NotFound),
            405 => Some(ErrorKind::MethodNotAllowed),
            409 => Some(ErrorKind::Conflict),
            422 => Some(ErrorKind::Unprocessable),
            500 => Some(ErrorKind::GeneralError),
            _ => None,
        }
    }
}

/// A structured workspace error that can live inside `anyhow::Error`.
///
/// Fields mirror the JSON payload:
/// - name
/// - message
/// - code (HTTP status)
/// - class_name
/// - errors (optional, per-field messages)
#[derive(Debug)]
pub struct WsError {
    pub kind: ErrorKind,
    pub message: String,
    pub errors: Option<Value>,
    pub source: Option<AnyError>,
}

impl WsError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            errors: None,
            source: None,
        }
    }

    pub fn with_errors(mut self, errors: Value) -> Self {
        self.errors = Some(errors);
        self
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

    /// Convert into `anyhow::Error` so it flows through the hook pipeline.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Find a `WsError` anywhere in an `anyhow` chain.
    pub fn find(err: &AnyError) -> Option<&WsError> {
        err.chain().find_map(|e| e.downcast_ref::<WsError>())
    }

    /// Turn any error into a WsError:
    /// - already a WsError: kept as is
    /// - otherwise wrapped as GeneralError
    pub fn normalize(err: AnyError) -> WsError {
        match err.downcast::<WsError>() {
            Ok(ws) => ws,
            Err(other) => WsError::new(ErrorKind::GeneralError, other.to_string()).with_source(other),
        }
    }

    /// Client-safe copy: drops the inner `source`.
    pub fn sanitize_for_client(&self) -> WsError {
        WsError {
            kind: self.kind,
            message: self.message.clone(),
            errors: self.errors.clone(),
            source: None,
        }
    }

    /// JSON payload: `{name, message, code, className, errors?}`.
    pub fn to_json(&self) -> Value {
        use serde_json::json;

        let mut base = json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });

        if let Some(e) = &self.errors {
            base["errors"] = e.clone();
        }
        base
    }

    // ---- Constructors ----

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn method_not_allowed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unprocessable, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
}

impl fmt::Display for WsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for WsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Bail out of an `anyhow::Result` function with a `WsError`.
#[macro_export]
macro_rules! bail_ws {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::WsError::$ctor($msg).into_anyhow())
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::WsError::$ctor(format!($fmt, $($arg)*)).into_anyhow())
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_keeps_ws_error_through_anyhow() {
        let err = WsError::conflict("taken").into_anyhow();
        let ws = WsError::normalize(err);
        assert_eq!(ws.kind, ErrorKind::Conflict);
        assert_eq!(ws.code(), 409);
    }

    #[test]
    fn normalize_wraps_foreign_errors_as_general() {
        let ws = WsError::normalize(anyhow::anyhow!("boom"));
        assert_eq!(ws.kind, ErrorKind::GeneralError);
        assert!(ws.message.contains("boom"));
    }

    #[test]
    fn find_sees_through_context() {
        let err = WsError::not_found("gone")
            .into_anyhow()
            .context("fetching workspace");
        assert_eq!(WsError::find(&err).map(|e| e.kind), Some(ErrorKind::NotFound));
    }

    #[test]
    fn json_shape_includes_errors_only_when_set() {
        let plain = WsError::not_found("x").to_json();
        assert!(plain.get("errors").is_none());

        let body = WsError::unprocessable("bad")
            .with_errors(json!({"name": ["Name is required. Enter a name."]}))
            .to_json();
        assert_eq!(body["className"], "unprocessable");
        assert_eq!(body["code"], 422);
        assert_eq!(body["errors"]["name"][0], "Name is required. Enter a name.");
    }
}
