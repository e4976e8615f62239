use crate::assembly::{AssemblyError, ErrorPayload};
use crate::config::ConfigError;
use crate::documents::RegistryError;
use crate::introspect::IntrospectError;
use crate::lint::LintFinding;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Registry(RegistryError),
    Assembly(AssemblyError),
    Introspect(IntrospectError),
    Lint(Vec<LintFinding>),
    /// A blocking render task panicked or was cancelled.
    Worker(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Assembly(err) if err.kind() == "document_not_found" => StatusCode::NOT_FOUND,
            AppError::Assembly(err) if err.is_client_error() => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Registry(_)
            | AppError::Assembly(_)
            | AppError::Introspect(_)
            | AppError::Lint(_)
            | AppError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn payloads(&self) -> Vec<ErrorPayload> {
        match self {
            AppError::Assembly(err) => err.payloads(),
            other => vec![ErrorPayload {
                kind: "internal",
                field: None,
                message: other.to_string(),
            }],
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Registry(err) => write!(f, "registry error: {}", err),
            AppError::Assembly(err) => write!(f, "assembly error: {}", err),
            AppError::Introspect(err) => write!(f, "field introspection error: {}", err),
            AppError::Lint(findings) => {
                write!(f, "catalog lint failed with {} finding(s)", findings.len())
            }
            AppError::Worker(reason) => write!(f, "render worker failed: {}", reason),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Registry(err) => Some(err),
            AppError::Assembly(err) => Some(err),
            AppError::Introspect(err) => Some(err),
            AppError::Lint(_) | AppError::Worker(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "errors": self.payloads() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<RegistryError> for AppError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

impl From<AssemblyError> for AppError {
    fn from(value: AssemblyError) -> Self {
        Self::Assembly(value)
    }
}

impl From<IntrospectError> for AppError {
    fn from(value: IntrospectError) -> Self {
        Self::Introspect(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jurisdiction::{InvalidJurisdiction, ResolveError};
    use crate::render::RenderError;

    #[test]
    fn statuses_follow_the_failing_stage() {
        let not_found = AppError::from(AssemblyError::Resolve(ResolveError::DocumentNotFound(
            "lease-agreement".to_string(),
        )));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let invalid = AppError::from(AssemblyError::from(InvalidJurisdiction("zz".to_string())));
        assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let render = AppError::from(AssemblyError::from(RenderError::EmptyOutput));
        assert_eq!(render.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(render.payloads()[0].kind, "empty_output");
    }

    #[test]
    fn non_assembly_failures_become_internal_payloads() {
        let err = AppError::Worker("task cancelled".to_string());
        let payloads = err.payloads();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].kind, "internal");
        assert_eq!(payloads[0].message, "render worker failed: task cancelled");
    }
}
