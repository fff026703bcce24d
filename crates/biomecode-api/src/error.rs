use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use biomecode_core::error::BiomeError;
use serde::Serialize;

/// Unified API error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into(), details: None }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: message.into(), details: None }
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_GATEWAY, message: message.into(), details: None }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self { status: StatusCode::SERVICE_UNAVAILABLE, message: message.into(), details: None }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: message.into(), details: None }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = self.status.as_u16(),
                error = %self.message,
                details = self.details.as_deref().unwrap_or(""),
                "Request failed"
            );
        }

        let body = ErrorBody { error: self.message, details: self.details };
        (self.status, Json(body)).into_response()
    }
}

impl From<BiomeError> for ApiError {
    fn from(err: BiomeError) -> Self {
        match &err {
            BiomeError::MalformedInput { reason } => {
                Self::bad_request("Invalid request").with_details(reason)
            }
            BiomeError::NoData { reason } => Self::not_found("No data").with_details(reason),
            BiomeError::RemoteEvaluation { status, message } => {
                Self::bad_gateway("Earth Engine evaluation failed")
                    .with_details(format!("{}: {}", status, message))
            }
            BiomeError::Authentication { .. } => Self::bad_gateway(
                "Earth Engine authentication failed",
            )
            .with_details(err.to_string()),
            BiomeError::RemoteUnavailable { .. } => {
                Self::service_unavailable("Earth Engine unavailable").with_details(err.to_string())
            }
            _ => Self::internal("Internal error").with_details(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("Invalid JSON body").with_details(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (BiomeError::malformed("bad geom"), StatusCode::BAD_REQUEST),
            (BiomeError::no_data("empty"), StatusCode::NOT_FOUND),
            (
                BiomeError::RemoteEvaluation {
                    status: "INVALID_ARGUMENT".into(),
                    message: "boom".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (BiomeError::Authentication { reason: "expired".into() }, StatusCode::BAD_GATEWAY),
            (
                BiomeError::RemoteUnavailable { reason: "timeout".into() },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (BiomeError::Serialization("oops".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_remote_message_kept_in_details() {
        let err = ApiError::from(BiomeError::RemoteEvaluation {
            status: "INVALID_ARGUMENT".into(),
            message: "Image.clip: Parameter 'input' is required.".into(),
        });
        assert_eq!(
            err.details.as_deref(),
            Some("INVALID_ARGUMENT: Image.clip: Parameter 'input' is required.")
        );
    }
}
