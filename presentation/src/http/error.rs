//! HTTP error envelope
//!
//! Every failure leaves the façade as `{"error": {"code", "message", …}}`.
//! Guardrail blocks keep their reason and risk level so clients can show
//! why a query was refused.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use compass_application::RunJuryError;
use compass_domain::RiskLevel;

/// Errors a façade handler can produce
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request (bad format tag, unparsable body fields).
    BadRequest(String),
    /// Input refused by the guardrail filter.
    GuardrailBlocked { reason: String, risk: RiskLevel },
    /// Lifecycle state is not ACTIVE.
    Busy { state: String },
    /// Unknown session or resource.
    NotFound(String),
    /// Anything unexpected inside the pipeline.
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::GuardrailBlocked { .. } => StatusCode::BAD_REQUEST,
            ApiError::Busy { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> serde_json::Value {
        match self {
            ApiError::BadRequest(message) => serde_json::json!({
                "error": {"code": "BAD_REQUEST", "message": message}
            }),
            ApiError::GuardrailBlocked { reason, risk } => serde_json::json!({
                "error": {
                    "code": "GUARDRAIL_BLOCKED",
                    "message": reason,
                    "reason": reason,
                    "riskLevel": risk.as_str(),
                }
            }),
            ApiError::Busy { state } => serde_json::json!({
                "error": {"code": "LIFECYCLE_BUSY", "message": format!("service is not accepting queries (state: {state})")}
            }),
            ApiError::NotFound(message) => serde_json::json!({
                "error": {"code": "NOT_FOUND", "message": message}
            }),
            ApiError::Internal(message) => serde_json::json!({
                "error": {"code": "INTERNAL", "message": message}
            }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

impl From<RunJuryError> for ApiError {
    fn from(error: RunJuryError) -> Self {
        match error {
            RunJuryError::GuardrailBlocked { reason, risk } => {
                ApiError::GuardrailBlocked { reason, risk }
            }
            RunJuryError::NoModels => ApiError::BadRequest("no models configured".to_string()),
            RunJuryError::Internal(message) => ApiError::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guardrail_block_is_400_with_fields() {
        let error = ApiError::GuardrailBlocked {
            reason: "input matches blocked pattern".to_string(),
            risk: RiskLevel::High,
        };
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        let body = error.body();
        assert_eq!(body["error"]["code"], "GUARDRAIL_BLOCKED");
        assert_eq!(body["error"]["riskLevel"], "high");
        assert_eq!(body["error"]["reason"], "input matches blocked pattern");
    }

    #[test]
    fn test_busy_is_503() {
        let error = ApiError::Busy {
            state: "DRAINING".to_string(),
        };
        assert_eq!(error.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(error.body()["error"]["code"], "LIFECYCLE_BUSY");
    }

    #[test]
    fn test_jury_error_conversion() {
        let error: ApiError = RunJuryError::GuardrailBlocked {
            reason: "blocked".to_string(),
            risk: RiskLevel::Medium,
        }
        .into();
        assert!(matches!(error, ApiError::GuardrailBlocked { .. }));

        let error: ApiError = RunJuryError::Internal("boom".to_string()).into();
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
