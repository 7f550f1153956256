use crate::error::LedgerError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

impl LedgerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. }
            | Self::InsufficientFunds { .. }
            | Self::InvalidStateTransition { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        let mut body = json!({ "kind": self.kind(), "message": self.to_string() });
        let detail = match self {
            Self::Validation { fields, .. } => json!({ "fields": fields }),
            Self::InsufficientFunds {
                requested,
                withdrawable,
            } => json!({ "requested": requested, "withdrawable": withdrawable }),
            Self::InvalidStateTransition {
                payout_id, status, ..
            } => json!({ "payout_id": payout_id, "status": status }),
            Self::NotFound { entity, id } => json!({ "entity": entity, "id": id }),
            Self::Forbidden { required } => json!({ "required": required }),
            _ => return body,
        };
        if let (Some(body), Value::Object(detail)) = (body.as_object_mut(), detail) {
            body.extend(detail);
        }
        body
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if !status.is_server_error() {
            return (status, Json(self.body())).into_response();
        }

        tracing::error!(error = %self, kind = self.kind(), "request failed");
        let body = json!({ "kind": self.kind(), "message": "internal server error" });
        (status, Json(body)).into_response()
    }
}
