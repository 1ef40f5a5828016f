//! Translation of gateway errors into HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::GatewayError;

/// Error returned by every handler
///
/// Wraps the `anyhow::Error` produced by the lower layers; the typed
/// `GatewayError` inside (if any) decides the status code.
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    /// Status code and `detail` text this error maps to
    pub fn status_and_detail(&self) -> (StatusCode, String) {
        match self.0.downcast_ref::<GatewayError>() {
            Some(GatewayError::Upstream { status, body }) => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                body.clone(),
            ),
            Some(GatewayError::NotFound) => {
                (StatusCode::NOT_FOUND, GatewayError::NotFound.to_string())
            }
            Some(err @ (GatewayError::InvalidId(_) | GatewayError::InvalidBody(_))) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Some(err @ GatewayError::UpstreamUnavailable(_)) => {
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", self.0)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = self.status_and_detail();

        if status.is_server_error() {
            tracing::error!("Request failed with {}: {}", status, detail);
        } else {
            tracing::debug!("Request rejected with {}: {}", status, detail);
        }

        let body = serde_json::json!({
            "detail": detail
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_and_body_pass_through() {
        let err = ApiError::from(GatewayError::Upstream {
            status: 500,
            body: "model not found".to_string(),
        });
        let (status, detail) = err.status_and_detail();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(detail, "model not found");
    }

    #[test]
    fn test_upstream_client_error_keeps_status() {
        let err = ApiError::from(GatewayError::Upstream {
            status: 404,
            body: "{\"error\":\"model 'x' not found\"}".to_string(),
        });
        let (status, detail) = err.status_and_detail();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(detail, "{\"error\":\"model 'x' not found\"}");
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let (status, detail) = ApiError::from(GatewayError::NotFound).status_and_detail();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(detail, "conversation not found");
    }

    #[test]
    fn test_invalid_id_maps_to_400() {
        let (status, _) =
            ApiError::from(GatewayError::InvalidId("a/b".to_string())).status_and_detail();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invalid_body_maps_to_400() {
        let (status, detail) =
            ApiError::from(GatewayError::InvalidBody("EOF while parsing".to_string()))
                .status_and_detail();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(detail, "Invalid request body: EOF while parsing");
    }

    #[test]
    fn test_unreachable_upstream_maps_to_502() {
        let (status, _) = ApiError::from(GatewayError::UpstreamUnavailable(
            "connection refused".to_string(),
        ))
        .status_and_detail();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_untyped_error_maps_to_500() {
        let (status, detail) = ApiError::from(anyhow::anyhow!("disk full")).status_and_detail();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(detail, "disk full");
    }
}
