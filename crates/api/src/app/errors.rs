//! Consistent JSON error responses.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use storefront_erp::ErpError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Map upstream errors to user-distinguishable responses: throttling gets
/// its own "high demand" message instead of a generic failure.
pub fn erp_error_to_response(err: ErpError) -> axum::response::Response {
    match err {
        ErpError::RateLimited { .. } => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "high_demand",
            "the catalog is under high demand, please try again shortly",
        ),
        ErpError::Upstream { status, message } => json_error(
            StatusCode::BAD_GATEWAY,
            "upstream_error",
            format!("upstream responded {status}: {message}"),
        ),
        ErpError::Auth(message) => json_error(
            StatusCode::BAD_GATEWAY,
            "upstream_auth",
            format!("upstream authentication failed: {message}"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limits_map_to_high_demand() {
        let response = erp_error_to_response(ErpError::rate_limited("throttled"));
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn other_upstream_failures_map_to_bad_gateway() {
        let response = erp_error_to_response(ErpError::upstream(500, "boom"));
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
