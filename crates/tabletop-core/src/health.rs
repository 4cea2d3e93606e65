use axum::http::StatusCode;

/// Liveness check for `GET /healthz`.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Map a readiness check result (e.g. a database ping) to a status code.
pub fn readiness<E: std::fmt::Display>(check: Result<(), E>) -> StatusCode {
    match check {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
