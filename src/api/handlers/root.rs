use axum::response::IntoResponse;

/// Undocumented root route; public landing for both session states.
pub async fn root() -> impl IntoResponse {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}
