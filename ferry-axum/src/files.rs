use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
    routing, Router,
};
use ferry_core::FerryError;
use tracing::debug;

use crate::{DeliveryParams, FerryAxumError, FerryAxumState};

/// `GET /u/{id}`: look the identifier up, falling back to it as a raw key.
pub async fn serve_upload(
    State(state): State<FerryAxumState>,
    Path(id): Path<String>,
    Query(params): Query<DeliveryParams>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, FerryAxumError> {
    let object = state.resolver.resolve(&id).await.map_err(|e| {
        FerryError::unavailable("Metadata lookup failed").with_source(e)
    })?;
    if object.is_none() {
        debug!(id = %id, "no metadata record, serving as raw key");
    }

    let request = params.into_request(&id, &headers).with_object(object);
    Ok(state.delivery.deliver(request).await?)
}

/// `GET /r/{id}`: serve the identifier as a datasource key.
pub async fn serve_raw(
    State(state): State<FerryAxumState>,
    Path(id): Path<String>,
    Query(params): Query<DeliveryParams>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, FerryAxumError> {
    let request = params.into_request(&id, &headers);
    Ok(state.delivery.deliver(request).await?)
}

pub fn router(state: FerryAxumState) -> Router<()> {
    Router::new()
        .route("/u/{id}", routing::get(serve_upload))
        .route("/r/{id}", routing::get(serve_raw))
        .with_state(state)
}
