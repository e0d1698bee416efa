use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ferry_blob::StorageError;
use ferry_core::errors::FerryError;
use tracing::error;

#[derive(Debug)]
pub struct FerryAxumError(pub anyhow::Error);

impl From<anyhow::Error> for FerryAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<FerryError> for FerryAxumError {
    fn from(e: FerryError) -> Self {
        Self(e.into_anyhow())
    }
}

impl From<StorageError> for FerryAxumError {
    fn from(e: StorageError) -> Self {
        let ferry = match &e {
            StorageError::Invalid { message } => FerryError::bad_request(message.clone()),
            _ => FerryError::general_error("Storage backend error"),
        };
        ferry.with_source(anyhow::Error::new(e)).into()
    }
}

impl IntoResponse for FerryAxumError {
    fn into_response(self) -> Response {
        let ferry = match self.0.chain().find_map(|e| e.downcast_ref::<FerryError>()) {
            Some(ferry) => ferry.sanitize_for_client(),
            None => FerryError::general_error(self.0.to_string()),
        };

        let status = StatusCode::from_u16(ferry.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            // the full chain stays in the log, the client only sees the message
            error!(error = ?self.0, "request failed");
        }
        (status, Json(ferry.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_map_to_statuses() {
        let res = FerryAxumError::from(StorageError::invalid("bad key")).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let io = std::io::Error::other("connection reset");
        let res = FerryAxumError::from(StorageError::backend(io)).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
