use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ws_core::errors::WsError;

#[derive(Debug)]
pub struct WsAxumError(pub anyhow::Error);

impl From<anyhow::Error> for WsAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<WsError> for WsAxumError {
    fn from(e: WsError) -> Self {
        Self(e.into_anyhow())
    }
}

impl IntoResponse for WsAxumError {
    fn into_response(self) -> Response {
        // A WsError anywhere in the chain keeps its status and fields
        let safe = match WsError::find(&self.0) {
            Some(ws) => ws.sanitize_for_client(),
            None => {
                tracing::error!(error = %self.0, "unhandled error in workspace route");
                WsError::normalize(self.0).sanitize_for_client()
            }
        };

        let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}
