use axum::Json;
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct ClientLogBody {
    #[serde(default)]
    pub msg: String,
}

/// `POST /api/client-log`: lets browsers without a usable console report
/// into the server log.
pub async fn client_log_handler(Json(body): Json<ClientLogBody>) -> StatusCode {
    info!(target: "client_log", "[client-http-log] {}", body.msg);
    StatusCode::NO_CONTENT
}
