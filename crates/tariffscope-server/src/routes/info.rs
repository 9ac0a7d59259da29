//! Health and server info routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(get_health))
        .route("/server-info", get(get_server_info))
}

/// GET /api/health — liveness plus cache occupancy.
async fn get_health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "tariffscope",
        "cachedRuns": state.cache.len(),
    }))
}

/// GET /api/server-info — network info.
async fn get_server_info(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let ip = local_ip();
    let port = state.config.port;

    Json(serde_json::json!({
        "ip": ip,
        "port": port,
        "url": format!("http://{}:{}", ip, port),
        "noticeApi": state.config.notice_api_base_url,
        "investigationFeed": state.config.investigation_feed_base_url,
        "platform": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
    }))
}

fn local_ip() -> String {
    // Learn the outbound interface address without sending anything
    use std::net::UdpSocket;
    UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("8.8.8.8:80")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|_| "127.0.0.1".to_string())
}
