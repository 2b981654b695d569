//! # アプリケーション構築
//!
//! ルーター構築を担当する。`main.rs` はインフラ初期化とサーバー起動に集中する。

use std::sync::Arc;

use axum::{
    Router,
    routing::{any, get, post},
};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handler::{ContactState, health_check, send_contact_email, send_contact_email_http},
    usecase::ContactService,
};

/// Callable RPC のパス
pub const CALLABLE_PATH: &str = "/sendContactEmail";
/// HTTP エンドポイントのパス
pub const HTTP_PATH: &str = "/sendContactEmailHTTP";

/// ルーターを構築する
///
/// CORS はリクエストの Origin をそのまま許可する（任意のオリジンから呼べる）。
pub fn build_app(service: Arc<ContactService>) -> Router {
    let state = Arc::new(ContactState { service });

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    Router::new()
        .route("/health", get(health_check))
        .route(CALLABLE_PATH, post(send_contact_email))
        .route(HTTP_PATH, any(send_contact_email_http))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
