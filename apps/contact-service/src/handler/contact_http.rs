//! # HTTP エンドポイント
//!
//! ## エンドポイント
//!
//! ```text
//! POST /sendContactEmailHTTP
//! ```
//!
//! | ステータス | ボディ | 条件 |
//! |-----------|-------|------|
//! | 200 | `{success, messageId, message}` | 送信成功 |
//! | 400 | `{error: "Missing required fields"}` | 必須項目の欠落 |
//! | 405 | `{error: "Method not allowed"}` | POST 以外 |
//! | 500 | `{error: "Failed to send email: ..."}` | 保存・送信の失敗 |
//!
//! `userAgent` はペイロードではなく `User-Agent` ヘッダーから取る。
//! CORS はルーター側の `CorsLayer` が処理する。

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use contact_relay_domain::contact::{ServerContext, SubmissionInput};
use contact_relay_shared::event_log::event;
use serde::Serialize;
use serde_json::Value;

use super::{ClientInfo, ContactState, SendContactEmailResponse};
use crate::{error::FailureKind, usecase::CallResult};

const METHOD_NOT_ALLOWED: &str = "Method not allowed";

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: error.into(),
        }),
    )
        .into_response()
}

/// HTTP レスポンスへの変換
fn into_http_response(result: CallResult) -> Response {
    match result {
        CallResult::Success { message_id } => (
            StatusCode::OK,
            Json(SendContactEmailResponse::new(message_id.as_str().to_string())),
        )
            .into_response(),
        CallResult::Failure {
            kind: FailureKind::InvalidArgument,
            message,
        } => error_response(StatusCode::BAD_REQUEST, message),
        CallResult::Failure {
            kind: FailureKind::Internal,
            message,
        } => error_response(StatusCode::INTERNAL_SERVER_ERROR, message),
    }
}

/// 問い合わせを受け付ける（HTTP エンドポイント）
///
/// 全メソッドをこのハンドラに振り、POST 以外は 405 を返す。
/// JSON オブジェクトとして解釈できないボディは空の入力として扱う（結果は 400）。
#[tracing::instrument(skip_all, fields(%method))]
pub async fn send_contact_email_http(
    method: Method,
    State(state): State<Arc<ContactState>>,
    client: ClientInfo,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return error_response(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED);
    }

    let payload = serde_json::from_slice::<Value>(&body).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "リクエストボディを解釈できないため空の入力として扱う");
        Value::Null
    });
    let input = SubmissionInput::from_value(payload);
    let context = ServerContext::http(client.ip_address, client.user_agent);

    let result = state
        .service
        .submit(&input, &context, event::origin::HTTP)
        .await;

    into_http_response(CallResult::from(result))
}
