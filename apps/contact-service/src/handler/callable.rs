//! # Callable RPC ハンドラ
//!
//! ## エンドポイント
//!
//! ```text
//! POST /sendContactEmail
//! ```
//!
//! ## ワイヤー形式
//!
//! リクエスト:
//!
//! ```json
//! { "data": { "name": "...", "email": "...", "subject": "...", "message": "..." } }
//! ```
//!
//! 成功時は `200 {"result": {...}}`、失敗時は
//! `{"error": {"status": "INVALID_ARGUMENT" | "INTERNAL", "message": "..."}}`
//! を 400 / 500 で返す。`userAgent` はペイロードの値を使う。

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use contact_relay_domain::contact::{ServerContext, SubmissionInput};
use contact_relay_shared::event_log::event;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ClientInfo, ContactState, SendContactEmailResponse};
use crate::{error::FailureKind, usecase::CallResult};

#[derive(Debug, Default, Deserialize)]
struct CallableRequest {
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Serialize)]
struct CallableSuccess {
    result: SendContactEmailResponse,
}

#[derive(Debug, Serialize)]
struct CallableFailure {
    error: CallableError,
}

#[derive(Debug, Serialize)]
struct CallableError {
    status:  &'static str,
    message: String,
}

impl FailureKind {
    /// Callable プロトコルのステータス表記
    fn callable_status(self) -> (StatusCode, &'static str) {
        match self {
            Self::InvalidArgument => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
            Self::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        }
    }
}

/// Callable レスポンスへの変換
fn into_callable_response(result: CallResult) -> Response {
    match result {
        CallResult::Success { message_id } => (
            StatusCode::OK,
            Json(CallableSuccess {
                result: SendContactEmailResponse::new(message_id.as_str().to_string()),
            }),
        )
            .into_response(),
        CallResult::Failure { kind, message } => {
            let (status_code, status) = kind.callable_status();
            (
                status_code,
                Json(CallableFailure {
                    error: CallableError { status, message },
                }),
            )
                .into_response()
        }
    }
}

/// 問い合わせを受け付ける（Callable RPC）
///
/// JSON として解釈できないボディは空の入力として扱う（結果は INVALID_ARGUMENT）。
#[tracing::instrument(skip_all)]
pub async fn send_contact_email(
    State(state): State<Arc<ContactState>>,
    client: ClientInfo,
    body: Bytes,
) -> Response {
    let request: CallableRequest = serde_json::from_slice(&body).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Callable リクエストを解釈できないため空の入力として扱う");
        CallableRequest::default()
    });
    let input = SubmissionInput::from_value(request.data);
    let context = ServerContext::callable(client.ip_address);

    let result = state
        .service
        .submit(&input, &context, event::origin::CALLABLE)
        .await;

    into_callable_response(CallResult::from(result))
}
