//! # HTTP ハンドラ
//!
//! - `callable`: Callable RPC（`POST /sendContactEmail`）
//! - `contact_http`: HTTP エンドポイント（`/sendContactEmailHTTP`）
//! - `health`: ヘルスチェック
//!
//! どちらの受付経路も [`ContactService::submit`] を呼び、結果の
//! [`CallResult`](crate::usecase::CallResult) をそれぞれのレスポンス形式に変換するだけ。

mod callable;
mod client_info;
mod contact_http;
mod health;

use std::sync::Arc;

pub use callable::send_contact_email;
pub use client_info::ClientInfo;
pub use contact_http::send_contact_email_http;
pub use health::health_check;
use serde::Serialize;

use crate::usecase::{ContactService, contact::SUCCESS_MESSAGE};

/// 受付ハンドラの共有状態
pub struct ContactState {
    pub service: Arc<ContactService>,
}

/// 受付成功時のレスポンスボディ
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendContactEmailResponse {
    pub success:    bool,
    pub message_id: String,
    pub message:    &'static str,
}

impl SendContactEmailResponse {
    fn new(message_id: String) -> Self {
        Self {
            success: true,
            message_id,
            message: SUCCESS_MESSAGE,
        }
    }
}
