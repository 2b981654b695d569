//! # 通知
//!
//! 問い合わせ通知メールのドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **レンダリングと送信の分離**: [`EmailMessage`] はテンプレートレンダラーの出力で、
//!   送信実装（`NotificationSender`）はこれを受け取るだけ
//! - **HTML とプレーンテキストの両形式**: HTML を表示できないメールクライアント向けに
//!   同等の情報をテキストでも持つ

use thiserror::Error;

/// 通知送信エラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// メール送信に失敗（認証失敗、ネットワーク障害、宛先拒否など）
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),

    /// テンプレートレンダリングに失敗
    #[error("テンプレートレンダリングに失敗: {0}")]
    TemplateFailed(String),
}

/// メールメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// 送信元（`"表示名" <address>` 形式を許容）
    pub from:      String,
    /// 送信先メールアドレス
    pub to:        String,
    /// 返信先（問い合わせ者のアドレス）
    pub reply_to:  Option<String>,
    /// 件名
    pub subject:   String,
    /// HTML 本文
    pub html_body: String,
    /// プレーンテキスト本文
    pub text_body: String,
}
