//! # 通知送信
//!
//! 問い合わせ通知メールの送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `NotificationSender` trait でメール送信を抽象化
//! - **2 つの実装**: SMTP（TLS リレー / Mailpit）、Noop（ローカル確認用）
//! - **環境変数切替**: `NOTIFICATION_BACKEND` でランタイム選択
//! - **リトライしない**: 送信失敗はそのまま呼び出し元に返す

mod noop;
mod smtp;

use async_trait::async_trait;
use contact_relay_domain::notification::{EmailMessage, NotificationError};
pub use noop::NoopNotificationSender;
pub use smtp::{SmtpCredentials, SmtpNotificationSender};

/// メール送信トレイト
///
/// 送信の具体的な方法を抽象化する。SMTP / Noop を環境変数で切り替える。
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// メールを送信する
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError>;
}
