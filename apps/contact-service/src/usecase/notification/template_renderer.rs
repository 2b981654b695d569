//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで問い合わせ通知メールを HTML/plaintext 両形式で生成する。
//!
//! ## 設計方針
//!
//! - **`include_str!` によるコンパイル時埋め込み**: テンプレートはバイナリに埋め込まれる
//! - **起動時に登録**: テンプレートの構文エラーは起動時に失敗させ、リクエスト単位では起きない
//! - **件名パターン**: `Portfolio Contact: {subject}`
//! - **純粋関数**: 同じレコードからは常に同じ本文を生成する（フッターもレコードの
//!   `timestamp` を使い、レンダリング時刻は含めない）

use contact_relay_domain::{
    contact::ContactSubmission,
    notification::{EmailMessage, NotificationError},
};
use tera::{Context, Tera};

const HTML_TEMPLATE: &str = "contact_submission.html";
const TEXT_TEMPLATE: &str = "contact_submission.txt";

/// 件名の接頭辞
pub const SUBJECT_PREFIX: &str = "Portfolio Contact: ";

/// 送信元・送信先の組
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// 送信元（`"Portfolio Contact Form" <account>` 形式）
    pub from: String,
    /// サイトオーナーの受信箱
    pub to:   String,
}

impl Envelope {
    /// 送信アカウントと受信箱から組み立てる
    pub fn new(account: &str, recipient: impl Into<String>) -> Self {
        Self {
            from: format!("\"Portfolio Contact Form\" <{account}>"),
            to:   recipient.into(),
        }
    }
}

/// テンプレートレンダラー
///
/// tera テンプレートエンジンをラップし、`ContactSubmission` から
/// `EmailMessage` を生成する。
pub struct TemplateRenderer {
    engine: Tera,
}

impl TemplateRenderer {
    /// 新しいレンダラーインスタンスを作成
    ///
    /// `include_str!` で埋め込んだテンプレートを tera に登録する。
    pub fn new() -> Result<Self, NotificationError> {
        let mut engine = Tera::default();

        engine
            .add_raw_templates(vec![
                (
                    HTML_TEMPLATE,
                    include_str!("../../../templates/notifications/contact_submission.html"),
                ),
                (
                    TEXT_TEMPLATE,
                    include_str!("../../../templates/notifications/contact_submission.txt"),
                ),
            ])
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(Self { engine })
    }

    /// 問い合わせレコードから通知メールを生成する
    ///
    /// 返信先は問い合わせ者のアドレスにする。
    pub fn render(
        &self,
        submission: &ContactSubmission,
        envelope: &Envelope,
    ) -> Result<EmailMessage, NotificationError> {
        let context = build_context(submission)?;

        let html_body = self
            .engine
            .render(HTML_TEMPLATE, &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        let text_body = self
            .engine
            .render(TEXT_TEMPLATE, &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(EmailMessage {
            from: envelope.from.clone(),
            to: envelope.to.clone(),
            reply_to: Some(submission.email().to_string()),
            subject: format!("{SUBJECT_PREFIX}{}", submission.subject()),
            html_body,
            text_body,
        })
    }
}

/// テンプレートに渡すコンテキストを構築する
fn build_context(submission: &ContactSubmission) -> Result<Context, NotificationError> {
    let device_info_json = serde_json::to_string_pretty(&submission.device_info())
        .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;
    let record_json = serde_json::to_string_pretty(submission)
        .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

    let mut context = Context::new();
    context.insert("name", submission.name());
    context.insert("email", submission.email());
    context.insert("subject", submission.subject());
    context.insert("message", submission.message());
    context.insert("platform", submission.platform());
    context.insert("message_id", submission.message_id().as_str());
    context.insert("timestamp", submission.timestamp());
    context.insert("ip_address", submission.ip_address());
    context.insert("device_info_json", &device_info_json);
    context.insert("record_json", &record_json);

    Ok(context)
}
