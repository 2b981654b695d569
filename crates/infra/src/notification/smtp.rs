//! SMTP 通知送信実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! 本番は暗黙 TLS のリレー（Gmail の 465 番など）、開発環境では Mailpit に平文で接続する。

use std::fmt;

use async_trait::async_trait;
use contact_relay_domain::notification::{EmailMessage, NotificationError};
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    message::{Mailbox, Message, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use super::NotificationSender;

/// SMTP 認証情報
#[derive(Clone)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// SMTP 通知送信
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をラップする。
pub struct SmtpNotificationSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotificationSender {
    /// TLS リレーに接続する送信インスタンスを作成
    ///
    /// # 引数
    ///
    /// - `host`: SMTP リレーのホスト名（例: "smtp.gmail.com"）
    /// - `port`: ポート番号（例: 465）
    /// - `credentials`: 送信アカウントとアプリパスワード
    pub fn relay(
        host: &str,
        port: u16,
        credentials: SmtpCredentials,
    ) -> Result<Self, NotificationError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| NotificationError::SendFailed(format!("SMTP リレー設定失敗: {e}")))?
            .port(port)
            .credentials(Credentials::new(
                credentials.username,
                credentials.password,
            ))
            .build();

        Ok(Self { transport })
    }

    /// TLS なしで接続する送信インスタンスを作成（Mailpit 等のローカル SMTP 向け）
    pub fn plain(host: &str, port: u16) -> Self {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(port)
            .build();

        Self { transport }
    }
}

/// EmailMessage を lettre のメッセージに変換する
///
/// 返信先が解釈できない場合は Reply-To を付けずに送る。
fn build_message(email: &EmailMessage) -> Result<Message, NotificationError> {
    let mut builder = Message::builder()
        .from(
            email
                .from
                .parse()
                .map_err(|e| NotificationError::SendFailed(format!("送信元アドレス不正: {e}")))?,
        )
        .to(email
            .to
            .parse()
            .map_err(|e| NotificationError::SendFailed(format!("宛先アドレス不正: {e}")))?)
        .subject(&email.subject);

    match email.reply_to.as_deref().map(str::parse::<Mailbox>) {
        Some(Ok(mailbox)) => builder = builder.reply_to(mailbox),
        Some(Err(e)) => tracing::debug!(error = %e, "返信先アドレスを解釈できないため Reply-To を省略"),
        None => {}
    }

    builder
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(email.text_body.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(email.html_body.clone()),
                ),
        )
        .map_err(|e| NotificationError::SendFailed(format!("メッセージ構築失敗: {e}")))
}

#[async_trait]
impl NotificationSender for SmtpNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        let message = build_message(email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::SendFailed(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn email(reply_to: Option<&str>) -> EmailMessage {
        EmailMessage {
            from:      "\"Portfolio Contact Form\" <portfolio.contact@example.com>".to_string(),
            to:        "owner@example.com".to_string(),
            reply_to:  reply_to.map(str::to_string),
            subject:   "Portfolio Contact: Hi".to_string(),
            html_body: "<p>Hello</p>".to_string(),
            text_body: "Hello".to_string(),
        }
    }

    fn header(message: &Message, name: &str) -> Option<String> {
        let formatted = String::from_utf8(message.formatted()).unwrap();
        formatted
            .lines()
            .find(|line| line.starts_with(&format!("{name}: ")))
            .map(|line| line[name.len() + 2..].to_string())
    }

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SmtpNotificationSender>();
    }

    #[test]
    fn 返信先が問い合わせ者のアドレスになる() {
        let message = build_message(&email(Some("alice@example.com"))).unwrap();

        assert_eq!(header(&message, "Reply-To"), Some("alice@example.com".to_string()));
        assert_eq!(
            header(&message, "Subject"),
            Some("Portfolio Contact: Hi".to_string())
        );
    }

    #[test]
    fn 解釈できない返信先は省略される() {
        let message = build_message(&email(Some("not an address"))).unwrap();

        assert_eq!(header(&message, "Reply-To"), None);
    }

    #[test]
    fn 宛先が不正ならsend_failedになる() {
        let mut email = email(None);
        email.to = "invalid".to_string();

        let result = build_message(&email);

        assert!(matches!(result, Err(NotificationError::SendFailed(_))));
    }

    #[test]
    fn 認証情報のdebug出力はパスワードを伏せる() {
        let credentials = SmtpCredentials {
            username: "portfolio.contact@example.com".to_string(),
            password: "app-password".to_string(),
        };

        let debug = format!("{credentials:?}");

        assert!(!debug.contains("app-password"));
        assert!(debug.contains("[REDACTED]"));
    }
}
