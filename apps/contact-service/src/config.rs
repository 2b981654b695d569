//! # Contact Service 設定
//!
//! 環境変数から Contact Service の設定を読み込む。起動時に一度だけ読み、
//! 以降は参照で受け渡す。

use std::{env, fmt};

use thiserror::Error;

/// 設定読み込みエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    #[error("{name} の値が不正です: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Contact Service サーバーの設定
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// バインドアドレス
    pub host:            String,
    /// ポート番号
    pub port:            u16,
    /// データベース接続 URL
    pub database_url:    String,
    /// 挿入トリガー（LISTEN ワーカー）を起動するか
    pub trigger_enabled: bool,
    /// 通知設定
    pub notification:    NotificationConfig,
}

/// 送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum NotificationBackend {
    /// SMTP（TLS リレーまたは Mailpit）
    Smtp,
    /// 送信しない（ログ出力のみ）
    Noop,
}

/// 通知機能の設定
///
/// `NOTIFICATION_BACKEND` 環境変数で送信バックエンドを切り替える。
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub backend:      NotificationBackend,
    pub smtp_host:    String,
    pub smtp_port:    u16,
    /// `false` で TLS なしの平文接続（Mailpit 向け）
    pub smtp_tls:     bool,
    /// 送信アカウント（From アドレスを兼ねる）
    pub mail_account: String,
    pub app_password: Secret,
    /// サイトオーナーの受信箱
    pub recipient:    String,
}

/// Debug 出力で値を伏せる文字列
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

const DEFAULT_MAIL_ACCOUNT: &str = "portfolio.contact@example.com";

impl ServiceConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 変数名から値を引く関数で設定を読み込む
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        Ok(Self {
            host:            lookup("CONTACT_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port:            parse("CONTACT_PORT", required("CONTACT_PORT")?)?,
            database_url:    required("DATABASE_URL")?,
            trigger_enabled: parse_or(&lookup, "CONTACT_TRIGGER_ENABLED", true)?,
            notification:    NotificationConfig::from_lookup(&lookup)?,
        })
    }
}

impl NotificationConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mail_account =
            lookup("MAIL_ACCOUNT").unwrap_or_else(|| DEFAULT_MAIL_ACCOUNT.to_string());

        Ok(Self {
            backend: parse_or(lookup, "NOTIFICATION_BACKEND", NotificationBackend::Smtp)?,
            smtp_host: lookup("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
            smtp_port: parse_or(lookup, "SMTP_PORT", 465)?,
            smtp_tls: parse_or(lookup, "SMTP_TLS", true)?,
            app_password: Secret::new(lookup("GMAIL_APP_PASSWORD").unwrap_or_default()),
            recipient: lookup("CONTACT_RECIPIENT").unwrap_or_else(|| mail_account.clone()),
            mail_account,
        })
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    lookup(name).map_or(Ok(default), |value| parse(name, value))
}
