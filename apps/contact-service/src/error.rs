//! # Contact Service エラー定義
//!
//! パイプラインで発生するエラーと、呼び出し元へ返す種別・メッセージへの変換を定義する。
//!
//! | エラー | 種別 | 永続化 | 送信 |
//! |-------|------|-------|------|
//! | `Validation` | invalid-argument | されない | されない |
//! | `Persistence` | internal | 失敗 | 試みない |
//! | `Template` / `Delivery` | internal | 済み | 失敗 |

use contact_relay_domain::{DomainError, notification::NotificationError};
use contact_relay_infra::InfraError;
use thiserror::Error;

/// 送信失敗時のメッセージ接頭辞
pub const SEND_FAILURE_PREFIX: &str = "Failed to send email: ";

/// 呼び出し元に返すエラー種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum FailureKind {
    /// 必須項目の欠落
    InvalidArgument,
    /// それ以外のすべての失敗
    Internal,
}

/// 問い合わせパイプラインで発生するエラー
#[derive(Debug, Error)]
pub enum ContactError {
    /// 必須項目の欠落
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// 永続化の失敗
    #[error(transparent)]
    Persistence(#[from] InfraError),

    /// 通知本文のレンダリング失敗
    #[error(transparent)]
    Template(NotificationError),

    /// メール送信の失敗
    #[error(transparent)]
    Delivery(NotificationError),
}

impl ContactError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::InvalidArgument,
            Self::Persistence(_) | Self::Template(_) | Self::Delivery(_) => FailureKind::Internal,
        }
    }

    /// 下位エラーのメッセージ（配信結果の `emailError` にも使う）
    pub fn detail(&self) -> String {
        match self {
            Self::Validation(e) => e.message().to_string(),
            Self::Persistence(e) => e.to_string(),
            Self::Template(e) | Self::Delivery(e) => match e {
                NotificationError::SendFailed(msg) | NotificationError::TemplateFailed(msg) => {
                    msg.clone()
                }
            },
        }
    }

    /// 呼び出し元に返すメッセージ
    pub fn public_message(&self) -> String {
        match self.kind() {
            FailureKind::InvalidArgument => self.detail(),
            FailureKind::Internal => format!("{SEND_FAILURE_PREFIX}{}", self.detail()),
        }
    }
}

#[cfg(test)]
mod tests {
    use contact_relay_domain::contact::MISSING_REQUIRED_FIELDS;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn バリデーションエラーはinvalid_argumentで素のメッセージを返す() {
        let err = ContactError::from(DomainError::Validation(
            MISSING_REQUIRED_FIELDS.to_string(),
        ));

        assert_eq!(err.kind(), FailureKind::InvalidArgument);
        assert_eq!(err.detail(), "Missing required fields");
        assert_eq!(err.public_message(), "Missing required fields");
    }

    #[test]
    fn 送信エラーはinternalで接頭辞付きのメッセージを返す() {
        let err =
            ContactError::Delivery(NotificationError::SendFailed("connection refused".to_string()));

        assert_eq!(err.kind(), FailureKind::Internal);
        assert_eq!(err.detail(), "connection refused");
        assert_eq!(err.public_message(), "Failed to send email: connection refused");
    }

    #[test]
    fn 永続化エラーはinternalになる() {
        let err = ContactError::from(InfraError::unexpected("disk full"));

        assert_eq!(err.kind(), FailureKind::Internal);
        assert!(err.public_message().starts_with(SEND_FAILURE_PREFIX));
        assert!(err.public_message().contains("disk full"));
    }

    #[test]
    fn 種別の文字列表現() {
        let invalid: &str = FailureKind::InvalidArgument.into();

        assert_eq!(invalid, "invalid-argument");
        assert_eq!(FailureKind::Internal.to_string(), "internal");
    }
}
