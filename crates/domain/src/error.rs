//! # ドメイン層エラー定義
//!
//! | エラー種別 | 呼び出し側での扱い |
//! |-----------|----------------|
//! | `Validation` | 必須項目の欠落。永続化も送信もせずに即時エラー |
//! | `InvalidRecord` | 保存済みドキュメントからレコードを復元できない |

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// `name` / `email` / `subject` / `message` のいずれかが欠落または空文字列。
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// 保存済みレコードの形式が不正
    #[error("レコードの形式が不正です: {0}")]
    InvalidRecord(String),
}

impl DomainError {
    /// 種別の接頭辞を除いたメッセージ
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(msg) | Self::InvalidRecord(msg) => msg,
        }
    }
}
