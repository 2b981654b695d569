//! # 問い合わせ
//!
//! 問い合わせフォームの入力から、永続化・通知に使うレコードを組み立てる。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`SubmissionInput`] | 問い合わせ入力 | 呼び出し元から届いた未検証のマッピング |
//! | [`ContactSubmission`] | 問い合わせレコード | 入力 + 付与項目（timestamp, messageId 等） |
//! | [`MessageId`] | メッセージ ID | `msg_<epoch ミリ秒>_<英数字 9 文字>` |
//! | [`ContactId`] | レコード ID | 永続化時に採番される UUID v7 |
//! | [`DeliveryStatus`] | 配信結果 | 挿入トリガーが追記する送信成否 |
//!
//! ## 付与項目の優先順位
//!
//! レコードは「入力の全項目 + 付与項目」で、キーが衝突した場合は付与項目が勝つ。
//! 既存キーを上書きしたときはキーの位置を保つ（入力側の順序がそのまま残る）。

use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{DomainError, clock::Clock};

define_uuid_id! {
    /// 問い合わせレコード ID
    ///
    /// contacts テーブルの主キー。
    pub struct ContactId;
}

/// 必須項目
pub const REQUIRED_FIELDS: [&str; 4] = ["name", "email", "subject", "message"];

/// 任意項目・接続元情報が得られなかったときのプレースホルダ
pub const UNKNOWN: &str = "Unknown";

/// 必須項目欠落時のエラーメッセージ
pub const MISSING_REQUIRED_FIELDS: &str = "Missing required fields";

/// レコードのフィールド名（JSON キー）
pub mod field {
    pub const NAME: &str = "name";
    pub const EMAIL: &str = "email";
    pub const SUBJECT: &str = "subject";
    pub const MESSAGE: &str = "message";
    pub const PLATFORM: &str = "platform";
    pub const USER_AGENT: &str = "userAgent";
    pub const DEVICE_INFO: &str = "deviceInfo";
    pub const TIMESTAMP: &str = "timestamp";
    pub const MESSAGE_ID: &str = "messageId";
    pub const RECEIVED_AT: &str = "receivedAt";
    pub const IP_ADDRESS: &str = "ipAddress";
}

// ===== 入力 =====

/// 問い合わせ入力
///
/// 呼び出し元から届いた JSON オブジェクトをそのまま保持する。
/// 必須項目の有無以外は検証しない（メール形式・長さのチェックはしない）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionInput(Map<String, Value>);

impl SubmissionInput {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// 任意の JSON 値から入力を作る
    ///
    /// オブジェクト以外は空の入力として扱う（必須項目欠落で弾かれる）。
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self(fields),
            _ => Self::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// 空でない文字列値を取得する
    fn non_empty_str(&self, key: &str) -> Option<&str> {
        non_empty_str(&self.0, key)
    }

    /// 欠落している必須項目を返す
    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .into_iter()
            .filter(|key| self.non_empty_str(key).is_none())
            .collect()
    }

    /// 必須項目がすべて揃っているか検証する
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.missing_fields().is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(MISSING_REQUIRED_FIELDS.to_string()))
        }
    }
}

fn non_empty_str<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

/// 値が「偽」相当か（未設定、null、false、0、空文字列）
fn is_falsy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => false,
    }
}

// ===== サーバー側コンテキスト =====

/// `userAgent` の取得元
///
/// 呼び出し方式によって取得元が異なる:
/// - Callable: ペイロードの `userAgent`
/// - HTTP: `User-Agent` リクエストヘッダー（ペイロードの値は使わない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAgentSource {
    Payload,
    Header(Option<String>),
}

/// エントリーポイントが観測した接続情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerContext {
    pub ip_address: Option<String>,
    pub user_agent: UserAgentSource,
}

impl ServerContext {
    /// Callable 呼び出しのコンテキスト
    pub fn callable(ip_address: Option<String>) -> Self {
        Self {
            ip_address,
            user_agent: UserAgentSource::Payload,
        }
    }

    /// HTTP エンドポイントのコンテキスト
    pub fn http(ip_address: Option<String>, user_agent_header: Option<String>) -> Self {
        Self {
            ip_address,
            user_agent: UserAgentSource::Header(user_agent_header),
        }
    }
}

// ===== メッセージ ID =====

/// メッセージ ID
///
/// `msg_<epoch ミリ秒>_<[0-9a-z] 9 文字>`。時刻 + 乱数による best-effort な一意性で、
/// 厳密な一意性は保証しない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub const PREFIX: &'static str = "msg_";
    const SUFFIX_LEN: usize = 9;
    const ALPHABET: &'static [u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    /// 時刻と乱数源から新しいメッセージ ID を生成する
    pub fn generate<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> Self {
        let suffix: String = (0..Self::SUFFIX_LEN)
            .map(|_| char::from(Self::ALPHABET[rng.random_range(0..Self::ALPHABET.len())]))
            .collect();
        Self(format!(
            "{}{}_{}",
            Self::PREFIX,
            now.timestamp_millis(),
            suffix
        ))
    }

    /// 保存済みの値から復元する（形式は検証しない）
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// `msg_<数字>_<英数字>` 形式かどうか
    pub fn is_well_formed(value: &str) -> bool {
        let Some(rest) = value.strip_prefix(Self::PREFIX) else {
            return false;
        };
        let Some((millis, suffix)) = rest.split_once('_') else {
            return false;
        };
        !millis.is_empty()
            && millis.chars().all(|c| c.is_ascii_digit())
            && !suffix.is_empty()
            && suffix.chars().all(|c| c.is_ascii_alphanumeric())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ===== レコード =====

/// 問い合わせレコード
///
/// 入力の全項目に付与項目を重ねた JSON ドキュメント。シリアライズ結果はそのまま
/// contacts テーブルの `document` カラムと、通知メール内の完全 JSON ダンプになる。
///
/// `receivedAt` は保存先の時計で付与されるため、永続化前は `null`。
#[derive(Debug, Clone, PartialEq)]
pub struct ContactSubmission {
    document:    Map<String, Value>,
    message_id:  MessageId,
    received_at: Option<DateTime<Utc>>,
}

impl Serialize for ContactSubmission {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.document.serialize(serializer)
    }
}

impl ContactSubmission {
    /// 入力からレコードを構築する
    ///
    /// 入力は変更しない。`timestamp`（ISO-8601 テキスト）はサーバー時計から、
    /// `messageId` は時計 + 乱数源から生成する。`receivedAt` は `null` を置いておき、
    /// 保存時に [`Self::with_received_at`] で埋める。
    ///
    /// # エラー
    ///
    /// 必須項目のいずれかが欠落または空文字列の場合 `DomainError::Validation`。
    pub fn build<R: Rng + ?Sized>(
        input: &SubmissionInput,
        context: &ServerContext,
        clock: &dyn Clock,
        rng: &mut R,
    ) -> Result<Self, DomainError> {
        input.validate()?;

        let now = clock.now();
        let message_id = MessageId::generate(now, rng);

        let platform = input.non_empty_str(field::PLATFORM).unwrap_or(UNKNOWN);
        let user_agent = match &context.user_agent {
            UserAgentSource::Payload => input.non_empty_str(field::USER_AGENT),
            UserAgentSource::Header(header) => header.as_deref().filter(|ua| !ua.is_empty()),
        }
        .unwrap_or(UNKNOWN);
        let device_info = if is_falsy(input.get(field::DEVICE_INFO)) {
            Value::Object(Map::new())
        } else {
            input.get(field::DEVICE_INFO).cloned().unwrap_or_default()
        };
        let ip_address = context
            .ip_address
            .as_deref()
            .filter(|ip| !ip.is_empty())
            .unwrap_or(UNKNOWN);

        let mut document = input.as_map().clone();
        document.insert(
            field::TIMESTAMP.to_string(),
            Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        document.insert(
            field::MESSAGE_ID.to_string(),
            Value::String(message_id.as_str().to_string()),
        );
        document.insert(field::RECEIVED_AT.to_string(), Value::Null);
        document.insert(
            field::PLATFORM.to_string(),
            Value::String(platform.to_string()),
        );
        document.insert(
            field::USER_AGENT.to_string(),
            Value::String(user_agent.to_string()),
        );
        document.insert(field::DEVICE_INFO.to_string(), device_info);
        document.insert(
            field::IP_ADDRESS.to_string(),
            Value::String(ip_address.to_string()),
        );

        Ok(Self {
            document,
            message_id,
            received_at: None,
        })
    }

    /// 保存先の時計で受信時刻を付与する
    pub fn with_received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.document.insert(
            field::RECEIVED_AT.to_string(),
            Value::String(received_at.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        self.received_at = Some(received_at);
        self
    }

    /// 保存済みドキュメントからレコードを復元する
    ///
    /// 別経路で挿入された行も扱うため、付与項目の欠落は許容する
    /// （`messageId` が無ければ `Unknown`、`receivedAt` は DB カラムの値を使う）。
    /// 必須項目の欠落は `DomainError::InvalidRecord`。
    pub fn from_document(
        document: Map<String, Value>,
        received_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let missing: Vec<&str> = REQUIRED_FIELDS
            .into_iter()
            .filter(|key| non_empty_str(&document, key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(DomainError::InvalidRecord(format!(
                "必須項目がありません: {}",
                missing.join(", ")
            )));
        }

        let message_id =
            MessageId::from_string(non_empty_str(&document, field::MESSAGE_ID).unwrap_or(UNKNOWN));

        Ok(Self {
            document,
            message_id,
            received_at: Some(received_at),
        })
    }

    fn str_or_unknown(&self, key: &str) -> &str {
        non_empty_str(&self.document, key).unwrap_or(UNKNOWN)
    }

    pub fn name(&self) -> &str {
        self.str_or_unknown(field::NAME)
    }

    pub fn email(&self) -> &str {
        self.str_or_unknown(field::EMAIL)
    }

    pub fn subject(&self) -> &str {
        self.str_or_unknown(field::SUBJECT)
    }

    pub fn message(&self) -> &str {
        self.str_or_unknown(field::MESSAGE)
    }

    pub fn platform(&self) -> &str {
        self.str_or_unknown(field::PLATFORM)
    }

    pub fn user_agent(&self) -> &str {
        self.str_or_unknown(field::USER_AGENT)
    }

    pub fn ip_address(&self) -> &str {
        self.str_or_unknown(field::IP_ADDRESS)
    }

    pub fn timestamp(&self) -> &str {
        self.str_or_unknown(field::TIMESTAMP)
    }

    pub fn device_info(&self) -> Value {
        self.document
            .get(field::DEVICE_INFO)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    /// 保存先が付与した受信時刻（永続化前は `None`）
    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.received_at
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }
}

// ===== 配信結果 =====

/// 配信結果
///
/// 挿入トリガーがレコードに一度だけ追記する。成功と失敗は排他で、
/// 成功時は `emailSent=true, emailSentAt`、失敗時は
/// `emailSent=false, emailError, emailAttemptedAt` になる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Sent {
        sent_at: DateTime<Utc>,
    },
    Failed {
        error:        String,
        attempted_at: DateTime<Utc>,
    },
}

impl DeliveryStatus {
    pub fn sent(sent_at: DateTime<Utc>) -> Self {
        Self::Sent { sent_at }
    }

    pub fn failed(error: impl Into<String>, attempted_at: DateTime<Utc>) -> Self {
        Self::Failed {
            error: error.into(),
            attempted_at,
        }
    }

    pub fn email_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }

    pub fn email_sent_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Sent { sent_at } => Some(*sent_at),
            Self::Failed { .. } => None,
        }
    }

    pub fn email_error(&self) -> Option<&str> {
        match self {
            Self::Sent { .. } => None,
            Self::Failed { error, .. } => Some(error),
        }
    }

    pub fn email_attempted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Sent { .. } => None,
            Self::Failed { attempted_at, .. } => Some(*attempted_at),
        }
    }

    /// 永続化されたカラム値から復元する
    ///
    /// 未配信（すべて NULL）や、排他条件を満たさない組み合わせは `None`。
    pub fn from_columns(
        email_sent: Option<bool>,
        email_sent_at: Option<DateTime<Utc>>,
        email_error: Option<String>,
        email_attempted_at: Option<DateTime<Utc>>,
    ) -> Option<Self> {
        match (email_sent, email_sent_at, email_error, email_attempted_at) {
            (Some(true), Some(sent_at), None, None) => Some(Self::Sent { sent_at }),
            (Some(false), None, Some(error), Some(attempted_at)) => Some(Self::Failed {
                error,
                attempted_at,
            }),
            _ => None,
        }
    }
}

/// 永続化済みの問い合わせ
#[derive(Debug, Clone, PartialEq)]
pub struct StoredContact {
    pub id:         ContactId,
    pub submission: ContactSubmission,
    pub delivery:   Option<DeliveryStatus>,
}
