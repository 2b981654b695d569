//! # ContactRepository
//!
//! 問い合わせレコードの永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **スキーマレス**: レコード全体を `document`（JSONB）に保存する
//! - **追記専用**: `insert` で追加し、変更は `record_delivery` による配信結果の追記のみ
//! - **受信時刻は DB が付与**: `received_at` カラムの `DEFAULT now()` と同じ値を
//!   `document.receivedAt` に書き込む
//! - **挿入通知**: contacts テーブルの AFTER INSERT トリガーが `contact_created` に
//!   レコード ID を通知する（[`crate::listener`] が購読）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contact_relay_domain::contact::{
    ContactId,
    ContactSubmission,
    DeliveryStatus,
    StoredContact,
};
use serde_json::Value;
use sqlx::{PgPool, types::Json};
use uuid::Uuid;

use crate::error::InfraError;

/// 問い合わせリポジトリトレイト
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// レコードを追記し、保存されたレコード（保存先の時計で付与した `receivedAt` を含む）を返す
    async fn insert(&self, submission: &ContactSubmission) -> Result<StoredContact, InfraError>;

    /// レコード ID で検索する（挿入トリガーが作成直後のスナップショットを読む）
    async fn find_by_id(&self, id: &ContactId) -> Result<Option<StoredContact>, InfraError>;

    /// 配信結果を記録する
    ///
    /// 1 レコードにつき一度だけ。記録済みまたは存在しない場合はエラー。
    async fn record_delivery(
        &self,
        id: &ContactId,
        status: &DeliveryStatus,
    ) -> Result<(), InfraError>;
}

/// PostgreSQL 実装の ContactRepository
#[derive(Debug, Clone)]
pub struct PostgresContactRepository {
    pool: PgPool,
}

impl PostgresContactRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ContactRow {
    id: Uuid,
    document: Json<Value>,
    received_at: DateTime<Utc>,
    email_sent: Option<bool>,
    email_sent_at: Option<DateTime<Utc>>,
    email_error: Option<String>,
    email_attempted_at: Option<DateTime<Utc>>,
}

impl TryFrom<ContactRow> for StoredContact {
    type Error = InfraError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        let Value::Object(document) = row.document.0 else {
            return Err(InfraError::corrupted_data(format!(
                "document がオブジェクトではありません: id={}",
                row.id
            )));
        };
        let submission = ContactSubmission::from_document(document, row.received_at)
            .map_err(|e| InfraError::corrupted_data(format!("{e}: id={}", row.id)))?;

        Ok(StoredContact {
            id: ContactId::from_uuid(row.id),
            submission,
            delivery: DeliveryStatus::from_columns(
                row.email_sent,
                row.email_sent_at,
                row.email_error,
                row.email_attempted_at,
            ),
        })
    }
}

#[async_trait]
impl ContactRepository for PostgresContactRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(message_id = %submission.message_id()))]
    async fn insert(&self, submission: &ContactSubmission) -> Result<StoredContact, InfraError> {
        let id = ContactId::new();

        // now() はトランザクション開始時刻なので received_at の DEFAULT と一致する
        let row = sqlx::query_as::<_, ContactRow>(
            r#"
            INSERT INTO contacts (id, message_id, document)
            VALUES ($1, $2, jsonb_set($3, '{receivedAt}', to_jsonb(now())))
            RETURNING
                id, document, received_at,
                email_sent, email_sent_at, email_error, email_attempted_at
            "#,
        )
        .bind(*id.as_uuid())
        .bind(submission.message_id().as_str())
        .bind(Json(submission))
        .fetch_one(&self.pool)
        .await?;

        StoredContact::try_from(row)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: &ContactId) -> Result<Option<StoredContact>, InfraError> {
        let row = sqlx::query_as::<_, ContactRow>(
            r#"
            SELECT
                id, document, received_at,
                email_sent, email_sent_at, email_error, email_attempted_at
            FROM contacts
            WHERE id = $1
            "#,
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(StoredContact::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id, email_sent = status.email_sent()))]
    async fn record_delivery(
        &self,
        id: &ContactId,
        status: &DeliveryStatus,
    ) -> Result<(), InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE contacts
            SET email_sent = $2,
                email_sent_at = $3,
                email_error = $4,
                email_attempted_at = $5
            WHERE id = $1 AND email_sent IS NULL
            "#,
        )
        .bind(*id.as_uuid())
        .bind(status.email_sent())
        .bind(status.email_sent_at())
        .bind(status.email_error())
        .bind(status.email_attempted_at())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(InfraError::unexpected(format!(
                "配信結果を記録できません（存在しないか記録済み）: id={id}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::error::InfraErrorKind;

    fn received_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn row(document: Value) -> ContactRow {
        ContactRow {
            id: Uuid::now_v7(),
            document: Json(document),
            received_at: received_at(),
            email_sent: Some(false),
            email_sent_at: None,
            email_error: Some("SMTP 送信失敗".to_string()),
            email_attempted_at: Some(received_at()),
        }
    }

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PostgresContactRepository>();
    }

    #[test]
    fn 行からstored_contactに変換できる() {
        let row = row(json!({
            "name": "Alice", "email": "a@x.com", "subject": "Hi", "message": "Hello",
            "messageId": "msg_1_abc",
        }));
        let id = row.id;

        let stored = StoredContact::try_from(row).unwrap();

        assert_eq!(stored.id.as_uuid(), &id);
        assert_eq!(stored.submission.message_id().as_str(), "msg_1_abc");
        assert_eq!(stored.submission.received_at(), Some(received_at()));
        assert_eq!(
            stored.delivery,
            Some(DeliveryStatus::failed("SMTP 送信失敗", received_at()))
        );
    }

    #[test]
    fn documentがオブジェクトでなければcorrupted_dataになる() {
        let err = StoredContact::try_from(row(json!(["not", "object"]))).unwrap_err();

        assert!(matches!(err.kind(), InfraErrorKind::CorruptedData(_)));
    }

    #[test]
    fn 必須項目が欠けたdocumentはcorrupted_dataになる() {
        let err = StoredContact::try_from(row(json!({"name": "Alice"}))).unwrap_err();

        assert!(matches!(err.kind(), InfraErrorKind::CorruptedData(_)));
    }
}
