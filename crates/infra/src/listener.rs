//! # 挿入通知の購読
//!
//! contacts テーブルの AFTER INSERT トリガーが発行する `contact_created` 通知を
//! `sqlx::postgres::PgListener` で受け取り、レコード ID に変換する。
//!
//! 接続が切れた場合、PgListener は次の受信時に再接続する。
//! 切断中に発行された通知は失われる。

use async_trait::async_trait;
use contact_relay_domain::contact::ContactId;
use sqlx::{PgPool, postgres::PgListener};

use crate::error::InfraError;

/// トリガーが通知に使うチャンネル名
pub const CONTACT_CREATED_CHANNEL: &str = "contact_created";

/// 挿入通知の供給元
///
/// `None` は供給の終了を表す。
#[async_trait]
pub trait ContactCreatedSource: Send {
    /// 次に挿入されたレコードの ID を待つ
    async fn next(&mut self) -> Option<Result<ContactId, InfraError>>;
}

/// PostgreSQL の LISTEN/NOTIFY による供給元
pub struct ContactCreatedListener {
    listener: PgListener,
}

impl ContactCreatedListener {
    /// プールから専用接続を確保し、`contact_created` を LISTEN する
    pub async fn connect(pool: &PgPool) -> Result<Self, InfraError> {
        let mut listener = PgListener::connect_with(pool).await?;
        listener.listen(CONTACT_CREATED_CHANNEL).await?;

        tracing::info!(channel = CONTACT_CREATED_CHANNEL, "挿入通知の購読を開始");

        Ok(Self { listener })
    }
}

#[async_trait]
impl ContactCreatedSource for ContactCreatedListener {
    async fn next(&mut self) -> Option<Result<ContactId, InfraError>> {
        let result = match self.listener.recv().await {
            Ok(notification) => parse_payload(notification.payload()),
            Err(e) => Err(e.into()),
        };
        Some(result)
    }
}

fn parse_payload(payload: &str) -> Result<ContactId, InfraError> {
    payload.parse::<ContactId>().map_err(|e| {
        InfraError::corrupted_data(format!("挿入通知のペイロードが不正: {payload:?}: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::InfraErrorKind;

    #[test]
    fn uuidのペイロードをレコードidに変換できる() {
        let id = ContactId::new();

        let parsed = parse_payload(&id.to_string()).unwrap();

        assert_eq!(parsed, id);
    }

    #[test]
    fn 不正なペイロードはcorrupted_dataになる() {
        let err = parse_payload("not-a-uuid").unwrap_err();

        assert!(matches!(err.kind(), InfraErrorKind::CorruptedData(_)));
    }
}
