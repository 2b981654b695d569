//! # 問い合わせパイプライン
//!
//! Callable / HTTP / 挿入トリガーの 3 経路が共有する処理。
//!
//! ```text
//! Callable / HTTP: 検証 → レコード構築 → 永続化 → レンダリング → 送信 → 結果
//! 挿入トリガー:    読み込み → レンダリング → 送信 → 配信結果の記録
//! ```
//!
//! ## 設計方針
//!
//! - **リトライしない**: どの段階の失敗もそのまま呼び出し元に返す
//! - **失敗の原子性**: 送信失敗時もレコードは残るが、呼び出し元には失敗だけを返す
//! - **トリガーは報告しない**: 挿入トリガーの結果はレコードの配信結果とログにのみ残る

use std::sync::Arc;

use contact_relay_domain::{
    clock::Clock,
    contact::{
        ContactId,
        ContactSubmission,
        DeliveryStatus,
        MessageId,
        ServerContext,
        SubmissionInput,
    },
};
use contact_relay_infra::{notification::NotificationSender, repository::ContactRepository};
use contact_relay_shared::{
    event_log::{error as log_error, event},
    log_business_event,
};

use super::notification::{Envelope, TemplateRenderer};
use crate::error::{ContactError, FailureKind};

/// 成功時に返すメッセージ
pub const SUCCESS_MESSAGE: &str = "Email sent successfully";

/// Callable / HTTP 共通の処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallResult {
    Success { message_id: MessageId },
    Failure { kind: FailureKind, message: String },
}

impl From<Result<MessageId, ContactError>> for CallResult {
    fn from(result: Result<MessageId, ContactError>) -> Self {
        match result {
            Ok(message_id) => Self::Success { message_id },
            Err(e) => Self::Failure {
                kind:    e.kind(),
                message: e.public_message(),
            },
        }
    }
}

/// 問い合わせサービス
///
/// 送信手段・保存先・時計は trait で受け取り、テストで差し替える。
pub struct ContactService {
    repository: Arc<dyn ContactRepository>,
    sender:     Arc<dyn NotificationSender>,
    renderer:   TemplateRenderer,
    envelope:   Envelope,
    clock:      Arc<dyn Clock>,
}

impl ContactService {
    pub fn new(
        repository: Arc<dyn ContactRepository>,
        sender: Arc<dyn NotificationSender>,
        renderer: TemplateRenderer,
        envelope: Envelope,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            sender,
            renderer,
            envelope,
            clock,
        }
    }

    /// 問い合わせを受け付ける（Callable / HTTP）
    ///
    /// 検証 → 構築 → 永続化 → レンダリング → 送信 を順に行い、成功時はメッセージ ID を返す。
    /// 通知には保存先が `receivedAt` を付与した後のレコードを使う。
    ///
    /// # エラー
    ///
    /// - 必須項目の欠落: `ContactError::Validation`（永続化も送信もしない）
    /// - 永続化の失敗: `ContactError::Persistence`（送信しない）
    /// - レンダリング・送信の失敗: `ContactError::Template` / `ContactError::Delivery`
    #[tracing::instrument(skip_all, fields(origin = origin))]
    pub async fn submit(
        &self,
        input: &SubmissionInput,
        context: &ServerContext,
        origin: &'static str,
    ) -> Result<MessageId, ContactError> {
        let submission =
            ContactSubmission::build(input, context, self.clock.as_ref(), &mut rand::rng())?;

        let stored = self.repository.insert(&submission).await.inspect_err(|e| {
            tracing::error!(
                error.category = log_error::category::INFRASTRUCTURE,
                error.kind = log_error::kind::DATABASE,
                error = %e,
                "問い合わせの保存に失敗"
            );
        })?;

        log_business_event!(
            event.category = event::category::CONTACT,
            event.action = event::action::CONTACT_PERSISTED,
            event.entity_type = event::entity_type::CONTACT,
            event.entity_id = %stored.id,
            event.result = event::result::SUCCESS,
            event.origin = origin,
            contact.message_id = %stored.submission.message_id(),
            "問い合わせを保存"
        );

        self.send(&stored.submission, origin).await?;

        Ok(stored.submission.message_id().clone())
    }

    /// 挿入されたレコードの通知を送り、配信結果を記録する（挿入トリガー）
    ///
    /// エラーは呼び出し元に返さずログに残す。記録した配信結果を返す
    /// （レコードが存在しない・記録済みの場合は `None`）。
    /// 行を読み込めても復元できない場合は送信せず、失敗として記録する。
    #[tracing::instrument(skip_all, fields(%id))]
    pub async fn deliver_created(&self, id: &ContactId) -> Option<DeliveryStatus> {
        let status = match self.repository.find_by_id(id).await {
            Ok(Some(stored)) if stored.delivery.is_some() => {
                tracing::debug!("配信結果が記録済みのためスキップ");
                return None;
            }
            Ok(Some(stored)) => {
                match self.send(&stored.submission, event::origin::TRIGGER).await {
                    Ok(()) => DeliveryStatus::sent(self.clock.now()),
                    Err(e) => DeliveryStatus::failed(e.detail(), self.clock.now()),
                }
            }
            Ok(None) => {
                tracing::warn!("挿入通知のレコードが見つからないためスキップ");
                return None;
            }
            Err(e) => {
                tracing::error!(
                    error.category = log_error::category::INFRASTRUCTURE,
                    error.kind = log_error::kind::DATABASE,
                    error = %e,
                    "挿入通知のレコード読み込みに失敗"
                );
                DeliveryStatus::failed(e.to_string(), self.clock.now())
            }
        };

        match self.repository.record_delivery(id, &status).await {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::CONTACT,
                    event.action = event::action::DELIVERY_RECORDED,
                    event.entity_type = event::entity_type::CONTACT,
                    event.entity_id = %id,
                    event.result = event::result::SUCCESS,
                    event.origin = event::origin::TRIGGER,
                    contact.email_sent = status.email_sent(),
                    "配信結果を記録"
                );
                Some(status)
            }
            Err(e) => {
                tracing::error!(
                    error.category = log_error::category::INFRASTRUCTURE,
                    error.kind = log_error::kind::DATABASE,
                    error = %e,
                    email_sent = status.email_sent(),
                    "配信結果の記録に失敗"
                );
                None
            }
        }
    }

    /// レンダリングして送信する
    async fn send(
        &self,
        submission: &ContactSubmission,
        origin: &'static str,
    ) -> Result<(), ContactError> {
        let email = self
            .renderer
            .render(submission, &self.envelope)
            .map_err(ContactError::Template)
            .inspect_err(|e| {
                tracing::error!(
                    error.kind = log_error::kind::TEMPLATE,
                    error = %e,
                    "通知テンプレートのレンダリングに失敗"
                );
            })?;

        match self.sender.send_email(&email).await {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_SENT,
                    event.entity_type = event::entity_type::CONTACT,
                    event.entity_id = %submission.message_id(),
                    event.result = event::result::SUCCESS,
                    event.origin = origin,
                    notification.recipient = %email.to,
                    "通知メール送信成功"
                );
                Ok(())
            }
            Err(e) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_FAILED,
                    event.entity_type = event::entity_type::CONTACT,
                    event.entity_id = %submission.message_id(),
                    event.result = event::result::FAILURE,
                    event.origin = origin,
                    notification.recipient = %email.to,
                    error.category = log_error::category::EXTERNAL_SERVICE,
                    error.kind = log_error::kind::SMTP,
                    error = %e,
                    "通知メール送信失敗"
                );
                Err(ContactError::Delivery(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use contact_relay_domain::{
        clock::FixedClock,
        contact::{MessageId, StoredContact},
    };
    use contact_relay_infra::mock::{MockContactRepository, MockNotificationSender};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn service(repo: &MockContactRepository, sender: &MockNotificationSender) -> ContactService {
        ContactService::new(
            Arc::new(repo.clone()),
            Arc::new(sender.clone()),
            TemplateRenderer::new().unwrap(),
            Envelope::new("portfolio.contact@example.com", "owner@example.com"),
            Arc::new(FixedClock::new(now())),
        )
    }

    fn valid_input() -> SubmissionInput {
        SubmissionInput::from_value(json!({
            "name": "Alice",
            "email": "a@x.com",
            "subject": "Hi",
            "message": "Hello\nWorld",
        }))
    }

    fn stored(repo: &MockContactRepository) -> StoredContact {
        let submission = ContactSubmission::build(
            &valid_input(),
            &ServerContext::callable(None),
            &FixedClock::new(now()),
            &mut rand::rng(),
        )
        .unwrap()
        .with_received_at(now());
        let stored = StoredContact {
            id: ContactId::new(),
            submission,
            delivery: None,
        };
        repo.add_contact(stored.clone());
        stored
    }

    #[tokio::test]
    async fn 受付に成功すると保存して送信しメッセージidを返す() {
        let repo = MockContactRepository::new();
        let sender = MockNotificationSender::new();
        let sut = service(&repo, &sender);

        let message_id = sut
            .submit(&valid_input(), &ServerContext::callable(None), event::origin::CALLABLE)
            .await
            .unwrap();

        assert!(MessageId::is_well_formed(message_id.as_str()));
        let contacts = repo.contacts();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].submission.message_id(), &message_id);
        assert_eq!(contacts[0].delivery, None);
        let sent = sender.sent_emails();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Portfolio Contact: Hi");
        assert_eq!(sent[0].to, "owner@example.com");
    }

    #[tokio::test]
    async fn received_atは保存先の時計で付与されtimestampとは別の時刻になる() {
        let stored_at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 2).unwrap();
        let repo = MockContactRepository::with_clock(Arc::new(FixedClock::new(stored_at)));
        let sender = MockNotificationSender::new();
        let sut = service(&repo, &sender);

        sut.submit(&valid_input(), &ServerContext::callable(None), event::origin::CALLABLE)
            .await
            .unwrap();

        let submission = &repo.contacts()[0].submission;
        assert_eq!(submission.timestamp(), "2026-03-01T12:00:00.000Z");
        assert_eq!(submission.received_at(), Some(stored_at));
        // 通知の JSON ダンプも保存後のレコード
        assert!(
            sender.sent_emails()[0]
                .text_body
                .contains("2026-03-01T12:00:02.000000Z")
        );
    }

    #[rstest]
    #[case::nameなし(json!({"email": "a@x.com", "subject": "Hi", "message": "Hello"}))]
    #[case::messageが空(json!({"name": "Alice", "email": "a@x.com", "subject": "Hi", "message": ""}))]
    #[case::空オブジェクト(json!({}))]
    #[tokio::test]
    async fn 必須項目が欠けると保存も送信もしない(#[case] input: serde_json::Value) {
        let repo = MockContactRepository::new();
        let sender = MockNotificationSender::new();
        let sut = service(&repo, &sender);

        let result = sut
            .submit(
                &SubmissionInput::from_value(input),
                &ServerContext::callable(None),
                event::origin::CALLABLE,
            )
            .await;

        assert_eq!(
            CallResult::from(result),
            CallResult::Failure {
                kind:    FailureKind::InvalidArgument,
                message: "Missing required fields".to_string(),
            }
        );
        assert!(repo.contacts().is_empty());
        assert!(sender.sent_emails().is_empty());
    }

    #[tokio::test]
    async fn 保存に失敗すると送信しない() {
        let repo = MockContactRepository::new();
        repo.fail_inserts_with("quota exceeded");
        let sender = MockNotificationSender::new();
        let sut = service(&repo, &sender);

        let result = sut
            .submit(&valid_input(), &ServerContext::callable(None), event::origin::HTTP)
            .await;

        let CallResult::Failure { kind, message } = CallResult::from(result) else {
            panic!("失敗になるはず");
        };
        assert_eq!(kind, FailureKind::Internal);
        assert!(message.starts_with("Failed to send email: "));
        assert!(message.contains("quota exceeded"));
        assert!(sender.sent_emails().is_empty());
    }

    #[tokio::test]
    async fn 送信に失敗してもレコードは残り失敗を返す() {
        let repo = MockContactRepository::new();
        let sender = MockNotificationSender::failing("535 authentication failed");
        let sut = service(&repo, &sender);

        let result = sut
            .submit(&valid_input(), &ServerContext::callable(None), event::origin::CALLABLE)
            .await;

        assert_eq!(
            CallResult::from(result),
            CallResult::Failure {
                kind:    FailureKind::Internal,
                message: "Failed to send email: 535 authentication failed".to_string(),
            }
        );
        assert_eq!(repo.contacts().len(), 1);
    }

    #[tokio::test]
    async fn トリガーは送信成功を記録する() {
        let repo = MockContactRepository::new();
        let sender = MockNotificationSender::new();
        let record = stored(&repo);
        let sut = service(&repo, &sender);

        let status = sut.deliver_created(&record.id).await;

        assert_eq!(status, Some(DeliveryStatus::sent(now())));
        assert_eq!(repo.contacts()[0].delivery, Some(DeliveryStatus::sent(now())));
        assert_eq!(sender.sent_emails().len(), 1);
    }

    #[tokio::test]
    async fn トリガーは送信失敗を記録する() {
        let repo = MockContactRepository::new();
        let sender = MockNotificationSender::failing("connection refused");
        let record = stored(&repo);
        let sut = service(&repo, &sender);

        sut.deliver_created(&record.id).await;

        let delivery = repo.contacts()[0].delivery.clone().unwrap();
        assert!(!delivery.email_sent());
        assert_eq!(delivery.email_error(), Some("connection refused"));
        assert_eq!(delivery.email_attempted_at(), Some(now()));
        assert_eq!(delivery.email_sent_at(), None);
    }

    #[tokio::test]
    async fn トリガーは復元できないレコードを送信失敗として記録する() {
        let repo = MockContactRepository::new();
        let sender = MockNotificationSender::new();
        let record = stored(&repo);
        repo.fail_finds_with("必須項目がありません: message");
        let sut = service(&repo, &sender);

        let status = sut.deliver_created(&record.id).await;

        let delivery = repo.contacts()[0].delivery.clone().unwrap();
        assert_eq!(status, Some(delivery.clone()));
        assert!(!delivery.email_sent());
        assert!(
            delivery
                .email_error()
                .is_some_and(|e| e.contains("必須項目がありません: message"))
        );
        assert_eq!(delivery.email_attempted_at(), Some(now()));
        assert!(sender.sent_emails().is_empty());
    }

    #[tokio::test]
    async fn トリガーは存在しないレコードをスキップする() {
        let repo = MockContactRepository::new();
        let sender = MockNotificationSender::new();
        let sut = service(&repo, &sender);

        let status = sut.deliver_created(&ContactId::new()).await;

        assert_eq!(status, None);
        assert!(sender.sent_emails().is_empty());
    }

    #[tokio::test]
    async fn トリガーは記録済みのレコードを再送しない() {
        let repo = MockContactRepository::new();
        let sender = MockNotificationSender::new();
        let record = stored(&repo);
        let sut = service(&repo, &sender);

        sut.deliver_created(&record.id).await;
        let second = sut.deliver_created(&record.id).await;

        assert_eq!(second, None);
        assert_eq!(sender.sent_emails().len(), 1);
    }
}
