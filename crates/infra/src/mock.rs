//! # テスト用モック
//!
//! ユースケース・ハンドラのテストで使用するインメモリ実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! contact-relay-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use contact_relay_domain::{
    clock::{Clock, SystemClock},
    contact::{ContactId, ContactSubmission, DeliveryStatus, StoredContact},
    notification::{EmailMessage, NotificationError},
};
use tokio::sync::mpsc;

use crate::{
    error::InfraError,
    listener::ContactCreatedSource,
    notification::NotificationSender,
    repository::ContactRepository,
};

// ===== MockContactRepository =====

/// 保存先の時計（`receivedAt` の付与に使う）はサービス側の時計と別に持つ
#[derive(Clone)]
pub struct MockContactRepository {
    contacts:    Arc<Mutex<Vec<StoredContact>>>,
    fail_insert: Arc<Mutex<Option<String>>>,
    fail_find:   Arc<Mutex<Option<String>>>,
    clock:       Arc<dyn Clock>,
}

impl Default for MockContactRepository {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl MockContactRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            contacts:    Arc::default(),
            fail_insert: Arc::default(),
            fail_find:   Arc::default(),
            clock,
        }
    }

    /// 以降の insert を指定メッセージで失敗させる
    pub fn fail_inserts_with(&self, message: impl Into<String>) {
        *self.fail_insert.lock().unwrap() = Some(message.into());
    }

    /// 以降の find_by_id を破損データとして失敗させる（行を復元できないケース）
    pub fn fail_finds_with(&self, message: impl Into<String>) {
        *self.fail_find.lock().unwrap() = Some(message.into());
    }

    pub fn contacts(&self) -> Vec<StoredContact> {
        self.contacts.lock().unwrap().clone()
    }

    pub fn add_contact(&self, contact: StoredContact) {
        self.contacts.lock().unwrap().push(contact);
    }
}

#[async_trait]
impl ContactRepository for MockContactRepository {
    async fn insert(&self, submission: &ContactSubmission) -> Result<StoredContact, InfraError> {
        if let Some(message) = self.fail_insert.lock().unwrap().clone() {
            return Err(InfraError::unexpected(message));
        }

        let stored = StoredContact {
            id:         ContactId::new(),
            submission: submission.clone().with_received_at(self.clock.now()),
            delivery:   None,
        };
        self.contacts.lock().unwrap().push(stored.clone());

        Ok(stored)
    }

    async fn find_by_id(&self, id: &ContactId) -> Result<Option<StoredContact>, InfraError> {
        if let Some(message) = self.fail_find.lock().unwrap().clone() {
            return Err(InfraError::corrupted_data(message));
        }

        Ok(self
            .contacts
            .lock()
            .unwrap()
            .iter()
            .find(|c| &c.id == id)
            .cloned())
    }

    async fn record_delivery(
        &self,
        id: &ContactId,
        status: &DeliveryStatus,
    ) -> Result<(), InfraError> {
        let mut contacts = self.contacts.lock().unwrap();
        match contacts.iter_mut().find(|c| &c.id == id) {
            Some(contact) if contact.delivery.is_none() => {
                contact.delivery = Some(status.clone());
                Ok(())
            }
            _ => Err(InfraError::unexpected(format!(
                "配信結果を記録できません（存在しないか記録済み）: id={id}"
            ))),
        }
    }
}

// ===== MockContactCreatedSource =====

pub struct MockContactCreatedSource {
    rx: mpsc::UnboundedReceiver<ContactId>,
}

impl MockContactCreatedSource {
    /// 送信側で ID を流す供給元を作成する（DB トリガーの代わり）
    ///
    /// 送信側をすべて drop すると供給が終了する。
    pub fn channel() -> (mpsc::UnboundedSender<ContactId>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }
}

#[async_trait]
impl ContactCreatedSource for MockContactCreatedSource {
    async fn next(&mut self) -> Option<Result<ContactId, InfraError>> {
        self.rx.recv().await.map(Ok)
    }
}

// ===== MockNotificationSender =====

#[derive(Clone, Default)]
pub struct MockNotificationSender {
    sent_emails: Arc<Mutex<Vec<EmailMessage>>>,
    fail_with:   Arc<Mutex<Option<String>>>,
}

impl MockNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// 常に指定メッセージで送信失敗するモックを作成
    pub fn failing(message: impl Into<String>) -> Self {
        let sender = Self::default();
        *sender.fail_with.lock().unwrap() = Some(message.into());
        sender
    }

    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.sent_emails.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for MockNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        if let Some(message) = self.fail_with.lock().unwrap().clone() {
            return Err(NotificationError::SendFailed(message));
        }
        self.sent_emails.lock().unwrap().push(email.clone());
        Ok(())
    }
}
