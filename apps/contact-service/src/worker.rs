//! # 挿入トリガーワーカー
//!
//! `contact_created` 通知を受け取るたびにタスクを起動し、
//! [`ContactService::deliver_created`] で通知送信と配信結果の記録を行う。
//!
//! 通知ごとのタスクは互いに独立で、順序は保証しない。

use std::{sync::Arc, time::Duration};

use contact_relay_infra::{InfraErrorKind, listener::ContactCreatedSource};
use contact_relay_shared::event_log::error as log_error;
use tokio::task::JoinSet;

use crate::usecase::ContactService;

/// LISTEN 接続が失敗したときの待機時間
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// 挿入通知を処理し続ける
///
/// 供給元が終了したら、起動済みのタスクの完了を待って戻る。
pub async fn run_contact_trigger<S>(mut source: S, service: Arc<ContactService>)
where
    S: ContactCreatedSource,
{
    let mut tasks = JoinSet::new();

    while let Some(next) = source.next().await {
        while tasks.try_join_next().is_some() {}

        match next {
            Ok(id) => {
                let service = Arc::clone(&service);
                tasks.spawn(async move {
                    service.deliver_created(&id).await;
                });
            }
            Err(e) => {
                tracing::error!(
                    error.category = log_error::category::INFRASTRUCTURE,
                    error.kind = log_error::kind::LISTENER,
                    error = %e,
                    "挿入通知の受信に失敗"
                );
                if matches!(e.kind(), InfraErrorKind::Database(_)) {
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }

    tracing::info!(pending = tasks.len(), "挿入通知の供給が終了");
    while tasks.join_next().await.is_some() {}
}
