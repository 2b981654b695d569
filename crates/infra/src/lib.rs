//! # Contact Relay インフラ層
//!
//! 外部システム（PostgreSQL、SMTP サーバー）との接続・通信を担当する。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール管理とマイグレーション
//! - **永続化**: 問い合わせレコードの追記と配信結果の記録
//! - **挿入通知**: `contact_created` チャンネルの購読（挿入トリガーの起点）
//! - **メール送信**: SMTP / Noop による通知メール送信
//!
//! ## 依存関係
//!
//! ```text
//! contact-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL データベース接続管理
//! - [`error`] - インフラ層エラー定義
//! - [`listener`] - 挿入通知の購読
//! - [`notification`] - メール送信
//! - [`repository`] - リポジトリ実装
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use contact_relay_infra::{db, repository::PostgresContactRepository};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::create_pool("postgres://localhost/contact_relay").await?;
//!     db::run_migrations(&pool).await?;
//!     let repository = PostgresContactRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
pub mod listener;
pub mod notification;
pub mod repository;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use error::{InfraError, InfraErrorKind};
