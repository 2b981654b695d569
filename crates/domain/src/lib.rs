//! # Contact Relay ドメイン層
//!
//! ポートフォリオサイトの問い合わせフォームを受け付けるためのドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **純粋関数**: レコード構築は入力・時計・乱数源だけに依存し、I/O を持たない
//! - **不変レコード**: 構築済みの [`contact::ContactSubmission`] は変更しない。
//!   変更できるのは配信結果（[`contact::DeliveryStatus`]）の追記のみ
//! - **インフラ非依存**: DB やメール送信の詳細は infra クレートに置く
//!
//! ## 依存関係の方向
//!
//! ```text
//! contact-service → infra → domain
//!          ↘         ↓
//!            shared
//! ```
//!
//! ## モジュール構成
//!
//! - [`contact`] - 問い合わせ入力、レコード、メッセージ ID、配信結果
//! - [`notification`] - メールメッセージと通知エラー
//! - [`clock`] - 時刻プロバイダ
//! - [`error`] - ドメイン層エラー
//!
//! ## 使用例
//!
//! ```rust
//! use contact_relay_domain::{
//!     clock::SystemClock,
//!     contact::{ContactSubmission, ServerContext, SubmissionInput},
//! };
//! use serde_json::json;
//!
//! let input = SubmissionInput::from_value(json!({
//!     "name": "Alice",
//!     "email": "a@x.com",
//!     "subject": "Hi",
//!     "message": "Hello",
//! }));
//! let context = ServerContext::callable(None);
//!
//! let record =
//!     ContactSubmission::build(&input, &context, &SystemClock, &mut rand::rng()).unwrap();
//! assert_eq!(record.name(), "Alice");
//! assert_eq!(record.ip_address(), "Unknown");
//! ```

#[macro_use]
mod macros;

pub mod clock;
pub mod contact;
pub mod error;
pub mod notification;

pub use error::DomainError;
