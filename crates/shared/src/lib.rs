//! # Contact Relay 共有ユーティリティ
//!
//! サービス横断で使用する共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - トレーシング関連の依存は `observability` feature の背後に置く

pub mod event_log;
pub mod health;
pub mod observability;

pub use health::HealthResponse;
