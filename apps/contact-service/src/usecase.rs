//! # ユースケース層
//!
//! - `contact`: 3 つのエントリーポイントが共有する受付・通知パイプライン
//! - `notification`: 通知メールのレンダリング

pub mod contact;
pub mod notification;

pub use contact::{CallResult, ContactService};
