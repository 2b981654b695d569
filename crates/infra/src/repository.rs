//! # リポジトリ実装
//!
//! - **依存性逆転**: ユースケースはトレイトにのみ依存し、PostgreSQL 実装を差し替え可能
//! - **追記専用**: 問い合わせレコードは挿入のみ。更新は配信結果の記録に限る

pub mod contact_repository;

pub use contact_repository::{ContactRepository, PostgresContactRepository};
