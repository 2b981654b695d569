//! # Contact Service ライブラリ
//!
//! ポートフォリオの問い合わせフォームを受け付け、保存してサイトオーナーに通知する。
//!
//! ## モジュール構成
//!
//! - `app_builder`: ルーター構築
//! - `config`: 環境変数からの設定読み込み
//! - `error`: パイプラインのエラーと呼び出し元向けの変換
//! - `handler`: HTTP ハンドラ（Callable RPC / HTTP エンドポイント / ヘルスチェック）
//! - `usecase`: 共有パイプラインと通知レンダリング
//! - `worker`: 挿入トリガーワーカー

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;
pub mod worker;
