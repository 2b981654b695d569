//! # 通知ユースケース
//!
//! 問い合わせレコードから通知メールを組み立てる。

mod template_renderer;

pub use template_renderer::{Envelope, TemplateRenderer};
