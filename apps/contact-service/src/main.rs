//! # Contact Service サーバー
//!
//! ポートフォリオの問い合わせフォームのバックエンド。
//!
//! ## 受付経路
//!
//! | 経路 | 起点 | 結果の返し方 |
//! |------|------|------------|
//! | Callable RPC | `POST /sendContactEmail` | `{result}` / `{error}` |
//! | HTTP エンドポイント | `POST /sendContactEmailHTTP` | ステータスコード + JSON |
//! | 挿入トリガー | contacts への INSERT（`LISTEN contact_created`） | レコードの配信結果 |
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `CONTACT_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `CONTACT_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `NOTIFICATION_BACKEND` | No | `smtp`（デフォルト）または `noop` |
//! | `SMTP_HOST` / `SMTP_PORT` / `SMTP_TLS` | No | SMTP 接続先（デフォルト: `smtp.gmail.com:465`、TLS） |
//! | `MAIL_ACCOUNT` | No | 送信アカウント兼 From アドレス |
//! | `GMAIL_APP_PASSWORD` | No | 送信アカウントのアプリパスワード |
//! | `CONTACT_RECIPIENT` | No | 通知先（デフォルト: `MAIL_ACCOUNT`） |
//! | `CONTACT_TRIGGER_ENABLED` | No | 挿入トリガーを起動するか（デフォルト: `true`） |
//! | `LOG_FORMAT` | No | `json` または `pretty` |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（Mailpit）
//! SMTP_HOST=localhost SMTP_PORT=1025 SMTP_TLS=false cargo run -p contact-relay-service
//!
//! # 本番環境
//! CONTACT_PORT=8080 DATABASE_URL=postgres://... GMAIL_APP_PASSWORD=... \
//!   cargo run -p contact-relay-service --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use contact_relay_domain::clock::SystemClock;
use contact_relay_infra::{
    db,
    listener::ContactCreatedListener,
    notification::{
        NoopNotificationSender,
        NotificationSender,
        SmtpCredentials,
        SmtpNotificationSender,
    },
    repository::PostgresContactRepository,
};
use contact_relay_service::{
    app_builder::build_app,
    config::{NotificationBackend, NotificationConfig, ServiceConfig},
    usecase::{
        ContactService,
        notification::{Envelope, TemplateRenderer},
    },
    worker::run_contact_trigger,
};
use contact_relay_shared::observability::{TracingConfig, init_tracing};

const SERVICE_NAME: &str = "contact-service";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(&TracingConfig::from_env(SERVICE_NAME));

    let config = ServiceConfig::from_env().context("設定の読み込みに失敗しました")?;
    tracing::info!(
        service = SERVICE_NAME,
        "Contact Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    let pool = db::create_pool(&config.database_url)
        .await
        .context("データベース接続に失敗しました")?;
    db::run_migrations(&pool)
        .await
        .context("マイグレーションの適用に失敗しました")?;
    tracing::info!("データベースに接続しました");

    let service = Arc::new(ContactService::new(
        Arc::new(PostgresContactRepository::new(pool.clone())),
        build_sender(&config.notification)?,
        TemplateRenderer::new().context("通知テンプレートの登録に失敗しました")?,
        Envelope::new(
            &config.notification.mail_account,
            config.notification.recipient.clone(),
        ),
        Arc::new(SystemClock),
    ));

    if config.trigger_enabled {
        let listener = ContactCreatedListener::connect(&pool)
            .await
            .context("挿入通知の購読に失敗しました")?;
        tokio::spawn(run_contact_trigger(listener, Arc::clone(&service)));
    } else {
        tracing::info!("挿入トリガーは無効です");
    }

    let app = build_app(service);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("バインドアドレスが不正です")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Contact Service サーバーが起動しました: {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// 設定に応じた送信実装を作成する
fn build_sender(config: &NotificationConfig) -> anyhow::Result<Arc<dyn NotificationSender>> {
    let sender: Arc<dyn NotificationSender> = match config.backend {
        NotificationBackend::Smtp if config.smtp_tls => {
            Arc::new(SmtpNotificationSender::relay(
                &config.smtp_host,
                config.smtp_port,
                SmtpCredentials {
                    username: config.mail_account.clone(),
                    password: config.app_password.expose().to_string(),
                },
            )?)
        }
        NotificationBackend::Smtp => Arc::new(SmtpNotificationSender::plain(
            &config.smtp_host,
            config.smtp_port,
        )),
        NotificationBackend::Noop => Arc::new(NoopNotificationSender),
    };

    tracing::info!(
        backend = %config.backend,
        smtp_host = %config.smtp_host,
        smtp_port = config.smtp_port,
        smtp_tls = config.smtp_tls,
        "通知バックエンドを初期化しました"
    );

    Ok(sender)
}
