use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use news_sentiment_returns::routers::create_routes;
use news_sentiment_returns::{load_config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;

    // Настройка структурированного логирования
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("news_sentiment_returns=info,warn"));

    // JSON лог в файл, если задан log_dir
    let (file_layer, _guard) = match config.log_dir.as_deref() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "news_sentiment_returns.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer().json().with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true))
        .with(file_layer)
        .init();

    let bind_address: std::net::SocketAddr = config.bind_address.parse()?;
    let state = AppState::new(config)?;

    let app = create_routes(state);
    tracing::info!("Сервер запущен на http://{}", bind_address);
    axum::Server::bind(&bind_address)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
