use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::OnceLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::AppState;

#[derive(Deserialize)]
pub struct SentimentAnalysisRequest {
    pub ticker: String,
    pub days: Option<u32>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub default_analysis_period_days: u32,
    pub remote_sentiment_model: bool,
    pub available_endpoints: Vec<String>,
}

fn ticker_regex() -> &'static Regex {
    static TICKER: OnceLock<Regex> = OnceLock::new();
    TICKER.get_or_init(|| Regex::new(r"^[A-Za-z0-9.^=\-]{1,15}$").expect("valid ticker regex"))
}

pub fn is_valid_ticker(ticker: &str) -> bool {
    ticker_regex().is_match(ticker.trim())
}

// Основной обработчик анализа sentiment/доходности
pub async fn sentiment_analysis(
    State(state): State<AppState>,
    Json(req): Json<SentimentAnalysisRequest>,
) -> Result<Json<Value>, StatusCode> {
    // Валидация входных данных
    let Some(days) = state.config.analysis_days(req.days) else {
        tracing::warn!("Некорректное количество дней: {:?}", req.days);
        return Err(StatusCode::BAD_REQUEST);
    };
    if !is_valid_ticker(&req.ticker) {
        tracing::warn!("Некорректный тикер: {:?}", req.ticker);
        return Err(StatusCode::BAD_REQUEST);
    }

    tracing::info!("Начинаем анализ {} за {} дней", req.ticker, days);

    match state.analyze(&req.ticker, days).await {
        Ok(result) => {
            tracing::info!("Анализ успешно завершен");
            serde_json::to_value(result)
                .map(Json)
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(e) => {
            tracing::error!("Ошибка анализа: {}", e);
            Ok(Json(json!({
                "status": "error",
                "message": e.to_string(),
                "error_type": e.error_type()
            })))
        }
    }
}

// Проверка здоровья сервиса
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "News Sentiment Returns API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// Получение статуса сервиса
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ready".to_string(),
        default_analysis_period_days: state.config.default_days,
        remote_sentiment_model: state.config.has_huggingface_key(),
        available_endpoints: vec![
            "/".to_string(),
            "/status".to_string(),
            "/api/sentiment-analysis".to_string(),
            "/analyze/:ticker".to_string(),
        ],
    })
}

// Анализ с периодом по умолчанию
pub async fn simple_analysis(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let req = SentimentAnalysisRequest { ticker, days: None };
    sentiment_analysis(State(state), Json(req)).await
}

// Создание маршрутов
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/status", get(get_status))
        .route("/api/sentiment-analysis", post(sentiment_analysis))
        .route("/analyze/:ticker", get(simple_analysis))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}
