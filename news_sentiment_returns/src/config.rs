use config::{Config, ConfigError};
use std::env;

use crate::errors::Result;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AppConfig {
    pub price_api_url: String,
    pub yahoo_news_url: String,
    pub newsapi_url: String,
    pub newsapi_key: Option<String>,
    pub rss_feed_template: String,
    pub huggingface_api_url: String,
    pub huggingface_api_key: Option<String>,
    pub max_articles: Option<usize>,
    pub max_concurrent_requests: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub default_days: u32,
    pub bind_address: String,
    pub log_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            price_api_url: "https://query1.finance.yahoo.com/v8/finance/chart".to_string(),
            yahoo_news_url: "https://query1.finance.yahoo.com/v1/finance/search".to_string(),
            newsapi_url: "https://newsapi.org/v2/everything".to_string(),
            newsapi_key: None,
            rss_feed_template:
                "https://feeds.finance.yahoo.com/rss/2.0/headline?s={ticker}&region=US&lang=en-US"
                    .to_string(),
            huggingface_api_url: "https://api-inference.huggingface.co/models/ProsusAI/finbert"
                .to_string(),
            huggingface_api_key: None,
            max_articles: Some(100),
            max_concurrent_requests: Some(10),
            request_timeout_secs: Some(10),
            default_days: 30,
            bind_address: "0.0.0.0:3000".to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Валидация конфигурации
    pub fn validate(&self) -> Result<()> {
        if let Some(max_articles) = self.max_articles {
            if max_articles == 0 || max_articles > 1000 {
                return Err(invalid("max_articles must be between 1 and 1000"));
            }
        }

        if let Some(max_concurrent) = self.max_concurrent_requests {
            if max_concurrent == 0 || max_concurrent > 50 {
                return Err(invalid("max_concurrent_requests must be between 1 and 50"));
            }
        }

        if self.default_days == 0 || self.default_days > 365 {
            return Err(invalid("default_days must be between 1 and 365"));
        }

        if !self.rss_feed_template.contains("{ticker}") {
            return Err(invalid("rss_feed_template must contain {ticker} placeholder"));
        }

        if self.bind_address.trim().is_empty() {
            return Err(invalid("bind_address cannot be empty"));
        }

        Ok(())
    }

    /// Период анализа: запрошенный или по умолчанию, в пределах 1..=365 дней
    pub fn analysis_days(&self, requested: Option<u32>) -> Option<u32> {
        let days = requested.unwrap_or(self.default_days);
        (1..=365).contains(&days).then_some(days)
    }

    pub fn has_huggingface_key(&self) -> bool {
        self.huggingface_api_key.as_deref().is_some_and(|key| !key.is_empty())
    }
}

fn invalid(message: &str) -> crate::errors::SentimentAnalysisError {
    ConfigError::Message(message.to_string()).into()
}

pub fn load_config() -> Result<AppConfig> {
    // Загружаем .env файл
    dotenvy::dotenv().ok();

    let defaults = AppConfig::default();
    let settings = Config::builder()
        .set_default("price_api_url", defaults.price_api_url)?
        .set_default("yahoo_news_url", defaults.yahoo_news_url)?
        .set_default("newsapi_url", defaults.newsapi_url)?
        .set_default("rss_feed_template", defaults.rss_feed_template)?
        .set_default("huggingface_api_url", defaults.huggingface_api_url)?
        .set_default("max_articles", defaults.max_articles.map(|v| v as u64))?
        .set_default("max_concurrent_requests", defaults.max_concurrent_requests.map(|v| v as u64))?
        .set_default("request_timeout_secs", defaults.request_timeout_secs)?
        .set_default("default_days", defaults.default_days as u64)?
        .set_default("bind_address", defaults.bind_address)?
        .add_source(config::File::with_name("config").required(false))
        .add_source(config::Environment::with_prefix("SENTIMENT_RETURNS"))
        .build()?;

    let mut config: AppConfig = settings.try_deserialize()?;

    // Ключи необязательны: без них используются резервные источники
    if let Ok(key) = env::var("NEWSAPI_KEY") {
        config.newsapi_key = Some(key);
    }
    if let Ok(key) = env::var("HUGGINGFACE_API_KEY") {
        config.huggingface_api_key = Some(key);
    }

    config.validate()?;

    Ok(config)
}
