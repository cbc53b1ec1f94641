use chrono::Utc;

pub mod analysis;
pub mod config;
pub mod errors;
pub mod models;
pub mod routers;
pub mod services;

pub use analysis::{
    aggregate_daily_sentiment, analyze_headlines, compute_next_day_returns, run_regression,
    DateSeries, LexiconClassifier, PriceSeries, SentimentClassifier,
};
pub use config::load_config;
pub use config::AppConfig;
pub use errors::{Result, SentimentAnalysisError};
pub use models::{
    AnalysisRequest, AnalysisResult, Headline, HeadlineScore, PricePoint, RegressionResult,
    SentimentScores,
};
pub use services::{AnalysisService, DataCollectorService, DataProcessorService};

#[derive(Clone)]
pub struct AppState {
    pub collector: DataCollectorService,
    pub processor: DataProcessorService,
    pub analysis: AnalysisService,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        Ok(AppState {
            collector: DataCollectorService::new(config.clone())?,
            processor: DataProcessorService::new(config.clone())?,
            analysis: AnalysisService::new(),
            config,
        })
    }

    /// Полный прогон: сбор данных, оценка заголовков, регрессия.
    pub async fn analyze(&self, ticker: &str, days: u32) -> Result<AnalysisResult> {
        let request = AnalysisRequest::for_last_days(ticker, days, Utc::now().date_naive())?;
        let data = self.collector.collect_data(&request).await?;

        if data.headlines.is_empty() {
            return Err(SentimentAnalysisError::NoData("No headlines fetched".to_string()));
        }
        if data.prices.is_empty() {
            return Err(SentimentAnalysisError::NoData("No price data fetched".to_string()));
        }

        let scores = self.processor.score_headlines(&data.headlines).await?;
        self.analysis.analyze(&request, &scores, data.prices)
    }
}
