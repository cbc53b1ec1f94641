use chrono::Utc;

use crate::analysis::{
    aggregate_daily_sentiment, compute_next_day_returns, prepare_regression_data, fit_least_squares,
    PriceSeries,
};
use crate::errors::Result;
use crate::models::{AnalysisRequest, AnalysisResult, HeadlineScore, KeyHeadline, PricePoint};

const KEY_HEADLINES: usize = 5;

/// Сводит оценённые заголовки и цены в результат анализа. Не хранит
/// состояния между вызовами.
#[derive(Debug, Clone, Default)]
pub struct AnalysisService;

impl AnalysisService {
    pub fn new() -> Self {
        AnalysisService
    }

    pub fn analyze(
        &self,
        request: &AnalysisRequest,
        scores: &[HeadlineScore],
        prices: Vec<PricePoint>,
    ) -> Result<AnalysisResult> {
        let prices = PriceSeries::new(prices)?;
        let price_count = prices.len();

        let daily_sentiment = aggregate_daily_sentiment(scores);
        let next_day_returns = compute_next_day_returns(&prices);

        let joined = prepare_regression_data(&daily_sentiment, &next_day_returns);
        let regression = fit_least_squares(&joined);

        tracing::info!(
            "{}: {} дней с sentiment, {} доходностей, совмещено {} дней",
            request.ticker,
            daily_sentiment.len(),
            next_day_returns.len(),
            joined.len()
        );

        let status = if joined.is_empty() { "no_signal" } else { "success" };

        Ok(AnalysisResult {
            ticker: request.ticker.clone(),
            start_date: request.start_date,
            end_date: request.end_date,
            timestamp: Utc::now().to_rfc3339(),
            status: status.to_string(),
            headline_count: scores.len(),
            price_count,
            joined_days: joined.len(),
            regression,
            daily_sentiment,
            next_day_returns,
            key_headlines: self.select_key_headlines(scores),
        })
    }

    fn select_key_headlines(&self, scores: &[HeadlineScore]) -> Vec<KeyHeadline> {
        let mut ranked: Vec<&HeadlineScore> = scores.iter().collect();
        ranked.sort_by(|a, b| b.sentiment().abs().total_cmp(&a.sentiment().abs()));

        ranked
            .into_iter()
            .take(KEY_HEADLINES)
            .map(|score| KeyHeadline {
                headline: score.headline().to_string(),
                sentiment: score.sentiment(),
                published_at: score.timestamp().to_rfc3339(),
            })
            .collect()
    }
}
