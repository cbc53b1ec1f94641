use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::DateSeries;
use crate::errors::{Result, SentimentAnalysisError};

/// Заголовок новости, полученный из внешнего источника
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub ticker: String,
    pub publisher: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Тройка вероятностей классификатора. Сумма не обязана быть равна 1,
/// но каждая компонента лежит в [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentScores {
    positive: f64,
    negative: f64,
    neutral: f64,
}

impl SentimentScores {
    pub fn new(positive: f64, negative: f64, neutral: f64) -> Result<Self> {
        let labelled = [("positive", positive), ("negative", negative), ("neutral", neutral)];
        for (label, value) in labelled {
            if !(0.0..=1.0).contains(&value) {
                return Err(SentimentAnalysisError::InvalidScore { label, value });
            }
        }
        Ok(SentimentScores {
            positive,
            negative,
            neutral,
        })
    }

    /// Строит тройку из пар (метка, оценка). Отсутствующие метки получают 0,
    /// неизвестные игнорируются.
    pub fn from_labels<'a, I>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let (mut positive, mut negative, mut neutral) = (0.0, 0.0, 0.0);
        for (label, score) in labels {
            match label.to_lowercase().as_str() {
                "positive" => positive = score,
                "negative" => negative = score,
                "neutral" => neutral = score,
                _ => {}
            }
        }
        Self::new(positive, negative, neutral)
    }

    pub fn positive(&self) -> f64 {
        self.positive
    }

    pub fn negative(&self) -> f64 {
        self.negative
    }

    pub fn neutral(&self) -> f64 {
        self.neutral
    }

    /// Скалярный sentiment в диапазоне [-1, 1]
    pub fn sentiment(&self) -> f64 {
        self.positive - self.negative
    }
}

/// Оценка одного заголовка. `sentiment` вычисляется при создании и не меняется.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlineScore {
    headline: String,
    positive: f64,
    negative: f64,
    neutral: f64,
    sentiment: f64,
    timestamp: DateTime<Utc>,
}

impl HeadlineScore {
    pub fn new(
        headline: impl Into<String>,
        timestamp: DateTime<Utc>,
        scores: SentimentScores,
    ) -> Self {
        HeadlineScore {
            headline: headline.into(),
            positive: scores.positive(),
            negative: scores.negative(),
            neutral: scores.neutral(),
            sentiment: scores.sentiment(),
            timestamp,
        }
    }

    pub fn headline(&self) -> &str {
        &self.headline
    }

    pub fn scores(&self) -> SentimentScores {
        SentimentScores {
            positive: self.positive,
            negative: self.negative,
            neutral: self.neutral,
        }
    }

    pub fn sentiment(&self) -> f64 {
        self.sentiment
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionResult {
    pub coefficient: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

impl RegressionResult {
    /// Результат "нет сигнала" для пустой выборки
    pub const NO_SIGNAL: RegressionResult = RegressionResult {
        coefficient: 0.0,
        intercept: 0.0,
        r_squared: 0.0,
    };
}

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl AnalysisRequest {
    /// Закрытый период `[today - days, today]`
    pub fn for_last_days(ticker: &str, days: u32, today: NaiveDate) -> Result<Self> {
        let start_date = today
            .checked_sub_days(chrono::Days::new(days as u64))
            .ok_or_else(|| {
                SentimentAnalysisError::InvalidDataFormat("Невозможно вычислить дату".to_string())
            })?;

        Ok(AnalysisRequest {
            ticker: ticker.trim().to_uppercase(),
            start_date,
            end_date: today,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct KeyHeadline {
    pub headline: String,
    pub sentiment: f64,
    pub published_at: String,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResult {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub timestamp: String,
    pub status: String,
    pub headline_count: usize,
    pub price_count: usize,
    pub joined_days: usize,
    pub regression: RegressionResult,
    pub daily_sentiment: DateSeries,
    pub next_day_returns: DateSeries,
    pub key_headlines: Vec<KeyHeadline>, // топ по |sentiment|
}
