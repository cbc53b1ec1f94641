// errors.rs
use chrono::NaiveDate;
use thiserror::Error;
use tokio::task::JoinError;

#[derive(Error, Debug)]
pub enum SentimentAnalysisError {
    #[error("Ошибка HTTP запроса: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Ошибка конфигурации: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("Ошибка regex: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Ошибка выполнения задачи: {0}")]
    TaskError(#[from] JoinError),

    #[error("Ряд цен не отсортирован по возрастанию дат: {previous} >= {next}")]
    UnsortedPriceSeries { previous: NaiveDate, next: NaiveDate },

    #[error("Некорректная цена {price} на дату {date}")]
    InvalidPrice { date: NaiveDate, price: f64 },

    #[error("Некорректная оценка классификатора ({label}): {value}")]
    InvalidScore { label: &'static str, value: f64 },

    #[error("Нет данных для анализа: {0}")]
    NoData(String),

    #[error("Некорректный формат данных: {0}")]
    InvalidDataFormat(String),

    #[error("API вернул ошибку: {0}")]
    ApiError(String),

    #[error("Нет доступных источников данных: {0}")]
    NoDataSourcesAvailable(String),
}

impl SentimentAnalysisError {
    /// Машиночитаемый тип ошибки для ответов API
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::HttpError(_) | Self::ApiError(_) | Self::NoDataSourcesAvailable(_) => {
                "data_collection_error"
            }
            Self::UnsortedPriceSeries { .. }
            | Self::InvalidPrice { .. }
            | Self::InvalidScore { .. } => "input_validation_error",
            Self::NoData(_) => "no_data",
            Self::ConfigError(_) => "configuration_error",
            Self::RegexError(_) | Self::TaskError(_) | Self::InvalidDataFormat(_) => {
                "data_processing_error"
            }
        }
    }
}

// Определяем псевдоним Result с фиксированным типом ошибки
pub type Result<T> = std::result::Result<T, SentimentAnalysisError>;
