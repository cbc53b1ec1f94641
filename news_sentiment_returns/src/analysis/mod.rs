//! Ядро анализа: дневной sentiment, доходности следующего дня и регрессия.
//! Чистые синхронные функции без ввода-вывода.

pub mod regression;
pub mod returns;
pub mod sentiment;
pub mod series;

pub use regression::{fit_least_squares, prepare_regression_data, run_regression, RegressionPoint};
pub use returns::compute_next_day_returns;
pub use sentiment::{
    aggregate_daily_sentiment, analyze_headlines, LexiconClassifier, SentimentClassifier,
};
pub use series::{DateSeries, PriceSeries};
