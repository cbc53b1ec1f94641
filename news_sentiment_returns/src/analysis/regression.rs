use chrono::NaiveDate;
use serde::Serialize;

use crate::analysis::DateSeries;
use crate::models::RegressionResult;

/// Одна точка совмещённой выборки
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionPoint {
    pub date: NaiveDate,
    pub sentiment: f64,
    pub next_day_return: f64,
}

/// Внутреннее соединение рядов по дате. Даты, присутствующие только в одном
/// ряду, молча отбрасываются.
pub fn prepare_regression_data(
    sentiment: &DateSeries,
    returns: &DateSeries,
) -> Vec<RegressionPoint> {
    sentiment
        .intersect(returns)
        .into_iter()
        .map(|(date, sentiment, next_day_return)| RegressionPoint {
            date,
            sentiment,
            next_day_return,
        })
        .collect()
}

/// Регрессия доходности следующего дня на дневной sentiment.
pub fn run_regression(sentiment: &DateSeries, returns: &DateSeries) -> RegressionResult {
    fit_least_squares(&prepare_regression_data(sentiment, returns))
}

/// МНК с одним признаком: return ≈ coefficient * sentiment + intercept.
///
/// Вырожденные случаи:
/// - пустая выборка: все поля 0.0;
/// - одна точка или нулевая дисперсия sentiment: coefficient 0.0,
///   intercept равен средней доходности, r_squared 0.0;
/// - нулевая дисперсия доходности (n >= 2): r_squared 1.0 при точной
///   подгонке, иначе 0.0.
///
/// Дисперсия считается нулевой, если она не превышает ошибку округления
/// относительно суммы квадратов значений. r_squared всегда лежит в [0, 1].
pub fn fit_least_squares(points: &[RegressionPoint]) -> RegressionResult {
    if points.is_empty() {
        return RegressionResult::NO_SIGNAL;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.sentiment).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.next_day_return).sum::<f64>() / n;

    let sxx: f64 = points.iter().map(|p| (p.sentiment - mean_x).powi(2)).sum();
    let sxy: f64 = points
        .iter()
        .map(|p| (p.sentiment - mean_x) * (p.next_day_return - mean_y))
        .sum();

    let sum_sq_x: f64 = points.iter().map(|p| p.sentiment.powi(2)).sum();
    if points.len() < 2 || negligible_variance(sxx, sum_sq_x, n) {
        return RegressionResult {
            coefficient: 0.0,
            intercept: mean_y,
            r_squared: 0.0,
        };
    }

    let coefficient = sxy / sxx;
    let intercept = mean_y - coefficient * mean_x;

    let ss_res: f64 = points
        .iter()
        .map(|p| (p.next_day_return - (coefficient * p.sentiment + intercept)).powi(2))
        .sum();
    let ss_tot: f64 = points.iter().map(|p| (p.next_day_return - mean_y).powi(2)).sum();

    let sum_sq_y: f64 = points.iter().map(|p| p.next_day_return.powi(2)).sum();

    let r_squared = if negligible_variance(ss_tot, sum_sq_y, n) {
        if negligible_variance(ss_res, sum_sq_y, n) { 1.0 } else { 0.0 }
    } else {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    };

    RegressionResult {
        coefficient,
        intercept,
        r_squared,
    }
}

/// Сумма квадратов отклонений, неотличимая от нуля при округлении
fn negligible_variance(sum_sq_dev: f64, sum_sq: f64, n: f64) -> bool {
    sum_sq_dev <= f64::EPSILON * n * sum_sq
}
