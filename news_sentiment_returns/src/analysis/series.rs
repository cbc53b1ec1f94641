use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::errors::{Result, SentimentAnalysisError};
use crate::models::PricePoint;

/// Упорядоченное отображение дата -> значение. Ключи уникальны и
/// отсортированы по построению.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DateSeries {
    values: BTreeMap<NaiveDate, f64>,
}

impl DateSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, date: &NaiveDate) -> Option<f64> {
        self.values.get(date).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.values.iter().map(|(date, value)| (*date, *value))
    }

    /// Пересечение двух рядов по дате: даты, отсутствующие хотя бы в одном
    /// из рядов, отбрасываются.
    pub fn intersect(&self, other: &DateSeries) -> Vec<(NaiveDate, f64, f64)> {
        self.values
            .iter()
            .filter_map(|(date, left)| other.get(date).map(|right| (*date, *left, right)))
            .collect()
    }
}

impl FromIterator<(NaiveDate, f64)> for DateSeries {
    /// При повторе даты побеждает последнее значение.
    fn from_iter<T: IntoIterator<Item = (NaiveDate, f64)>>(iter: T) -> Self {
        DateSeries {
            values: iter.into_iter().collect(),
        }
    }
}

/// Ряд цен: строго возрастающие даты, конечные положительные цены.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self> {
        for point in &points {
            if !point.price.is_finite() || point.price <= 0.0 {
                return Err(SentimentAnalysisError::InvalidPrice {
                    date: point.date,
                    price: point.price,
                });
            }
        }

        if let Some(pair) = points.windows(2).find(|pair| pair[0].date >= pair[1].date) {
            return Err(SentimentAnalysisError::UnsortedPriceSeries {
                previous: pair[0].date,
                next: pair[1].date,
            });
        }

        Ok(PriceSeries { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
