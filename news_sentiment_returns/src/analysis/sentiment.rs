use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::analysis::DateSeries;
use crate::errors::Result;
use crate::models::{Headline, HeadlineScore, SentimentScores};

/// Классификатор настроений: заголовок -> тройка оценок.
pub trait SentimentClassifier {
    fn classify(&self, text: &str) -> Result<SentimentScores>;
}

impl<F> SentimentClassifier for F
where
    F: Fn(&str) -> Result<SentimentScores>,
{
    fn classify(&self, text: &str) -> Result<SentimentScores> {
        self(text)
    }
}

/// Словарный классификатор без сетевых вызовов. Отрицание перед словом
/// меняет его вклад на противоположный.
#[derive(Debug, Clone, Default)]
pub struct LexiconClassifier;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "strong", "positive", "bullish", "surge", "surges",
    "rally", "rallies", "gain", "gains", "profit", "rise", "rises", "beat", "beats",
    "upgrade", "upgraded", "growth", "record", "boom", "success", "outperform", "soar",
    "soars", "jump", "jumps",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "weak", "poor", "negative", "bearish", "crash", "crashes", "plunge", "plunges",
    "loss", "losses", "fall", "falls", "decline", "declines", "drop", "drops", "miss",
    "misses", "downgrade", "downgraded", "lawsuit", "probe", "recall", "layoffs", "slump",
    "tumble", "tumbles",
];

const NEGATION_WORDS: &[&str] = &["not", "no", "never", "without"];

impl SentimentClassifier for LexiconClassifier {
    fn classify(&self, text: &str) -> Result<SentimentScores> {
        let text_lower = text.to_lowercase();
        let words: Vec<&str> = text_lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let mut positive_count: i32 = 0;
        let mut negative_count: i32 = 0;

        for (i, word) in words.iter().enumerate() {
            let is_negated = i > 0 && NEGATION_WORDS.contains(&words[i - 1]);
            if POSITIVE_WORDS.contains(word) {
                if is_negated {
                    negative_count += 1;
                } else {
                    positive_count += 1;
                }
            }
            if NEGATIVE_WORDS.contains(word) {
                if is_negated {
                    positive_count += 1;
                } else {
                    negative_count += 1;
                }
            }
        }

        // Одно псевдонаблюдение нейтрального класса
        let total = (positive_count + negative_count + 1) as f64;
        SentimentScores::new(
            positive_count as f64 / total,
            negative_count as f64 / total,
            1.0 / total,
        )
    }
}

/// Оценивает каждый заголовок классификатором, сохраняя порядок входа.
pub fn analyze_headlines<C>(headlines: &[Headline], classifier: &C) -> Result<Vec<HeadlineScore>>
where
    C: SentimentClassifier + ?Sized,
{
    headlines
        .iter()
        .map(|headline| {
            let scores = classifier.classify(&headline.text)?;
            Ok(HeadlineScore::new(headline.text.clone(), headline.timestamp, scores))
        })
        .collect()
}

/// Среднее значение sentiment по календарным датам (UTC). Даты без
/// заголовков в ряд не попадают.
pub fn aggregate_daily_sentiment(scores: &[HeadlineScore]) -> DateSeries {
    let mut groups: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for score in scores {
        let entry = groups.entry(score.timestamp().date_naive()).or_insert((0.0, 0));
        entry.0 += score.sentiment();
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(date, (sum, count))| (date, sum / count as f64))
        .collect()
}
