use futures::stream::{self, StreamExt};
use regex::Regex;
use reqwest::{Client, ClientBuilder};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::analysis::{analyze_headlines, LexiconClassifier, SentimentClassifier};
use crate::config::AppConfig;
use crate::errors::{Result, SentimentAnalysisError};
use crate::models::{Headline, HeadlineScore, SentimentScores};

const MAX_INPUT_CHARS: usize = 512;

/// Очистка текста заголовка от HTML, ссылок и лишних пробелов
#[derive(Debug, Clone)]
pub struct TextCleaner {
    html_regex: Regex,
    url_regex: Regex,
    whitespace_regex: Regex,
}

impl TextCleaner {
    pub fn new() -> Result<Self> {
        Ok(TextCleaner {
            html_regex: Regex::new(r"<[^>]+>")?,
            url_regex: Regex::new(r"http\S+|www\.\S+")?,
            whitespace_regex: Regex::new(r"\s+")?,
        })
    }

    pub fn clean(&self, text: &str) -> String {
        let cleaned = self.html_regex.replace_all(text, " ");
        let cleaned = self.url_regex.replace_all(&cleaned, " ");
        let cleaned = self.whitespace_regex.replace_all(&cleaned, " ");
        cleaned.trim().to_string()
    }
}

/// Оценки, заранее полученные от удалённой модели. Для заголовков без
/// оценки используется словарный классификатор.
#[derive(Debug, Clone)]
pub struct CachedClassifier {
    cleaner: TextCleaner,
    scores: HashMap<String, SentimentScores>,
    fallback: LexiconClassifier,
}

impl CachedClassifier {
    pub fn new(cleaner: TextCleaner, scores: HashMap<String, SentimentScores>) -> Self {
        CachedClassifier {
            cleaner,
            scores,
            fallback: LexiconClassifier,
        }
    }

    pub fn cached_len(&self) -> usize {
        self.scores.len()
    }
}

impl SentimentClassifier for CachedClassifier {
    fn classify(&self, text: &str) -> Result<SentimentScores> {
        match self.scores.get(&self.cleaner.clean(text)) {
            Some(scores) => Ok(*scores),
            None => self.fallback.classify(text),
        }
    }
}

#[derive(Clone)]
pub struct DataProcessorService {
    client: Client,
    cleaner: TextCleaner,
    config: AppConfig,
}

impl DataProcessorService {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout_secs.unwrap_or(10)))
            .build()?;
        Ok(DataProcessorService {
            client,
            cleaner: TextCleaner::new()?,
            config,
        })
    }

    /// Оценивает заголовки. Порядок результата совпадает с порядком входа.
    pub async fn score_headlines(&self, headlines: &[Headline]) -> Result<Vec<HeadlineScore>> {
        let classifier = self.build_classifier(headlines).await;
        let scores = analyze_headlines(headlines, &classifier)?;
        tracing::info!(
            "Оценено {} заголовков ({} через удалённую модель)",
            scores.len(),
            classifier.cached_len()
        );
        Ok(scores)
    }

    async fn build_classifier(&self, headlines: &[Headline]) -> CachedClassifier {
        if !self.config.has_huggingface_key() {
            tracing::info!("Ключ Hugging Face не задан, используется словарный анализ");
            return CachedClassifier::new(self.cleaner.clone(), HashMap::new());
        }

        let unique_texts: HashSet<String> = headlines
            .iter()
            .map(|h| self.cleaner.clean(&h.text))
            .filter(|text| !text.is_empty())
            .collect();

        let max_concurrent = self.config.max_concurrent_requests.unwrap_or(10);
        let results = stream::iter(unique_texts)
            .map(|text| async move {
                let result = self.fetch_remote_scores(&text).await;
                (text, result)
            })
            .buffer_unordered(max_concurrent)
            .collect::<Vec<_>>()
            .await;

        let mut scores = HashMap::new();
        for (text, result) in results {
            match result {
                Ok(score) => {
                    tracing::debug!("Оценка модели для \"{}\": {:?}", text, score);
                    scores.insert(text, score);
                }
                Err(e) => tracing::warn!("Удалённая модель недоступна для \"{}\": {}", text, e),
            }
        }

        CachedClassifier::new(self.cleaner.clone(), scores)
    }

    async fn fetch_remote_scores(&self, text: &str) -> Result<SentimentScores> {
        let payload = json!({ "inputs": truncate_words(text, MAX_INPUT_CHARS) });
        let api_key = self.config.huggingface_api_key.as_deref().unwrap_or_default();

        let response = self
            .client
            .post(&self.config.huggingface_api_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SentimentAnalysisError::ApiError(format!(
                "Hugging Face API error: {}",
                status
            )));
        }

        let result: Value = response.json().await?;
        parse_label_scores(&result)
    }
}

fn truncate_words(text: &str, max_chars: usize) -> String {
    let mut truncated = String::new();
    for word in text.split_whitespace() {
        let extra = if truncated.is_empty() { word.len() } else { word.len() + 1 };
        if truncated.len() + extra > max_chars {
            break;
        }
        if !truncated.is_empty() {
            truncated.push(' ');
        }
        truncated.push_str(word);
    }
    truncated
}

/// Разбор ответа модели классификации: `[[{label, score}, ...]]` или
/// `[{label, score}, ...]`.
pub fn parse_label_scores(value: &Value) -> Result<SentimentScores> {
    let invalid = || {
        SentimentAnalysisError::InvalidDataFormat(format!(
            "Некорректный формат ответа модели: {}",
            value
        ))
    };

    let outer = value.as_array().ok_or_else(invalid)?;
    let predictions = match outer.first() {
        Some(Value::Array(inner)) => inner,
        Some(_) => outer,
        None => return Err(invalid()),
    };

    let pairs: Vec<(&str, f64)> = predictions
        .iter()
        .filter_map(|p| Some((p["label"].as_str()?, p["score"].as_f64()?)))
        .collect();

    if pairs.is_empty() {
        return Err(invalid());
    }

    SentimentScores::from_labels(pairs)
}
