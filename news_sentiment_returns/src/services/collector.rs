use chrono::{DateTime, Days, NaiveDate, Utc};
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::AppConfig;
use crate::errors::{Result, SentimentAnalysisError};
use crate::models::{AnalysisRequest, Headline, PricePoint};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; news_sentiment_returns/0.1)";

/// Сырые данные одного прогона анализа
#[derive(Debug, Clone, Default)]
pub struct CollectedData {
    pub headlines: Vec<Headline>,
    pub prices: Vec<PricePoint>,
}

#[derive(Clone)]
pub struct DataCollectorService {
    client: Client,
    config: AppConfig,
}

impl DataCollectorService {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout_secs.unwrap_or(10)))
            .build()?;
        Ok(DataCollectorService { client, config })
    }

    pub async fn collect_data(&self, request: &AnalysisRequest) -> Result<CollectedData> {
        let price_task = {
            let service = self.clone();
            let request = request.clone();
            tokio::spawn(async move { service.collect_prices(&request).await })
        };

        let news_task = {
            let service = self.clone();
            let request = request.clone();
            tokio::spawn(async move { service.collect_headlines(&request).await })
        };

        let (price_result, news_result) = tokio::try_join!(price_task, news_task)?;

        Ok(CollectedData {
            prices: price_result?,
            headlines: news_result?,
        })
    }

    async fn collect_prices(&self, request: &AnalysisRequest) -> Result<Vec<PricePoint>> {
        // Верхняя граница API исключающая, поэтому сдвигаем её на день
        let period_end = request
            .end_date
            .checked_add_days(Days::new(1))
            .ok_or_else(|| {
                SentimentAnalysisError::InvalidDataFormat("Невозможно вычислить дату".to_string())
            })?;

        let url = format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=history",
            self.config.price_api_url,
            urlencoding::encode(&request.ticker),
            midnight_timestamp(request.start_date),
            midnight_timestamp(period_end),
        );

        tracing::info!(
            "Получение цен {} с {} по {}",
            request.ticker,
            request.start_date,
            request.end_date
        );
        tracing::debug!("URL: {}", url);

        let json = self.get_json(&url, "Yahoo chart").await?;
        let prices = parse_yahoo_chart(&json)?;

        tracing::info!("Получено {} цен {}", prices.len(), request.ticker);
        Ok(prices)
    }

    async fn collect_headlines(&self, request: &AnalysisRequest) -> Result<Vec<Headline>> {
        let mut any_source_answered = false;

        match self.collect_from_yahoo_news(request).await {
            Ok(headlines) if !headlines.is_empty() => return Ok(headlines),
            Ok(_) => {
                any_source_answered = true;
                tracing::info!("Yahoo News не вернул заголовков за период");
            }
            Err(e) => tracing::warn!("Yahoo News недоступен: {}", e),
        }

        if self.config.newsapi_key.is_some() {
            match self.collect_from_newsapi(request).await {
                Ok(headlines) if !headlines.is_empty() => return Ok(headlines),
                Ok(_) => {
                    any_source_answered = true;
                    tracing::info!("NewsAPI не вернул заголовков за период");
                }
                Err(e) => tracing::warn!("NewsAPI недоступен: {}", e),
            }
        }

        match self.collect_from_rss(request).await {
            Ok(headlines) => return Ok(headlines),
            Err(e) => tracing::warn!("RSS фид недоступен: {}", e),
        }

        if any_source_answered {
            Ok(Vec::new())
        } else {
            tracing::error!("Все источники новостей недоступны");
            Err(SentimentAnalysisError::NoDataSourcesAvailable(
                "Все источники новостей недоступны. Проверьте подключение к интернету.".to_string(),
            ))
        }
    }

    async fn collect_from_yahoo_news(&self, request: &AnalysisRequest) -> Result<Vec<Headline>> {
        let url = format!(
            "{}?q={}&newsCount={}&quotesCount=0",
            self.config.yahoo_news_url,
            urlencoding::encode(&request.ticker),
            self.config.max_articles.unwrap_or(100),
        );

        let json = self.get_json(&url, "Yahoo News").await?;
        let headlines = parse_yahoo_news(&json, request)?;
        tracing::info!("Собрано {} заголовков из Yahoo News", headlines.len());
        Ok(headlines)
    }

    async fn collect_from_newsapi(&self, request: &AnalysisRequest) -> Result<Vec<Headline>> {
        let api_key = self.config.newsapi_key.as_deref().unwrap_or_default();
        let page_size = self.config.max_articles.unwrap_or(100).min(100);

        let url = format!(
            "{}?q={}&from={}&to={}&language=en&sortBy=publishedAt&pageSize={}&apiKey={}",
            self.config.newsapi_url,
            urlencoding::encode(&request.ticker),
            request.start_date.format("%Y-%m-%d"),
            request.end_date.format("%Y-%m-%d"),
            page_size,
            api_key
        );

        tracing::info!("Запрос новостей NewsAPI с {}", request.start_date);

        let json = self.get_json(&url, "NewsAPI").await?;
        let headlines = parse_newsapi_articles(&json, request)?;
        tracing::info!("Собрано {} заголовков из NewsAPI", headlines.len());
        Ok(headlines)
    }

    async fn collect_from_rss(&self, request: &AnalysisRequest) -> Result<Vec<Headline>> {
        let feed_url = self
            .config
            .rss_feed_template
            .replace("{ticker}", &urlencoding::encode(&request.ticker));

        tracing::info!("Сбор заголовков из RSS фида {}", feed_url);

        let response = self.client.get(&feed_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SentimentAnalysisError::ApiError(format!("RSS error: {}", status)));
        }

        let content = response.bytes().await?;
        let headlines = parse_rss_feed(&content, request, self.config.max_articles.unwrap_or(100))?;
        tracing::info!("Собрано {} заголовков из RSS", headlines.len());
        Ok(headlines)
    }

    async fn get_json(&self, url: &str, source: &str) -> Result<Value> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Неизвестная ошибка".to_string());
            return Err(SentimentAnalysisError::ApiError(format!(
                "{} error: {} - {}",
                source, status, error_text
            )));
        }

        Ok(response.json::<Value>().await?)
    }
}

fn midnight_timestamp(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}

fn in_period(timestamp: &DateTime<Utc>, request: &AnalysisRequest) -> bool {
    let date = timestamp.date_naive();
    request.start_date <= date && date <= request.end_date
}

/// Разбор ответа Yahoo Finance search: `news[].{title, publisher, providerPublishTime}`.
pub fn parse_yahoo_news(json: &Value, request: &AnalysisRequest) -> Result<Vec<Headline>> {
    let items = json["news"].as_array().ok_or_else(|| {
        SentimentAnalysisError::InvalidDataFormat("Отсутствует поле news".to_string())
    })?;

    let headlines = items
        .iter()
        .filter_map(|item| {
            let text = item["title"].as_str()?.trim();
            let timestamp = DateTime::from_timestamp(item["providerPublishTime"].as_i64()?, 0)?;
            (!text.is_empty() && in_period(&timestamp, request)).then(|| Headline {
                text: text.to_string(),
                timestamp,
                ticker: request.ticker.clone(),
                publisher: item["publisher"].as_str().unwrap_or_default().to_string(),
            })
        })
        .collect();

    Ok(headlines)
}

/// Разбор ответа NewsAPI. Берутся только статьи, в заголовке которых
/// упоминается тикер.
pub fn parse_newsapi_articles(json: &Value, request: &AnalysisRequest) -> Result<Vec<Headline>> {
    let articles = json["articles"].as_array().ok_or_else(|| {
        SentimentAnalysisError::InvalidDataFormat("Отсутствует поле articles".to_string())
    })?;

    // \b не срабатывает на границе символов вроде ^ в ^GSPC
    let ticker_regex = Regex::new(&format!(
        r"(?i)(?:^|\W){}(?:\W|$)",
        regex::escape(&request.ticker)
    ))?;
    let mut headlines = Vec::new();

    for article in articles {
        let text = article["title"].as_str().unwrap_or_default().trim();
        if text.is_empty() || !ticker_regex.is_match(text) {
            continue;
        }

        let Some(published_at) = article["publishedAt"].as_str() else {
            continue;
        };
        let timestamp = match DateTime::parse_from_rfc3339(published_at) {
            Ok(dt) => dt.with_timezone(&Utc),
            Err(e) => {
                tracing::debug!("Пропущена статья с некорректной датой {}: {}", published_at, e);
                continue;
            }
        };

        if in_period(&timestamp, request) {
            headlines.push(Headline {
                text: text.to_string(),
                timestamp,
                ticker: request.ticker.clone(),
                publisher: article["source"]["name"].as_str().unwrap_or_default().to_string(),
            });
        }
    }

    Ok(headlines)
}

/// Разбор RSS/Atom фида через feed-rs
pub fn parse_rss_feed(
    content: &[u8],
    request: &AnalysisRequest,
    max_articles: usize,
) -> Result<Vec<Headline>> {
    let feed = feed_rs::parser::parse(content)
        .map_err(|e| SentimentAnalysisError::InvalidDataFormat(format!("RSS parse error: {}", e)))?;

    let feed_title = feed.title.as_ref().map(|t| t.content.clone()).unwrap_or_default();

    let headlines = feed
        .entries
        .iter()
        .take(max_articles)
        .filter_map(|entry| {
            let text = entry.title.as_ref()?.content.trim().to_string();
            let timestamp = entry.published.or(entry.updated)?;
            if text.is_empty() || !in_period(&timestamp, request) {
                return None;
            }
            let publisher = entry
                .authors
                .first()
                .map(|author| author.name.clone())
                .unwrap_or_else(|| feed_title.clone());
            Some(Headline {
                text,
                timestamp,
                ticker: request.ticker.clone(),
                publisher,
            })
        })
        .collect();

    Ok(headlines)
}

/// Разбор ответа Yahoo chart API. Предпочитается `adjclose`, иначе `close`.
/// Дата бара берётся в часовом поясе биржи (`meta.gmtoffset`), пустые
/// значения пропускаются, на одну дату остаётся одна цена, результат
/// отсортирован по возрастанию дат.
pub fn parse_yahoo_chart(json: &Value) -> Result<Vec<PricePoint>> {
    let chart = &json["chart"];
    if let Some(description) = chart["error"]["description"].as_str() {
        return Err(SentimentAnalysisError::ApiError(description.to_string()));
    }

    let result = &chart["result"][0];
    if result.is_null() {
        return Err(SentimentAnalysisError::InvalidDataFormat(
            "Отсутствует поле chart.result".to_string(),
        ));
    }

    // Нет торгов за период
    let Some(timestamps) = result["timestamp"].as_array() else {
        return Ok(Vec::new());
    };

    let closes = result["indicators"]["adjclose"][0]["adjclose"]
        .as_array()
        .or_else(|| result["indicators"]["quote"][0]["close"].as_array())
        .ok_or_else(|| {
            SentimentAnalysisError::InvalidDataFormat("Отсутствуют цены закрытия".to_string())
        })?;

    if closes.len() != timestamps.len() {
        return Err(SentimentAnalysisError::InvalidDataFormat(format!(
            "Число цен ({}) не совпадает с числом дат ({})",
            closes.len(),
            timestamps.len()
        )));
    }

    let gmt_offset = result["meta"]["gmtoffset"].as_i64().unwrap_or(0);

    let mut daily_prices = BTreeMap::new();
    for (timestamp, close) in timestamps.iter().zip(closes) {
        let timestamp = timestamp.as_i64().ok_or_else(|| {
            SentimentAnalysisError::InvalidDataFormat("Некорректный timestamp".to_string())
        })?;
        let Some(price) = close.as_f64() else {
            continue;
        };
        let exchange_time = DateTime::from_timestamp(timestamp + gmt_offset, 0).ok_or_else(|| {
            SentimentAnalysisError::InvalidDataFormat("Некорректный timestamp".to_string())
        })?;
        daily_prices.insert(exchange_time.date_naive(), price);
    }

    Ok(daily_prices
        .into_iter()
        .map(|(date, price)| PricePoint { date, price })
        .collect())
}
