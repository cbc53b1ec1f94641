use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{NaiveDate, TimeZone, Utc};
use news_sentiment_returns::routers::{create_routes, health_check, is_valid_ticker};
use news_sentiment_returns::services::collector::{
    parse_newsapi_articles, parse_rss_feed, parse_yahoo_chart, parse_yahoo_news,
};
use news_sentiment_returns::services::processor::parse_label_scores;
use news_sentiment_returns::services::{CachedClassifier, TextCleaner};
use news_sentiment_returns::*;
use serde_json::json;
use std::collections::HashMap;
use tower::ServiceExt;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn test_request() -> AnalysisRequest {
    AnalysisRequest {
        ticker: "AAPL".to_string(),
        start_date: date(2022, 12, 25),
        end_date: date(2023, 1, 2),
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        newsapi_key: Some("test_key".to_string()),
        ..AppConfig::default()
    }
}

#[test]
fn test_config_validation() {
    let mut config = test_config();

    // Валидная конфигурация должна проходить
    assert!(config.validate().is_ok());

    // Неверное количество статей
    config.max_articles = Some(0);
    assert!(config.validate().is_err());

    config.max_articles = Some(2000);
    assert!(config.validate().is_err());

    // Неверное количество одновременных запросов
    config.max_articles = Some(50);
    config.max_concurrent_requests = Some(0);
    assert!(config.validate().is_err());

    config.max_concurrent_requests = Some(100);
    assert!(config.validate().is_err());

    config.max_concurrent_requests = Some(10);
    config.default_days = 0;
    assert!(config.validate().is_err());

    config.default_days = 30;
    config.rss_feed_template = "https://example.com/rss".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_error_type() {
    let config = AppConfig {
        default_days: 0,
        ..test_config()
    };

    let error = config.validate().unwrap_err();
    assert!(matches!(error, SentimentAnalysisError::ConfigError(_)));
    assert_eq!(error.error_type(), "configuration_error");
}

#[test]
fn test_analysis_days() {
    let config = test_config();

    // Без явного значения берется default_days
    assert_eq!(config.analysis_days(None), Some(30));
    assert_eq!(config.analysis_days(Some(7)), Some(7));
    assert_eq!(config.analysis_days(Some(365)), Some(365));
    assert_eq!(config.analysis_days(Some(0)), None);
    assert_eq!(config.analysis_days(Some(400)), None);

    let config = AppConfig {
        default_days: 90,
        ..test_config()
    };
    assert_eq!(config.analysis_days(None), Some(90));
}

#[test]
fn test_huggingface_key_detection() {
    let mut config = test_config();
    assert!(!config.has_huggingface_key());

    config.huggingface_api_key = Some(String::new());
    assert!(!config.has_huggingface_key());

    config.huggingface_api_key = Some("hf_token".to_string());
    assert!(config.has_huggingface_key());
}

#[test]
fn test_parse_yahoo_chart() {
    let json = json!({
        "chart": {
            "result": [{
                "timestamp": [1672756200, 1672842600, 1672929000],
                "indicators": {
                    "quote": [{ "close": [125.07, 126.36, 125.02] }],
                    "adjclose": [{ "adjclose": [100.0, null, 99.0] }]
                }
            }],
            "error": null
        }
    });

    let prices = parse_yahoo_chart(&json).unwrap();
    assert_eq!(
        prices,
        vec![
            PricePoint { date: date(2023, 1, 3), price: 100.0 },
            PricePoint { date: date(2023, 1, 5), price: 99.0 },
        ]
    );
}

#[test]
fn test_parse_yahoo_chart_errors() {
    let error = json!({
        "chart": { "result": null, "error": { "code": "Not Found", "description": "No data found" } }
    });
    assert!(matches!(parse_yahoo_chart(&error), Err(SentimentAnalysisError::ApiError(_))));

    // Нет торгов за период
    let empty = json!({ "chart": { "result": [{ "indicators": { "quote": [{}] } }], "error": null } });
    assert!(parse_yahoo_chart(&empty).unwrap().is_empty());
}

#[test]
fn test_parse_yahoo_chart_uses_exchange_timezone() {
    // ASX: торги открываются в 10:00 по Сиднею, то есть накануне по UTC
    let json = json!({
        "chart": {
            "result": [{
                "meta": { "symbol": "BHP.AX", "gmtoffset": 39600 },
                "timestamp": [1673218800, 1673305200],
                "indicators": {
                    "quote": [{ "close": [48.1, 48.6] }],
                    "adjclose": [{ "adjclose": [47.9, 48.4] }]
                }
            }],
            "error": null
        }
    });

    let prices = parse_yahoo_chart(&json).unwrap();
    assert_eq!(
        prices,
        vec![
            PricePoint { date: date(2023, 1, 9), price: 47.9 },
            PricePoint { date: date(2023, 1, 10), price: 48.4 },
        ]
    );
}

#[test]
fn test_parse_yahoo_news_filters_period() {
    let json = json!({
        "news": [
            { "title": "Apple rallies on iPhone demand", "publisher": "Reuters", "providerPublishTime": 1672567200 },
            { "title": "Old story", "publisher": "Bloomberg", "providerPublishTime": 1671530400 },
            { "title": "", "publisher": "Empty", "providerPublishTime": 1672567200 },
            { "title": "No timestamp", "publisher": "Unknown" }
        ]
    });

    let headlines = parse_yahoo_news(&json, &test_request()).unwrap();
    assert_eq!(headlines.len(), 1);
    assert_eq!(headlines[0].text, "Apple rallies on iPhone demand");
    assert_eq!(headlines[0].publisher, "Reuters");
    assert_eq!(headlines[0].ticker, "AAPL");
    assert_eq!(headlines[0].timestamp, Utc.with_ymd_and_hms(2023, 1, 1, 10, 0, 0).unwrap());

    assert!(parse_yahoo_news(&json!({}), &test_request()).is_err());
}

#[test]
fn test_parse_newsapi_articles() {
    let json = json!({
        "status": "ok",
        "articles": [
            { "title": "AAPL hits record high", "publishedAt": "2023-01-01T12:00:00Z", "source": { "name": "CNBC" } },
            { "title": "Microsoft earnings preview", "publishedAt": "2023-01-01T12:00:00Z", "source": { "name": "CNBC" } },
            { "title": "AAPL outlook", "publishedAt": "not a date", "source": { "name": "CNBC" } },
            { "title": "AAPL in 2024", "publishedAt": "2024-01-01T12:00:00Z", "source": { "name": "CNBC" } }
        ]
    });

    let headlines = parse_newsapi_articles(&json, &test_request()).unwrap();
    assert_eq!(headlines.len(), 1);
    assert_eq!(headlines[0].text, "AAPL hits record high");
    assert_eq!(headlines[0].publisher, "CNBC");
}

#[test]
fn test_parse_newsapi_articles_index_ticker() {
    let json = json!({
        "status": "ok",
        "articles": [
            { "title": "^GSPC slides as yields climb", "publishedAt": "2023-01-01T12:00:00Z", "source": { "name": "CNBC" } },
            { "title": "Futures on ^gspc steady", "publishedAt": "2023-01-01T13:00:00Z", "source": { "name": "CNBC" } },
            { "title": "X^GSPCY is not the index", "publishedAt": "2023-01-01T14:00:00Z", "source": { "name": "CNBC" } }
        ]
    });
    let request = AnalysisRequest {
        ticker: "^GSPC".to_string(),
        ..test_request()
    };

    let headlines = parse_newsapi_articles(&json, &request).unwrap();
    let titles: Vec<&str> = headlines.iter().map(|h| h.text.as_str()).collect();
    assert_eq!(titles, vec!["^GSPC slides as yields climb", "Futures on ^gspc steady"]);
    assert!(headlines.iter().all(|h| h.ticker == "^GSPC"));
}

#[test]
fn test_parse_rss_feed() {
    let rss = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Yahoo! Finance: AAPL News</title>
    <link>https://finance.yahoo.com/</link>
    <description>Latest news</description>
    <item>
      <title>Apple shares climb ahead of earnings</title>
      <link>https://finance.yahoo.com/news/1</link>
      <pubDate>Sun, 01 Jan 2023 10:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Apple last year</title>
      <link>https://finance.yahoo.com/news/2</link>
      <pubDate>Thu, 01 Dec 2022 10:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

    let headlines = parse_rss_feed(rss.as_bytes(), &test_request(), 20).unwrap();
    assert_eq!(headlines.len(), 1);
    assert_eq!(headlines[0].text, "Apple shares climb ahead of earnings");
    assert_eq!(headlines[0].publisher, "Yahoo! Finance: AAPL News");

    assert!(parse_rss_feed(b"not a feed", &test_request(), 20).is_err());
}

#[test]
fn test_parse_label_scores() {
    let nested = json!([[
        { "label": "positive", "score": 0.7 },
        { "label": "negative", "score": 0.2 },
        { "label": "neutral", "score": 0.1 }
    ]]);
    let scores = parse_label_scores(&nested).unwrap();
    assert_eq!(scores.positive(), 0.7);
    assert_eq!(scores.negative(), 0.2);
    assert_eq!(scores.neutral(), 0.1);

    let flat = json!([{ "label": "NEGATIVE", "score": 0.9 }]);
    assert_eq!(parse_label_scores(&flat).unwrap().negative(), 0.9);

    assert!(parse_label_scores(&json!({ "error": "Model is loading" })).is_err());
    assert!(parse_label_scores(&json!([])).is_err());
}

#[test]
fn test_text_cleaner() {
    let cleaner = TextCleaner::new().unwrap();
    assert_eq!(
        cleaner.clean("<b>Apple</b>   beats   estimates https://example.com/story"),
        "Apple beats estimates"
    );
}

#[test]
fn test_cached_classifier_falls_back_to_lexicon() {
    let cleaner = TextCleaner::new().unwrap();
    let mut scores = HashMap::new();
    scores.insert(
        "Apple beats estimates".to_string(),
        SentimentScores::new(0.9, 0.05, 0.05).unwrap(),
    );
    let classifier = CachedClassifier::new(cleaner, scores);

    // Совпадение после очистки текста
    let cached = classifier.classify("<i>Apple</i> beats  estimates").unwrap();
    assert_eq!(cached.positive(), 0.9);

    let fallback = classifier.classify("Shares plunge after guidance cut").unwrap();
    assert!(fallback.sentiment() < 0.0);
}

#[tokio::test]
async fn test_processor_scores_offline_without_key() {
    let processor = DataProcessorService::new(test_config()).unwrap();
    let headlines = vec![
        Headline {
            text: "Apple stock rally continues".to_string(),
            timestamp: Utc.with_ymd_and_hms(2023, 1, 1, 10, 0, 0).unwrap(),
            ticker: "AAPL".to_string(),
            publisher: "Reuters".to_string(),
        },
        Headline {
            text: "Apple faces lawsuit".to_string(),
            timestamp: Utc.with_ymd_and_hms(2023, 1, 2, 10, 0, 0).unwrap(),
            ticker: "AAPL".to_string(),
            publisher: "Reuters".to_string(),
        },
    ];

    let scores = processor.score_headlines(&headlines).await.unwrap();
    assert_eq!(scores.len(), 2);
    assert!(scores[0].sentiment() > 0.0);
    assert!(scores[1].sentiment() < 0.0);
}

#[test]
fn test_ticker_validation() {
    assert!(is_valid_ticker("AAPL"));
    assert!(is_valid_ticker("BRK.B"));
    assert!(is_valid_ticker("^GSPC"));
    assert!(!is_valid_ticker(""));
    assert!(!is_valid_ticker("AAPL; DROP"));
}

#[test]
fn test_health_check() {
    let response = tokio_test::block_on(health_check());
    assert_eq!(response.0.status, "healthy");
}

#[tokio::test]
async fn test_routes_reject_invalid_requests() {
    let state = AppState::new(test_config()).unwrap();

    for body in [r#"{"ticker":"AAPL","days":0}"#, r#"{"ticker":"AAPL","days":400}"#, r#"{"ticker":"","days":7}"#] {
        let response = create_routes(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/sentiment-analysis")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
    }
}

#[tokio::test]
async fn test_status_route() {
    let state = AppState::new(test_config()).unwrap();

    let response = create_routes(state)
        .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn test_error_types() {
    assert_eq!(SentimentAnalysisError::NoData("x".to_string()).error_type(), "no_data");
    assert_eq!(
        SentimentAnalysisError::InvalidPrice { date: date(2023, 1, 1), price: 0.0 }.error_type(),
        "input_validation_error"
    );
    assert_eq!(
        SentimentAnalysisError::NoDataSourcesAvailable("x".to_string()).error_type(),
        "data_collection_error"
    );
}
