//! Hosted classifiers against local fake services.
#![cfg(feature = "server")]

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

use chatlens::error::ClassifierErrorKind;
use chatlens::prelude::*;

/// Requests seen by a fake service: `(authorization header, JSON body)`.
type Seen = Arc<Mutex<Vec<(String, Value)>>>;

/// Serves `router` on an ephemeral port and returns its base URL.
async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn record(seen: &Seen, headers: &HeaderMap, body: Value) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    seen.lock().unwrap().push((auth, body));
}

async fn fake_openai(reply: &'static str) -> (String, Seen) {
    let seen: Seen = Arc::default();
    let router = Router::new()
        .route(
            "/v1/chat/completions",
            post(
                move |State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    record(&seen, &headers, body);
                    Json(json!({
                        "choices": [{ "message": { "role": "assistant", "content": reply } }]
                    }))
                },
            ),
        )
        .with_state(seen.clone());
    (format!("{}/v1", spawn(router).await), seen)
}

async fn fake_huggingface(response: Value) -> (String, Seen) {
    let seen: Seen = Arc::default();
    let router = Router::new()
        .route(
            "/models/nlptown/bert-base-multilingual-uncased-sentiment",
            post(
                move |State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>| {
                    let response = response.clone();
                    async move {
                        record(&seen, &headers, body);
                        Json(response)
                    }
                },
            ),
        )
        .with_state(seen.clone());
    (format!("{}/models", spawn(router).await), seen)
}

async fn failing_service() -> String {
    let router = Router::new().fallback(|| async {
        (StatusCode::TOO_MANY_REQUESTS, "slow down")
    });
    spawn(router).await
}

#[tokio::test]
async fn test_llm_message_classification() {
    let (base, seen) = fake_openai(
        "1. Sentiment: Lovable.\n2. Red flags: None\n3. Compliments: cute, funny\n4. Attachment style: Secure",
    )
    .await;

    let classifier = LlmClassifier::new("sk-test").with_base_url(base).with_model("test-model");
    let c = classifier.classify_message("tum bahut cute ho").await.unwrap();

    assert_eq!(c.sentiment, Some(Sentiment::Lovable));
    assert_eq!(c.red_flags, None);
    assert_eq!(c.compliments, Some(vec!["cute".to_string(), "funny".to_string()]));
    assert_eq!(c.attachment_style.as_deref(), Some("Secure"));

    let seen = seen.lock().unwrap();
    let (auth, body) = &seen[0];
    assert_eq!(auth, "Bearer sk-test");
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["max_tokens"], 150);
    assert_eq!(body["messages"][0]["role"], "system");
    assert!(
        body["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("tum bahut cute ho")
    );
}

#[tokio::test]
async fn test_llm_session_classification() {
    let (base, seen) = fake_openai(
        "Sentiment: Negative\nRed flags: jealousy, ignoring\nCompliments: None\nSummary: An argument about plans.",
    )
    .await;
    let classifier = LlmClassifier::new("sk-test").with_base_url(base);

    let messages = parse_transcript(
        "[01/15/2024, 9:05 AM] Alice: why ignore me\n[01/15/2024, 9:07 AM] Bob: busy tha",
    );
    let sessions = group_sessions(&messages, chrono::TimeDelta::hours(24));
    let c = classifier.classify_session(&sessions[0]).await.unwrap();

    assert_eq!(c.sentiment, Some(Sentiment::Negative));
    assert_eq!(c.red_flags.as_deref(), Some("jealousy, ignoring"));
    assert_eq!(c.compliments, Some(Vec::new()));
    assert_eq!(c.summary.as_deref(), Some("An argument about plans."));

    let seen = seen.lock().unwrap();
    let body = &seen[0].1;
    assert_eq!(body["max_tokens"], 500);
    let prompt = body["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains("- [Alice] why ignore me\n- [Bob] busy tha"));
}

#[tokio::test]
async fn test_llm_end_to_end_report() {
    let (base, _seen) = fake_openai("Sentiment: Positive\nRed flags: None\nCompliments: kind").await;
    let classifier = Arc::new(LlmClassifier::new("sk-test").with_base_url(base));

    let messages = parse_transcript(
        "[01/15/2024, 9:05 AM] Alice: hello\n[01/15/2024, 9:07 AM] Bob: hi there",
    );
    let config = AnalysisConfig::new().with_compliment_source(ComplimentSource::Classifier);
    let report = Aggregator::with_config(Arc::new(Lexicon::hinglish()), config)
        .aggregate(&messages, classifier)
        .await;

    assert_eq!(report.interest_level["Alice"], 2);
    assert_eq!(report.interest_level["Bob"], 2);
    assert_eq!(report.compliments["Alice"], 1);
    assert!(report.red_flags.is_empty());
    assert_eq!(report.classification.classifier, "llm");
    assert_eq!(report.classification.units_analyzed, 2);
}

#[tokio::test]
async fn test_huggingface_nested_labels() {
    let (base, seen) = fake_huggingface(json!([[
        { "label": "1 star", "score": 0.05 },
        { "label": "4 stars", "score": 0.61 },
        { "label": "5 stars", "score": 0.34 }
    ]]))
    .await;

    let classifier = HuggingFaceClassifier::new("hf-test").with_base_url(base);
    let c = classifier.classify_message("bahut badhia").await.unwrap();

    assert_eq!(c.sentiment, Some(Sentiment::Positive));
    assert_eq!(c.red_flags, None);
    assert_eq!(c.compliments, None);

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].0, "Bearer hf-test");
    assert_eq!(seen[0].1, json!({ "inputs": "bahut badhia" }));
}

#[tokio::test]
async fn test_huggingface_flat_labels() {
    let (base, _seen) = fake_huggingface(json!([
        { "label": "NEGATIVE", "score": 0.9 },
        { "label": "POSITIVE", "score": 0.1 }
    ]))
    .await;

    let classifier = HuggingFaceClassifier::new("hf-test").with_base_url(base);
    let c = classifier.classify_message("itna gussa").await.unwrap();
    assert_eq!(c.sentiment, Some(Sentiment::Negative));
}

#[tokio::test]
async fn test_huggingface_empty_response_is_error() {
    let (base, _seen) = fake_huggingface(json!([])).await;
    let classifier = HuggingFaceClassifier::new("hf-test").with_base_url(base);

    let err = classifier.classify_message("hello").await.unwrap_err();
    assert!(err.is_classifier());
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let base = failing_service().await;
    let classifier = LlmClassifier::new("sk-test").with_base_url(&base);

    let err = classifier.classify_message("hello").await.unwrap_err();
    match err {
        AnalyzerError::Classifier {
            classifier: "llm",
            source: ClassifierErrorKind::Status { status, body },
        } => {
            assert_eq!(status, 429);
            assert_eq!(body, "slow down");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_failing_service_does_not_fail_report() {
    let base = failing_service().await;
    let classifier = Arc::new(HuggingFaceClassifier::new("hf-test").with_base_url(base));
    let config = AnalysisConfig::new().with_retries(0, std::time::Duration::ZERO);

    let messages = parse_transcript(
        "[01/15/2024, 9:05 AM] Alice: you are amazing\n[01/15/2024, 9:07 AM] Bob: haha",
    );
    let report = Aggregator::with_config(Arc::new(Lexicon::hinglish()), config)
        .aggregate(&messages, classifier)
        .await;

    assert_eq!(report.classification.units_failed, 2);
    assert_eq!(report.compliments["Alice"], 1);
    assert_eq!(report.response_times, vec![2]);
}

#[tokio::test]
async fn test_build_classifier_requires_keys() {
    let lexicon = Arc::new(Lexicon::hinglish());

    let settings = ClassifierSettings::new().with_kind(ClassifierKind::Llm);
    let err = build_classifier(&settings, lexicon.clone()).err().unwrap();
    assert!(matches!(err, AnalyzerError::Config { .. }));

    let settings = ClassifierSettings::new()
        .with_kind(ClassifierKind::HuggingFace)
        .with_hf_api_key("hf-test");
    let classifier = build_classifier(&settings, lexicon).unwrap();
    assert_eq!(classifier.name(), "huggingface");
}

#[tokio::test]
async fn test_build_classifier_uses_configured_base_urls() {
    let lexicon = Arc::new(Lexicon::hinglish());

    let (openai, openai_seen) = fake_openai("Sentiment: Neutral\nRed flags: None").await;
    let settings = ClassifierSettings::new()
        .with_kind(ClassifierKind::Llm)
        .with_openai_api_key("sk-built")
        .with_openai_base_url(openai);
    let llm = build_classifier(&settings, lexicon.clone()).unwrap();
    let c = llm.classify_message("theek hai").await.unwrap();
    assert_eq!(c.sentiment, Some(Sentiment::Neutral));
    assert_eq!(openai_seen.lock().unwrap()[0].0, "Bearer sk-built");

    let (hf, hf_seen) = fake_huggingface(json!([{ "label": "3 stars", "score": 0.8 }])).await;
    let settings = ClassifierSettings::new()
        .with_kind(ClassifierKind::HuggingFace)
        .with_hf_api_key("hf-built")
        .with_hf_base_url(hf);
    let huggingface = build_classifier(&settings, lexicon).unwrap();
    let c = huggingface.classify_message("theek hai").await.unwrap();
    assert_eq!(c.sentiment, Some(Sentiment::Neutral));
    assert_eq!(hf_seen.lock().unwrap()[0].1, json!({ "inputs": "theek hai" }));
}
