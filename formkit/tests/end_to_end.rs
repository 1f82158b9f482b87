use std::{collections::HashMap, sync::Arc, time::Duration};

use formkit::{
    FetcherRegistry, FormSchema, FormSession, SessionError, SessionOptions, SessionPhase,
    prefill::StaticProfileFetcher, rules::REQUIRED_MESSAGE,
};

const KYC: &str = r#"{
    "country": "Testland",
    "fields": [
        {"id": "first_name", "label": "First Name", "type": "text", "required": true},
        {"id": "age", "label": "Age", "type": "number", "required": false,
         "validation": {"minValue": 18, "maxValue": 99}}
    ]
}"#;

#[tokio::test]
async fn test_fill_and_submit_without_prefill() {
    let _ = env_logger::builder().is_test(true).try_init();

    let schema = FormSchema::from_json(KYC).unwrap();
    let registry = FetcherRegistry::new();
    let mut session = FormSession::open("TL", &schema, &registry, SessionOptions::default());
    session.ready().await;
    assert_eq!(session.phase(), SessionPhase::Ready);

    assert!(session.set_value("first_name", ""));
    assert!(session.set_value("age", "150"));
    assert!(!session.is_submit_enabled());

    let Err(SessionError::Invalid(failure)) = session.submit() else {
        panic!("submission should fail");
    };
    let messages: Vec<_> = failure.errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, [REQUIRED_MESSAGE, "Must be at most 99."]);
    assert!(!session.is_result_presented());

    session.set_value("first_name", "Sam");
    assert_eq!(session.field("first_name").unwrap().error(), None);
    assert!(session.is_submit_enabled());
    session.set_value("age", "40");

    let payload = session.submit().unwrap();
    assert_eq!(
        serde_json::to_value(&payload).unwrap(),
        serde_json::json!({"first_name": "Sam", "age": "40"})
    );
    assert_eq!(
        session.submission_result(),
        Some("{\n  \"first_name\": \"Sam\",\n  \"age\": \"40\"\n}")
    );
}

#[tokio::test]
async fn test_prefilled_fields_are_locked() {
    let schema = FormSchema::from_json(KYC).unwrap();
    let fetcher = StaticProfileFetcher::new(HashMap::from([(
        "first_name".to_string(),
        "Alex".to_string(),
    )]))
    .with_delay(Duration::from_millis(10));
    let registry = FetcherRegistry::new().with("TL", Arc::new(fetcher));

    let mut session = FormSession::open("TL", &schema, &registry, SessionOptions::default());
    assert!(session.is_loading());
    session.ready().await;

    assert!(!session.set_value("first_name", "Sam"));
    assert!(session.set_value("age", "30"));

    let payload = session.submit().unwrap();
    assert_eq!(payload.get("first_name"), Some("Alex"));
    assert_eq!(payload.get("age"), Some("30"));
}
