use std::path::Path;

use formkit::{FieldType, FormSession, SessionOptions, catalog::Catalog};
use kycflow::{ctx::build_registry, settings::Settings};

fn catalog() -> Catalog {
    Catalog::open(Path::new(env!("CARGO_MANIFEST_DIR")).join("config"))
}

#[test]
fn test_every_region_document_loads() {
    let catalog = catalog();
    assert!(!catalog.regions().is_empty());
    for region in catalog.regions() {
        let schema = catalog.read_schema(&region.code).unwrap();
        assert!(!schema.fields.is_empty(), "{} has no fields", region.code);
    }
}

#[tokio::test]
async fn test_netherlands_prefill() {
    let schema = catalog().load_schema("NL").unwrap();
    let registry = build_registry(&Settings::default());
    let mut session = FormSession::open("NL", &schema, &registry, SessionOptions::default());
    session.ready().await;

    let birth_date = session.field("birth_date").unwrap();
    assert_eq!(birth_date.field_type(), FieldType::Date);
    assert_eq!(birth_date.value(), "15/08/1990");
    assert!(birth_date.is_read_only());

    assert!(!session.is_submit_enabled());
    assert!(session.set_value("bsn", "12345678"));
    assert!(session.is_submit_enabled());
    assert!(session.submit().is_err());
    assert_eq!(
        session.field("bsn").unwrap().error(),
        Some("BSN must be 9 digits.")
    );

    assert!(session.set_value("bsn", "123456789"));
    let payload = session.submit().unwrap();
    assert_eq!(payload.get("last_name"), Some("Visser"));
}

#[test]
fn test_us_ssn_and_age_rules() {
    let schema = catalog().load_schema("US").unwrap();
    let mut session = FormSession::start("US", &schema, None, SessionOptions::default());
    session.set_value("first_name", "Sam");
    session.set_value("last_name", "Lee");
    session.set_value("ssn", "123-45-6789");
    session.set_value("age", "17");

    assert!(session.submit().is_err());
    assert_eq!(session.field("age").unwrap().error(), Some("Must be at least 18."));

    session.set_value("age", "40");
    assert!(session.submit().is_ok());
}
