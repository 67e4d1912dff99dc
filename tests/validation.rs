use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use honeyform::{Captcha, CaptchaError, CaptchaOptions, FormGenerator, TimingViolation};

const FORM_ID: &str = "registration";
const SECRET: &str = "correct horse battery staple";

fn generated_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 5, 1, 10, 0, 0).unwrap()
}

fn captcha_at(now: DateTime<Utc>) -> Captcha {
    Captcha::with_options(
        FORM_ID,
        SECRET,
        CaptchaOptions::default().with_clock(move || now),
    )
    .unwrap()
}

fn after(elapsed: Duration) -> Captcha {
    captcha_at(generated_at() + elapsed)
}

fn new_form() -> FormGenerator {
    captcha_at(generated_at()).generator().unwrap()
}

/// What a browser posts back after a human fills in name and email.
fn honest_submission(form: &FormGenerator) -> BTreeMap<String, String> {
    let mut sub = BTreeMap::new();
    let meta = form.metadata_field();
    sub.insert(meta.name.clone(), meta.value.clone());
    for hp in form.honeypots() {
        sub.insert(hp.field_id().to_string(), String::new());
    }
    sub.insert(form.field_name("name").unwrap(), "Ada".to_string());
    sub.insert(form.field_name("email").unwrap(), "ada@example.com".to_string());
    sub
}

#[test]
fn honest_submission_validates() {
    let form = new_form();
    let data = after(Duration::seconds(60))
        .validate(honest_submission(&form))
        .unwrap();

    assert_eq!(data.get("name"), Some("Ada"));
    assert_eq!(data.get("email"), Some("ada@example.com"));
    assert!(!data.contains_key(form.metadata_field_name()));

    let real: Vec<_> = data.iter().filter(|(_, v)| !v.is_empty()).collect();
    assert_eq!(real.len(), 2);
    assert_eq!(data.metadata().form_id(), FORM_ID);
}

#[test]
fn accepts_anywhere_in_window() {
    let form = new_form();
    for elapsed in [
        Duration::seconds(15),
        Duration::minutes(5),
        Duration::hours(23),
        Duration::hours(24),
    ] {
        assert!(
            after(elapsed).validate(honest_submission(&form)).is_ok(),
            "{:?}",
            elapsed
        );
    }
}

#[test]
fn too_fast() {
    let form = new_form();
    let err = after(Duration::seconds(2))
        .validate(honest_submission(&form))
        .unwrap_err();
    assert!(matches!(err, CaptchaError::Timing(TimingViolation::TooFast)));
    assert!(err.is_turing_test_failure());
}

#[test]
fn too_old() {
    let form = new_form();
    let err = after(Duration::hours(60))
        .validate(honest_submission(&form))
        .unwrap_err();
    assert!(matches!(err, CaptchaError::Timing(TimingViolation::TooOld)));
}

#[test]
fn removed_honeypot() {
    let form = new_form();
    let mut sub = honest_submission(&form);
    let removed = form.honeypots()[1].field_id().to_string();
    sub.remove(&removed);

    match after(Duration::seconds(60)).validate(sub) {
        Err(CaptchaError::HoneypotMissing { field }) => assert_eq!(field, removed),
        other => panic!("expected HoneypotMissing, got {:?}", other),
    }
}

#[test]
fn filled_honeypot() {
    let form = new_form();
    let mut sub = honest_submission(&form);
    let filled = form.honeypots()[0].field_id().to_string();
    sub.insert(filled.clone(), "buy now".into());

    let err = after(Duration::seconds(60)).validate(sub).unwrap_err();
    match &err {
        CaptchaError::HoneypotFilled { field, value } => {
            assert_eq!(field, &filled);
            assert_eq!(value, "buy now");
        }
        other => panic!("expected HoneypotFilled, got {:?}", other),
    }
    assert!(!err.to_string().contains("buy now"));
}

#[test]
fn metadata_signed_with_other_secret() {
    let forged = Captcha::new(FORM_ID, "some other secret")
        .unwrap()
        .generator_at(generated_at())
        .unwrap();
    let form = new_form();
    let mut sub = honest_submission(&form);
    sub.insert(
        form.metadata_field_name().to_string(),
        forged.metadata_field().value.clone(),
    );

    let err = after(Duration::seconds(60)).validate(sub).unwrap_err();
    assert!(matches!(err, CaptchaError::InvalidSignature));
    assert!(!err.is_turing_test_failure());
}

#[test]
fn flipped_token_byte() {
    let form = new_form();
    let mut sub = honest_submission(&form);
    let token = sub.get_mut(form.metadata_field_name()).unwrap();
    let flipped = if token.starts_with('A') { "B" } else { "A" };
    token.replace_range(0..1, flipped);

    assert!(matches!(
        after(Duration::seconds(60)).validate(sub),
        Err(CaptchaError::InvalidSignature)
    ));
}

#[test]
fn missing_metadata() {
    let form = new_form();
    let mut sub = honest_submission(&form);
    sub.remove(form.metadata_field_name());

    let err = after(Duration::seconds(60)).validate(sub).unwrap_err();
    assert!(matches!(err, CaptchaError::MissingMetadata));
    assert_eq!(err.code(), 1);
}

#[test]
fn token_from_other_form() {
    // Keys are bound to the form id, so another form's token does not even
    // verify, let alone reach the form id comparison.
    let other = Captcha::new("newsletter", SECRET)
        .unwrap()
        .generator_at(generated_at())
        .unwrap();
    let form = new_form();
    let mut sub = honest_submission(&form);
    sub.insert(
        form.metadata_field_name().to_string(),
        other.metadata_field().value.clone(),
    );

    assert!(matches!(
        after(Duration::seconds(60)).validate(sub),
        Err(CaptchaError::InvalidSignature)
    ));
}

#[test]
fn foreign_fields_are_kept() {
    let form = new_form();
    let mut sub = honest_submission(&form);
    sub.insert("utm_source".into(), "newsletter".into());

    let data = after(Duration::seconds(60)).validate(sub).unwrap();
    assert_eq!(data.get("utm_source"), Some("newsletter"));
}

#[test]
fn entry_points_with_default_options() {
    let form = honeyform::generate(FORM_ID, SECRET).unwrap();
    let sub = honest_submission(&form);
    // Generated just now, so well inside the minimum delay.
    assert!(matches!(
        honeyform::validate(FORM_ID, SECRET, sub),
        Err(CaptchaError::Timing(TimingViolation::TooFast))
    ));
}

#[test]
fn transport_object_round_trip() {
    let form = new_form();
    let transport = form.to_transport_object(&["email"]).unwrap();

    let mut sub = BTreeMap::new();
    sub.insert(transport.meta_data.name.clone(), transport.meta_data.value.clone());
    for hp in &transport.honeypots {
        sub.insert(hp.name.clone(), hp.value.clone());
    }
    let email_key = transport.fields["email"].as_str().unwrap().to_string();
    sub.insert(email_key, "ada@example.com".to_string());

    let data = after(Duration::minutes(2)).validate(sub).unwrap();
    assert_eq!(data.get("email"), Some("ada@example.com"));
}

#[test]
fn rejects_empty_secret_and_bad_window() {
    assert!(matches!(
        Captcha::new(FORM_ID, ""),
        Err(CaptchaError::Crypto(_))
    ));
    let opts = CaptchaOptions {
        min_delay: Duration::hours(1),
        max_age: Duration::minutes(1),
        ..Default::default()
    };
    assert!(matches!(
        Captcha::with_options(FORM_ID, SECRET, opts),
        Err(CaptchaError::InvalidOptions(_))
    ));
}

#[test]
fn missing_metadata_reported_before_honeypots() {
    let form = new_form();
    let mut sub = honest_submission(&form);
    sub.remove(form.metadata_field_name());
    sub.insert(form.honeypots()[0].field_id().to_string(), "spam".into());

    assert!(matches!(
        after(Duration::seconds(60)).validate(sub),
        Err(CaptchaError::MissingMetadata)
    ));
}

#[test]
fn timing_reported_before_honeypots() {
    let form = new_form();

    let mut filled = honest_submission(&form);
    filled.insert(form.honeypots()[0].field_id().to_string(), "spam".into());
    assert!(matches!(
        after(Duration::seconds(2)).validate(filled),
        Err(CaptchaError::Timing(TimingViolation::TooFast))
    ));

    let mut missing = honest_submission(&form);
    missing.remove(form.honeypots()[0].field_id());
    assert!(matches!(
        after(Duration::hours(60)).validate(missing),
        Err(CaptchaError::Timing(TimingViolation::TooOld))
    ));
}
