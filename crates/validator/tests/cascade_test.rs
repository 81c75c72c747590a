//! Cascade, dependent rules and fault propagation.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use ruleweave_validator::prelude::*;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Records every call and fails when told to.
struct Stub {
    calls: Arc<AtomicUsize>,
    pass: bool,
}

impl Stub {
    fn new(pass: bool) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: Arc::clone(&calls),
                pass,
            },
            calls,
        )
    }
}

#[async_trait]
impl Worker for Stub {
    fn execute(&self, ctx: &PropertyContext<'_>) -> EngineResult<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.pass {
            ctx.add_failure(ValidationFailure::new(ctx.property_name(), "stub failure"));
        }
        Ok(self.pass)
    }
}

fn validator(rule: Rule) -> Validator {
    Validator::builder("Customer").rule(rule).build()
}

#[test]
fn test_stop_on_first_failure_skips_later_elements() {
    let (first, first_calls) = Stub::new(false);
    let (second, second_calls) = Stub::new(true);
    let (third, third_calls) = Stub::new(false);

    let validator = validator(
        Rule::for_property("Name")
            .cascade(CascadeMode::StopOnFirstFailure)
            .must(first)
            .must(second)
            .must(third),
    );
    let result = validator.validate_value(json!({"Name": "x"})).unwrap();

    assert_eq!(result.failures().len(), 1);
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    assert_eq!(third_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_continue_runs_every_element() {
    let (first, first_calls) = Stub::new(false);
    let (second, second_calls) = Stub::new(false);

    let validator = validator(Rule::for_property("Name").must(first).must(second));
    let result = validator.validate_value(json!({"Name": "x"})).unwrap();

    assert_eq!(result.failures().len(), 2);
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_default_cascade_comes_from_config() {
    let (first, _) = Stub::new(false);
    let (second, second_calls) = Stub::new(false);

    let validator = Validator::builder("Customer")
        .config(ValidatorConfig::new().with_default_cascade(CascadeMode::StopOnFirstFailure))
        .rule(Rule::for_property("Name").must(first).must(second))
        .build();
    validator.validate_value(json!({})).unwrap();

    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_null_name_with_stop_reports_only_not_null() {
    let validator = validator(
        Rule::for_property("Name")
            .cascade(CascadeMode::StopOnFirstFailure)
            .must(NotNull)
            .must(Length::max(5)),
    );

    let result = validator.validate_value(json!({"Name": null})).unwrap();

    assert_eq!(result.failures().len(), 1);
    let failure = &result.failures()[0];
    assert_eq!(failure.property_name(), "Name");
    assert_eq!(failure.error_code(), Some("not_null"));
    assert_eq!(failure.message(), "'Name' must not be null.");
}

#[test]
fn test_dependent_rules_run_only_after_success() {
    let (dependent, dependent_calls) = Stub::new(false);
    let validator = validator(
        Rule::for_property("Name")
            .must(NotEmpty)
            .dependent_rule(Rule::for_property("Email").must(dependent)),
    );

    let result = validator.validate_value(json!({"Name": ""})).unwrap();
    assert_eq!(result.property_names(), vec!["Name"]);
    assert_eq!(dependent_calls.load(Ordering::SeqCst), 0);

    let result = validator.validate_value(json!({"Name": "Ada"})).unwrap();
    assert_eq!(result.property_names(), vec!["Email"]);
    assert_eq!(dependent_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_dependent_rules_run_in_order() {
    let validator = validator(
        Rule::for_property("Name")
            .dependent_rule(Rule::for_property("B").must(NotNull))
            .dependent_rule(Rule::for_property("A").must(NotNull)),
    );

    let result = validator.validate_value(json!({})).unwrap();
    assert_eq!(result.property_names(), vec!["B", "A"]);
}

#[test]
fn test_on_failure_receives_container() {
    let seen = Arc::new(parking_lot::Mutex::new(None));
    let sink = Arc::clone(&seen);

    let validator = validator(
        Rule::for_property("Name")
            .must(NotEmpty)
            .on_failure(move |container| *sink.lock() = Some(container.clone())),
    );

    validator.validate_value(json!({"Name": "ok"})).unwrap();
    assert!(seen.lock().is_none());

    validator.validate_value(json!({"Name": "", "Id": 7})).unwrap();
    assert_eq!(*seen.lock(), Some(json!({"Name": "", "Id": 7})));
}

#[test]
fn test_worker_fault_propagates() {
    let validator = validator(Rule::for_property("Email").must(Custom::new(|_| {
        Err(EngineError::worker(
            "unique_email",
            std::io::Error::other("backend down"),
        ))
    })));

    let error = validator.validate_value(json!({"Email": "a@b.c"})).unwrap_err();
    assert!(matches!(error, EngineError::Worker { .. }));
    assert!(error.to_string().contains("unique_email"));
}

#[test]
fn test_fault_is_not_a_failure_and_stops_the_run() {
    let (later, later_calls) = Stub::new(true);
    let validator = Validator::builder("Customer")
        .rule(Rule::for_property("Email").must(Custom::new(|_| {
            Err(EngineError::worker("boom", std::io::Error::other("x")))
        })))
        .rule(Rule::for_property("Name").must(later))
        .build();

    assert!(validator.validate_value(json!({})).is_err());
    assert_eq!(later_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_rule_level_failure_flag_is_per_element() {
    let failed = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&failed);
    let validator = validator(
        Rule::for_property("Age")
            .must(Must::new(|v| v.as_u64().is_some_and(|age| age >= 18)))
            .on_failure(move |_| flag.store(true, Ordering::SeqCst)),
    );

    validator.validate_value(json!({"Age": 30})).unwrap();
    assert!(!failed.load(Ordering::SeqCst));
    validator.validate_value(json!({"Age": 12})).unwrap();
    assert!(failed.load(Ordering::SeqCst));
}

#[test]
fn test_serializable_instance() {
    #[derive(serde::Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Customer {
        name: Option<String>,
    }

    let validator = validator(Rule::for_property("Name").must(NotNull));
    let result = validator.validate(&Customer { name: None }).unwrap();
    assert_eq!(result.property_names(), vec!["Name"]);
    assert!(validator
        .validate(&Customer {
            name: Some("Ada".into())
        })
        .unwrap()
        .is_valid());
}
