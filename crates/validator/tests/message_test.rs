//! Messages, failure metadata and rule selection.

use pretty_assertions::assert_eq;
use ruleweave_validator::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn customer() -> Validator {
    let address = Arc::new(
        Validator::builder("Address")
            .rule(Rule::for_property("Zip").must(Length::exact(5)))
            .rule(Rule::for_property("City").must(NotEmpty))
            .build(),
    );

    Validator::builder("Customer")
        .rule(Rule::for_property("CustomerName").must(NotNull))
        .rule(Rule::for_property("Email").must(Matches::new(r"^[^@\s]+@[^@\s]+$").unwrap()))
        .rule(Rule::for_property("Address").must(ChildValidator::new(address)))
        .rule(
            Rule::for_property("Discount")
                .in_rule_sets(["admin"])
                .must(Must::new(|d| d.as_u64().is_some_and(|d| d <= 50))),
        )
        .build()
}

#[test]
fn test_result_display() {
    let result = customer()
        .validate_value(json!({
            "Email": "nope",
            "Discount": 10,
            "Address": {"Zip": "123", "City": "Oslo"}
        }))
        .unwrap();

    insta::assert_snapshot!(result.to_string().trim_end(), @r"
    Validation failed with 3 failure(s):
      1. CustomerName: 'Customer Name' must not be null.
      2. Email: 'Email' is not in the correct format.
      3. Address.Zip: 'Zip' must be 5 characters in length. You entered 3 characters.
    ");
}

#[test]
fn test_rule_set_selector() {
    let validator = customer();
    let instance = json!({"CustomerName": "Ada", "Email": "x", "Discount": 90, "Address": null});

    let default = validator
        .validate_with(
            instance.clone(),
            ValidateOptions::new().with_selector(RuleSetSelector::new(["default"])),
        )
        .unwrap();
    assert_eq!(default.property_names(), vec!["Email"]);

    let admin = validator
        .validate_with(
            instance.clone(),
            ValidateOptions::new().with_selector(RuleSetSelector::new(["admin"])),
        )
        .unwrap();
    assert_eq!(admin.property_names(), vec!["Discount"]);

    let all = validator
        .validate_with(instance, ValidateOptions::new().with_selector(RuleSetSelector::new(["*"])))
        .unwrap();
    assert_eq!(all.property_names(), vec!["Email", "Discount"]);
}

#[test]
fn test_member_name_selector_reaches_into_children() {
    let validator = customer();
    let result = validator
        .validate_with(
            json!({"Email": "x", "Address": {"Zip": "1", "City": ""}}),
            ValidateOptions::new().with_selector(MemberNameSelector::new(["Address.Zip"])),
        )
        .unwrap();

    assert_eq!(result.property_names(), vec!["Address.Zip"]);
}

#[test]
fn test_element_metadata_overrides() {
    let validator = Validator::builder("Customer")
        .rule(
            Rule::for_property("Age").must_with(
                Must::new(|age| age.as_u64().is_some_and(|age| age >= 18)),
                ElementMetadata::new()
                    .with_message("{PropertyName} is {PropertyValue}, too young")
                    .with_error_code("too_young")
                    .with_severity(Severity::Warning)
                    .with_custom_state(|ctx| json!({"limit": 18, "actual": ctx.value()})),
            ),
        )
        .build();

    let result = validator.validate_value(json!({"Age": 12})).unwrap();
    let failure = &result.failures()[0];

    assert_eq!(failure.message(), "Age is 12, too young");
    assert_eq!(failure.error_code(), Some("too_young"));
    assert_eq!(failure.severity(), Severity::Warning);
    assert_eq!(failure.custom_state(), Some(&json!({"limit": 18, "actual": 12})));
    assert_eq!(result.warnings().count(), 1);
    assert_eq!(result.errors().count(), 0);
}

#[test]
fn test_dynamic_message_and_placeholders() {
    let validator = Validator::builder("Customer")
        .rule(Rule::for_property("Nickname").must_with(
            MaxLength::new(3),
            ElementMetadata::new()
                .with_message_fn(|ctx| format!("{} too long for {{PropertyName}}", ctx.value())),
        ))
        .build();

    let result = validator.validate_value(json!({"Nickname": "abcd"})).unwrap();
    let failure = &result.failures()[0];
    assert_eq!(failure.message(), "\"abcd\" too long for Nickname");
    assert_eq!(failure.placeholders().get("MaxLength"), Some(&json!(3)));
    assert_eq!(failure.placeholders().get("TotalLength"), Some(&json!(4)));
    assert_eq!(failure.attempted_value(), &json!("abcd"));
}

#[test]
fn test_attempted_value_is_not_reformatted() {
    let validator = Validator::builder("Customer")
        .rule(Rule::for_property("Name").must_with(
            Length::max(2),
            ElementMetadata::new().with_message("value {PropertyValue} too long ({TotalLength})"),
        ))
        .build();

    let result = validator.validate_value(json!({"Name": "{TotalLength}"})).unwrap();
    assert_eq!(result.failures()[0].message(), "value {TotalLength} too long (13)");
}

#[test]
fn test_display_names() {
    let validator = Validator::builder("Customer")
        .config(ValidatorConfig::new().with_display_name_resolver(|query| {
            (query.container_type == "Customer" && query.member == Some("Zip"))
                .then(|| "Postal code".to_owned())
        }))
        .rule(Rule::for_property("Zip").must(NotNull))
        .rule(Rule::for_property("FirstName").must(NotNull))
        .rule(Rule::for_property("Surname").with_display_name("Last name").must(NotNull))
        .rule(
            Rule::for_instance()
                .with_display_name_fn(|c| format!("{} record", c["Kind"].as_str().unwrap_or("?")))
                .must(Must::new(|c| c.get("Id").is_some())),
        )
        .build();

    let result = validator.validate_value(json!({"Kind": "retail"})).unwrap();
    let messages: Vec<_> = result.failures().iter().map(ValidationFailure::message).collect();
    assert_eq!(
        messages,
        vec![
            "'Postal code' must not be null.",
            "'First Name' must not be null.",
            "'Last name' must not be null.",
            "The specified condition was not met for 'retail record'.",
        ]
    );
    assert_eq!(result.failures()[3].property_name(), "retail record");
}

#[test]
fn test_message_builder_sees_default_message() {
    let validator = Validator::builder("Customer")
        .rule(
            Rule::for_property("Name")
                .must(NotNull)
                .with_message_builder(|ctx| {
                    format!("[{}] {}", ctx.property.property_name(), ctx.default_message())
                }),
        )
        .build();

    let result = validator.validate_value(json!({})).unwrap();
    assert_eq!(result.failures()[0].message(), "[Name] 'Name' must not be null.");
}

#[test]
fn test_error_code_resolver_applies_to_defaults_only() {
    let validator = Validator::builder("Customer")
        .config(ValidatorConfig::new().with_error_code_resolver(|code| code.to_uppercase()))
        .rule(Rule::for_property("Name").must(NotNull))
        .rule(Rule::for_property("Email").must_with(
            NotNull,
            ElementMetadata::new().with_error_code("email_required"),
        ))
        .build();

    let result = validator.validate_value(json!({})).unwrap();
    let codes: Vec<_> = result.failures().iter().map(|f| f.error_code()).collect();
    assert_eq!(codes, vec![Some("NOT_NULL"), Some("email_required")]);
}

#[test]
fn test_transform_changes_validated_value() {
    let validator = Validator::builder("Customer")
        .rule(
            Rule::for_property("Code")
                .transform(|v| json!(v.as_str().map(str::trim)))
                .must(Length::exact(3)),
        )
        .build();

    assert!(validator.validate_value(json!({"Code": "  abc "})).unwrap().is_valid());
    let result = validator.validate_value(json!({"Code": " ab "})).unwrap();
    assert_eq!(result.failures()[0].attempted_value(), &json!("ab"));
}

#[test]
fn test_shared_data_visible_to_workers() {
    let validator = Validator::builder("Customer")
        .rule(Rule::for_property("Email").must(Custom::new(|ctx| {
            let blocked = ctx.shared().get("blocked").unwrap_or_default();
            if blocked.as_array().is_some_and(|b| b.contains(ctx.value())) {
                ctx.add_failure(ValidationFailure::new(ctx.property_name(), "blocked address"));
            }
            Ok(())
        })))
        .build();

    let shared: SharedData = [("blocked".to_owned(), json!(["spam@x.io"]))].into_iter().collect();
    let result = validator
        .validate_with(
            json!({"Email": "spam@x.io"}),
            ValidateOptions::new().with_shared_data(shared),
        )
        .unwrap();
    assert_eq!(result.failures()[0].message(), "blocked address");
}
