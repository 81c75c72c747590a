//! Collection rules, nested validators and path construction.

use pretty_assertions::assert_eq;
use ruleweave_validator::prelude::*;
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_failing_element_reports_indexed_path() {
    let validator = Validator::builder("Order")
        .rule(Rule::for_each("Items").must(NotEmpty))
        .build();

    let result = validator
        .validate_value(json!({"Items": ["a", "", "c"]}))
        .unwrap();

    assert_eq!(result.property_names(), vec!["Items[1]"]);
    assert_eq!(result.failures()[0].attempted_value(), &json!(""));
}

#[test]
fn test_non_array_and_null_are_trivially_valid() {
    let validator = Validator::builder("Order")
        .rule(Rule::for_each("Items").must(NotEmpty))
        .build();

    assert!(validator.validate_value(json!({})).unwrap().is_valid());
    assert!(validator.validate_value(json!({"Items": null})).unwrap().is_valid());
    assert!(validator.validate_value(json!({"Items": "abc"})).unwrap().is_valid());
}

#[test]
fn test_null_elements_and_filtered_elements_are_skipped() {
    let item = Arc::new(
        Validator::builder("Item")
            .rule(Rule::for_property("Sku").must(NotEmpty))
            .build(),
    );
    let validator = Validator::builder("Order")
        .rule(
            Rule::for_each_with(
                "Items",
                CollectionOptions::new().with_filter(|item| item["Active"] == true),
            )
            .must(ChildValidator::new(item)),
        )
        .build();

    let result = validator
        .validate_value(json!({"Items": [
            {"Active": false, "Sku": ""},
            null,
            {"Active": true, "Sku": ""}
        ]}))
        .unwrap();

    assert_eq!(result.property_names(), vec!["Items[0].Sku"]);
}

#[test]
fn test_running_counter_counts_validated_elements_only() {
    let validator = Validator::builder("Order")
        .rule(
            Rule::for_each_with(
                "Items",
                CollectionOptions::new().with_filter(|item| item.as_str() != Some("skip")),
            )
            .must(Length::min(2)),
        )
        .build();

    let result = validator
        .validate_value(json!({"Items": ["skip", null, "ok", "x", "skip", "y"]}))
        .unwrap();

    // validated: "ok" -> [0], "x" -> [1], "y" -> [2]
    assert_eq!(result.property_names(), vec!["Items[1]", "Items[2]"]);
}

#[test]
fn test_display_index_from_element() {
    let lines = Arc::new(
        Validator::builder("Line")
            .rule(
                Rule::for_property("Quantity")
                    .must(Must::new(|q| q.as_u64().is_some_and(|q| q > 0))),
            )
            .build(),
    );
    let validator = Validator::builder("Order")
        .rule(
            Rule::for_each_with(
                "Lines",
                CollectionOptions::new()
                    .with_display_index(|line| line["Sku"].as_str().map(str::to_owned)),
            )
            .must(ChildValidator::new(lines)),
        )
        .build();

    let result = validator
        .validate_value(json!({"Lines": [
            {"Sku": "A-1", "Quantity": 1},
            {"Sku": "B-2", "Quantity": 0},
            {"Quantity": 0}
        ]}))
        .unwrap();

    // the element without a key falls back to its position among validated elements
    assert_eq!(
        result.property_names(),
        vec!["Lines[B-2].Quantity", "Lines[2].Quantity"]
    );
}

#[test]
fn test_nested_collections_build_full_path() {
    let line = Arc::new(
        Validator::builder("Line")
            .rule(Rule::for_property("Sku").must(NotEmpty))
            .build(),
    );
    let order = Arc::new(
        Validator::builder("Order")
            .rule(Rule::for_each("Lines").must(ChildValidator::new(line)))
            .build(),
    );
    let customer = Validator::builder("Customer")
        .rule(Rule::for_each("Orders").must(ChildValidator::new(order)))
        .build();

    let result = customer
        .validate_value(json!({"Orders": [
            {"Lines": [{"Sku": "a"}]},
            {"Lines": [{"Sku": "b"}, {"Sku": ""}]}
        ]}))
        .unwrap();

    assert_eq!(result.property_names(), vec!["Orders[1].Lines[1].Sku"]);
}

#[test]
fn test_nested_object_path_and_null_child() {
    let address = Arc::new(
        Validator::builder("Address")
            .rule(Rule::for_property("Zip").must(NotEmpty))
            .build(),
    );
    let validator = Validator::builder("Customer")
        .rule(Rule::for_property("Address").must(ChildValidator::new(address)))
        .build();

    let result = validator
        .validate_value(json!({"Address": {"Zip": ""}}))
        .unwrap();
    assert_eq!(result.property_names(), vec!["Address.Zip"]);

    // a null child is skipped rather than failed
    assert!(validator.validate_value(json!({"Address": null})).unwrap().is_valid());
}

#[test]
fn test_sibling_paths_do_not_leak() {
    let address = Arc::new(
        Validator::builder("Address")
            .rule(Rule::for_property("Zip").must(NotEmpty))
            .build(),
    );
    let validator = Validator::builder("Customer")
        .rule(Rule::for_property("Home").must(ChildValidator::new(Arc::clone(&address))))
        .rule(Rule::for_property("Work").must(ChildValidator::new(address)))
        .rule(Rule::for_property("Name").must(NotEmpty))
        .build();

    let result = validator
        .validate_value(json!({"Home": {"Zip": ""}, "Work": {"Zip": ""}}))
        .unwrap();
    assert_eq!(
        result.property_names(),
        vec!["Home.Zip", "Work.Zip", "Name"]
    );
}

#[test]
fn test_child_validator_factory_chooses_by_container() {
    let strict = Arc::new(
        Validator::builder("Address")
            .rule(Rule::for_property("Zip").must(Length::exact(5)))
            .build(),
    );
    let lenient = Arc::new(Validator::builder("Address").build());

    let validator = Validator::builder("Customer")
        .rule(Rule::for_property("Address").must(ChildValidator::from_factory(move |customer| {
            if customer["Country"] == "US" {
                Arc::clone(&strict)
            } else {
                Arc::clone(&lenient)
            }
        })))
        .build();

    let address = json!({"Zip": "123"});
    assert!(!validator
        .validate_value(json!({"Country": "US", "Address": address}))
        .unwrap()
        .is_valid());
    assert!(validator
        .validate_value(json!({"Country": "NL", "Address": address}))
        .unwrap()
        .is_valid());
}

#[test]
fn test_collection_without_name_is_configuration_error() {
    let validator = Validator::builder("Order")
        .rule(Rule::for_instance().must_each(NotEmpty, CollectionOptions::new()))
        .build();

    let error = validator.validate_value(json!(["a", ""])).unwrap_err();
    assert!(error.is_configuration());
}

#[test]
fn test_collection_without_name_over_object_is_valid() {
    let validator = Validator::builder("Order")
        .rule(Rule::for_instance().must_each(NotEmpty, CollectionOptions::new()))
        .build();

    assert!(validator.validate_value(json!({"a": 1})).unwrap().is_valid());
    assert!(validator.validate_value(json!("text")).unwrap().is_valid());
}

#[test]
fn test_collection_worker_on_plain_rule() {
    let validator = Validator::builder("Order")
        .rule(
            Rule::for_property("Tags")
                .must(NotEmpty)
                .must_each(Length::max(3), CollectionOptions::new()),
        )
        .build();

    let result = validator
        .validate_value(json!({"Tags": ["abc", "abcd"]}))
        .unwrap();
    assert_eq!(result.property_names(), vec!["Tags[1]"]);

    let result = validator.validate_value(json!({"Tags": []})).unwrap();
    assert_eq!(result.property_names(), vec!["Tags"]);
}

#[test]
fn test_condition_sees_container_inside_collection() {
    let validator = Validator::builder("Order")
        .rule(
            Rule::for_each("Items")
                .must(NotEmpty)
                .when(Condition::new(|ctx| ctx.model()["Strict"] == true)),
        )
        .build();

    assert!(validator
        .validate_value(json!({"Items": [""]}))
        .unwrap()
        .is_valid());
    assert_eq!(
        validator
            .validate_value(json!({"Strict": true, "Items": ["", "a", ""]}))
            .unwrap()
            .property_names(),
        vec!["Items[0]", "Items[2]"]
    );
}

#[test]
fn test_override_property_name_changes_segment() {
    let validator = Validator::builder("Order")
        .rule(
            Rule::for_each("Items")
                .override_property_name("Products")
                .must(NotEmpty),
        )
        .build();

    let result = validator.validate_value(json!({"Items": [""]})).unwrap();
    assert_eq!(result.property_names(), vec!["Products[0]"]);
}
