//! Basic usage example for ruleweave-validator

use ruleweave_validator::prelude::*;
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct Line {
    sku: String,
    quantity: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Order {
    customer_name: Option<String>,
    country: String,
    zip: String,
    lines: Vec<Line>,
}

fn line_validator() -> Validator {
    Validator::builder("Line")
        .rule(Rule::for_property("sku").must(NotEmpty))
        .rule(Rule::for_property("quantity").must(Must::new(|q| q.as_u64().is_some_and(|q| q > 0))))
        .build()
}

fn order_validator() -> EngineResult<Validator> {
    let lines = Arc::new(line_validator());

    Ok(Validator::builder("Order")
        .rule(
            Rule::for_property("CustomerName")
                .cascade(CascadeMode::StopOnFirstFailure)
                .must(NotNull)
                .must(Length::max(5)),
        )
        .rule(
            Rule::for_property("Zip")
                .must(Matches::new(r"^\d{5}$")?)
                .when(Condition::new(|ctx| ctx.model()["Country"] == "US")),
        )
        .rule(Rule::for_each("Lines").must(ChildValidator::new(lines)))
        .build())
}

#[tokio::main]
async fn main() -> EngineResult<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let validator = order_validator()?;
    let order = Order {
        customer_name: Some("Bartholomew".into()),
        country: "US".into(),
        zip: "9021".into(),
        lines: vec![
            Line { sku: "A-1".into(), quantity: 2 },
            Line { sku: String::new(), quantity: 0 },
        ],
    };

    let result = validator.validate(&order)?;
    println!("{result}");

    let token = CancellationToken::new();
    let async_result = validator.validate_async(&order, &token).await?;
    assert_eq!(result.failures().len(), async_result.failures().len());

    Ok(())
}
