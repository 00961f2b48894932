//! Behavioural properties of the calculation engine and the statistics
//! aggregator, exercised through the public API only.

use abacus_core::{
    compute_stats, resolve_and_evaluate, CalcError, CalculationRecord, Number, OperationKind,
};
use serde_json::json;
use time::macros::datetime;
use uuid::Uuid;

// ──────────────────────────────────────────────
// Engine
// ──────────────────────────────────────────────

fn run(kind: &str, inputs: serde_json::Value) -> Result<Number, CalcError> {
    resolve_and_evaluate(&json!(kind), &inputs).map(|(_, result)| result)
}

#[test]
fn valid_arity_always_yields_a_real_number() {
    let cases = [
        ("addition", json!([1.5, 2, -3])),
        ("subtraction", json!([10, 0.25])),
        ("multiplication", json!([-2, 3.5])),
        ("division", json!([7, -2])),
        ("exponentiation", json!([1.5, 2, 2])),
        ("power", json!([9, 0.5])),
        ("modulus", json!([7.5, 2])),
    ];
    for (kind, inputs) in cases {
        let result = run(kind, inputs).unwrap_or_else(|e| panic!("{kind}: {e}"));
        assert!(result.as_f64().is_finite(), "{kind} gave {result}");
    }
}

#[test]
fn subtraction_is_order_sensitive() {
    assert_eq!(run("subtraction", json!([20, 5, 3])), Ok(Number::Int(12)));
    assert_eq!(run("subtraction", json!([5, 20, 3])), Ok(Number::Int(-18)));
}

#[test]
fn division_examples() {
    assert_eq!(run("division", json!([100, 2, 5])), Ok(Number::Float(10.0)));
    assert_eq!(run("division", json!([50, 0, 5])), Err(CalcError::DivisionByZero));
}

#[test]
fn power_examples() {
    assert_eq!(run("power", json!([2, 4])), Ok(Number::Float(16.0)));
    assert!(matches!(
        run("power", json!([2, 3, 4])),
        Err(CalcError::InvalidInputs { .. })
    ));
}

#[test]
fn modulus_examples() {
    assert_eq!(run("modulus", json!([10, 3])), Ok(Number::Float(1.0)));
    assert_eq!(run("modulus", json!([10, 0])), Err(CalcError::ModulusByZero));
}

#[test]
fn exponentiation_example() {
    assert_eq!(run("exponentiation", json!([2, 3])), Ok(Number::Float(8.0)));
}

#[test]
fn resolution_examples() {
    let (kind, _) = resolve_and_evaluate(&json!("  Addition  "), &json!([1, 1])).unwrap();
    assert_eq!(kind, OperationKind::Addition);
    assert_eq!(
        resolve_and_evaluate(&json!(123), &json!([1, 1])),
        Err(CalcError::UnsupportedOperation)
    );
    assert_eq!(
        resolve_and_evaluate(&json!("unknown"), &json!([1, 1])),
        Err(CalcError::UnsupportedOperation)
    );
}

#[test]
fn error_messages_are_user_facing() {
    assert_eq!(
        CalcError::UnsupportedOperation.to_string(),
        "Unsupported calculation type"
    );
    assert_eq!(
        run("addition", json!([1])).unwrap_err().to_string(),
        "Inputs must contain at least two numbers."
    );
    assert_eq!(
        run("division", json!([1, 0])).unwrap_err().to_string(),
        "Cannot divide by zero."
    );
}

// ──────────────────────────────────────────────
// Statistics
// ──────────────────────────────────────────────

#[test]
fn stats_over_created_records() {
    let owner = Uuid::new_v4();
    let records = vec![
        CalculationRecord::create(
            owner,
            &json!("addition"),
            &json!([1, 2]),
            datetime!(2025-12-01 09:00:00 UTC),
        )
        .unwrap(),
        CalculationRecord::create(
            owner,
            &json!("multiplication"),
            &json!([2, 3, 4]),
            datetime!(2025-12-02 09:00:00 UTC),
        )
        .unwrap(),
    ];

    let stats = compute_stats(&owner.to_string(), &records);
    assert_eq!(stats.total_calculations, 2);
    assert!((stats.average_operands - 2.5).abs() < 1e-9);
    assert_eq!(
        stats.last_calculation_date.as_deref(),
        Some("2025-12-02T09:00:00Z")
    );

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(
        json["operations_breakdown"],
        json!({"addition": 1, "multiplication": 1})
    );
    assert_eq!(json["most_used_operation"], json!("addition"));
}

#[test]
fn empty_stats_json_shape() {
    let stats = compute_stats(&Uuid::new_v4().to_string(), &[]);
    assert_eq!(
        serde_json::to_value(&stats).unwrap(),
        json!({
            "total_calculations": 0,
            "average_operands": 0.0,
            "operations_breakdown": {},
            "most_used_operation": null,
            "last_calculation_date": null,
        })
    );
}
