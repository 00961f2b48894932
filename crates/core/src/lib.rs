//! Abacus core -- the calculation engine, the calculation record model,
//! per-user usage statistics and the CSV report.
//!
//! Everything in this crate is pure: no I/O, no shared state, no clocks
//! (callers pass timestamps in). The HTTP server and the CLI are thin
//! shells around the functions exported here.

pub mod error;
pub mod numeric;
pub mod operation;
pub mod record;
pub mod report;
pub mod stats;

pub use error::CalcError;
pub use numeric::Number;
pub use operation::{evaluate, parse_inputs, resolve, Arity, Calculation, OperationKind};
pub use record::CalculationRecord;
pub use report::{export_filename, render_csv};
pub use stats::{compute_stats, summarize, CalculationStats};

/// Resolve a raw operation name and evaluate it against raw inputs.
///
/// This is the single entry point the outer layers use for one-shot
/// evaluation. The operation name is validated before the inputs, so an
/// unknown operation always reports `UnsupportedOperation` regardless of
/// what the inputs look like.
pub fn resolve_and_evaluate(
    raw_kind: &serde_json::Value,
    raw_inputs: &serde_json::Value,
) -> Result<(OperationKind, Number), CalcError> {
    let kind = resolve(raw_kind)?;
    let inputs = parse_inputs(raw_inputs)?;
    let result = evaluate(kind, &inputs)?;
    Ok((kind, result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolve_and_evaluate_normalizes_name() {
        let (kind, result) = resolve_and_evaluate(&json!(" Multiplication "), &json!([2, 3, 4]))
            .expect("valid calculation");
        assert_eq!(kind, OperationKind::Multiplication);
        assert_eq!(result, Number::Int(24));
    }

    #[test]
    fn unknown_operation_wins_over_bad_inputs() {
        let err = resolve_and_evaluate(&json!("sqrt"), &json!("not a list")).unwrap_err();
        assert_eq!(err, CalcError::UnsupportedOperation);
    }

    #[test]
    fn bad_inputs_reported_for_known_operation() {
        let err = resolve_and_evaluate(&json!("addition"), &json!(5)).unwrap_err();
        assert!(matches!(err, CalcError::InvalidInputs { .. }));
    }
}
