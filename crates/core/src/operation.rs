//! Calculation engine: operation resolution and per-operation evaluation.
//!
//! The set of operations is closed. Resolution maps a raw, user-supplied
//! name onto an [`OperationKind`]; evaluation is a single `match` over the
//! kind, with the arity rule checked before any arithmetic happens.
//!
//! Folds (subtraction, division, exponentiation) always run left to right
//! in input order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CalcError;
use crate::numeric::Number;

/// One of the seven supported arithmetic operations.
///
/// `Power` and `Exponentiation` are distinct: power takes exactly two
/// inputs, exponentiation folds over any non-empty list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Exponentiation,
    Power,
    Modulus,
}

/// How many inputs an operation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    AtLeast(usize),
    Exactly(usize),
}

impl Arity {
    pub fn accepts(self, len: usize) -> bool {
        match self {
            Arity::AtLeast(n) => len >= n,
            Arity::Exactly(n) => len == n,
        }
    }
}

impl OperationKind {
    pub const ALL: [OperationKind; 7] = [
        OperationKind::Addition,
        OperationKind::Subtraction,
        OperationKind::Multiplication,
        OperationKind::Division,
        OperationKind::Exponentiation,
        OperationKind::Power,
        OperationKind::Modulus,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Addition => "addition",
            OperationKind::Subtraction => "subtraction",
            OperationKind::Multiplication => "multiplication",
            OperationKind::Division => "division",
            OperationKind::Exponentiation => "exponentiation",
            OperationKind::Power => "power",
            OperationKind::Modulus => "modulus",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            OperationKind::Addition
            | OperationKind::Subtraction
            | OperationKind::Multiplication
            | OperationKind::Division => Arity::AtLeast(2),
            // Only the list shape is enforced for exponentiation; a single
            // element evaluates to itself.
            OperationKind::Exponentiation => Arity::AtLeast(1),
            OperationKind::Power | OperationKind::Modulus => Arity::Exactly(2),
        }
    }

    fn arity_error(self) -> CalcError {
        match self {
            OperationKind::Power => CalcError::invalid("Power requires exactly two values."),
            OperationKind::Modulus => CalcError::invalid("Modulus requires exactly two values."),
            OperationKind::Exponentiation => {
                CalcError::invalid("Inputs must contain at least one number.")
            }
            _ => CalcError::invalid("Inputs must contain at least two numbers."),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = CalcError;

    /// Case- and whitespace-insensitive lookup: `"  Addition "` is addition.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        OperationKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == key)
            .ok_or(CalcError::UnsupportedOperation)
    }
}

/// Resolve a raw operation name. Anything that is not a JSON string is
/// unsupported.
pub fn resolve(raw: &serde_json::Value) -> Result<OperationKind, CalcError> {
    raw.as_str()
        .ok_or(CalcError::UnsupportedOperation)?
        .parse()
}

/// Validate that the raw inputs are a list of numbers.
///
/// Shape only: the arity rule is operation-specific and is checked by
/// [`evaluate`].
pub fn parse_inputs(raw: &serde_json::Value) -> Result<Vec<Number>, CalcError> {
    let items = raw.as_array().ok_or_else(CalcError::not_a_list)?;
    items
        .iter()
        .map(|item| Number::from_json(item).ok_or_else(CalcError::not_a_list))
        .collect()
}

/// Evaluate an operation over its inputs.
///
/// Pure and deterministic; the inputs are never modified.
pub fn evaluate(kind: OperationKind, inputs: &[Number]) -> Result<Number, CalcError> {
    if !kind.arity().accepts(inputs.len()) {
        return Err(kind.arity_error());
    }

    let result = match kind {
        OperationKind::Addition => fold(kind, inputs, Number::add)?,
        OperationKind::Subtraction => fold(kind, inputs, Number::sub)?,
        OperationKind::Multiplication => inputs
            .iter()
            .fold(Number::Int(1), |acc, &value| acc.mul(value)),
        OperationKind::Division => divide(kind, inputs)?,
        OperationKind::Exponentiation => Number::Float(fold(kind, inputs, Number::pow)?.as_f64()),
        OperationKind::Power => match inputs {
            [base, exponent] => Number::Float(base.pow(*exponent).as_f64()),
            _ => return Err(kind.arity_error()),
        },
        OperationKind::Modulus => match inputs {
            [_, divisor] if divisor.is_zero() => return Err(CalcError::ModulusByZero),
            [dividend, divisor] => Number::Float(dividend.rem_floored(*divisor)),
            _ => return Err(kind.arity_error()),
        },
    };

    if result.is_finite() {
        Ok(result)
    } else {
        Err(CalcError::NonFiniteResult { operation: kind })
    }
}

/// Left fold seeded with the first element.
fn fold(
    kind: OperationKind,
    inputs: &[Number],
    op: impl Fn(Number, Number) -> Number,
) -> Result<Number, CalcError> {
    let (first, rest) = inputs.split_first().ok_or_else(|| kind.arity_error())?;
    Ok(rest.iter().fold(*first, |acc, &value| op(acc, value)))
}

fn divide(kind: OperationKind, inputs: &[Number]) -> Result<Number, CalcError> {
    let (first, rest) = inputs.split_first().ok_or_else(|| kind.arity_error())?;
    let mut acc = Number::Float(first.as_f64());
    for &divisor in rest {
        if divisor.is_zero() {
            return Err(CalcError::DivisionByZero);
        }
        acc = acc.div(divisor);
    }
    Ok(acc)
}

/// A resolved operation paired with its raw, not-yet-validated inputs.
///
/// Produced by the factory ([`Calculation::create`]); the result is only
/// computed on demand by [`Calculation::result`].
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    kind: OperationKind,
    inputs: serde_json::Value,
}

impl Calculation {
    /// Resolve the operation name. The inputs are carried as-is; their shape
    /// is checked when the result is computed.
    pub fn create(
        raw_kind: &serde_json::Value,
        inputs: serde_json::Value,
    ) -> Result<Self, CalcError> {
        Ok(Calculation {
            kind: resolve(raw_kind)?,
            inputs,
        })
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn inputs(&self) -> &serde_json::Value {
        &self.inputs
    }

    pub fn result(&self) -> Result<Number, CalcError> {
        evaluate(self.kind, &parse_inputs(&self.inputs)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nums(values: &[i64]) -> Vec<Number> {
        values.iter().copied().map(Number::Int).collect()
    }

    fn eval(kind: OperationKind, values: &[i64]) -> Result<Number, CalcError> {
        evaluate(kind, &nums(values))
    }

    // -- resolution --

    #[test]
    fn resolve_is_case_and_whitespace_insensitive() {
        assert_eq!(resolve(&json!("  Addition  ")), Ok(OperationKind::Addition));
        assert_eq!(resolve(&json!("POWER")), Ok(OperationKind::Power));
        assert_eq!(resolve(&json!("\tmodulus\n")), Ok(OperationKind::Modulus));
    }

    #[test]
    fn resolve_rejects_non_text() {
        assert_eq!(resolve(&json!(123)), Err(CalcError::UnsupportedOperation));
        assert_eq!(resolve(&json!(null)), Err(CalcError::UnsupportedOperation));
        assert_eq!(
            resolve(&json!(["addition"])),
            Err(CalcError::UnsupportedOperation)
        );
    }

    #[test]
    fn resolve_rejects_unknown_names() {
        assert_eq!(resolve(&json!("unknown")), Err(CalcError::UnsupportedOperation));
        assert_eq!(resolve(&json!("")), Err(CalcError::UnsupportedOperation));
        assert_eq!(resolve(&json!("add")), Err(CalcError::UnsupportedOperation));
    }

    #[test]
    fn every_kind_round_trips_through_its_name() {
        for kind in OperationKind::ALL {
            assert_eq!(kind.as_str().parse::<OperationKind>(), Ok(kind));
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                json!(kind.as_str())
            );
        }
    }

    #[test]
    fn factory_defers_input_validation() {
        let calc = Calculation::create(&json!("Division"), json!("oops")).unwrap();
        assert_eq!(calc.kind(), OperationKind::Division);
        assert_eq!(calc.inputs(), &json!("oops"));
        assert!(matches!(calc.result(), Err(CalcError::InvalidInputs { .. })));
    }

    #[test]
    fn factory_result_is_repeatable() {
        let calc = Calculation::create(&json!("subtraction"), json!([20, 5, 3])).unwrap();
        assert_eq!(calc.result(), Ok(Number::Int(12)));
        assert_eq!(calc.result(), Ok(Number::Int(12)));
        assert_eq!(calc.inputs(), &json!([20, 5, 3]));
    }

    // -- input shape --

    #[test]
    fn non_list_inputs_rejected_for_every_kind() {
        for kind in OperationKind::ALL {
            for raw in [json!("1,2"), json!(null), json!(5), json!({"a": 1})] {
                let calc = Calculation::create(&json!(kind.as_str()), raw).unwrap();
                match calc.result() {
                    Err(CalcError::InvalidInputs { reason }) => {
                        assert_eq!(reason, "Inputs must be a list of numbers.")
                    }
                    other => panic!("{}: expected InvalidInputs, got {:?}", kind, other),
                }
            }
        }
    }

    #[test]
    fn non_numeric_element_rejected() {
        let err = parse_inputs(&json!([1, "2"])).unwrap_err();
        assert_eq!(err, CalcError::not_a_list());
    }

    // -- arity --

    #[test]
    fn binary_folds_need_two_inputs() {
        for kind in [
            OperationKind::Addition,
            OperationKind::Subtraction,
            OperationKind::Multiplication,
            OperationKind::Division,
        ] {
            assert_eq!(
                eval(kind, &[5]),
                Err(CalcError::invalid("Inputs must contain at least two numbers."))
            );
            assert!(eval(kind, &[]).is_err());
        }
    }

    #[test]
    fn power_needs_exactly_two() {
        assert_eq!(
            eval(OperationKind::Power, &[2, 3, 4]),
            Err(CalcError::invalid("Power requires exactly two values."))
        );
        assert!(eval(OperationKind::Power, &[2]).is_err());
    }

    #[test]
    fn modulus_needs_exactly_two() {
        assert_eq!(
            eval(OperationKind::Modulus, &[10, 3, 2]),
            Err(CalcError::invalid("Modulus requires exactly two values."))
        );
    }

    #[test]
    fn exponentiation_accepts_single_input() {
        assert_eq!(eval(OperationKind::Exponentiation, &[7]), Ok(Number::Float(7.0)));
    }

    #[test]
    fn exponentiation_rejects_empty_list() {
        assert!(matches!(
            eval(OperationKind::Exponentiation, &[]),
            Err(CalcError::InvalidInputs { .. })
        ));
    }

    // -- results --

    #[test]
    fn addition_preserves_integers() {
        assert_eq!(eval(OperationKind::Addition, &[1, 2, 3]), Ok(Number::Int(6)));
        assert_eq!(
            evaluate(OperationKind::Addition, &[Number::Int(1), Number::Float(0.5)]),
            Ok(Number::Float(1.5))
        );
    }

    #[test]
    fn subtraction_folds_left() {
        assert_eq!(eval(OperationKind::Subtraction, &[20, 5, 3]), Ok(Number::Int(12)));
        assert_eq!(eval(OperationKind::Subtraction, &[5, 20, 3]), Ok(Number::Int(-18)));
    }

    #[test]
    fn multiplication_product() {
        assert_eq!(eval(OperationKind::Multiplication, &[2, 3, 4]), Ok(Number::Int(24)));
        assert_eq!(eval(OperationKind::Multiplication, &[2, 0]), Ok(Number::Int(0)));
    }

    #[test]
    fn addition_and_multiplication_commute() {
        let orders = [[1, 2, 3], [3, 1, 2], [2, 3, 1]];
        for kind in [OperationKind::Addition, OperationKind::Multiplication] {
            let expected = eval(kind, &orders[0]);
            for order in &orders[1..] {
                assert_eq!(eval(kind, order), expected);
            }
        }
    }

    #[test]
    fn division_folds_left_as_float() {
        assert_eq!(eval(OperationKind::Division, &[100, 2, 5]), Ok(Number::Float(10.0)));
        assert_eq!(eval(OperationKind::Division, &[1, 4]), Ok(Number::Float(0.25)));
    }

    #[test]
    fn division_by_any_zero_divisor() {
        assert_eq!(eval(OperationKind::Division, &[50, 0, 5]), Err(CalcError::DivisionByZero));
        assert_eq!(eval(OperationKind::Division, &[50, 5, 0]), Err(CalcError::DivisionByZero));
        assert_eq!(
            evaluate(OperationKind::Division, &[Number::Int(1), Number::Float(0.0)]),
            Err(CalcError::DivisionByZero)
        );
    }

    #[test]
    fn zero_dividend_is_fine() {
        assert_eq!(eval(OperationKind::Division, &[0, 5]), Ok(Number::Float(0.0)));
    }

    #[test]
    fn exponentiation_folds_left() {
        assert_eq!(eval(OperationKind::Exponentiation, &[2, 3]), Ok(Number::Float(8.0)));
        // (2^3)^2 = 64, not 2^(3^2) = 512
        assert_eq!(eval(OperationKind::Exponentiation, &[2, 3, 2]), Ok(Number::Float(64.0)));
    }

    #[test]
    fn power_is_float() {
        assert_eq!(eval(OperationKind::Power, &[2, 4]), Ok(Number::Float(16.0)));
        assert_eq!(eval(OperationKind::Power, &[2, -2]), Ok(Number::Float(0.25)));
    }

    #[test]
    fn modulus_is_float() {
        assert_eq!(eval(OperationKind::Modulus, &[10, 3]), Ok(Number::Float(1.0)));
        assert_eq!(eval(OperationKind::Modulus, &[-7, 3]), Ok(Number::Float(2.0)));
    }

    #[test]
    fn modulus_by_zero() {
        assert_eq!(eval(OperationKind::Modulus, &[10, 0]), Err(CalcError::ModulusByZero));
        assert_eq!(
            evaluate(OperationKind::Modulus, &[Number::Int(10), Number::Float(0.0)]),
            Err(CalcError::ModulusByZero)
        );
    }

    #[test]
    fn non_finite_results_are_rejected() {
        assert_eq!(
            eval(OperationKind::Power, &[0, -1]),
            Err(CalcError::NonFiniteResult {
                operation: OperationKind::Power
            })
        );
        assert_eq!(
            evaluate(OperationKind::Power, &[Number::Int(-8), Number::Float(0.5)]),
            Err(CalcError::NonFiniteResult {
                operation: OperationKind::Power
            })
        );
        assert_eq!(
            eval(OperationKind::Exponentiation, &[10, 400]),
            Err(CalcError::NonFiniteResult {
                operation: OperationKind::Exponentiation
            })
        );
    }

    #[test]
    fn evaluation_does_not_touch_inputs() {
        let inputs = nums(&[9, 4]);
        let snapshot = inputs.clone();
        let first = evaluate(OperationKind::Subtraction, &inputs);
        let second = evaluate(OperationKind::Subtraction, &inputs);
        assert_eq!(first, second);
        assert_eq!(inputs, snapshot);
    }
}
