use crate::operation::OperationKind;

/// All errors the calculation engine can produce.
///
/// Every variant is a user-input problem; none of them is fatal to the
/// process, and the engine never returns a partial result alongside one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalcError {
    /// The operation name is not text, or not one of the seven known kinds.
    #[error("Unsupported calculation type")]
    UnsupportedOperation,

    /// The inputs are not a list of numbers, or the list has the wrong
    /// length for the operation.
    #[error("{reason}")]
    InvalidInputs { reason: String },

    /// A divisor after the first element is zero.
    #[error("Cannot divide by zero.")]
    DivisionByZero,

    /// The modulus operand is zero.
    #[error("Modulus by zero is undefined.")]
    ModulusByZero,

    /// The operation left the real, finite domain (overflow to infinity,
    /// a negative base raised to a fractional exponent, zero raised to a
    /// negative power).
    #[error("{operation} result is not a finite real number")]
    NonFiniteResult { operation: OperationKind },
}

impl CalcError {
    pub(crate) fn not_a_list() -> Self {
        CalcError::InvalidInputs {
            reason: "Inputs must be a list of numbers.".to_string(),
        }
    }

    pub(crate) fn invalid(reason: &str) -> Self {
        CalcError::InvalidInputs {
            reason: reason.to_string(),
        }
    }
}
