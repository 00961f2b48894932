//! The calculation record: one user's calculation as it is stored and
//! returned by the API.
//!
//! `operation` and `owner` are fixed at creation. The result is derived
//! and can only change through [`CalculationRecord::replace_inputs`], which
//! re-evaluates before touching anything. Deserialized records go through
//! the same evaluation, so a stored `result` never disagrees with its inputs.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::CalcError;
use crate::numeric::Number;
use crate::operation::{evaluate, parse_inputs, resolve, OperationKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCalculationRecord")]
pub struct CalculationRecord {
    id: Uuid,
    #[serde(rename = "user_id")]
    owner: Uuid,
    #[serde(rename = "type")]
    operation: OperationKind,
    #[serde(default)]
    inputs: Vec<Number>,
    result: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

/// Wire form of [`CalculationRecord`] before its result is checked.
#[derive(Deserialize)]
struct RawCalculationRecord {
    id: Uuid,
    user_id: Uuid,
    #[serde(rename = "type")]
    operation: OperationKind,
    #[serde(default)]
    inputs: Vec<Number>,
    result: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

impl TryFrom<RawCalculationRecord> for CalculationRecord {
    type Error = CalcError;

    /// The result is always recomputed from the inputs. Inputs the operation
    /// rejects are only accepted as a pending record with a null result.
    fn try_from(raw: RawCalculationRecord) -> Result<Self, Self::Error> {
        let result = match evaluate(raw.operation, &raw.inputs) {
            Ok(value) => Some(value.as_f64()),
            Err(e) if raw.result.is_some() => return Err(e),
            Err(_) => None,
        };
        Ok(CalculationRecord {
            id: raw.id,
            owner: raw.user_id,
            operation: raw.operation,
            inputs: raw.inputs,
            result,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        })
    }
}

impl CalculationRecord {
    /// Create a record from raw request values, computing the result
    /// immediately. Fails without producing a record if the operation is
    /// unknown or the inputs do not satisfy its rules.
    pub fn create(
        owner: Uuid,
        raw_kind: &serde_json::Value,
        raw_inputs: &serde_json::Value,
        now: OffsetDateTime,
    ) -> Result<Self, CalcError> {
        let operation = resolve(raw_kind)?;
        let inputs = parse_inputs(raw_inputs)?;
        Self::new(owner, operation, inputs, now)
    }

    /// Typed variant of [`CalculationRecord::create`].
    pub fn new(
        owner: Uuid,
        operation: OperationKind,
        inputs: Vec<Number>,
        now: OffsetDateTime,
    ) -> Result<Self, CalcError> {
        let result = evaluate(operation, &inputs)?;
        Ok(CalculationRecord {
            id: Uuid::new_v4(),
            owner,
            operation,
            inputs,
            result: Some(result.as_f64()),
            created_at: now,
            updated_at: now,
        })
    }

    /// A record with no result and unchecked inputs, for building
    /// aggregation fixtures.
    #[cfg(test)]
    pub(crate) fn pending(
        owner: Uuid,
        operation: OperationKind,
        inputs: Vec<Number>,
        created_at: OffsetDateTime,
    ) -> Self {
        CalculationRecord {
            id: Uuid::new_v4(),
            owner,
            operation,
            inputs,
            result: None,
            created_at,
            updated_at: created_at,
        }
    }

    /// Replace the inputs and recompute the result.
    ///
    /// On error the record is left exactly as it was.
    pub fn replace_inputs(
        &mut self,
        raw_inputs: &serde_json::Value,
        now: OffsetDateTime,
    ) -> Result<(), CalcError> {
        let inputs = parse_inputs(raw_inputs)?;
        self.replace_inputs_with(inputs, now)
    }

    pub fn replace_inputs_with(
        &mut self,
        inputs: Vec<Number>,
        now: OffsetDateTime,
    ) -> Result<(), CalcError> {
        let result = evaluate(self.operation, &inputs)?;
        self.inputs = inputs;
        self.result = Some(result.as_f64());
        self.updated_at = now;
        Ok(())
    }

    /// Mark the record as touched without changing its inputs.
    pub fn touch(&mut self, now: OffsetDateTime) {
        self.updated_at = now;
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> Uuid {
        self.owner
    }

    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    pub fn inputs(&self) -> &[Number] {
        &self.inputs
    }

    pub fn result(&self) -> Option<f64> {
        self.result
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn updated_at(&self) -> OffsetDateTime {
        self.updated_at
    }
}
