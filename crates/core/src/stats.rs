//! Per-user usage statistics over calculation records.
//!
//! The aggregator never fails. Records are expected to be pre-filtered to
//! one owner by the caller; ownership is not re-checked here.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::UtcOffset;
use uuid::Uuid;

use crate::operation::OperationKind;
use crate::record::CalculationRecord;

/// Summary of one user's calculations.
///
/// The breakdown is a `BTreeMap` so serialization order is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationStats {
    pub total_calculations: usize,
    pub average_operands: f64,
    pub operations_breakdown: BTreeMap<String, usize>,
    pub most_used_operation: Option<String>,
    pub last_calculation_date: Option<String>,
}

impl CalculationStats {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Statistics for the user identified by `user_id_raw`.
///
/// An identifier that does not parse as a UUID matches nothing and yields
/// the empty summary.
pub fn compute_stats(user_id_raw: &str, records: &[CalculationRecord]) -> CalculationStats {
    match Uuid::parse_str(user_id_raw.trim()) {
        Ok(_) => summarize(records),
        Err(_) => CalculationStats::empty(),
    }
}

/// Statistics over an already owner-scoped set of records.
///
/// `most_used_operation` ties go to the operation seen first while
/// scanning `records` in order.
pub fn summarize(records: &[CalculationRecord]) -> CalculationStats {
    if records.is_empty() {
        return CalculationStats::empty();
    }

    let total = records.len();

    let mut counts: HashMap<OperationKind, usize> = HashMap::new();
    let mut encounter_order: Vec<OperationKind> = Vec::new();
    for record in records {
        let kind = record.operation();
        let count = counts.entry(kind).or_insert(0);
        if *count == 0 {
            encounter_order.push(kind);
        }
        *count += 1;
    }

    let mut most_used: Option<(OperationKind, usize)> = None;
    for kind in &encounter_order {
        let count = counts[kind];
        match most_used {
            Some((_, best)) if best >= count => {}
            _ => most_used = Some((*kind, count)),
        }
    }

    let operand_total: usize = records.iter().map(|r| r.inputs().len()).sum();
    let average_operands = operand_total as f64 / total as f64;

    let last_calculation_date = records
        .iter()
        .map(CalculationRecord::created_at)
        .max()
        .and_then(|ts| ts.to_offset(UtcOffset::UTC).format(&Rfc3339).ok());

    CalculationStats {
        total_calculations: total,
        average_operands,
        operations_breakdown: counts
            .into_iter()
            .map(|(kind, count)| (kind.as_str().to_string(), count))
            .collect(),
        most_used_operation: most_used.map(|(kind, _)| kind.as_str().to_string()),
        last_calculation_date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::Number;
    use time::macros::datetime;
    use time::OffsetDateTime;

    const USER: &str = "123e4567-e89b-12d3-a456-426614174000";

    fn owner() -> Uuid {
        Uuid::parse_str(USER).unwrap()
    }

    fn record(kind: OperationKind, inputs: &[i64], at: OffsetDateTime) -> CalculationRecord {
        CalculationRecord::pending(
            owner(),
            kind,
            inputs.iter().copied().map(Number::Int).collect(),
            at,
        )
    }

    fn sample() -> Vec<CalculationRecord> {
        vec![
            record(
                OperationKind::Addition,
                &[1, 2],
                datetime!(2025-12-01 10:00:00 UTC),
            ),
            record(
                OperationKind::Addition,
                &[5],
                datetime!(2025-12-05 02:18:00 UTC),
            ),
            record(
                OperationKind::Multiplication,
                &[2, 3, 4],
                datetime!(2025-12-03 08:30:00 UTC),
            ),
        ]
    }

    #[test]
    fn empty_records_give_empty_summary() {
        let stats = compute_stats(USER, &[]);
        assert_eq!(stats.total_calculations, 0);
        assert_eq!(stats.average_operands, 0.0);
        assert!(stats.operations_breakdown.is_empty());
        assert_eq!(stats.most_used_operation, None);
        assert_eq!(stats.last_calculation_date, None);
    }

    #[test]
    fn summary_over_sample() {
        let stats = compute_stats(USER, &sample());
        assert_eq!(stats.total_calculations, 3);
        assert_eq!(stats.operations_breakdown.len(), 2);
        assert_eq!(stats.operations_breakdown["addition"], 2);
        assert_eq!(stats.operations_breakdown["multiplication"], 1);
        assert_eq!(stats.most_used_operation.as_deref(), Some("addition"));
        assert!((stats.average_operands - 2.0).abs() < 1e-9);
        assert_eq!(
            stats.last_calculation_date.as_deref(),
            Some("2025-12-05T02:18:00Z")
        );
    }

    #[test]
    fn unparseable_user_id_gives_empty_summary() {
        let stats = compute_stats("not-a-uuid", &sample());
        assert_eq!(stats, CalculationStats::empty());
    }

    #[test]
    fn user_id_is_trimmed() {
        let stats = compute_stats(&format!("  {}  ", USER), &sample());
        assert_eq!(stats.total_calculations, 3);
    }

    #[test]
    fn tie_goes_to_first_encountered() {
        let at = datetime!(2025-01-01 00:00:00 UTC);
        let records = vec![
            record(OperationKind::Power, &[2, 2], at),
            record(OperationKind::Division, &[4, 2], at),
            record(OperationKind::Division, &[8, 2], at),
            record(OperationKind::Power, &[3, 2], at),
        ];
        let stats = summarize(&records);
        assert_eq!(stats.most_used_operation.as_deref(), Some("power"));

        let reversed: Vec<_> = records.into_iter().rev().collect();
        let stats = summarize(&reversed);
        assert_eq!(stats.most_used_operation.as_deref(), Some("power"));
    }

    #[test]
    fn later_majority_beats_first_seen() {
        let at = datetime!(2025-01-01 00:00:00 UTC);
        let records = vec![
            record(OperationKind::Modulus, &[5, 2], at),
            record(OperationKind::Subtraction, &[4, 2], at),
            record(OperationKind::Subtraction, &[8, 2], at),
        ];
        assert_eq!(
            summarize(&records).most_used_operation.as_deref(),
            Some("subtraction")
        );
    }

    #[test]
    fn empty_inputs_count_as_zero_operands() {
        let at = datetime!(2025-01-01 00:00:00 UTC);
        let records = vec![
            record(OperationKind::Addition, &[], at),
            record(OperationKind::Addition, &[1, 2, 3, 4], at),
        ];
        assert!((summarize(&records).average_operands - 2.0).abs() < 1e-9);
    }

    #[test]
    fn last_date_is_normalized_to_utc() {
        let records = vec![record(
            OperationKind::Addition,
            &[1, 2],
            datetime!(2025-06-01 12:00:00 +2),
        )];
        assert_eq!(
            summarize(&records).last_calculation_date.as_deref(),
            Some("2025-06-01T10:00:00Z")
        );
    }

    #[test]
    fn unformattable_timestamp_yields_none() {
        // RFC 3339 only covers four-digit years.
        let date = time::Date::from_calendar_date(-1, time::Month::January, 1).unwrap();
        let records = vec![record(
            OperationKind::Addition,
            &[1, 2],
            date.midnight().assume_utc(),
        )];
        let stats = summarize(&records);
        assert_eq!(stats.total_calculations, 1);
        assert_eq!(stats.last_calculation_date, None);
    }

    #[test]
    fn repeated_runs_serialize_identically() {
        let records = sample();
        let first = serde_json::to_string(&compute_stats(USER, &records)).unwrap();
        let second = serde_json::to_string(&compute_stats(USER, &records)).unwrap();
        assert_eq!(first, second);
    }
}
