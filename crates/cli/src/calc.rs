//! Offline commands: `abacus eval` and `abacus stats`.

use std::path::Path;

use abacus_core::{
    compute_stats, resolve_and_evaluate, summarize, CalculationRecord, CalculationStats,
};
use uuid::Uuid;

use crate::{fail, OutputFormat};

pub(crate) fn cmd_eval(operation: &str, inputs: &str, output: OutputFormat, quiet: bool) {
    let raw_inputs: serde_json::Value = match serde_json::from_str(inputs) {
        Ok(v) => v,
        Err(e) => fail(&format!("error: inputs are not valid JSON: {}", e), output, quiet),
    };

    match resolve_and_evaluate(&serde_json::Value::from(operation), &raw_inputs) {
        Ok((kind, result)) => match output {
            OutputFormat::Json => {
                let value = serde_json::json!({
                    "type": kind,
                    "inputs": raw_inputs,
                    "result": result.as_f64(),
                });
                println!("{}", value);
            }
            OutputFormat::Text => println!("{}", result),
        },
        Err(e) => fail(&format!("error: {}", e), output, quiet),
    }
}

pub(crate) fn cmd_stats(path: &Path, user: Option<&str>, output: OutputFormat, quiet: bool) {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => fail(
            &format!("error: cannot read {}: {}", path.display(), e),
            output,
            quiet,
        ),
    };
    let records: Vec<CalculationRecord> = match serde_json::from_str(&text) {
        Ok(r) => r,
        Err(e) => fail(
            &format!("error: invalid records in {}: {}", path.display(), e),
            output,
            quiet,
        ),
    };

    let stats = select_and_summarize(&records, user);

    match output {
        OutputFormat::Json => match serde_json::to_string_pretty(&stats) {
            Ok(s) => println!("{}", s),
            Err(e) => fail(&format!("error: {}", e), output, quiet),
        },
        OutputFormat::Text => print_stats(&stats),
    }
}

/// With a user id, only that user's records count; an id that is not a
/// UUID yields the empty summary.
fn select_and_summarize(records: &[CalculationRecord], user: Option<&str>) -> CalculationStats {
    match user {
        None => summarize(records),
        Some(raw) => {
            let owned: Vec<CalculationRecord> = match Uuid::parse_str(raw.trim()) {
                Ok(owner) => records
                    .iter()
                    .filter(|r| r.owner() == owner)
                    .cloned()
                    .collect(),
                Err(_) => Vec::new(),
            };
            compute_stats(raw, &owned)
        }
    }
}

fn print_stats(stats: &CalculationStats) {
    println!("Total calculations: {}", stats.total_calculations);
    println!("Average operands:   {:.2}", stats.average_operands);
    println!(
        "Most used:          {}",
        stats.most_used_operation.as_deref().unwrap_or("-")
    );
    println!(
        "Last calculation:   {}",
        stats.last_calculation_date.as_deref().unwrap_or("-")
    );
    if !stats.operations_breakdown.is_empty() {
        println!("Breakdown:");
        for (kind, count) in &stats.operations_breakdown {
            println!("  {:<15} {}", kind, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abacus_core::{Number, OperationKind};
    use time::macros::datetime;

    fn record(owner: Uuid, kind: OperationKind, inputs: &[i64]) -> CalculationRecord {
        CalculationRecord::new(
            owner,
            kind,
            inputs.iter().copied().map(Number::Int).collect(),
            datetime!(2025-01-01 00:00:00 UTC),
        )
        .unwrap()
    }

    #[test]
    fn user_filter_only_counts_owned_records() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let records = vec![
            record(alice, OperationKind::Addition, &[1, 2]),
            record(bob, OperationKind::Division, &[8, 2]),
            record(alice, OperationKind::Multiplication, &[2, 3, 4]),
        ];

        let all = select_and_summarize(&records, None);
        assert_eq!(all.total_calculations, 3);

        let only_alice = select_and_summarize(&records, Some(&alice.to_string()));
        assert_eq!(only_alice.total_calculations, 2);
        assert!(!only_alice.operations_breakdown.contains_key("division"));
    }

    #[test]
    fn unparseable_user_is_empty_summary() {
        let records = vec![record(Uuid::new_v4(), OperationKind::Addition, &[1, 2])];
        let stats = select_and_summarize(&records, Some("not-a-uuid"));
        assert_eq!(stats, CalculationStats::empty());
    }
}
