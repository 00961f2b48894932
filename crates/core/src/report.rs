//! CSV report of a user's calculations.

use std::borrow::Cow;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::numeric::Number;
use crate::record::CalculationRecord;

pub const CSV_HEADER: [&str; 5] = ["id", "type", "inputs", "result", "created_at"];

/// Render records as CSV, one row per record in the order given.
///
/// Inputs are joined with `", "` inside a single quoted field. Rows end
/// with CRLF.
pub fn render_csv(records: &[CalculationRecord]) -> String {
    let mut out = String::new();
    push_row(&mut out, CSV_HEADER);

    for record in records {
        let inputs = record
            .inputs()
            .iter()
            .map(Number::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let result = record
            .result()
            .map(|r| Number::Float(r).to_string())
            .unwrap_or_default();
        let created_at = record.created_at().format(&Rfc3339).unwrap_or_default();

        push_row(
            &mut out,
            [
                record.id().to_string(),
                record.operation().to_string(),
                inputs,
                result,
                created_at,
            ],
        );
    }

    out
}

/// Attachment filename for an export generated at `now`.
pub fn export_filename(now: OffsetDateTime) -> String {
    format!(
        "calculations_{:04}{:02}{:02}_{:02}{:02}{:02}.csv",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

fn push_row<I, S>(out: &mut String, fields: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(field.as_ref()));
    }
    out.push_str("\r\n");
}

fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationKind;
    use time::macros::datetime;
    use uuid::Uuid;

    #[test]
    fn header_only_for_no_records() {
        assert_eq!(render_csv(&[]), "id,type,inputs,result,created_at\r\n");
    }

    #[test]
    fn rows_quote_joined_inputs() {
        let rec = CalculationRecord::new(
            Uuid::new_v4(),
            OperationKind::Addition,
            vec![Number::Int(5), Number::Float(10.5)],
            datetime!(2025-12-05 02:18:00 UTC),
        )
        .unwrap();
        let csv = render_csv(std::slice::from_ref(&rec));
        let lines: Vec<&str> = csv.split("\r\n").filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            format!(
                "{},addition,\"5, 10.5\",15.5,2025-12-05T02:18:00Z",
                rec.id()
            )
        );
    }

    #[test]
    fn single_input_is_not_quoted() {
        let rec = CalculationRecord::pending(
            Uuid::new_v4(),
            OperationKind::Exponentiation,
            vec![Number::Int(3)],
            datetime!(2025-01-01 00:00:00 UTC),
        );
        let csv = render_csv(&[rec]);
        assert!(csv.contains(",exponentiation,3,,2025-01-01T00:00:00Z\r\n"));
    }

    #[test]
    fn escape_doubles_quotes() {
        assert_eq!(escape_field("a\"b"), "\"a\"\"b\"");
        assert_eq!(escape_field("plain"), "plain");
    }

    #[test]
    fn filename_is_timestamped() {
        assert_eq!(
            export_filename(datetime!(2025-03-07 09:05:01 UTC)),
            "calculations_20250307_090501.csv"
        );
    }
}
