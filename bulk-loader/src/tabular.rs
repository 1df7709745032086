//! Reading import rows out of uploaded CSV documents.
use error_stack::{Report, ResultExt};
use itertools::Itertools;
use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TabularError {
    #[error("missing required columns: {}", .0.iter().join(", "))]
    MissingColumns(Vec<String>),
    #[error("row on line {line} could not be read: {reason}")]
    InvalidRow { line: u64, reason: String },
    #[error("document is not valid CSV")]
    Read,
}

/// Parse a CSV document with a header row into `T`s.
///
/// Every name in `required_columns` must be present in the header; extra
/// columns are ignored. Fields are trimmed, and an empty field deserializes
/// to `None` for optional values.
pub fn parse_csv<T>(bytes: &[u8], required_columns: &[&str]) -> Result<Vec<T>, Report<TabularError>>
where
    T: DeserializeOwned,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader.headers().change_context(TabularError::Read)?.clone();

    let missing: Vec<String> = required_columns
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(Report::new(TabularError::MissingColumns(missing)));
    }

    reader
        .deserialize()
        .map(|row| {
            row.map_err(|e| {
                let line = e.position().map(|p| p.line()).unwrap_or_default();
                let reason = match e.kind() {
                    csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
                    csv::ErrorKind::UnequalLengths {
                        expected_len, len, ..
                    } => format!("expected {expected_len} fields, found {len}"),
                    _ => e.to_string(),
                };
                Report::new(e).change_context(TabularError::InvalidRow { line, reason })
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImportRecord;

    const THEME_COLUMNS: &[&str] = &["id", "parent_id", "name"];

    #[test]
    fn blank_parent_is_read_as_a_root() {
        let csv = b"id,name,parent_id\n1,Technic,\n2,Supercar, 1\n";

        let rows: Vec<ImportRecord<i64>> = parse_csv(csv, THEME_COLUMNS).unwrap();

        assert_eq!(
            vec![
                ImportRecord::root(1, "Technic"),
                ImportRecord::child(2, "Supercar", 1)
            ],
            rows
        );
    }

    #[test]
    fn extra_columns_are_ignored() {
        let csv = b"id,name,parent_id,notes\n7,Castle,,old\n";

        let rows: Vec<ImportRecord<i64>> = parse_csv(csv, THEME_COLUMNS).unwrap();

        assert_eq!(vec![ImportRecord::root(7, "Castle")], rows);
    }

    #[test]
    fn header_only_document_has_no_rows() {
        let rows: Vec<ImportRecord<i64>> = parse_csv(b"id,name,parent_id\n", THEME_COLUMNS).unwrap();

        assert!(rows.is_empty());
    }

    #[test]
    fn missing_columns_are_listed() {
        let error = parse_csv::<ImportRecord<i64>>(b"id,title\n1,Space\n", THEME_COLUMNS)
            .expect_err("columns are missing");

        assert_eq!(
            &TabularError::MissingColumns(vec!["parent_id".to_string(), "name".to_string()]),
            error.current_context()
        );
    }

    #[test]
    fn non_numeric_id_reports_its_line() {
        let csv = b"id,name,parent_id\n1,Space,\nabc,Town,\n";

        let error = parse_csv::<ImportRecord<i64>>(csv, THEME_COLUMNS).expect_err("row is invalid");

        let TabularError::InvalidRow { line, reason } = error.current_context() else {
            panic!("expected an invalid row, got {error:?}");
        };
        assert_eq!(3, *line);
        assert!(reason.contains("invalid digit"), "{reason}");
    }

    #[test]
    fn ragged_row_reports_the_field_counts() {
        let csv = b"id,name,parent_id
1,Space,
2,Town
";

        let error = parse_csv::<ImportRecord<i64>>(csv, THEME_COLUMNS).expect_err("row is short");

        assert_eq!(
            &TabularError::InvalidRow {
                line: 3,
                reason: "expected 3 fields, found 2".to_string()
            },
            error.current_context()
        );
        assert_eq!(
            "row on line 3 could not be read: expected 3 fields, found 2",
            error.current_context().to_string()
        );
    }
}
