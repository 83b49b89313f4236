//! Reading the two-column `key,value` dataset the benchmark driver works on.

use std::{fs, path::Path};

use super::BenchError;

/// One `key,value` row of the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// The key column, quotes stripped
    pub key: String,
    /// The value column parsed as a float
    pub value: f32,
}

/// Splits a line on commas that are not enclosed in double quotes, dropping every quote.
#[must_use]
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

/// Parses one data line; `line_number` is 1-based and only used for error reporting.
///
/// # Errors
///
/// [`BenchError::MalformedRecord`] when the line does not hold two fields or the value is
/// not a number.
pub fn parse_record(line: &str, line_number: usize) -> Result<Record, BenchError> {
    let mut fields = split_fields(line).into_iter();
    let (Some(key), Some(value)) = (fields.next(), fields.next()) else {
        return Err(BenchError::MalformedRecord {
            line: line_number,
            reason: "expected two comma separated fields".to_string(),
        });
    };
    let value = value.trim().parse::<f32>().map_err(|err| BenchError::MalformedRecord {
        line: line_number,
        reason: format!("value {value:?} is not a number: {err}"),
    })?;
    Ok(Record { key, value })
}

/// Parses dataset text: the first line is a header, blank lines are skipped.
///
/// # Errors
///
/// [`BenchError::MalformedRecord`] for the first bad line, [`BenchError::EmptyDataset`]
/// when no record remains.
pub fn parse_dataset(text: &str) -> Result<Vec<Record>, BenchError> {
    let records = text
        .lines()
        .enumerate()
        .skip(1)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| parse_record(line.trim_end_matches('\r'), index.saturating_add(1)))
        .collect::<Result<Vec<_>, _>>()?;

    if records.is_empty() {
        return Err(BenchError::EmptyDataset);
    }
    Ok(records)
}

/// Reads and parses the dataset at `path`.
///
/// # Errors
///
/// I/O failures and any error of [`parse_dataset`].
pub fn read_dataset(path: &Path) -> Result<Vec<Record>, BenchError> {
    let text = fs::read_to_string(path)?;
    let records = parse_dataset(&text)?;
    log::info!("read {} records from {}", records.len(), path.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain_and_quoted() {
        assert_eq!(split_fields("apple,1.5"), vec!["apple", "1.5"]);
        assert_eq!(split_fields("\"apple, green\",\"2\""), vec!["apple, green", "2"]);
        assert_eq!(split_fields("a\"b\"c,3"), vec!["abc", "3"]);
        assert_eq!(split_fields(""), vec![""]);
    }

    #[test]
    fn test_parse_dataset_skips_header_and_blank_lines() {
        let text = "name,score\n\"alpha\",1.0\n\nbeta,\"2.5\"\r\n";
        let records = parse_dataset(text).unwrap();
        assert_eq!(
            records,
            vec![
                Record { key: "alpha".to_string(), value: 1.0 },
                Record { key: "beta".to_string(), value: 2.5 },
            ]
        );
    }

    #[test]
    fn test_bad_lines_report_their_number() {
        let err = parse_dataset("k,v\nalpha,1\nbeta,oops\n").unwrap_err();
        assert!(matches!(err, BenchError::MalformedRecord { line: 3, .. }), "{err}");

        let err = parse_dataset("k,v\nlonely\n").unwrap_err();
        assert!(matches!(err, BenchError::MalformedRecord { line: 2, .. }), "{err}");
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(matches!(parse_dataset("k,v\n"), Err(BenchError::EmptyDataset)));
        assert!(matches!(parse_dataset(""), Err(BenchError::EmptyDataset)));
    }
}
