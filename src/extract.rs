use std::collections::BTreeMap;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use csv::ReaderBuilder;

use crate::coerce::CellValue;
use crate::error::IngestError;

/// One uploaded export file. The name decides the format (`.csv` / `.xlsx`,
/// case-sensitive as uploaded) and appears in failure messages.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Key prefix of the aggregate "top post" rows some exports prepend. Those
/// rows describe derived metrics, not this post, and are never ingested.
pub const STALE_METRIC_PREFIX: &str = "top-";

/// The key/value mapping parsed from one uploaded file. A `BTreeMap` keeps
/// iteration deterministic, which the prefix-scanned metric lookup relies on.
pub type RawTable = BTreeMap<String, CellValue>;

/// Parse an uploaded file into a [`RawTable`].
///
/// The file is read as a headerless two-column (key, value) table. Rows with
/// a null-equivalent value and rows whose key carries the stale-metric prefix
/// are dropped; the last occurrence of a duplicate key wins.
pub fn extract(file: &UploadedFile) -> Result<RawTable, IngestError> {
    let rows = if file.name.ends_with(".csv") {
        read_csv(file)?
    } else if file.name.ends_with(".xlsx") {
        read_xlsx(file)?
    } else {
        return Err(IngestError::UnsupportedFormat {
            file: file.name.clone(),
        });
    };

    let mut table = RawTable::new();
    for (key, value) in rows {
        if key.starts_with(STALE_METRIC_PREFIX) {
            continue;
        }
        table.insert(key, value);
    }
    Ok(table)
}

fn parse_error(file: &UploadedFile, message: impl ToString) -> IngestError {
    IngestError::Parse {
        file: file.name.clone(),
        message: message.to_string(),
    }
}

fn read_csv(file: &UploadedFile) -> Result<Vec<(String, CellValue)>, IngestError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(&file.bytes));

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| parse_error(file, e))?;
        match record.len() {
            0 => continue,
            // A lone key has no value column: null-equivalent, dropped.
            1 => continue,
            2 => {
                let value = record.get(1).unwrap_or_default();
                // Whitespace-only values count as null-equivalent too, so a
                // blank required field is reported missing instead of present.
                if value.trim().is_empty() {
                    continue;
                }
                let key = record.get(0).unwrap_or_default().to_string();
                rows.push((key, CellValue::Text(value.to_string())));
            }
            n => {
                return Err(parse_error(
                    file,
                    format!("expected 2 columns, found {} at record {}", n, idx + 1),
                ))
            }
        }
    }
    Ok(rows)
}

fn read_xlsx(file: &UploadedFile) -> Result<Vec<(String, CellValue)>, IngestError> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(file.bytes.clone())).map_err(|e| parse_error(file, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| parse_error(file, "workbook has no sheets"))?
        .map_err(|e| parse_error(file, e))?;

    let mut rows = Vec::new();
    for row in range.rows() {
        let key = match row.first() {
            None | Some(Data::Empty) => continue,
            Some(cell) => cell.to_string(),
        };
        let value = match row.get(1) {
            None | Some(Data::Empty) | Some(Data::Error(_)) => continue,
            Some(Data::String(s)) if s.trim().is_empty() => continue,
            Some(Data::String(s)) => CellValue::Text(s.clone()),
            Some(Data::Float(f)) => CellValue::Number(*f),
            Some(Data::Int(i)) => CellValue::Number(*i as f64),
            Some(other) => CellValue::Text(other.to_string()),
        };
        rows.push((key, value));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::coerce_int;
    use rust_xlsxwriter::Workbook;

    fn csv_file(name: &str, content: &str) -> UploadedFile {
        UploadedFile {
            name: name.into(),
            bytes: content.as_bytes().to_vec(),
        }
    }

    #[test]
    fn parses_two_column_csv() {
        let file = csv_file(
            "stats.csv",
            "Post URL,https://example.com/posts/1\nImpressions,\"1,234\"\n",
        );
        let table = extract(&file).unwrap();
        assert_eq!(
            table.get("Post URL"),
            Some(&CellValue::Text("https://example.com/posts/1".into()))
        );
        assert_eq!(
            table.get("Impressions"),
            Some(&CellValue::Text("1,234".into()))
        );
    }

    #[test]
    fn parses_two_column_xlsx() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Post URL").unwrap();
        sheet
            .write_string(0, 1, "https://example.com/posts/1")
            .unwrap();
        sheet.write_string(1, 0, "Impressions").unwrap();
        sheet.write_number(1, 1, 1234.0).unwrap();
        // Key with no value cell: null-equivalent, dropped.
        sheet.write_string(2, 0, "Reactions").unwrap();
        sheet.write_string(3, 0, "top-performing posts").unwrap();
        sheet.write_number(3, 1, 99.0).unwrap();
        let file = UploadedFile {
            name: "stats.xlsx".to_string(),
            bytes: workbook.save_to_buffer().unwrap(),
        };

        let table = extract(&file).unwrap();
        assert_eq!(
            table.get("Post URL"),
            Some(&CellValue::Text("https://example.com/posts/1".into()))
        );
        assert_eq!(
            table.get("Impressions"),
            Some(&CellValue::Number(1234.0))
        );
        assert_eq!(table["Impressions"].to_text(), "1234");
        assert_eq!(coerce_int(table.get("Impressions")), 1234);
        assert!(!table.contains_key("Reactions"));
        assert!(!table.contains_key("top-performing posts"));
    }

    #[test]
    fn drops_stale_metric_rows() {
        let file = csv_file(
            "stats.csv",
            "top-performing,42\ntop-audience,99\nReactions,7\n",
        );
        let table = extract(&file).unwrap();
        assert!(table.keys().all(|k| !k.starts_with(STALE_METRIC_PREFIX)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn drops_rows_with_empty_values() {
        let file = csv_file("stats.csv", "Reactions,\nComments,3\nSaves\n");
        let table = extract(&file).unwrap();
        assert!(!table.contains_key("Reactions"));
        assert!(!table.contains_key("Saves"));
        assert_eq!(table.get("Comments"), Some(&CellValue::Text("3".into())));
    }

    #[test]
    fn last_duplicate_key_wins() {
        let file = csv_file("stats.csv", "Reactions,1\nReactions,2\n");
        let table = extract(&file).unwrap();
        assert_eq!(table.get("Reactions"), Some(&CellValue::Text("2".into())));
    }

    #[test]
    fn rejects_unknown_extensions() {
        let file = csv_file("stats.txt", "a,b\n");
        let err = extract(&file).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat { .. }));
        assert!(err.to_string().contains("stats.txt"));
    }

    #[test]
    fn extension_check_is_case_sensitive() {
        let file = csv_file("stats.CSV", "a,b\n");
        assert!(matches!(
            extract(&file),
            Err(IngestError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn rejects_wide_rows() {
        let file = csv_file("stats.csv", "Reactions,1,extra\n");
        let err = extract(&file).unwrap_err();
        assert!(matches!(err, IngestError::Parse { .. }));
    }
}
