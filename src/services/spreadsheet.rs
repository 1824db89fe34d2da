//! Spreadsheet Service - contact decoding and the downloadable template

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};

use crate::models::{CellValue, NormalizedContact, RawContactRecord};

/// Label given to columns whose header cell is blank
const EMPTY_HEADER: &str = "__EMPTY";

/// Template workbook columns
pub const TEMPLATE_HEADERS: [&str; 3] = ["Name", "Email", "Number"];

/// Spreadsheet decode error
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Unreadable workbook: {0}")]
    Workbook(String),
    #[error("Workbook has no worksheet")]
    NoWorksheet,
    #[error("Unreadable worksheet: {0}")]
    Worksheet(String),
}

/// Decode the first sheet of a workbook into one record per data row.
///
/// The first row of the sheet's used range supplies the column labels. Rows
/// with no non-blank cell are skipped.
pub fn decode_workbook(bytes: &[u8]) -> Result<Vec<RawContactRecord>, DecodeError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| DecodeError::Workbook(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(DecodeError::NoWorksheet)?
        .map_err(|e| DecodeError::Worksheet(e.to_string()))?;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => header_labels(header_row),
        None => return Ok(Vec::new()),
    };

    let mut records = Vec::new();
    for row in rows {
        let mut record = RawContactRecord::new();
        for (label, cell) in headers.iter().zip(row.iter()) {
            if let Some(value) = cell_value(cell) {
                record.push(label.clone(), value);
            }
        }

        if !record.is_empty() {
            records.push(record);
        }
    }

    tracing::debug!(rows = records.len(), columns = headers.len(), "Decoded workbook");
    Ok(records)
}

/// Lower-case every key. Later columns win on collision.
pub fn normalize(record: &RawContactRecord) -> NormalizedContact {
    let mut contact = NormalizedContact::default();
    for (label, value) in record.iter() {
        contact.insert(label.to_lowercase(), value.clone());
    }
    contact
}

pub fn normalize_all(records: &[RawContactRecord]) -> Vec<NormalizedContact> {
    records.iter().map(normalize).collect()
}

/// Decode and normalize in one step
pub fn load_contacts(bytes: &[u8]) -> Result<Vec<NormalizedContact>, DecodeError> {
    let records = decode_workbook(bytes)?;
    Ok(normalize_all(&records))
}

/// Build the contacts template offered for download
pub fn contacts_template() -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();

    for (col, header) in TEMPLATE_HEADERS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }

    worksheet.write_string(1, 0, "Jane Doe")?;
    worksheet.write_string(1, 1, "jane.doe@example.com")?;
    worksheet.write_number(1, 2, 1001.0)?;

    workbook.push_worksheet(worksheet);

    workbook.save_to_buffer()
}

fn cell_value(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Int(i) => Some(CellValue::Int(*i)),
        Data::Float(f) => Some(CellValue::Float(*f)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        other => Some(CellValue::Text(other.to_string())),
    }
}

/// Blank headers become `__EMPTY`, repeats get `_1`, `_2`, ... suffixes.
fn header_labels(row: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    row.iter()
        .map(|cell| {
            let base = cell_value(cell)
                .map(|value| value.as_text())
                .unwrap_or_else(|| EMPTY_HEADER.to_string());

            let count = seen.entry(base.clone()).or_insert(0);
            let label = if *count == 0 {
                base
            } else {
                format!("{}_{}", base, count)
            };
            *count += 1;
            label
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build an xlsx workbook whose first sheet holds `rows` as text cells.
    /// Empty strings are left unwritten.
    pub(crate) fn workbook_bytes(rows: &[&[&str]]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let mut worksheet = Worksheet::new();

        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    worksheet.write_string(r as u32, c as u16, *value).unwrap();
                }
            }
        }

        workbook.push_worksheet(worksheet);
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_decode_rows_in_order() {
        let bytes = workbook_bytes(&[
            &["Name", "Email", "Number"],
            &["Sam", "sam@example.com", "42"],
            &["Alex", "alex@example.com", "7"],
        ]);

        let records = decode_workbook(&bytes).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Name"), Some(&CellValue::from("Sam")));
        assert_eq!(records[1].get("Email"), Some(&CellValue::from("alex@example.com")));
    }

    #[test]
    fn test_blank_cells_are_absent() {
        let bytes = workbook_bytes(&[
            &["Name", "Email"],
            &["Sam", ""],
            &["", ""],
            &["", "x@example.com"],
        ]);

        let records = decode_workbook(&bytes).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].get("Email").is_none());
        assert!(records[1].get("Name").is_none());
    }

    #[test]
    fn test_header_labels() {
        let bytes = workbook_bytes(&[&["Email", "", "Email", ""], &["a", "b", "c", "d"]]);

        let records = decode_workbook(&bytes).unwrap();
        let labels: Vec<&str> = records[0].iter().map(|(label, _)| label).collect();
        assert_eq!(labels, vec!["Email", "__EMPTY", "Email_1", "__EMPTY_1"]);
    }

    #[test]
    fn test_malformed_bytes_fail() {
        let result = decode_workbook(b"definitely not a spreadsheet");
        assert!(matches!(result, Err(DecodeError::Workbook(_))));
    }

    #[test]
    fn test_header_only_sheet_is_empty() {
        let bytes = workbook_bytes(&[&["Name", "Email"]]);
        assert!(decode_workbook(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_normalize_lowercases_and_last_write_wins() {
        let record = RawContactRecord::new()
            .with("EMAIL", "first@example.com")
            .with("Name", "Sam")
            .with("Email", "second@example.com");

        let contact = normalize(&record);
        assert_eq!(contact.email().as_deref(), Some("second@example.com"));
        assert_eq!(contact.name().as_deref(), Some("Sam"));
        assert_eq!(contact.len(), 2);
    }

    #[test]
    fn test_load_is_idempotent() {
        let bytes = workbook_bytes(&[
            &["NAME", "Email", "Number", "Team"],
            &["Sam", "sam@example.com", "42", "red"],
            &["Alex", "", "7", "blue"],
        ]);

        let first = load_contacts(&bytes).unwrap();
        let second = load_contacts(&bytes).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].get("team"), Some(&CellValue::from("red")));
    }

    #[test]
    fn test_template_round_trips() {
        let bytes = contacts_template().unwrap();
        let contacts = load_contacts(&bytes).unwrap();

        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].email().as_deref(), Some("jane.doe@example.com"));
        assert_eq!(contacts[0].name().as_deref(), Some("Jane Doe"));
        assert_eq!(contacts[0].number().as_deref(), Some("1001"));
    }
}
