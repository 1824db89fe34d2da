//! Contact Models

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

/// A non-blank spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl CellValue {
    /// Render the cell the way it reads in the sheet (`42.0` becomes `"42"`).
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => (*f as i64).to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One decoded data row: column label to cell value, in column order.
///
/// Blank cells are absent rather than stored as empty values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawContactRecord {
    cells: Vec<(String, CellValue)>,
}

impl RawContactRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: impl Into<String>, value: CellValue) {
        self.cells.push((label.into(), value));
    }

    pub fn with(mut self, label: &str, value: impl Into<CellValue>) -> Self {
        self.push(label, value.into());
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(label, value)| (label.as_str(), value))
    }

    pub fn get(&self, label: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A contact whose keys are all lower-case.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NormalizedContact {
    fields: HashMap<String, CellValue>,
}

impl NormalizedContact {
    pub(crate) fn insert(&mut self, key: String, value: CellValue) {
        self.fields.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields.get(key)
    }

    fn text(&self, key: &str) -> Option<String> {
        self.get(key).map(CellValue::as_text)
    }

    pub fn email(&self) -> Option<String> {
        self.text("email")
    }

    pub fn name(&self) -> Option<String> {
        self.text("name")
    }

    pub fn number(&self) -> Option<String> {
        self.text("number")
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text() {
        assert_eq!(CellValue::Float(42.0).as_text(), "42");
        assert_eq!(CellValue::Float(4.5).as_text(), "4.5");
        assert_eq!(CellValue::Int(-7).as_text(), "-7");
        assert_eq!(CellValue::Bool(true).as_text(), "true");
        assert_eq!(CellValue::from("Sam").as_text(), "Sam");
    }

    #[test]
    fn test_record_keeps_column_order() {
        let record = RawContactRecord::new()
            .with("Name", "Sam")
            .with("Email", "sam@example.com");

        let labels: Vec<&str> = record.iter().map(|(label, _)| label).collect();
        assert_eq!(labels, vec!["Name", "Email"]);
        assert_eq!(record.get("Email"), Some(&CellValue::from("sam@example.com")));
        assert!(record.get("email").is_none());
    }
}
