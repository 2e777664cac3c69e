use std::collections::BTreeMap;

use serde::Serialize;

use purchreq_core::Money;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Integer(i64),
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        CellValue::Integer(i64::from(value))
    }
}

impl From<Money> for CellValue {
    fn from(value: Money) -> Self {
        CellValue::Number(value.as_f64())
    }
}

/// One worksheet: A1-style address → value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    pub name: String,
    pub cells: BTreeMap<String, CellValue>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, address: impl Into<String>, value: impl Into<CellValue>) {
        self.cells.insert(address.into(), value.into());
    }

    pub fn get(&self, address: &str) -> Option<&CellValue> {
        self.cells.get(address)
    }
}

/// A filled-in copy of a template workbook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workbook {
    /// Template the cell writes apply to.
    pub template: &'static str,
    /// Name of the produced file.
    pub file_name: String,
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}
