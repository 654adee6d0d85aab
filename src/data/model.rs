use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the source table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value.
/// Used as a `BTreeMap` value and in `BTreeSet`s, so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn rank(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Date(_) => 4,
                Text(_) => 5,
            }
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the value as an `f64` for plotting.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if v.is_finite() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Guess the type of a raw text cell (CSV, JSON strings).
    pub fn guess(s: &str) -> CellValue {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("nan") {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::Text(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the dataset
// ---------------------------------------------------------------------------

/// A single observation: one region at one date.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    pub region: String,
    /// Every other column: column_name → value.
    pub fields: BTreeMap<String, CellValue>,
}

impl Record {
    /// Numeric value of `column`, if present and numeric.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.fields.get(column).and_then(CellValue::as_f64)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed table with pre-computed indices.
///
/// Built once by the loader and never mutated afterwards: there are no
/// `&mut self` methods and the fields are private.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
    columns: Vec<String>,
    numeric_columns: Vec<String>,
    regions: BTreeSet<String>,
    date_range: Option<(NaiveDate, NaiveDate)>,
}

impl Dataset {
    /// Build indices from loaded records.
    ///
    /// `columns` is the header of the source file in its original order,
    /// including the date and region columns.
    pub fn from_records(columns: Vec<String>, records: Vec<Record>) -> Self {
        let mut regions = BTreeSet::new();
        let mut min_date: Option<NaiveDate> = None;
        let mut max_date: Option<NaiveDate> = None;
        // column → (saw a number, saw a non-numeric non-null)
        let mut kinds: BTreeMap<&str, (bool, bool)> = BTreeMap::new();

        for rec in &records {
            regions.insert(rec.region.clone());
            min_date = Some(min_date.map_or(rec.date, |d| d.min(rec.date)));
            max_date = Some(max_date.map_or(rec.date, |d| d.max(rec.date)));
            for (col, val) in &rec.fields {
                let entry = kinds.entry(col.as_str()).or_default();
                match val {
                    CellValue::Null => {}
                    CellValue::Integer(_) | CellValue::Float(_) => entry.0 = true,
                    _ => entry.1 = true,
                }
            }
        }

        let numeric_columns = columns
            .iter()
            .filter(|c| matches!(kinds.get(c.as_str()), Some((true, false))))
            .cloned()
            .collect();

        Dataset {
            records,
            columns,
            numeric_columns,
            regions,
            date_range: min_date.zip(max_date),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// All column names in source order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Columns whose non-null values are all numeric.
    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    pub fn is_numeric(&self, column: &str) -> bool {
        self.numeric_columns.iter().any(|c| c == column)
    }

    /// Sorted set of distinct regions.
    pub fn regions(&self) -> &BTreeSet<String> {
        &self.regions
    }

    /// Earliest and latest date, `None` for an empty dataset.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_range
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn record(region: &str, d: NaiveDate, hiv: Option<f64>, urban: f64) -> Record {
        let mut fields = BTreeMap::new();
        fields.insert(
            "hiv_incidence".to_string(),
            hiv.map_or(CellValue::Null, CellValue::Float),
        );
        fields.insert("urbanization_level".to_string(), CellValue::Float(urban));
        fields.insert("source".to_string(), CellValue::Text("GHS".to_string()));
        Record {
            date: d,
            region: region.to_string(),
            fields,
        }
    }

    /// Small fixture used across the data-layer tests.
    pub(crate) fn sample_dataset() -> Dataset {
        let columns = ["date", "region", "hiv_incidence", "urbanization_level", "source"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Dataset::from_records(
            columns,
            vec![
                record("Ashanti", date(2020, 1, 1), Some(1.0), 0.4),
                record("Volta", date(2020, 1, 1), Some(3.0), 0.2),
                record("Ashanti", date(2021, 1, 1), Some(2.0), 0.5),
                record("Volta", date(2021, 1, 1), None, 0.3),
                record("Northern", date(2022, 6, 1), Some(5.0), 0.1),
            ],
        )
    }

    #[test]
    fn indices_are_derived_from_records() {
        let ds = sample_dataset();
        assert_eq!(ds.len(), 5);
        assert_eq!(
            ds.regions().iter().cloned().collect::<Vec<_>>(),
            vec!["Ashanti", "Northern", "Volta"]
        );
        assert_eq!(ds.date_range(), Some((date(2020, 1, 1), date(2022, 6, 1))));
        assert_eq!(ds.numeric_columns(), ["hiv_incidence", "urbanization_level"]);
        assert!(!ds.is_numeric("source"));
    }

    #[test]
    fn empty_dataset_has_no_range() {
        let ds = Dataset::from_records(vec!["date".into(), "region".into()], Vec::new());
        assert!(ds.is_empty());
        assert_eq!(ds.date_range(), None);
        assert!(ds.numeric_columns().is_empty());
    }

    #[test]
    fn guess_detects_cell_types() {
        assert_eq!(CellValue::guess(""), CellValue::Null);
        assert_eq!(CellValue::guess("NaN"), CellValue::Null);
        assert_eq!(CellValue::guess("42"), CellValue::Integer(42));
        assert_eq!(CellValue::guess("0.25"), CellValue::Float(0.25));
        assert_eq!(CellValue::guess("true"), CellValue::Bool(true));
        assert_eq!(CellValue::guess("Ashanti"), CellValue::Text("Ashanti".into()));
    }

    #[test]
    fn mixed_values_are_totally_ordered() {
        let mut set = BTreeSet::new();
        set.insert(CellValue::Text("b".into()));
        set.insert(CellValue::Float(1.5));
        set.insert(CellValue::Null);
        set.insert(CellValue::Integer(3));
        let ordered: Vec<_> = set.into_iter().collect();
        assert_eq!(ordered[0], CellValue::Null);
        assert_eq!(ordered[3], CellValue::Text("b".into()));
    }
}
