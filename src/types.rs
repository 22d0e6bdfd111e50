use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use tabled::Tabled;

/// Numeric cell as it arrives from JSON or CSV: a real number, text such as
/// `"1,250.50"` that still needs lenient parsing, or any other value, which
/// is never usable as a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Num(f64),
    Text(String),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub count: Option<RawNumber>,
    #[serde(default)]
    pub acv: Option<RawNumber>,
    #[serde(rename = "closed_fiscal_quarter", default)]
    pub closed_fiscal_quarter: Option<String>,
    #[serde(rename = "Cust_Type", default)]
    pub cust_type: Option<String>,
}

/// One opportunity-group row after cleaning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub count: u64,
    pub acv: f64,
    #[serde(rename = "closed_fiscal_quarter")]
    pub closed_fiscal_quarter: String,
    #[serde(rename = "Cust_Type")]
    pub cust_type: String,
}

impl Record {
    pub fn new(count: u64, acv: f64, quarter: &str, cust_type: &str) -> Self {
        Record {
            count,
            acv,
            closed_fiscal_quarter: quarter.to_string(),
            cust_type: cust_type.to_string(),
        }
    }
}

/// `{count, acv}` pair. ACV is held as whole cents so that sums are exact and
/// do not depend on the order records are added in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Totals {
    pub count: u64,
    acv_cents: i128,
}

impl Totals {
    pub const ZERO: Totals = Totals {
        count: 0,
        acv_cents: 0,
    };

    pub fn new(count: u64, acv: f64) -> Self {
        Totals {
            count,
            acv_cents: to_cents(acv),
        }
    }

    pub fn acv(&self) -> f64 {
        self.acv_cents as f64 / 100.0
    }

    pub fn acv_cents(&self) -> i128 {
        self.acv_cents
    }
}

fn to_cents(acv: f64) -> i128 {
    if !acv.is_finite() {
        return 0;
    }
    (acv * 100.0).round() as i128
}

impl From<&Record> for Totals {
    fn from(r: &Record) -> Self {
        Totals::new(r.count, r.acv)
    }
}

impl AddAssign for Totals {
    fn add_assign(&mut self, rhs: Totals) {
        self.count = self.count.saturating_add(rhs.count);
        self.acv_cents = self.acv_cents.saturating_add(rhs.acv_cents);
    }
}

impl Add for Totals {
    type Output = Totals;

    fn add(mut self, rhs: Totals) -> Totals {
        self += rhs;
        self
    }
}

impl Sum for Totals {
    fn sum<I: Iterator<Item = Totals>>(iter: I) -> Totals {
        iter.fold(Totals::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Totals> for Totals {
    fn sum<I: Iterator<Item = &'a Totals>>(iter: I) -> Totals {
        iter.copied().sum()
    }
}

impl Serialize for Totals {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Totals", 2)?;
        s.serialize_field("count", &self.count)?;
        s.serialize_field("acv", &self.acv())?;
        s.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDef {
    pub label: String,
    pub color: String,
}

impl CategoryDef {
    pub fn new(label: &str, color: &str) -> Self {
        CategoryDef {
            label: label.to_string(),
            color: color.to_string(),
        }
    }
}

/// Ordered customer-type categories with their display colors. Anything not
/// listed is shown through `fallback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScheme {
    pub categories: Vec<CategoryDef>,
    #[serde(default = "CategoryScheme::default_fallback")]
    pub fallback: CategoryDef,
}

impl Default for CategoryScheme {
    fn default() -> Self {
        CategoryScheme {
            categories: vec![
                CategoryDef::new("Existing Customer", "#4285F4"),
                CategoryDef::new("New Customer", "#FB8C00"),
            ],
            fallback: Self::default_fallback(),
        }
    }
}

impl CategoryScheme {
    pub fn default_fallback() -> CategoryDef {
        CategoryDef::new("Other", "#ccc")
    }

    pub fn is_known(&self, cust_type: &str) -> bool {
        self.categories.iter().any(|c| c.label == cust_type)
    }

    pub fn color_for(&self, cust_type: &str) -> &str {
        self.categories
            .iter()
            .find(|c| c.label == cust_type)
            .map(|c| c.color.as_str())
            .unwrap_or(self.fallback.color.as_str())
    }

    /// Orders observed types for display: configured categories first in
    /// configured order, then unknown types by label.
    pub fn display_order<'a, I>(&self, observed: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut unknown: Vec<String> = Vec::new();
        let mut known: Vec<(usize, String)> = Vec::new();
        for t in observed {
            match self.categories.iter().position(|c| &c.label == t) {
                Some(idx) => known.push((idx, t.clone())),
                None => unknown.push(t.clone()),
            }
        }
        known.sort();
        known.dedup();
        unknown.sort();
        unknown.dedup();
        known.into_iter().map(|(_, t)| t).chain(unknown).collect()
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct BarSegmentRow {
    #[serde(rename = "Quarter")]
    #[tabled(rename = "Quarter")]
    pub quarter: String,
    #[serde(rename = "CustType")]
    #[tabled(rename = "CustType")]
    pub cust_type: String,
    #[serde(rename = "Color")]
    #[tabled(rename = "Color")]
    pub color: String,
    #[serde(rename = "Opps")]
    #[tabled(rename = "Opps")]
    pub count: u64,
    #[serde(rename = "ACV")]
    #[tabled(rename = "ACV")]
    pub acv: String,
    #[serde(rename = "Y0")]
    #[tabled(rename = "Y0")]
    pub y0: f64,
    #[serde(rename = "Y1")]
    #[tabled(rename = "Y1")]
    pub y1: f64,
    #[serde(rename = "QuarterTotal")]
    #[tabled(rename = "QuarterTotal")]
    pub quarter_total: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DoughnutRow {
    #[serde(rename = "CustType")]
    #[tabled(rename = "CustType")]
    pub cust_type: String,
    #[serde(rename = "Color")]
    #[tabled(rename = "Color")]
    pub color: String,
    #[serde(rename = "Opps")]
    #[tabled(rename = "Opps")]
    pub count: u64,
    #[serde(rename = "ACV")]
    #[tabled(rename = "ACV")]
    pub acv: String,
    #[serde(rename = "PctOfTotal")]
    #[tabled(rename = "PctOfTotal")]
    pub percent: String,
    #[serde(rename = "StartAngle")]
    #[tabled(rename = "StartAngle")]
    pub start_angle: String,
    #[serde(rename = "EndAngle")]
    #[tabled(rename = "EndAngle")]
    pub end_angle: String,
    #[serde(rename = "Label")]
    #[tabled(rename = "Label")]
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub total_records: usize,
    pub total_quarters: usize,
    pub total_cust_types: usize,
    pub grand_total: Totals,
    pub grand_total_display: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_accumulate_exactly() {
        let parts = [Totals::new(1, 0.1), Totals::new(1, 0.2), Totals::new(1, 0.3)];
        let forward: Totals = parts.iter().sum();
        let backward: Totals = parts.iter().rev().sum();
        assert_eq!(forward, backward);
        assert_eq!(forward.count, 3);
        assert_eq!(forward.acv(), 0.6);
    }

    #[test]
    fn non_finite_acv_counts_as_zero() {
        assert_eq!(Totals::new(2, f64::NAN).acv(), 0.0);
        assert_eq!(Totals::new(2, f64::INFINITY).acv(), 0.0);
    }

    #[test]
    fn oversized_totals_saturate_instead_of_overflowing() {
        let huge = Totals::new(u64::MAX, 1e40);
        let sum = huge + huge;
        assert_eq!(sum.count, u64::MAX);
        assert_eq!(sum.acv_cents(), i128::MAX);
    }

    #[test]
    fn totals_serialize_as_count_and_acv() {
        let json = serde_json::to_value(Totals::new(3, 150000.0)).unwrap();
        assert_eq!(json, serde_json::json!({"count": 3, "acv": 150000.0}));
    }

    #[test]
    fn unknown_types_use_fallback_color() {
        let scheme = CategoryScheme::default();
        assert_eq!(scheme.color_for("Existing Customer"), "#4285F4");
        assert_eq!(scheme.color_for("New Customer"), "#FB8C00");
        assert_eq!(scheme.color_for("Partner"), "#ccc");
        assert!(!scheme.is_known("Partner"));
    }

    #[test]
    fn display_order_puts_configured_categories_first() {
        let scheme = CategoryScheme::default();
        let observed = vec![
            "Partner".to_string(),
            "New Customer".to_string(),
            "Channel".to_string(),
            "Existing Customer".to_string(),
        ];
        assert_eq!(
            scheme.display_order(&observed),
            vec!["Existing Customer", "New Customer", "Channel", "Partner"]
        );
    }

    #[test]
    fn raw_record_reads_source_field_names() {
        let raw: RawRecord = serde_json::from_str(
            r#"{"count": 2, "acv": "1,500.25", "closed_fiscal_quarter": "2024-Q1", "Cust_Type": "New Customer"}"#,
        )
        .unwrap();
        assert_eq!(raw.count, Some(RawNumber::Num(2.0)));
        assert_eq!(raw.acv, Some(RawNumber::Text("1,500.25".to_string())));
        assert_eq!(raw.cust_type.as_deref(), Some("New Customer"));
    }

    #[test]
    fn record_serializes_with_source_field_names() {
        let json = serde_json::to_value(Record::new(2, 10.5, "2024-Q1", "New Customer")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "count": 2,
                "acv": 10.5,
                "closed_fiscal_quarter": "2024-Q1",
                "Cust_Type": "New Customer"
            })
        );
    }

    #[test]
    fn raw_record_accepts_non_numeric_amounts() {
        let raw: RawRecord = serde_json::from_str(
            r#"{"count": true, "acv": [1], "closed_fiscal_quarter": "2024-Q1", "Cust_Type": "New Customer"}"#,
        )
        .unwrap();
        assert_eq!(raw.count, Some(RawNumber::Other(serde_json::json!(true))));
        assert_eq!(raw.acv, Some(RawNumber::Other(serde_json::json!([1]))));
    }
}
