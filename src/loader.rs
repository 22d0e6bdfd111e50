use crate::error::{DashboardError, Result};
use crate::types::{RawRecord, Record};
use crate::util::{amount_from_raw, count_from_raw};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    /// Rows without a fiscal quarter or customer type.
    pub dropped_rows: usize,
    /// Rows whose count or acv was missing or unusable and was read as 0.
    pub defaulted_rows: usize,
    /// JSON elements or CSV rows that could not be decoded at all.
    pub parse_errors: usize,
}

/// Read the record list from `path`. `.json` files hold an array of records,
/// `.csv` files use the same field names as headers.
pub fn load_records(path: impl AsRef<Path>) -> Result<(Vec<Record>, LoadReport)> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let read_err = |source| DashboardError::DataSource {
        path: path.display().to_string(),
        source,
    };

    let (records, report) = match ext.as_str() {
        "json" => {
            let text = std::fs::read_to_string(path).map_err(read_err)?;
            parse_json_records(&text)?
        }
        "csv" => {
            let file = std::fs::File::open(path).map_err(read_err)?;
            read_csv_records(file)?
        }
        other => {
            return Err(DashboardError::UnsupportedFormat(format!(
                "{} (extension {:?})",
                path.display(),
                other
            )))
        }
    };
    info!(
        path = %path.display(),
        total = report.total_rows,
        kept = report.kept_rows,
        dropped = report.dropped_rows,
        "loaded customer type records"
    );
    Ok((records, report))
}

/// Parse a JSON array of records. The array itself must be well formed; an
/// element that does not decode as a record is skipped and counted in
/// `parse_errors`.
pub fn parse_json_records(text: &str) -> Result<(Vec<Record>, LoadReport)> {
    let values: Vec<serde_json::Value> = serde_json::from_str(text)?;
    let mut raws = Vec::with_capacity(values.len());
    let mut parse_errors = 0usize;
    for (idx, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<RawRecord>(value) {
            Ok(r) => raws.push(r),
            Err(e) => {
                warn!(record = idx, error = %e, "skipping undecodable JSON record");
                parse_errors += 1;
            }
        }
    }
    Ok(with_parse_errors(clean_records(raws), parse_errors))
}

pub fn read_csv_records<R: Read>(reader: R) -> Result<(Vec<Record>, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut raws = Vec::new();
    let mut parse_errors = 0usize;
    for (idx, result) in rdr.deserialize::<RawRecord>().enumerate() {
        match result {
            Ok(r) => raws.push(r),
            Err(e) => {
                warn!(row = idx, error = %e, "skipping undecodable CSV row");
                parse_errors += 1;
            }
        }
    }
    Ok(with_parse_errors(clean_records(raws), parse_errors))
}

fn with_parse_errors(
    (records, mut report): (Vec<Record>, LoadReport),
    parse_errors: usize,
) -> (Vec<Record>, LoadReport) {
    report.total_rows += parse_errors;
    report.parse_errors = parse_errors;
    (records, report)
}

/// Turn raw rows into records. Rows missing a quarter or customer type are
/// dropped; a missing or unusable count/acv is read as 0.
pub fn clean_records<I>(raws: I) -> (Vec<Record>, LoadReport)
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for (idx, raw) in raws.into_iter().enumerate() {
        report.total_rows += 1;

        let quarter = non_blank(raw.closed_fiscal_quarter.as_deref());
        let cust_type = non_blank(raw.cust_type.as_deref());
        let (Some(quarter), Some(cust_type)) = (quarter, cust_type) else {
            warn!(
                record = idx,
                quarter = ?raw.closed_fiscal_quarter,
                cust_type = ?raw.cust_type,
                "skipping record without fiscal quarter or customer type"
            );
            report.dropped_rows += 1;
            continue;
        };

        let count = count_from_raw(raw.count.as_ref());
        let acv = amount_from_raw(raw.acv.as_ref());
        if count.is_none() || acv.is_none() {
            debug!(
                record = idx,
                count = ?raw.count,
                acv = ?raw.acv,
                "missing or invalid count/acv read as 0"
            );
            report.defaulted_rows += 1;
        }

        records.push(Record {
            count: count.unwrap_or(0),
            acv: acv.unwrap_or(0.0),
            closed_fiscal_quarter: quarter.to_string(),
            cust_type: cust_type.to_string(),
        });
    }

    report.kept_rows = records.len();
    (records, report)
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
