//! Aggregation engine.
//!
//! Turns the flat record list into the views every presentation shares:
//! per-type totals, the quarter x type matrix, per-quarter totals and the
//! grand total. All of it is built in single grouping passes over the input,
//! and sums are exact so the result does not depend on record order.
use crate::types::{Record, Totals};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// custType -> totals across every quarter.
pub fn aggregate_by_type(records: &[Record]) -> BTreeMap<String, Totals> {
    let mut totals: BTreeMap<String, Totals> = BTreeMap::new();
    for r in records {
        *totals.entry(r.cust_type.clone()).or_default() += Totals::from(r);
    }
    totals
}

/// Sparse quarter -> custType -> totals, with zero-valued reads for any
/// pair that never occurred.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QuarterTypeMatrix {
    cells: BTreeMap<String, BTreeMap<String, Totals>>,
}

impl QuarterTypeMatrix {
    /// Observed quarters in ascending label order.
    pub fn quarters(&self) -> Vec<String> {
        self.cells.keys().cloned().collect()
    }

    /// Every customer type seen in any quarter, ascending.
    pub fn cust_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .cells
            .values()
            .flat_map(|row| row.keys().cloned())
            .collect();
        types.sort();
        types.dedup();
        types
    }

    pub fn get(&self, quarter: &str, cust_type: &str) -> Totals {
        self.cells
            .get(quarter)
            .and_then(|row| row.get(cust_type))
            .copied()
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

pub fn aggregate_by_quarter_and_type(records: &[Record]) -> QuarterTypeMatrix {
    let mut cells: BTreeMap<String, BTreeMap<String, Totals>> = BTreeMap::new();
    for r in records {
        *cells
            .entry(r.closed_fiscal_quarter.clone())
            .or_default()
            .entry(r.cust_type.clone())
            .or_default() += Totals::from(r);
    }
    QuarterTypeMatrix { cells }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatrixTotals {
    pub by_quarter: BTreeMap<String, Totals>,
    pub by_type: BTreeMap<String, Totals>,
    pub grand: Totals,
}

impl MatrixTotals {
    pub fn quarter(&self, quarter: &str) -> Totals {
        self.by_quarter.get(quarter).copied().unwrap_or_default()
    }

    pub fn cust_type(&self, cust_type: &str) -> Totals {
        self.by_type.get(cust_type).copied().unwrap_or_default()
    }
}

/// Column totals per quarter, row totals per type and the grand total over
/// the `quarters` x `types` sub-grid of `matrix`. Absent cells count as zero.
pub fn compute_totals<Q, T>(matrix: &QuarterTypeMatrix, quarters: &[Q], types: &[T]) -> MatrixTotals
where
    Q: AsRef<str>,
    T: AsRef<str>,
{
    let mut out = MatrixTotals::default();
    for t in types {
        out.by_type.entry(t.as_ref().to_string()).or_default();
    }
    for q in quarters {
        let q = q.as_ref();
        let column = out.by_quarter.entry(q.to_string()).or_default();
        for t in types {
            let t = t.as_ref();
            let cell = matrix.get(q, t);
            *column += cell;
            *out.by_type.entry(t.to_string()).or_default() += cell;
            out.grand += cell;
        }
    }
    out
}

/// Every derived view of one record list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregation {
    pub quarters: Vec<String>,
    pub type_totals: BTreeMap<String, Totals>,
    pub quarter_type_totals: QuarterTypeMatrix,
    pub quarter_totals: BTreeMap<String, Totals>,
    pub grand_total: Totals,
}

impl Aggregation {
    pub fn from_records(records: &[Record]) -> Self {
        let matrix = aggregate_by_quarter_and_type(records);
        let quarters = matrix.quarters();
        let types = matrix.cust_types();
        let totals = compute_totals(&matrix, &quarters, &types);
        Aggregation {
            quarters,
            type_totals: totals.by_type,
            quarter_type_totals: matrix,
            quarter_totals: totals.by_quarter,
            grand_total: totals.grand,
        }
    }

    pub fn cell(&self, quarter: &str, cust_type: &str) -> Totals {
        self.quarter_type_totals.get(quarter, cust_type)
    }

    pub fn quarter_total(&self, quarter: &str) -> Totals {
        self.quarter_totals.get(quarter).copied().unwrap_or_default()
    }

    pub fn type_total(&self, cust_type: &str) -> Totals {
        self.type_totals.get(cust_type).copied().unwrap_or_default()
    }

    pub fn cust_types(&self) -> impl Iterator<Item = &String> {
        self.type_totals.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.quarters.is_empty()
    }
}

static NEXT_DATASET_VERSION: AtomicU64 = AtomicU64::new(1);

/// A loaded record list tagged with a process-unique version.
#[derive(Debug, Clone)]
pub struct Dataset {
    version: u64,
    records: Arc<Vec<Record>>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Dataset {
            version: NEXT_DATASET_VERSION.fetch_add(1, Ordering::Relaxed),
            records: Arc::new(records),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }
}

/// Holds the aggregation of the most recent dataset so several adapters can
/// share one computation.
#[derive(Debug, Default)]
pub struct MemoizedAggregation {
    cached: Option<(u64, Arc<Aggregation>)>,
}

impl MemoizedAggregation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(&mut self, dataset: &Dataset) -> Arc<Aggregation> {
        if let Some((version, agg)) = &self.cached {
            if *version == dataset.version() {
                debug!(version, "reusing memoized aggregation");
                return Arc::clone(agg);
            }
        }
        debug!(version = dataset.version(), "aggregating dataset");
        let agg = Arc::new(Aggregation::from_records(dataset.records()));
        self.cached = Some((dataset.version(), Arc::clone(&agg)));
        agg
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}
