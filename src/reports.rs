use crate::engine::{compute_totals, Aggregation};
use crate::types::{BarSegmentRow, CategoryScheme, DoughnutRow, Record, SummaryStats, Totals};
use crate::util::{format_money, format_number, format_percent, percent_of_total};
use serde::Serialize;
use std::f64::consts::TAU;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSegment {
    pub cust_type: String,
    pub color: String,
    pub totals: Totals,
    /// Bottom and top of the segment, in ACV units.
    pub y0: f64,
    pub y1: f64,
    /// In-segment value label; only positive segments carry one.
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedBar {
    pub quarter: String,
    pub segments: Vec<BarSegment>,
    pub total: Totals,
    pub total_label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StackedBarChart {
    pub bars: Vec<StackedBar>,
    pub y_max: f64,
}

impl StackedBarChart {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn to_rows(&self) -> Vec<BarSegmentRow> {
        self.bars
            .iter()
            .flat_map(|bar| {
                bar.segments.iter().map(move |s| BarSegmentRow {
                    quarter: bar.quarter.clone(),
                    cust_type: s.cust_type.clone(),
                    color: s.color.clone(),
                    count: s.totals.count,
                    acv: format_money(s.totals.acv()),
                    y0: s.y0,
                    y1: s.y1,
                    quarter_total: bar.total_label.clone(),
                })
            })
            .collect()
    }
}

/// One bar per quarter (ascending), one segment per observed customer type
/// stacked bottom-up in display order. A type missing from a quarter still
/// gets a zero-height segment.
pub fn stacked_bar(agg: &Aggregation, scheme: &CategoryScheme) -> StackedBarChart {
    let types = scheme.display_order(agg.cust_types());
    let mut y_max = 0.0f64;

    let bars: Vec<StackedBar> = agg
        .quarters
        .iter()
        .map(|q| {
            let mut running = Totals::ZERO;
            let segments = types
                .iter()
                .map(|t| {
                    let cell = agg.cell(q, t);
                    let y0 = running.acv();
                    running += cell;
                    BarSegment {
                        cust_type: t.clone(),
                        color: scheme.color_for(t).to_string(),
                        totals: cell,
                        y0,
                        y1: running.acv(),
                        label: (cell.acv_cents() > 0).then(|| format_money(cell.acv())),
                    }
                })
                .collect();
            let total = agg.quarter_total(q);
            y_max = y_max.max(total.acv());
            StackedBar {
                quarter: q.clone(),
                segments,
                total,
                total_label: format_money(total.acv()),
            }
        })
        .collect();

    StackedBarChart { bars, y_max }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoughnutArc {
    pub cust_type: String,
    pub color: String,
    pub totals: Totals,
    pub percent: u32,
    /// Radians, clockwise from twelve o'clock.
    pub start_angle: f64,
    pub end_angle: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoughnutChart {
    pub arcs: Vec<DoughnutArc>,
    pub total: Totals,
    pub center_label: String,
}

impl DoughnutChart {
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    pub fn to_rows(&self) -> Vec<DoughnutRow> {
        self.arcs
            .iter()
            .map(|a| DoughnutRow {
                cust_type: a.cust_type.clone(),
                color: a.color.clone(),
                count: a.totals.count,
                acv: format_money(a.totals.acv()),
                percent: format_percent(a.percent),
                start_angle: format_number(a.start_angle, 4),
                end_angle: format_number(a.end_angle, 4),
                label: a.label.clone(),
            })
            .collect()
    }
}

/// One arc per customer type, sized by its share of the grand-total ACV.
pub fn doughnut(agg: &Aggregation, scheme: &CategoryScheme) -> DoughnutChart {
    let total = agg.grand_total;
    let total_cents = total.acv_cents();
    let mut running: i128 = 0;

    let arcs = scheme
        .display_order(agg.cust_types())
        .into_iter()
        .map(|t| {
            let totals = agg.type_total(&t);
            let start_angle = share_angle(running, total_cents);
            running += totals.acv_cents();
            let percent = percent_of_total(totals.acv(), total.acv());
            DoughnutArc {
                color: scheme.color_for(&t).to_string(),
                label: format!("{} ({}%)", format_money(totals.acv()), percent),
                cust_type: t,
                totals,
                percent,
                start_angle,
                end_angle: share_angle(running, total_cents),
            }
        })
        .collect();

    DoughnutChart {
        arcs,
        total,
        center_label: format!("Total {}", format_money(total.acv())),
    }
}

fn share_angle(part_cents: i128, total_cents: i128) -> f64 {
    if total_cents <= 0 {
        return 0.0;
    }
    TAU * (part_cents as f64 / total_cents as f64)
}

/// Which total a table percentage is taken against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PercentBasis {
    /// The total of the column the cell sits in: the quarter total for a
    /// quarter column, the grand total for the Total column.
    ColumnTotal,
    GrandTotal,
}

/// Percentage denominators for the summary table. The default matches the
/// dashboard: quarter cells against their quarter, the Total column against
/// the grand total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableOptions {
    pub quarter_cell_basis: PercentBasis,
    pub total_column_basis: PercentBasis,
}

impl Default for TableOptions {
    fn default() -> Self {
        TableOptions {
            quarter_cell_basis: PercentBasis::ColumnTotal,
            total_column_basis: PercentBasis::GrandTotal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TableCell {
    pub totals: Totals,
    pub percent: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub label: String,
    pub color: Option<String>,
    /// One cell per quarter, aligned with `SummaryTable::quarters`.
    pub cells: Vec<TableCell>,
    pub total: TableCell,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    pub quarters: Vec<String>,
    pub rows: Vec<TableRow>,
    pub total_row: TableRow,
}

impl SummaryTable {
    pub fn is_empty(&self) -> bool {
        self.quarters.is_empty()
    }

    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["Cust Type".to_string()];
        for q in self.quarters.iter().map(String::as_str).chain(["Total"]) {
            header.push(format!("{} # of Opps", q));
            header.push(format!("{} ACV", q));
            header.push(format!("{} % of Total", q));
        }
        header
    }

    /// Display strings for every body row, Total row last.
    pub fn body(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .chain(std::iter::once(&self.total_row))
            .map(|row| {
                let mut out = vec![row.label.clone()];
                for cell in row.cells.iter().chain(std::iter::once(&row.total)) {
                    out.push(cell.totals.count.to_string());
                    out.push(format_money(cell.totals.acv()));
                    out.push(format_percent(cell.percent));
                }
                out
            })
            .collect()
    }
}

/// Quarter x category pivot. Configured categories always get a row, in
/// configured order; every unknown customer type is folded into one
/// fallback row, present only when such types occur.
pub fn summary_table(
    agg: &Aggregation,
    scheme: &CategoryScheme,
    options: TableOptions,
) -> SummaryTable {
    let quarters = &agg.quarters;
    let grand = agg.grand_total;

    let percent = |part: Totals, column: Totals, basis: PercentBasis| {
        let whole = match basis {
            PercentBasis::ColumnTotal => column,
            PercentBasis::GrandTotal => grand,
        };
        percent_of_total(part.acv(), whole.acv())
    };

    let build_row = |label: &str, color: Option<&str>, types: &[&str]| {
        let totals = compute_totals(&agg.quarter_type_totals, quarters, types);
        let cells = quarters
            .iter()
            .map(|q| {
                let part = totals.quarter(q);
                TableCell {
                    totals: part,
                    percent: percent(part, agg.quarter_total(q), options.quarter_cell_basis),
                }
            })
            .collect();
        TableRow {
            label: label.to_string(),
            color: color.map(str::to_string),
            cells,
            total: TableCell {
                totals: totals.grand,
                percent: percent(totals.grand, grand, options.total_column_basis),
            },
        }
    };

    let mut rows: Vec<TableRow> = scheme
        .categories
        .iter()
        .map(|c| build_row(&c.label, Some(c.color.as_str()), &[c.label.as_str()]))
        .collect();

    let unknown: Vec<&str> = agg
        .cust_types()
        .map(String::as_str)
        .filter(|t| !scheme.is_known(t))
        .collect();
    if !unknown.is_empty() {
        rows.push(build_row(
            &scheme.fallback.label,
            Some(scheme.fallback.color.as_str()),
            &unknown,
        ));
    }

    let total_row = TableRow {
        label: "Total".to_string(),
        color: None,
        cells: quarters
            .iter()
            .map(|q| {
                let column = agg.quarter_total(q);
                TableCell {
                    totals: column,
                    percent: percent(column, column, options.quarter_cell_basis),
                }
            })
            .collect(),
        total: TableCell {
            totals: grand,
            percent: percent(grand, grand, options.total_column_basis),
        },
    };

    SummaryTable {
        quarters: quarters.clone(),
        rows,
        total_row,
    }
}

pub fn generate_summary(records: &[Record], agg: &Aggregation) -> SummaryStats {
    SummaryStats {
        total_records: records.len(),
        total_quarters: agg.quarters.len(),
        total_cust_types: agg.type_totals.len(),
        grand_total: agg.grand_total,
        grand_total_display: format_money(agg.grand_total.acv()),
    }
}
