use acv_mix_report::*;
use std::io::Write;

fn scenario() -> Vec<Record> {
    vec![
        Record::new(2, 100_000.0, "2024-Q1", "Existing Customer"),
        Record::new(1, 50_000.0, "2024-Q1", "New Customer"),
        Record::new(3, 150_000.0, "2024-Q2", "Existing Customer"),
    ]
}

fn mixed_records() -> Vec<Record> {
    vec![
        Record::new(4, 12_345.67, "2023-Q4", "Existing Customer"),
        Record::new(2, 0.1, "2024-Q1", "New Customer"),
        Record::new(1, 0.2, "2024-Q1", "Partner"),
        Record::new(9, 987_654.32, "2024-Q2", "Existing Customer"),
        Record::new(3, 0.3, "2024-Q2", "New Customer"),
        Record::new(5, 45_000.0, "2023-Q4", "Reseller"),
        Record::new(1, 33_333.33, "2024-Q1", "Existing Customer"),
        Record::new(0, 0.0, "2024-Q3", "New Customer"),
    ]
}

#[test]
fn test_end_to_end_scenario() {
    let agg = Aggregation::from_records(&scenario());

    assert_eq!(agg.quarters, vec!["2024-Q1", "2024-Q2"]);
    let cell = agg.cell("2024-Q1", "Existing Customer");
    assert_eq!(cell.count, 2);
    assert_eq!(cell.acv(), 100_000.0);

    let q1 = agg.quarter_total("2024-Q1");
    assert_eq!((q1.count, q1.acv()), (3, 150_000.0));
    assert_eq!(percent_of_total(cell.acv(), q1.acv()), 67);

    assert_eq!(agg.grand_total.count, 6);
    assert_eq!(agg.grand_total.acv(), 300_000.0);

    let table = summary_table(&agg, &CategoryScheme::default(), TableOptions::default());
    assert_eq!(table.rows[0].cells[0].percent, 67);
    assert_eq!(table.total_row.total.totals, agg.grand_total);
}

#[test]
fn test_grand_total_matches_every_axis() {
    let agg = Aggregation::from_records(&mixed_records());

    let by_quarter: Totals = agg.quarter_totals.values().sum();
    let by_type: Totals = agg.type_totals.values().sum();
    assert_eq!(by_quarter, agg.grand_total);
    assert_eq!(by_type, agg.grand_total);

    for q in &agg.quarters {
        let row: Totals = agg
            .cust_types()
            .map(|t| agg.cell(q, t))
            .sum();
        assert_eq!(row, agg.quarter_total(q));
    }
    assert!((agg.grand_total.acv() - 1_078_333.92).abs() < 1e-6);
}

#[test]
fn test_input_order_does_not_matter() {
    let records = mixed_records();
    let baseline = Aggregation::from_records(&records);

    let mut reversed = records.clone();
    reversed.reverse();
    assert_eq!(Aggregation::from_records(&reversed), baseline);

    let mut rotated = records.clone();
    rotated.rotate_left(3);
    assert_eq!(Aggregation::from_records(&rotated), baseline);

    let mut interleaved: Vec<Record> = records.iter().step_by(2).cloned().collect();
    interleaved.extend(records.iter().skip(1).step_by(2).cloned());
    assert_eq!(Aggregation::from_records(&interleaved), baseline);
}

#[test]
fn test_unknown_type_still_counts() {
    let mut records = scenario();
    records.push(Record::new(2, 40_000.0, "2024-Q2", "Partner"));
    let agg = Aggregation::from_records(&records);

    assert_eq!(agg.quarter_total("2024-Q2"), Totals::new(5, 190_000.0));
    assert_eq!(agg.grand_total, Totals::new(8, 340_000.0));

    let scheme = CategoryScheme::default();
    let ring = doughnut(&agg, &scheme);
    let partner = ring.arcs.iter().find(|a| a.cust_type == "Partner").unwrap();
    assert_eq!(partner.color, scheme.fallback.color);

    let bars = stacked_bar(&agg, &scheme);
    assert_eq!(bars.bars[1].total_label, "$190K");
}

#[test]
fn test_empty_dataset() {
    let agg = Aggregation::from_records(&[]);
    assert!(agg.quarters.is_empty());
    assert_eq!(agg.grand_total, Totals::ZERO);
    assert!(aggregate_by_type(&[]).is_empty());
    assert!(aggregate_by_quarter_and_type(&[]).is_empty());

    let summary = generate_summary(&[], &agg);
    assert_eq!(summary.total_records, 0);
    assert_eq!(summary.grand_total_display, "$0K");
}

#[test]
fn test_format_money_examples() {
    assert_eq!(format_money(0.0), "$0K");
    assert_eq!(format_money(125_000.0), "$125K");
    assert_eq!(format_money(1_250_000.0), "$1,250K");
}

#[test]
fn test_load_json_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("customer-type.json");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        r#"[
            {{"count": 2, "acv": 100000, "closed_fiscal_quarter": "2024-Q1", "Cust_Type": "Existing Customer"}},
            {{"count": 1, "acv": 50000, "closed_fiscal_quarter": "2024-Q1", "Cust_Type": "New Customer"}},
            {{"count": 3, "acv": 150000, "closed_fiscal_quarter": "2024-Q2", "Cust_Type": "Existing Customer"}},
            {{"count": 1, "acv": 999, "Cust_Type": "New Customer"}}
        ]"#
    )
    .unwrap();

    let (records, report) = load_records(&path).unwrap();
    assert_eq!(records, scenario());
    assert_eq!(report.total_rows, 4);
    assert_eq!(report.dropped_rows, 1);
}

#[test]
fn test_load_csv_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("customer-type.csv");
    std::fs::write(
        &path,
        "count,acv,closed_fiscal_quarter,Cust_Type\n\
         2,100000,2024-Q1,Existing Customer\n\
         1,50000,2024-Q1,New Customer\n\
         3,150000,2024-Q2,Existing Customer\n",
    )
    .unwrap();

    let (records, _) = load_records(&path).unwrap();
    assert_eq!(records, scenario());
}

#[test]
fn test_missing_file_is_data_source_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_records(dir.path().join("absent.json")).unwrap_err();
    assert!(err.is_data_source());

    let body = ErrorBody::from(&err);
    assert_eq!(body.error, "Failed to load customer type data");
    assert!(body.message.contains("absent.json"));
}

#[test]
fn test_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("customer-type.xml");
    std::fs::write(&path, "<rows/>").unwrap();
    let err = load_records(&path).unwrap_err();
    assert!(matches!(err, DashboardError::UnsupportedFormat(_)));
}

#[test]
fn test_exports_written_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let agg = Aggregation::from_records(&scenario());
    let scheme = CategoryScheme::default();

    let bar_path = dir.path().join("bar.csv");
    output::write_csv(&bar_path, &stacked_bar(&agg, &scheme).to_rows()).unwrap();
    let bar_csv = std::fs::read_to_string(&bar_path).unwrap();
    assert!(bar_csv.starts_with("Quarter,CustType,Color,Opps,ACV,Y0,Y1,QuarterTotal"));
    assert_eq!(bar_csv.lines().count(), 1 + 4);

    let table = summary_table(&agg, &scheme, TableOptions::default());
    let table_path = dir.path().join("table.csv");
    output::write_grid_csv(&table_path, &table.header(), &table.body()).unwrap();
    let table_csv = std::fs::read_to_string(&table_path).unwrap();
    assert!(table_csv.contains("Existing Customer,2,$100K,67%"));

    let summary_path = dir.path().join("summary.json");
    output::write_json(&summary_path, &generate_summary(&scenario(), &agg)).unwrap();
    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary_path).unwrap()).unwrap();
    assert_eq!(summary["grand_total"]["count"], 6);
    assert_eq!(summary["grand_total_display"], "$300K");
}

#[test]
fn test_configured_categories_drive_rows_and_colors() {
    let scheme = config::parse_category_scheme(
        r##"{
            "categories": [
                {"label": "New Customer", "color": "#00aa00"},
                {"label": "Partner", "color": "#aa00aa"}
            ],
            "fallback": {"label": "Unassigned", "color": "#999"}
        }"##,
    )
    .unwrap();

    let mut records = scenario();
    records.push(Record::new(1, 10_000.0, "2024-Q2", "Partner"));
    let agg = Aggregation::from_records(&records);
    let table = summary_table(&agg, &scheme, TableOptions::default());

    let labels: Vec<&str> = table.rows.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["New Customer", "Partner", "Unassigned"]);
    assert_eq!(table.rows[2].total.totals, Totals::new(5, 250_000.0));

    let ring = doughnut(&agg, &scheme);
    let order: Vec<&str> = ring.arcs.iter().map(|a| a.cust_type.as_str()).collect();
    assert_eq!(order, vec!["New Customer", "Partner", "Existing Customer"]);
    assert_eq!(ring.arcs[2].color, "#999");
}

#[test]
fn test_memoized_aggregation_shared_by_adapters() {
    let dataset = Dataset::new(scenario());
    let mut memo = MemoizedAggregation::new();
    let scheme = CategoryScheme::default();

    let for_bar = memo.get_or_compute(&dataset);
    let for_table = memo.get_or_compute(&dataset);
    assert!(std::sync::Arc::ptr_eq(&for_bar, &for_table));

    let bar = stacked_bar(&for_bar, &scheme);
    let table = summary_table(&for_table, &scheme, TableOptions::default());
    assert_eq!(bar.bars[0].total, table.total_row.cells[0].totals);
}
