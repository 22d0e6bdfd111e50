// Entry point and interactive menu.
//
// - Option [1] loads the customer type dataset and prints load diagnostics.
// - Option [2] builds the stacked bar, doughnut and summary table views,
//   exports them and prints previews.
// - After generating reports, the user can go back to the menu or exit.
use acv_mix_report::{
    doughnut, generate_summary, load_records, output, stacked_bar, summary_table, util, Config,
    Dataset, ErrorBody, MemoizedAggregation,
};
use once_cell::sync::Lazy;
use std::io::{self, BufRead, Write};
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// The loaded dataset and its aggregation survive between menu choices so
// reports can be regenerated without reloading.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        dataset: None,
        aggregation: MemoizedAggregation::new(),
    })
});

struct AppState {
    dataset: Option<Dataset>,
    aggregation: MemoizedAggregation,
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// One trimmed line of input, or `None` once input is closed or unreadable.
fn read_trimmed_line<R: BufRead>(reader: &mut R) -> Option<String> {
    let mut buf = String::new();
    match reader.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    read_trimmed_line(&mut io::stdin().lock())
}

/// Returns `true` if the user chose `Y`, `false` if they chose `N` or input
/// ended.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let Some(answer) = read_trimmed_line(&mut io::stdin().lock()) else {
            return false;
        };
        match answer.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn print_failure(err: &acv_mix_report::DashboardError) {
    let body = ErrorBody::from(err);
    eprintln!("{}", body.error);
    match serde_json::to_string(&body) {
        Ok(json) => eprintln!("{}\n", json),
        Err(_) => eprintln!("{}\n", body.message),
    }
}

fn handle_load(config: &Config) {
    match load_records(&config.data_path) {
        Ok((records, report)) => {
            println!(
                "Processing dataset... ({} rows read, {} kept)",
                util::format_int(report.total_rows as u64),
                util::format_int(report.kept_rows as u64)
            );
            if report.dropped_rows > 0 || report.parse_errors > 0 {
                println!(
                    "Note: {} rows skipped (missing quarter/customer type or undecodable).",
                    util::format_int((report.dropped_rows + report.parse_errors) as u64)
                );
            }
            if report.defaulted_rows > 0 {
                println!(
                    "Info: {} rows had a missing count or ACV, read as 0.",
                    util::format_int(report.defaulted_rows as u64)
                );
            }
            println!();
            let mut state = APP_STATE.lock().unwrap_or_else(|p| p.into_inner());
            state.dataset = Some(Dataset::new(records));
        }
        Err(e) => {
            error!(error = %e, "load failed");
            print_failure(&e);
        }
    }
}

fn handle_generate_reports(config: &Config) {
    let (dataset, agg) = {
        let mut state = APP_STATE.lock().unwrap_or_else(|p| p.into_inner());
        let AppState {
            dataset,
            aggregation,
        } = &mut *state;
        let Some(dataset) = dataset.as_ref() else {
            println!("Error: No data loaded. Please load the data file first (option 1).\n");
            return;
        };
        (dataset.clone(), aggregation.get_or_compute(dataset))
    };

    info!(quarters = agg.quarters.len(), "generating reports");
    println!("Won ACV mix by Cust Type\n");

    let out = |name: &str| config.output_dir.join(name);

    let bar = stacked_bar(&agg, &config.categories);
    let bar_rows = bar.to_rows();
    let file1 = out("report1_stacked_bar.csv");
    if let Err(e) = output::write_csv(&file1, &bar_rows) {
        print_failure(&e);
    }
    println!("Report 1: Won ACV by Closed Fiscal Quarter (stacked)\n");
    output::preview_table_rows(&bar_rows, config.preview_rows);
    println!("(Full table exported to {})\n", file1.display());

    let ring = doughnut(&agg, &config.categories);
    let ring_rows = ring.to_rows();
    let file2 = out("report2_doughnut.csv");
    if let Err(e) = output::write_csv(&file2, &ring_rows) {
        print_failure(&e);
    }
    println!("Report 2: Won ACV share by Cust Type");
    println!("({})\n", ring.center_label);
    output::preview_table_rows(&ring_rows, config.preview_rows);
    println!("(Full table exported to {})\n", file2.display());

    let table = summary_table(&agg, &config.categories, config.table);
    let header = table.header();
    let body = if table.is_empty() { Vec::new() } else { table.body() };
    let file3 = out("report3_summary_table.csv");
    if let Err(e) = output::write_grid_csv(&file3, &header, &body) {
        print_failure(&e);
    }
    println!("Report 3: Cust Type Summary by Quarter\n");
    output::preview_grid(&header, &body);
    println!("(Full table exported to {})\n", file3.display());

    let summary = generate_summary(dataset.records(), &agg);
    let file4 = out("summary.json");
    if let Err(e) = output::write_json(&file4, &summary) {
        print_failure(&e);
    }
    println!("Summary Stats ({}):", file4.display());
    println!(
        "{{\"total_opps\": {}, \"total_acv\": \"{}\"}}\n",
        util::format_int(summary.grand_total.count),
        summary.grand_total_display
    );
}

fn main() {
    setup_logging();
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            print_failure(&e);
            std::process::exit(2);
        }
    };
    info!(data = %config.data_path.display(), "starting");

    loop {
        println!("Won ACV mix by Cust Type");
        println!("[1] Load the data file");
        println!("[2] Generate Reports\n");
        let Some(choice) = read_choice() else {
            println!("\nExiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => handle_load(&config),
            "2" => {
                println!();
                handle_generate_reports(&config);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1 or 2.\n"),
        }
    }
}
