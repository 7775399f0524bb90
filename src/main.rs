// Entry point and high-level CLI flow.
//
// - Option [1] loads the monthly sitrep files, normalizes and merges them
//   with the ICB identity lookup, and prints per-file diagnostics.
// - Option [2] exports the aggregated dataset, a JSON summary, and the
//   top-movers table for the latest loaded month.
// - After generating outputs, the user can choose to go back to the
//   selection menu or exit.
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;

use chrono::Datelike;
use vw_report::config::PipelineConfig;
use vw_report::types::{AggregatedRecord, DatasetRow};
use vw_report::{aggregate, loader, metrics, output, reports, resolve, util};

// Simple in-memory app state so we only run the pipeline once but can
// export outputs multiple times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<Dataset>,
}

#[derive(Clone)]
struct Dataset {
    records: Vec<AggregatedRecord>,
    unresolved_rows: usize,
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask the user whether to go back to the menu after generating outputs.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Selection Menu (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        let resp = buf.trim().to_uppercase();
        match resp.as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: run the pipeline over the data directory.
///
/// Structural failures in one monthly file abort only that file; every
/// outcome is printed so a partially loaded batch is never silent.
fn handle_load(cfg: &PipelineConfig) {
    let (batches, outcomes) = match loader::load_batch(cfg) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Failed to scan {}: {}\n", cfg.data_dir.display(), e);
            return;
        }
    };

    let mut loaded = 0usize;
    let mut failed = 0usize;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(rows) => {
                loaded += 1;
                println!("  {}: {} rows", outcome.file, util::format_int(*rows as i64));
            }
            Err(e) => {
                failed += 1;
                eprintln!("  {}: FAILED ({})", outcome.file, e);
            }
        }
    }
    println!(
        "Processing dataset... ({} files loaded, {} failed)",
        util::format_int(loaded as i64),
        util::format_int(failed as i64)
    );
    if loaded == 0 {
        println!("Error: no monthly files could be loaded.\n");
        return;
    }

    let unified = match aggregate::unify(batches) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to unify batch: {}\n", e);
            return;
        }
    };
    let retained: Vec<&str> = unified.columns.iter().map(|c| c.as_str()).collect();
    println!(
        "Unified table: {} rows, columns retained: {}.",
        util::format_int(unified.rows.len() as i64),
        retained.join(", ")
    );
    for file in &unified.drifted_files {
        println!("Note: header labels in {} drift from the first file.", file);
    }

    let lookup = match resolve::load_lookup(&cfg.lookup_path) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to load identity lookup: {}\n", e);
            return;
        }
    };

    let resolution = resolve::resolve_and_aggregate(&unified, &lookup);
    if resolution.unresolved_rows > 0 {
        println!(
            "Warning: {} rows had no identity match and keep a null ICB code.",
            util::format_int(resolution.unresolved_rows as i64)
        );
    }

    let mut records = resolution.records;
    metrics::derive(&mut records, cfg.template.per_100k_multiplier);
    println!(
        "Aggregated {} (month, ICB) records.\n",
        util::format_int(records.len() as i64)
    );

    let mut state = APP_STATE.lock().unwrap();
    state.data = Some(Dataset {
        records,
        unresolved_rows: resolution.unresolved_rows,
    });
}

/// Handle option [2]: export the dataset, summary, and top movers.
fn handle_generate_outputs() {
    let data = {
        let state = APP_STATE.lock().unwrap();
        state.data.clone()
    };
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the monthly files first (option 1).\n");
        return;
    };

    println!("Generating outputs...");
    println!("Outputs saved to individual files...\n");

    let dataset_rows: Vec<DatasetRow> = data.records.iter().map(DatasetRow::from).collect();
    let dataset_file = "virtual_ward_dataset.csv";
    if let Err(e) = output::write_csv(dataset_file, &dataset_rows) {
        eprintln!("Write error: {}", e);
    }
    println!("Virtual Ward Dataset by (Month, ICB)\n");
    output::preview_table_rows(&dataset_rows, 3);
    println!("(Full table exported to {})\n", dataset_file);

    let summary = reports::generate_summary(&data.records, data.unresolved_rows);
    if let Err(e) = output::write_json("summary.json", &summary) {
        eprintln!("Write error: {}", e);
    }
    println!("Summary Stats (summary.json):");
    println!(
        "  months: {}, areas: {}, unresolved rows: {}, latest capacity: {}\n",
        summary.months_covered,
        summary.total_areas,
        util::format_int(summary.unresolved_rows as i64),
        util::format_opt_int(summary.latest_capacity)
    );

    if let Some(latest) = summary.latest_month {
        let movers = reports::top_movers(&data.records, latest.year(), latest.month());
        let movers_file = "top_movers.csv";
        if let Err(e) = output::write_csv(movers_file, &movers) {
            eprintln!("Write error: {}", e);
        }
        println!(
            "Top Capacity Movers for {} (vs prior month)\n",
            latest.format("%B %Y")
        );
        output::preview_table_rows(&movers, 5);
        println!("(Full table exported to {})\n", movers_file);
    }
}

fn main() {
    let cfg = PipelineConfig::default();
    loop {
        println!("NHS Virtual Ward Sitrep Pipeline:");
        println!("[1] Load monthly files");
        println!("[2] Generate Outputs\n");
        match read_choice().as_str() {
            "1" => {
                handle_load(&cfg);
            }
            "2" => {
                println!();
                handle_generate_outputs();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1 or 2.\n");
            }
        }
    }
}
