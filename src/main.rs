// Entry point and high-level CLI flow.
//
// - Options [1]/[2] load and clean a usage or mileage export, printing
//   load diagnostics.
// - Option [3] generates the reports for whatever is loaded: console
//   previews plus CSV/JSON artifacts.
// - After generating reports, the user can go back to the menu or exit.
use fleet_report::cache::MemoCache;
use fleet_report::config::FleetParams;
use fleet_report::output;
use fleet_report::reports;
use fleet_report::types::{CleanedTable, ReportKind};
use fleet_report::util::{format_int, format_number};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Vehicles under this distance count as inactive in the KPI rollup.
const ACTIVE_THRESHOLD_KM: f64 = 10.0;

/// Default operator thresholds for the performance log.
const GOAL_UTILIZATION_PCT: f64 = 60.0;
const MAX_IDLE_HOURS: f64 = 1.5;

static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { loaded: None }));
static CACHE: MemoCache = MemoCache::new();

struct AppState {
    loaded: Option<Arc<(CleanedTable, fleet_report::LoadReport)>>,
}

/// Read a single line of input after printing a prompt.
fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask whether to go back to the menu after generating reports.
fn prompt_back_to_menu() -> bool {
    loop {
        match read_line("Back to Report Selection (Y/N): ").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Load and clean an export of the given kind, going through the memo
/// cache so re-loading the same file is free.
fn handle_load(kind: ReportKind) {
    let default_path = match kind {
        ReportKind::Usage => "usage_report.csv",
        ReportKind::Mileage => "mileage_report.csv",
    };
    let answer = read_line(&format!("File path [{}]: ", default_path));
    let path = if answer.is_empty() { default_path } else { &answer };

    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Failed to read {}: {}\n", path, e);
            return;
        }
    };
    match CACHE.process(&bytes, kind, &FleetParams::default()) {
        Ok(loaded) => {
            let report = &loaded.1;
            println!(
                "Processing {} report... ({} rows scanned, {} kept)",
                kind.label(),
                format_int(report.total_rows as i64),
                format_int(report.kept_rows as i64)
            );
            if report.dropped_rows > 0 {
                println!(
                    "Note: {} row(s) dropped (blank or unparsable key column).",
                    format_int(report.dropped_rows as i64)
                );
            }
            if report.coerced_values > 0 {
                println!(
                    "Info: {} malformed value(s) defaulted to zero.",
                    format_int(report.coerced_values as i64)
                );
            }
            println!();
            APP_STATE.lock().unwrap().loaded = Some(loaded);
        }
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

fn handle_generate_reports() {
    let loaded = APP_STATE.lock().unwrap().loaded.clone();
    let Some(loaded) = loaded else {
        println!("Error: No data loaded. Please load a report first (option 1 or 2).\n");
        return;
    };

    println!("Generating reports...\n");
    match &loaded.0 {
        CleanedTable::Usage(records) => generate_usage_reports(records),
        CleanedTable::Mileage(records) => generate_fleet_reports(records),
    }
}

fn generate_usage_reports(records: &[fleet_report::UsageRecord]) {
    let overview = reports::usage_overview(records);
    println!("Operational Efficiency Summary\n");
    println!(
        "Engine ON: {} h | Productive: {} h | Idle: {} h | Period efficiency: {}%",
        format_number(overview.total_engine_hours, 1),
        format_number(overview.total_work_hours, 1),
        format_number(overview.total_idle_hours, 1),
        format_number(overview.period_utilization_pct, 1)
    );
    println!();

    match reports::planner_advice(records) {
        Some(advice) => {
            println!(
                "Planner: average {}%, best day {}%, recommended goal {}%",
                format_number(advice.average_utilization_pct, 1),
                format_number(advice.best_utilization_pct, 1),
                format_number(advice.recommended_goal_pct, 1)
            );
        }
        None => println!("Planner: not enough data (need days with >1 hour runtime)."),
    }
    println!();

    let wasteful = records
        .iter()
        .filter(|r| {
            reports::classify_day(r, GOAL_UTILIZATION_PCT, MAX_IDLE_HOURS)
                == reports::DayClass::HighWaste
        })
        .count();
    if wasteful > 0 {
        println!(
            "Warning: {} day(s) over the {}h idle limit.\n",
            wasteful, MAX_IDLE_HOURS
        );
    }

    let log = reports::usage_log_rows(records);
    let log_file = "usage_performance_log.csv";
    if let Err(e) = output::write_csv(log_file, &log) {
        eprintln!("Write error: {}", e);
    }
    println!("Performance Log");
    output::preview_table(&log, 5);
    println!("(Full table exported to {})\n", log_file);

    if let Err(e) = output::write_json("usage_summary.json", &overview) {
        eprintln!("Write error: {}", e);
    }
    println!("Summary stats written to usage_summary.json\n");
}

fn generate_fleet_reports(records: &[fleet_report::FleetRecord]) {
    let kpis = reports::fleet_kpis(records, ACTIVE_THRESHOLD_KM);
    println!("Strategic Fleet Summary\n");
    println!(
        "Distance: {} km | Active: {} / {} | Utilization: {}% | Ghost assets: {} | Fuel: {}",
        format_number(kpis.total_distance_km, 0),
        kpis.active_vehicles,
        kpis.fleet_size,
        format_number(kpis.utilization_rate_pct, 1),
        kpis.ghost_assets,
        format_number(kpis.total_fuel_cost as f64, 0)
    );
    println!();

    let registry = reports::registry_rows(records);
    let registry_file = "fleet_registry.csv";
    if let Err(e) = output::write_csv(registry_file, &registry) {
        eprintln!("Write error: {}", e);
    }
    println!("Detailed Fleet Registry");
    output::preview_table(&registry, 5);
    println!("(Full table exported to {})\n", registry_file);

    let breakdown = reports::mileage_breakdown(records);
    println!("Mileage by Location & Make");
    output::preview_table(&breakdown, 5);

    let locations = reports::location_overview(records);
    let locations_file = "fleet_location_summary.csv";
    if let Err(e) = output::write_csv(locations_file, &locations) {
        eprintln!("Write error: {}", e);
    }
    println!("Geospatial Fleet Overview");
    output::preview_table(&locations, 5);
    println!("(Full table exported to {})\n", locations_file);

    // Plain round-trip of the cleaned table, the "download CSV" artifact.
    if let Err(e) = output::write_csv("strategic_fleet_report.csv", records) {
        eprintln!("Write error: {}", e);
    }
    println!("Cleaned table exported to strategic_fleet_report.csv\n");

    if let Err(e) = output::write_json("fleet_summary.json", &kpis) {
        eprintln!("Write error: {}", e);
    }
    println!("Summary stats written to fleet_summary.json\n");
}

fn main() {
    tracing_subscriber::fmt().with_target(false).init();
    loop {
        println!("Select an option:");
        println!("[1] Load usage report");
        println!("[2] Load mileage report");
        println!("[3] Generate reports\n");
        match read_line("Enter choice: ").as_str() {
            "1" => handle_load(ReportKind::Usage),
            "2" => handle_load(ReportKind::Mileage),
            "3" => {
                println!();
                handle_generate_reports();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1, 2 or 3.\n");
            }
        }
    }
}
