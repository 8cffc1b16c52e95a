// Batch cleaning pipeline for uploaded telematics exports.
//
// One call turns raw file bytes into a typed, sorted table. The whole table
// is processed step by step (header check, row filter, coercion, derivation)
// and either all of it comes back or a fatal `ReportError` does; row-level
// problems are repaired with documented fallbacks and tallied in
// `LoadReport`.
use crate::config::FleetParams;
use crate::error::ReportError;
use crate::types::{CleanedTable, FleetRecord, MaintenanceBand, ReportKind, UsageRecord};
use crate::util::{parse_date_safe, parse_f64_safe, try_duration_hours};
use csv::{ReaderBuilder, StringRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

/// Every export starts with two title/boilerplate rows before the header.
const BOILERPLATE_ROWS: usize = 2;

/// Required usage-report headers, matched exactly after trimming.
const USAGE_REQUIRED: [&str; 3] = ["Grouping", "Engine hours", "Boom Operation time"];

/// The mileage layout is positional: Sr, Plate, Make, Location, Start_Km,
/// End_Km, Total_Km. Column order is a compatibility contract.
const MILEAGE_COLUMNS: usize = 7;

/// Leading alphanumeric identifier token, then optional free-text remainder.
static PLATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z0-9-]+)\s*(.*)$").expect("plate pattern is valid"));

/// Row-level diagnostics from one load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Candidate data rows after the header.
    pub total_rows: usize,
    /// Rows that made it into the cleaned table.
    pub kept_rows: usize,
    /// Rows dropped for an empty or unparsable primary key.
    pub dropped_rows: usize,
    /// Secondary fields that fell back to a zero/sentinel default.
    pub coerced_values: usize,
}

/// Clean one uploaded report.
///
/// `params` only affects the mileage derivations; the usage pipeline is
/// parameter-free. Output row order is deterministic, so processing the
/// same bytes twice yields identical tables.
pub fn process(
    bytes: &[u8],
    kind: ReportKind,
    params: &FleetParams,
) -> Result<(CleanedTable, LoadReport), ReportError> {
    let (header, rows) = read_table(bytes)?;
    let (table, report) = match kind {
        ReportKind::Usage => {
            let (records, report) = clean_usage(&header, &rows)?;
            (CleanedTable::Usage(records), report)
        }
        ReportKind::Mileage => {
            let (records, report) = clean_fleet(&header, &rows, params)?;
            (CleanedTable::Mileage(records), report)
        }
    };
    info!(
        kind = kind.label(),
        total = report.total_rows,
        kept = report.kept_rows,
        dropped = report.dropped_rows,
        coerced = report.coerced_values,
        "report cleaned"
    );
    Ok((table, report))
}

/// Decode the raw grid: skip the boilerplate rows, trim the header cells,
/// return header plus candidate data rows.
fn read_table(bytes: &[u8]) -> Result<(Vec<String>, Vec<StringRecord>), ReportError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut rows: Vec<StringRecord> = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| ReportError::Parse(e.to_string()))?;
        rows.push(record);
    }
    if rows.len() <= BOILERPLATE_ROWS {
        return Err(ReportError::Parse(format!(
            "no header row found after {} boilerplate row(s)",
            BOILERPLATE_ROWS
        )));
    }
    let data = rows.split_off(BOILERPLATE_ROWS + 1);
    let header = rows[BOILERPLATE_ROWS]
        .iter()
        .map(|cell| cell.trim().to_string())
        .collect();
    Ok((header, data))
}

fn clean_usage(
    header: &[String],
    rows: &[StringRecord],
) -> Result<(Vec<UsageRecord>, LoadReport), ReportError> {
    let mut columns = [0usize; 3];
    let mut missing: Vec<String> = Vec::new();
    for (slot, name) in columns.iter_mut().zip(USAGE_REQUIRED) {
        match header.iter().position(|h| h.as_str() == name) {
            Some(idx) => *slot = idx,
            None => missing.push(name.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(ReportError::MissingColumns { missing });
    }
    let [date_col, engine_col, work_col] = columns;

    let mut report = LoadReport::default();
    let mut records: Vec<UsageRecord> = Vec::new();
    for row in rows {
        report.total_rows += 1;
        let key = row.get(date_col).map(str::trim).unwrap_or("");
        if key.is_empty() {
            report.dropped_rows += 1;
            continue;
        }
        let Some(date) = parse_date_safe(Some(key)) else {
            report.dropped_rows += 1;
            debug!(cell = key, "dropping row with unparsable date");
            continue;
        };
        let engine_hours = coerce_duration(row.get(engine_col), &mut report).max(0.0);
        let work_hours = coerce_duration(row.get(work_col), &mut report).max(0.0);
        let idle_hours = (engine_hours - work_hours).max(0.0);
        let utilization_pct = if engine_hours > 0.0 {
            work_hours / engine_hours * 100.0
        } else {
            0.0
        };
        records.push(UsageRecord {
            date,
            engine_hours,
            work_hours,
            idle_hours,
            utilization_pct,
        });
    }
    records.sort_by_key(|r| r.date);
    report.kept_rows = records.len();
    Ok((records, report))
}

fn clean_fleet(
    header: &[String],
    rows: &[StringRecord],
    params: &FleetParams,
) -> Result<(Vec<FleetRecord>, LoadReport), ReportError> {
    if header.len() != MILEAGE_COLUMNS {
        return Err(ReportError::ColumnCount {
            expected: MILEAGE_COLUMNS,
            found: header.len(),
        });
    }
    // Positional layout after the Sr column.
    let (plate_col, make_col, location_col) = (1, 2, 3);
    let (start_col, end_col, total_col) = (4, 5, 6);

    let mut report = LoadReport::default();
    let mut records: Vec<FleetRecord> = Vec::new();
    for row in rows {
        report.total_rows += 1;
        let plate_raw = row.get(plate_col).unwrap_or("");
        if plate_raw.trim().is_empty() {
            report.dropped_rows += 1;
            continue;
        }
        let (vehicle_id, role_notes) = split_plate(plate_raw, &params.pool_role);
        let make = row.get(make_col).unwrap_or("").trim().to_uppercase();
        let location = params.locations.normalize(row.get(location_col).unwrap_or(""));
        let (lat, lon) = params.locations.coords_for(&location);

        let start_km = coerce_km(row.get(start_col), &mut report);
        let end_km = coerce_km(row.get(end_col), &mut report);
        let total_km = coerce_km(row.get(total_col), &mut report);

        let maintenance_band = MaintenanceBand::from_end_km(end_km);
        let liters = total_km / 100.0 * params.effective_rate(&make, maintenance_band);
        let est_fuel_cost = (liters * params.unit_price(&make)).round() as i64;
        let cost_per_km = if total_km > 0.0 {
            est_fuel_cost as f64 / total_km
        } else {
            0.0
        };

        records.push(FleetRecord {
            plate: plate_raw.trim().to_string(),
            vehicle_id,
            role_notes,
            make,
            location,
            lat,
            lon,
            start_km,
            end_km,
            total_km,
            maintenance_band,
            est_fuel_cost,
            cost_per_km,
        });
    }
    // Mileage rows keep upload order; the registry view re-sorts for display.
    report.kept_rows = records.len();
    Ok((records, report))
}

fn coerce_duration(cell: Option<&str>, report: &mut LoadReport) -> f64 {
    match try_duration_hours(cell) {
        Some(hours) => hours,
        None => {
            report.coerced_values += 1;
            0.0
        }
    }
}

/// Odometer fields are non-negative by definition; unparsable, missing and
/// negative readings all coerce to zero and the row is kept.
fn coerce_km(cell: Option<&str>, report: &mut LoadReport) -> f64 {
    match parse_f64_safe(cell) {
        Some(v) if v >= 0.0 => v,
        _ => {
            report.coerced_values += 1;
            0.0
        }
    }
}

/// Split a composite plate field into its identifier token and role text.
/// Plates that do not match the pattern keep the whole value as the id,
/// and a blank remainder becomes the pool sentinel.
fn split_plate(raw: &str, pool_role: &str) -> (String, String) {
    if let Some(caps) = PLATE_RE.captures(raw) {
        let rest = caps[2].trim();
        let role = if rest.is_empty() {
            pool_role.to_string()
        } else {
            rest.to_string()
        };
        (caps[1].to_string(), role)
    } else {
        (raw.trim().to_string(), pool_role.to_string())
    }
}
