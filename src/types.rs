use chrono::NaiveDate;
use serde::Serialize;
use tabled::Tabled;

/// Which upload layout the loader should expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReportKind {
    /// Time-log: one row per date with engine-on and boom-operation durations.
    Usage,
    /// Odometer-log: one row per vehicle with start/end/total kilometres.
    Mileage,
}

impl ReportKind {
    pub fn label(&self) -> &'static str {
        match self {
            ReportKind::Usage => "usage",
            ReportKind::Mileage => "mileage",
        }
    }
}

/// Cleaned row of a usage (time-log) report.
///
/// `idle_hours` is clamped non-negative; `utilization_pct` is 0 when the
/// engine never ran, and has no upper clamp (inconsistent source data can
/// push it past 100 and we pass that through).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRecord {
    pub date: NaiveDate,
    pub engine_hours: f64,
    pub work_hours: f64,
    pub idle_hours: f64,
    pub utilization_pct: f64,
}

/// Coarse maintenance-risk category binned from the end odometer reading.
/// Half-open bins: a reading of exactly 50,000 is already Mid-Life and
/// 100,000 is already End-of-Life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MaintenanceBand {
    #[serde(rename = "Fresh (<50k km)")]
    Fresh,
    #[serde(rename = "Mid-Life (50-100k km)")]
    MidLife,
    #[serde(rename = "End-of-Life (>100k km)")]
    EndOfLife,
}

impl MaintenanceBand {
    pub fn from_end_km(end_km: f64) -> Self {
        if end_km < 50_000.0 {
            MaintenanceBand::Fresh
        } else if end_km < 100_000.0 {
            MaintenanceBand::MidLife
        } else {
            MaintenanceBand::EndOfLife
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MaintenanceBand::Fresh => "Fresh (<50k km)",
            MaintenanceBand::MidLife => "Mid-Life (50-100k km)",
            MaintenanceBand::EndOfLife => "End-of-Life (>100k km)",
        }
    }
}

/// Cleaned row of a mileage (odometer-log) report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetRecord {
    /// Composite plate field as uploaded; kept for plate-level filtering.
    pub plate: String,
    /// Leading alphanumeric token of the plate field.
    pub vehicle_id: String,
    /// Free-text remainder of the plate field, or the pool sentinel.
    pub role_notes: String,
    pub make: String,
    /// Canonical city name, or "Unknown".
    pub location: String,
    pub lat: f64,
    pub lon: f64,
    pub start_km: f64,
    pub end_km: f64,
    pub total_km: f64,
    pub maintenance_band: MaintenanceBand,
    pub est_fuel_cost: i64,
    pub cost_per_km: f64,
}

/// Output of one load: the cleaned table for whichever kind was uploaded.
#[derive(Debug, Clone, PartialEq)]
pub enum CleanedTable {
    Usage(Vec<UsageRecord>),
    Mileage(Vec<FleetRecord>),
}

impl CleanedTable {
    pub fn kind(&self) -> ReportKind {
        match self {
            CleanedTable::Usage(_) => ReportKind::Usage,
            CleanedTable::Mileage(_) => ReportKind::Mileage,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CleanedTable::Usage(rows) => rows.len(),
            CleanedTable::Mileage(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pre-formatted performance-log row for console previews and CSV export.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct UsageLogRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: String,
    #[serde(rename = "EngineHours")]
    #[tabled(rename = "EngineHours")]
    pub engine_hours: String,
    #[serde(rename = "WorkHours")]
    #[tabled(rename = "WorkHours")]
    pub work_hours: String,
    #[serde(rename = "IdleHours")]
    #[tabled(rename = "IdleHours")]
    pub idle_hours: String,
    #[serde(rename = "Utilization")]
    #[tabled(rename = "Utilization")]
    pub utilization: String,
}

/// Pre-formatted fleet-registry row, sorted by distance for display.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RegistryRow {
    #[serde(rename = "VehicleId")]
    #[tabled(rename = "VehicleId")]
    pub vehicle_id: String,
    #[serde(rename = "RoleNotes")]
    #[tabled(rename = "RoleNotes")]
    pub role_notes: String,
    #[serde(rename = "Make")]
    #[tabled(rename = "Make")]
    pub make: String,
    #[serde(rename = "Location")]
    #[tabled(rename = "Location")]
    pub location: String,
    #[serde(rename = "TotalKm")]
    #[tabled(rename = "TotalKm")]
    pub total_km: String,
    #[serde(rename = "EstFuelCost")]
    #[tabled(rename = "EstFuelCost")]
    pub est_fuel_cost: String,
    #[serde(rename = "MaintenanceBand")]
    #[tabled(rename = "MaintenanceBand")]
    pub maintenance_band: String,
}

/// Distance rollup per (location, make), the bar-chart source.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MileageBreakdownRow {
    #[serde(rename = "Location")]
    #[tabled(rename = "Location")]
    pub location: String,
    #[serde(rename = "Make")]
    #[tabled(rename = "Make")]
    pub make: String,
    #[serde(rename = "TotalKm")]
    #[tabled(rename = "TotalKm")]
    pub total_km: String,
}

/// Per-location rollup used for the map view and the location export.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct LocationSummaryRow {
    #[serde(rename = "Location")]
    #[tabled(rename = "Location")]
    pub location: String,
    #[serde(rename = "Vehicles")]
    #[tabled(rename = "Vehicles")]
    pub vehicles: usize,
    #[serde(rename = "TotalKm")]
    #[tabled(rename = "TotalKm")]
    pub total_km: String,
    #[serde(rename = "Lat")]
    #[tabled(rename = "Lat")]
    pub lat: f64,
    #[serde(rename = "Lon")]
    #[tabled(rename = "Lon")]
    pub lon: f64,
}

/// Period totals for a usage report, written to the JSON summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageOverview {
    pub total_engine_hours: f64,
    pub total_work_hours: f64,
    pub total_idle_hours: f64,
    /// Work over engine for the whole period, 0 when the engine never ran.
    pub period_utilization_pct: f64,
}

/// Goal recommendation derived from days with real runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannerAdvice {
    pub average_utilization_pct: f64,
    pub best_utilization_pct: f64,
    /// 75th percentile of daily utilization: "be your best self more often".
    pub recommended_goal_pct: f64,
}

/// Headline fleet KPIs for a mileage report, written to the JSON summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetKpis {
    pub total_distance_km: f64,
    /// Unique vehicle ids, not rows; multi-month uploads repeat vehicles.
    pub fleet_size: usize,
    pub active_vehicles: usize,
    pub utilization_rate_pct: f64,
    /// Rows with zero recorded distance.
    pub ghost_assets: usize,
    pub total_fuel_cost: i64,
}
