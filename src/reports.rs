// Aggregation and filtering over cleaned tables.
//
// Everything here is a pure function of (records, knobs): filters never
// re-run the loading pipeline, and aggregates carry no state between calls.
use crate::types::{
    FleetKpis, FleetRecord, LocationSummaryRow, MileageBreakdownRow, PlannerAdvice,
    RegistryRow, UsageLogRow, UsageOverview, UsageRecord,
};
use crate::util::{average, format_number, percentile};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Days below this runtime are noise for planning purposes.
const REAL_RUNTIME_HOURS: f64 = 1.0;

/// Keep rows whose date is in the selection; an empty selection means all.
pub fn filter_usage(records: &[UsageRecord], dates: &[NaiveDate]) -> Vec<UsageRecord> {
    if dates.is_empty() {
        return records.to_vec();
    }
    let wanted: HashSet<&NaiveDate> = dates.iter().collect();
    records
        .iter()
        .filter(|r| wanted.contains(&r.date))
        .cloned()
        .collect()
}

pub fn usage_overview(records: &[UsageRecord]) -> UsageOverview {
    let total_engine_hours: f64 = records.iter().map(|r| r.engine_hours).sum();
    let total_work_hours: f64 = records.iter().map(|r| r.work_hours).sum();
    let total_idle_hours: f64 = records.iter().map(|r| r.idle_hours).sum();
    let period_utilization_pct = if total_engine_hours > 0.0 {
        total_work_hours / total_engine_hours * 100.0
    } else {
        0.0
    };
    UsageOverview {
        total_engine_hours,
        total_work_hours,
        total_idle_hours,
        period_utilization_pct,
    }
}

/// Recommend next period's utilization goal from days with real runtime.
/// Returns `None` when no day qualifies.
pub fn planner_advice(records: &[UsageRecord]) -> Option<PlannerAdvice> {
    let utilizations: Vec<f64> = records
        .iter()
        .filter(|r| r.engine_hours > REAL_RUNTIME_HOURS)
        .map(|r| r.utilization_pct)
        .collect();
    if utilizations.is_empty() {
        return None;
    }
    let best = utilizations
        .iter()
        .copied()
        .fold(f64::MIN, f64::max);
    Some(PlannerAdvice {
        average_utilization_pct: average(&utilizations),
        best_utilization_pct: best,
        recommended_goal_pct: percentile(&utilizations, 0.75),
    })
}

/// How a logged day reads against the operator's thresholds. Precedence:
/// barely-used days are flagged before waste, waste before efficiency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayClass {
    /// Under an hour of runtime; too little data to judge.
    LowUsage,
    /// Idle time above the operator's limit.
    HighWaste,
    /// Utilization above the operator's goal.
    HighEfficiency,
    Normal,
}

pub fn classify_day(record: &UsageRecord, goal_pct: f64, max_idle_hours: f64) -> DayClass {
    if record.engine_hours < REAL_RUNTIME_HOURS {
        DayClass::LowUsage
    } else if record.idle_hours > max_idle_hours {
        DayClass::HighWaste
    } else if record.utilization_pct > goal_pct {
        DayClass::HighEfficiency
    } else {
        DayClass::Normal
    }
}

pub fn usage_log_rows(records: &[UsageRecord]) -> Vec<UsageLogRow> {
    records
        .iter()
        .map(|r| UsageLogRow {
            date: r.date.format("%Y-%m-%d").to_string(),
            engine_hours: format!("{:.2} h", r.engine_hours),
            work_hours: format!("{:.2} h", r.work_hours),
            idle_hours: format!("{:.2} h", r.idle_hours),
            utilization: format!("{:.1}%", r.utilization_pct),
        })
        .collect()
}

/// Conjunctive fleet filters; an empty selection on any axis means all.
#[derive(Debug, Clone, Default)]
pub struct FleetFilter {
    pub locations: Vec<String>,
    pub makes: Vec<String>,
    pub plates: Vec<String>,
}

pub fn filter_fleet(records: &[FleetRecord], filter: &FleetFilter) -> Vec<FleetRecord> {
    records
        .iter()
        .filter(|r| filter.locations.is_empty() || filter.locations.contains(&r.location))
        .filter(|r| filter.makes.is_empty() || filter.makes.contains(&r.make))
        .filter(|r| filter.plates.is_empty() || filter.plates.contains(&r.plate))
        .cloned()
        .collect()
}

/// Headline KPIs. Vehicle counts are over unique ids so multi-month uploads
/// with repeated vehicles do not inflate the fleet size.
pub fn fleet_kpis(records: &[FleetRecord], active_threshold_km: f64) -> FleetKpis {
    let total_distance_km: f64 = records.iter().map(|r| r.total_km).sum();
    let fleet: HashSet<&str> = records.iter().map(|r| r.vehicle_id.as_str()).collect();
    let active: HashSet<&str> = records
        .iter()
        .filter(|r| r.total_km > active_threshold_km)
        .map(|r| r.vehicle_id.as_str())
        .collect();
    let utilization_rate_pct = if fleet.is_empty() {
        0.0
    } else {
        active.len() as f64 / fleet.len() as f64 * 100.0
    };
    FleetKpis {
        total_distance_km,
        fleet_size: fleet.len(),
        active_vehicles: active.len(),
        utilization_rate_pct,
        ghost_assets: records.iter().filter(|r| r.total_km == 0.0).count(),
        total_fuel_cost: records.iter().map(|r| r.est_fuel_cost).sum(),
    }
}

/// Distance per (location, make), descending by distance.
pub fn mileage_breakdown(records: &[FleetRecord]) -> Vec<MileageBreakdownRow> {
    let mut map: HashMap<(String, String), f64> = HashMap::new();
    for r in records {
        *map.entry((r.location.clone(), r.make.clone())).or_default() += r.total_km;
    }
    let mut rows: Vec<((String, String), f64)> = map.into_iter().collect();
    rows.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    rows.into_iter()
        .map(|((location, make), km)| MileageBreakdownRow {
            location,
            make,
            total_km: format_number(km, 0),
        })
        .collect()
}

/// Per-location rollup for the map: row count, distance and coordinates.
pub fn location_overview(records: &[FleetRecord]) -> Vec<LocationSummaryRow> {
    #[derive(Default)]
    struct Acc {
        vehicles: usize,
        total_km: f64,
        lat: f64,
        lon: f64,
    }
    let mut map: HashMap<String, Acc> = HashMap::new();
    for r in records {
        let acc = map.entry(r.location.clone()).or_default();
        if acc.vehicles == 0 {
            acc.lat = r.lat;
            acc.lon = r.lon;
        }
        acc.vehicles += 1;
        acc.total_km += r.total_km;
    }
    let mut rows: Vec<(f64, LocationSummaryRow)> = map
        .into_iter()
        .map(|(location, acc)| {
            (
                acc.total_km,
                LocationSummaryRow {
                    location,
                    vehicles: acc.vehicles,
                    total_km: format_number(acc.total_km, 0),
                    lat: acc.lat,
                    lon: acc.lon,
                },
            )
        })
        .collect();
    rows.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.1.location.cmp(&b.1.location))
    });
    rows.into_iter().map(|(_, row)| row).collect()
}

/// The vehicles doing most of the work: top 20% of rows plus a floor of 5,
/// by total distance.
pub fn top_workhorses(records: &[FleetRecord]) -> Vec<FleetRecord> {
    let take = records.len() / 5 + 5;
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        b.total_km
            .partial_cmp(&a.total_km)
            .unwrap_or(Ordering::Equal)
    });
    sorted.truncate(take);
    sorted
}

/// Registry view: every vehicle, busiest first, cells pre-formatted.
pub fn registry_rows(records: &[FleetRecord]) -> Vec<RegistryRow> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        b.total_km
            .partial_cmp(&a.total_km)
            .unwrap_or(Ordering::Equal)
    });
    sorted
        .into_iter()
        .map(|r| RegistryRow {
            vehicle_id: r.vehicle_id,
            role_notes: r.role_notes,
            make: r.make,
            location: r.location,
            total_km: format_number(r.total_km, 0),
            est_fuel_cost: format_number(r.est_fuel_cost as f64, 0),
            maintenance_band: r.maintenance_band.label().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MaintenanceBand;

    fn usage_row(day: u32, engine: f64, work: f64) -> UsageRecord {
        let utilization_pct = if engine > 0.0 { work / engine * 100.0 } else { 0.0 };
        UsageRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            engine_hours: engine,
            work_hours: work,
            idle_hours: (engine - work).max(0.0),
            utilization_pct,
        }
    }

    fn fleet_row(id: &str, location: &str, make: &str, total_km: f64) -> FleetRecord {
        FleetRecord {
            plate: id.to_string(),
            vehicle_id: id.to_string(),
            role_notes: "General Pool".to_string(),
            make: make.to_string(),
            location: location.to_string(),
            lat: 25.0,
            lon: 55.0,
            start_km: 0.0,
            end_km: total_km,
            total_km,
            maintenance_band: MaintenanceBand::Fresh,
            est_fuel_cost: (total_km / 10.0) as i64,
            cost_per_km: 0.1,
        }
    }

    #[test]
    fn overview_totals_and_period_utilization() {
        let rows = [usage_row(1, 8.0, 6.0), usage_row(2, 2.0, 1.0)];
        let overview = usage_overview(&rows);
        assert_eq!(overview.total_engine_hours, 10.0);
        assert_eq!(overview.total_work_hours, 7.0);
        assert_eq!(overview.total_idle_hours, 3.0);
        assert_eq!(overview.period_utilization_pct, 70.0);
    }

    #[test]
    fn overview_of_empty_table_is_all_zero() {
        let overview = usage_overview(&[]);
        assert_eq!(overview.period_utilization_pct, 0.0);
        assert_eq!(overview.total_engine_hours, 0.0);
    }

    #[test]
    fn date_filter_empty_selection_means_all() {
        let rows = [usage_row(1, 8.0, 6.0), usage_row(2, 2.0, 1.0)];
        assert_eq!(filter_usage(&rows, &[]).len(), 2);
        let only = [NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()];
        let picked = filter_usage(&rows, &only);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].date, only[0]);
    }

    #[test]
    fn planner_ignores_days_without_real_runtime() {
        let rows = [
            usage_row(1, 8.0, 6.0),  // 75%
            usage_row(2, 10.0, 2.5), // 25%
            usage_row(3, 4.0, 2.0),  // 50%
            usage_row(4, 8.0, 8.0),  // 100%
            usage_row(5, 0.5, 0.5),  // below runtime floor, excluded
        ];
        let advice = planner_advice(&rows).unwrap();
        assert_eq!(advice.average_utilization_pct, 62.5);
        assert_eq!(advice.best_utilization_pct, 100.0);
        // 75th percentile of [25, 50, 75, 100] with linear interpolation.
        assert_eq!(advice.recommended_goal_pct, 81.25);
    }

    #[test]
    fn planner_needs_at_least_one_real_day() {
        assert!(planner_advice(&[usage_row(1, 0.5, 0.2)]).is_none());
        assert!(planner_advice(&[]).is_none());
    }

    #[test]
    fn day_classification_follows_threshold_precedence() {
        // 30 min runtime: low usage wins even though idle is over the limit.
        assert_eq!(classify_day(&usage_row(1, 0.5, 0.0), 60.0, 1.5), DayClass::LowUsage);
        // 3h idle over a 1.5h limit beats the efficiency flag.
        assert_eq!(classify_day(&usage_row(2, 8.0, 5.0), 60.0, 1.5), DayClass::HighWaste);
        assert_eq!(
            classify_day(&usage_row(3, 8.0, 7.0), 60.0, 1.5),
            DayClass::HighEfficiency
        );
        assert_eq!(classify_day(&usage_row(4, 8.0, 6.8), 90.0, 1.5), DayClass::Normal);
    }

    #[test]
    fn kpis_count_unique_vehicles_and_ghosts() {
        let rows = [
            fleet_row("A", "Dubai", "MAZDA", 120.0),
            fleet_row("A", "Dubai", "MAZDA", 80.0), // same vehicle, second month
            fleet_row("B", "Sharjah", "MAZDA", 0.0),
            fleet_row("C", "Dubai", "ASHOK LEYLAND", 5.0),
        ];
        let kpis = fleet_kpis(&rows, 10.0);
        assert_eq!(kpis.fleet_size, 3);
        assert_eq!(kpis.active_vehicles, 1);
        assert!((kpis.utilization_rate_pct - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(kpis.ghost_assets, 1);
        assert_eq!(kpis.total_distance_km, 205.0);
    }

    #[test]
    fn kpis_of_empty_fleet_do_not_divide() {
        let kpis = fleet_kpis(&[], 10.0);
        assert_eq!(kpis.utilization_rate_pct, 0.0);
        assert_eq!(kpis.fleet_size, 0);
    }

    #[test]
    fn fleet_filters_are_conjunctive() {
        let rows = [
            fleet_row("A", "Dubai", "MAZDA", 120.0),
            fleet_row("B", "Sharjah", "MAZDA", 50.0),
            fleet_row("C", "Dubai", "ASHOK LEYLAND", 300.0),
        ];
        let filter = FleetFilter {
            locations: vec!["Dubai".to_string()],
            makes: vec!["MAZDA".to_string()],
            plates: vec![],
        };
        let picked = filter_fleet(&rows, &filter);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].vehicle_id, "A");
        assert_eq!(filter_fleet(&rows, &FleetFilter::default()).len(), 3);
    }

    #[test]
    fn breakdown_groups_by_location_and_make() {
        let rows = [
            fleet_row("A", "Dubai", "MAZDA", 100.0),
            fleet_row("B", "Dubai", "MAZDA", 50.0),
            fleet_row("C", "Sharjah", "MAZDA", 400.0),
        ];
        let breakdown = mileage_breakdown(&rows);
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].location, "Sharjah");
        assert_eq!(breakdown[0].total_km, "400");
        assert_eq!(breakdown[1].location, "Dubai");
        assert_eq!(breakdown[1].total_km, "150");
    }

    #[test]
    fn location_overview_keeps_coordinates() {
        let rows = [
            fleet_row("A", "Dubai", "MAZDA", 100.0),
            fleet_row("B", "Dubai", "MAZDA", 60.0),
        ];
        let overview = location_overview(&rows);
        assert_eq!(overview.len(), 1);
        assert_eq!(overview[0].vehicles, 2);
        assert_eq!(overview[0].total_km, "160");
        assert_eq!((overview[0].lat, overview[0].lon), (25.0, 55.0));
    }

    #[test]
    fn workhorses_take_top_fifth_plus_floor() {
        let rows: Vec<FleetRecord> = (0..20)
            .map(|i| fleet_row(&format!("V{i}"), "Dubai", "MAZDA", i as f64 * 10.0))
            .collect();
        let top = top_workhorses(&rows);
        assert_eq!(top.len(), 9); // 20/5 + 5
        assert_eq!(top[0].vehicle_id, "V19");
        assert!(top.windows(2).all(|w| w[0].total_km >= w[1].total_km));
    }

    #[test]
    fn registry_is_sorted_busiest_first() {
        let rows = [
            fleet_row("A", "Dubai", "MAZDA", 10.0),
            fleet_row("B", "Dubai", "MAZDA", 999.0),
        ];
        let registry = registry_rows(&rows);
        assert_eq!(registry[0].vehicle_id, "B");
        assert_eq!(registry[0].total_km, "999");
        assert_eq!(registry[1].maintenance_band, "Fresh (<50k km)");
    }
}
