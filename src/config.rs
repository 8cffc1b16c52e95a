// Explicit configuration for the mileage pipeline.
//
// The original dashboards kept these tables as module-level constants; here
// they are plain values handed to the loader, with the shipped tables as
// defaults. Ordered maps keep the serialized fingerprint stable, which the
// memo cache relies on.
use crate::types::MaintenanceBand;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Health-penalty multiplier schedule by maintenance band. Identity by
/// default; operators can surcharge Mid-Life / End-of-Life vehicles.
#[derive(Debug, Clone, Serialize)]
pub struct BandMultipliers {
    pub fresh: f64,
    pub mid_life: f64,
    pub end_of_life: f64,
}

impl BandMultipliers {
    pub fn for_band(&self, band: MaintenanceBand) -> f64 {
        match band {
            MaintenanceBand::Fresh => self.fresh,
            MaintenanceBand::MidLife => self.mid_life,
            MaintenanceBand::EndOfLife => self.end_of_life,
        }
    }
}

impl Default for BandMultipliers {
    fn default() -> Self {
        Self {
            fresh: 1.0,
            mid_life: 1.0,
            end_of_life: 1.0,
        }
    }
}

/// Site-name cleanup tables plus the coordinate lookup for the map view.
///
/// `aliases` are substring substitutions applied to the upper-cased raw
/// value (depot prefixes, abbreviations); `canonical` then maps the result
/// to a display name. Anything left over lands in the "Unknown" bucket with
/// the fallback coordinate, never dropped.
#[derive(Debug, Clone, Serialize)]
pub struct LocationTable {
    pub aliases: Vec<(String, String)>,
    pub canonical: BTreeMap<String, String>,
    pub coords: BTreeMap<String, (f64, f64)>,
    pub unknown: String,
    pub unknown_coords: (f64, f64),
}

impl LocationTable {
    /// Normalize a raw location cell to its canonical city name.
    pub fn normalize(&self, raw: &str) -> String {
        let mut value = raw.trim().to_uppercase();
        for (from, to) in &self.aliases {
            if value.contains(from.as_str()) {
                value = value.replace(from.as_str(), to);
            }
        }
        let value = value.trim();
        self.canonical
            .get(value)
            .cloned()
            .unwrap_or_else(|| self.unknown.clone())
    }

    /// Coordinate pair for a canonical city name.
    pub fn coords_for(&self, canonical: &str) -> (f64, f64) {
        self.coords
            .get(canonical)
            .copied()
            .unwrap_or(self.unknown_coords)
    }
}

impl Default for LocationTable {
    fn default() -> Self {
        let aliases = [
            ("CWL-DUBAI", "DUBAI"),
            ("CWL DUBAI", "DUBAI"),
            ("SHJ-THAMEEM", "SHARJAH"),
            ("AUH", "ABU DHABI"),
        ]
        .into_iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();

        let canonical: BTreeMap<String, String> = [
            ("DUBAI", "Dubai"),
            ("ABU DHABI", "Abu Dhabi"),
            ("SHARJAH", "Sharjah"),
            ("AL AIN", "Al Ain"),
            ("RAS AL KHAIMAH", "Ras Al Khaimah"),
            ("FUJAIRAH", "Fujairah"),
            ("AJMAN", "Ajman"),
            ("UMM AL QUWAIN", "Umm Al Quwain"),
        ]
        .into_iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();

        let coords: BTreeMap<String, (f64, f64)> = [
            ("Dubai", (25.2048, 55.2708)),
            ("Abu Dhabi", (24.4539, 54.3773)),
            ("Sharjah", (25.3463, 55.4209)),
            ("Al Ain", (24.1302, 55.7434)),
            ("Ras Al Khaimah", (25.8007, 55.9762)),
            ("Fujairah", (25.1288, 56.3265)),
            ("Ajman", (25.4052, 55.5136)),
            ("Umm Al Quwain", (25.5471, 55.7032)),
        ]
        .into_iter()
        .map(|(name, ll)| (name.to_string(), ll))
        .collect();

        Self {
            aliases,
            canonical,
            coords,
            unknown: "Unknown".to_string(),
            unknown_coords: (25.0, 55.0),
        }
    }
}

/// Everything the mileage derivations need: consumption rates, pump prices,
/// and the adjustment multipliers. The usage pipeline takes no parameters.
#[derive(Debug, Clone, Serialize)]
pub struct FleetParams {
    /// Base consumption in L/100km, keyed by upper-cased make.
    pub fuel_rates: BTreeMap<String, f64>,
    /// Fallback consumption for makes not in the table.
    pub default_rate: f64,
    /// Pump prices per litre.
    pub petrol_price: f64,
    pub diesel_price: f64,
    /// Makes fuelled by petrol; everything else is billed at the diesel price.
    pub petrol_makes: BTreeSet<String>,
    pub band_multipliers: BandMultipliers,
    /// Uniform adjustment applied to every vehicle's effective rate
    /// (seasonal factor, AC load and the like).
    pub efficiency_multiplier: f64,
    pub locations: LocationTable,
    /// Sentinel role for plates with no trailing free text.
    pub pool_role: String,
}

impl FleetParams {
    /// Consumption rate for a make after band and seasonal adjustments.
    pub fn effective_rate(&self, make: &str, band: MaintenanceBand) -> f64 {
        let base = self
            .fuel_rates
            .get(make)
            .copied()
            .unwrap_or(self.default_rate);
        base * self.band_multipliers.for_band(band) * self.efficiency_multiplier
    }

    /// Pump price per litre for a make.
    pub fn unit_price(&self, make: &str) -> f64 {
        if self.petrol_makes.contains(make) {
            self.petrol_price
        } else {
            self.diesel_price
        }
    }
}

impl Default for FleetParams {
    fn default() -> Self {
        let fuel_rates: BTreeMap<String, f64> = [
            ("NISSAN SUNNY", 8.0),
            ("NISSAN ALTIMA", 8.5),
            ("MAZDA", 9.0),
            ("ASHOK LEYLAND", 16.0),
            ("MITSUBISHI CANTER", 15.0),
        ]
        .into_iter()
        .map(|(make, rate)| (make.to_string(), rate))
        .collect();

        let petrol_makes: BTreeSet<String> = ["NISSAN SUNNY", "NISSAN ALTIMA", "MAZDA"]
            .into_iter()
            .map(str::to_string)
            .collect();

        Self {
            fuel_rates,
            default_rate: 12.0,
            petrol_price: 2.60,
            diesel_price: 2.85,
            petrol_makes,
            band_multipliers: BandMultipliers::default(),
            efficiency_multiplier: 1.0,
            locations: LocationTable::default(),
            pool_role: "General Pool".to_string(),
        }
    }
}
