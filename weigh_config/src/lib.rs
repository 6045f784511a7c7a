#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and product-catalog parsing for the weighing stations.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The product catalog CSV loader enforces headers and checks that each
//!   row's tolerance band is ordered (low < target < high).
//! - `density_band` maps a foam density grade to its (low, high) weight band.

use serde::Deserialize;

/// Weight source selection.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    /// Jittered constant for bench testing; no hardware required.
    #[default]
    Simulation,
    /// Serial-attached indicator (requires the `hardware` feature downstream).
    Hardware,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScaleCfg {
    pub mode: ScaleMode,
    /// Serial device, e.g. "COM5" or "/dev/ttyUSB0".
    pub port: String,
    pub baud_rate: u32,
    /// Upper bound for a single read; the polling loop must never block longer.
    pub read_timeout_ms: u64,
    /// Simulation center weight and jitter half-range.
    pub sim_center_kg: f64,
    pub sim_jitter_kg: f64,
}

impl Default for ScaleCfg {
    fn default() -> Self {
        Self {
            mode: ScaleMode::Simulation,
            port: "COM5".to_string(),
            baud_rate: 9600,
            read_timeout_ms: 2000,
            sim_center_kg: 25.0,
            sim_jitter_kg: 0.5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StabilityCfg {
    /// Max deviation from the 2-point moving average to count as stable (kg).
    pub stable_tolerance_kg: f64,
    /// How long the signal must stay stable before a value is held (ms).
    pub quick_stable_ms: u64,
    /// Deviation from a held value that releases the hold (kg).
    pub hold_release_kg: f64,
    /// Reading below which a locked line resets for the next item (kg).
    pub reset_threshold_kg: f64,
    /// Readings at or below this never count as stable (empty platter).
    pub near_zero_kg: f64,
    /// Rolling history length per line.
    pub history_len: usize,
}

impl Default for StabilityCfg {
    fn default() -> Self {
        Self {
            stable_tolerance_kg: 0.15,
            quick_stable_ms: 150,
            hold_release_kg: 0.1,
            reset_threshold_kg: 0.5,
            near_zero_kg: 0.1,
            history_len: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RecordingCfg {
    /// Minimum wall time between two records on the same line (ms).
    pub min_record_interval_ms: u64,
    /// Button-gating band for scrap blocks (kg).
    pub ng_min_kg: f64,
    pub ng_max_kg: f64,
    /// Wider defense-in-depth band checked again at record time (kg).
    pub ng_record_min_kg: f64,
    pub ng_record_max_kg: f64,
    /// How many recent log entries the duplicate scan inspects.
    pub duplicate_scan: usize,
    /// Weight tolerance for the duplicate scan (kg).
    pub duplicate_eps_kg: f64,
}

impl Default for RecordingCfg {
    fn default() -> Self {
        Self {
            min_record_interval_ms: 2000,
            ng_min_kg: 10.0,
            ng_max_kg: 10.5,
            ng_record_min_kg: 9.0,
            ng_record_max_kg: 11.0,
            duplicate_scan: 5,
            duplicate_eps_kg: 0.01,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PollCfg {
    /// Tick period of the line monitor loop (ms).
    pub interval_ms: u64,
}

impl Default for PollCfg {
    fn default() -> Self {
        Self { interval_ms: 500 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Lines {
    pub names: Vec<String>,
}

impl Default for Lines {
    fn default() -> Self {
        Self {
            names: vec![
                "Line 1".to_string(),
                "Line 2".to_string(),
                "Line 3".to_string(),
                "Line 4".to_string(),
            ],
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub scale: ScaleCfg,
    pub stability: StabilityCfg,
    pub recording: RecordingCfg,
    pub poll: PollCfg,
    pub logging: Logging,
    pub lines: Lines,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Scale
        if self.scale.baud_rate == 0 {
            eyre::bail!("scale.baud_rate must be > 0");
        }
        if self.scale.read_timeout_ms == 0 {
            eyre::bail!("scale.read_timeout_ms must be >= 1");
        }
        if self.scale.read_timeout_ms > 10_000 {
            eyre::bail!("scale.read_timeout_ms is unreasonably large (>10s)");
        }
        if self.scale.port.trim().is_empty() {
            eyre::bail!("scale.port must not be empty");
        }
        if !self.scale.sim_jitter_kg.is_finite() || self.scale.sim_jitter_kg < 0.0 {
            eyre::bail!("scale.sim_jitter_kg must be finite and >= 0");
        }
        if !self.scale.sim_center_kg.is_finite() || self.scale.sim_center_kg < 0.0 {
            eyre::bail!("scale.sim_center_kg must be finite and >= 0");
        }

        // Stability
        if self.stability.stable_tolerance_kg <= 0.0 {
            eyre::bail!("stability.stable_tolerance_kg must be > 0");
        }
        if self.stability.hold_release_kg <= 0.0 {
            eyre::bail!("stability.hold_release_kg must be > 0");
        }
        if self.stability.reset_threshold_kg <= 0.0 {
            eyre::bail!("stability.reset_threshold_kg must be > 0");
        }
        if self.stability.near_zero_kg < 0.0 {
            eyre::bail!("stability.near_zero_kg must be >= 0");
        }
        if self.stability.history_len < 2 {
            eyre::bail!("stability.history_len must be >= 2");
        }
        if self.stability.quick_stable_ms > 60_000 {
            eyre::bail!("stability.quick_stable_ms is unreasonably large (>60s)");
        }

        // Recording
        if self.recording.min_record_interval_ms == 0 {
            eyre::bail!("recording.min_record_interval_ms must be >= 1");
        }
        if self.recording.ng_min_kg > self.recording.ng_max_kg {
            eyre::bail!("recording.ng_min_kg must be <= ng_max_kg");
        }
        if self.recording.ng_record_min_kg > self.recording.ng_min_kg
            || self.recording.ng_record_max_kg < self.recording.ng_max_kg
        {
            eyre::bail!("recording NG record band must contain the display band");
        }
        if self.recording.duplicate_scan == 0 {
            eyre::bail!("recording.duplicate_scan must be >= 1");
        }
        if self.recording.duplicate_eps_kg <= 0.0 {
            eyre::bail!("recording.duplicate_eps_kg must be > 0");
        }

        // Poll
        if self.poll.interval_ms == 0 {
            eyre::bail!("poll.interval_ms must be >= 1");
        }
        if self.poll.interval_ms > 10_000 {
            eyre::bail!("poll.interval_ms is unreasonably large (>10s)");
        }

        // Lines
        if self.lines.names.is_empty() {
            eyre::bail!("lines.names must list at least one production line");
        }

        Ok(())
    }
}

/// Product catalog CSV schema.
///
/// Expected headers:
/// product_id,customer,variety,density,low_kg,target_kg,high_kg
///
/// Example:
/// product_id,customer,variety,density,low_kg,target_kg,high_kg
/// P-64-001,ACME,ACPE,64,59.74,65.0,85.0
#[derive(Debug, Deserialize, Clone)]
pub struct ProductRow {
    pub product_id: String,
    pub customer: String,
    pub variety: String,
    pub density: u32,
    pub low_kg: f64,
    pub target_kg: f64,
    pub high_kg: f64,
}

pub fn load_products_csv(path: &std::path::Path) -> eyre::Result<Vec<ProductRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open products CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = [
        "product_id",
        "customer",
        "variety",
        "density",
        "low_kg",
        "target_kg",
        "high_kg",
    ];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "products CSV must have headers '{}', got: {}",
            expected.join(","),
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<ProductRow>().enumerate() {
        match rec {
            Ok(row) => {
                validate_product_row(&row)
                    .map_err(|e| eyre::eyre!("invalid CSV row {}: {}", idx + 2, e))?;
                rows.push(row);
            }
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    Ok(rows)
}

fn validate_product_row(row: &ProductRow) -> eyre::Result<()> {
    if row.product_id.trim().is_empty() {
        eyre::bail!("product_id must not be empty");
    }
    for (name, v) in [
        ("low_kg", row.low_kg),
        ("target_kg", row.target_kg),
        ("high_kg", row.high_kg),
    ] {
        if !v.is_finite() || v <= 0.0 {
            eyre::bail!("{name} must be finite and > 0");
        }
    }
    if !(row.low_kg < row.target_kg && row.target_kg < row.high_kg) {
        eyre::bail!(
            "tolerance band must be ordered low < target < high, got {} / {} / {}",
            row.low_kg,
            row.target_kg,
            row.high_kg
        );
    }
    Ok(())
}

/// Weight band (low, high) in kg for a foam density grade.
/// Returns None for densities outside the catalog.
pub fn density_band(density: u32) -> Option<(f64, f64)> {
    let band = match density {
        64 => (59.74, 85.00),
        80 => (74.03, 93.75),
        96 => (87.55, 115.00),
        104 => (96.24, 121.88),
        112 => (103.64, 131.25),
        120 => (111.05, 140.63),
        128 => (118.45, 150.00),
        136 => (125.85, 159.38),
        144 => (133.26, 168.75),
        160 => (154.50, 175.50),
        192 => (177.68, 220.00),
        256 => (226.60, 312.00),
        _ => return None,
    };
    Some(band)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = Config::default();
        cfg.validate().unwrap();
    }

    #[test]
    fn density_band_known_and_unknown() {
        assert_eq!(density_band(64), Some((59.74, 85.00)));
        assert_eq!(density_band(100), None);
    }
}
