//! Persistence sink
//!
//! The control loop pushes per-DCP detail snapshots and per-trial final
//! snapshots into a [`DetailSink`]. Which tables are recorded, and whether
//! at every DCP or only at the final one, is a per-table configuration
//! choice (`write_items`).
//!
//! # Failure policy
//!
//! Sink writes are deliberately lenient: a row that fails to serialize or
//! write is logged at `warn` level and skipped, so one bad row cannot lose
//! an entire long-running sample. This is intentionally weaker than the
//! fatal policy applied to simulation invariants; see DESIGN.md.
//! Durability is only guaranteed at commit boundaries — commits are batched
//! by `commit_count_delay` writes and forced at sample boundaries.

use crate::engine::SimulationEngine;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::any::Any;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Sink configuration, part of the scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkSettings {
    /// Output file for the JSON-lines sink; `None` disables persistence.
    #[serde(default)]
    pub filename: Option<PathBuf>,

    /// Force a commit every N writes; `None` commits only at sample and
    /// trial boundaries.
    #[serde(default)]
    pub commit_count_delay: Option<u32>,

    /// Tables to record. A bare name ("leg") records at every DCP, a
    /// `_final` name ("leg_final") records once per trial.
    #[serde(default = "default_write_items")]
    pub write_items: BTreeSet<String>,
}

fn default_write_items() -> BTreeSet<String> {
    ["demand_final", "leg_final", "fare_final"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            filename: None,
            commit_count_delay: None,
            write_items: default_write_items(),
        }
    }
}

/// Consumer of simulation snapshots.
///
/// Methods are infallible by design: implementations log and skip bad
/// rows rather than surfacing errors into the control loop.
pub trait DetailSink: Send {
    /// One per-DCP snapshot (subject to `write_items`).
    fn save_details(&mut self, engine: &SimulationEngine, dcp: u32);

    /// One per-trial final snapshot.
    fn save_final(&mut self, engine: &SimulationEngine);

    /// Commit boundary. Callers must not assume durability before this.
    fn commit(&mut self);

    /// Downcast support (mirrors the step/policy pattern).
    fn as_any(&self) -> &dyn Any;
}

// ============================================================================
// Null sink
// ============================================================================

/// Discards everything. Used when no persistence is configured.
pub struct NullSink;

impl DetailSink for NullSink {
    fn save_details(&mut self, _engine: &SimulationEngine, _dcp: u32) {}
    fn save_final(&mut self, _engine: &SimulationEngine) {}
    fn commit(&mut self) {}
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Row construction (shared by sinks)
// ============================================================================

fn detail_rows(engine: &SimulationEngine, dcp: u32, suffix: &str) -> Vec<(String, serde_json::Value)> {
    let trial = engine.trial();
    let sample = engine.sample();
    let mut rows = Vec::new();

    let table = |name: &str| format!("{}{}", name, suffix);

    for dmd in engine.demands() {
        rows.push((
            table("demand"),
            json!({
                "trial": trial, "sample": sample, "dcp": dcp,
                "orig": dmd.orig, "dest": dmd.dest, "segment": dmd.segment,
                "scenario_demand": dmd.scenario_demand,
                "reference_fare": dmd.reference_fare,
                "sold": dmd.sold, "revenue": dmd.revenue,
            }),
        ));
    }
    for leg in engine.legs() {
        rows.push((
            table("leg"),
            json!({
                "trial": trial, "sample": sample, "dcp": dcp,
                "carrier": leg.carrier, "fltno": leg.fltno,
                "orig": leg.orig, "dest": leg.dest,
                "capacity": leg.capacity, "sold": leg.sold, "revenue": leg.revenue,
            }),
        ));
        for bucket in &leg.buckets {
            rows.push((
                table("bucket"),
                json!({
                    "trial": trial, "sample": sample, "dcp": dcp,
                    "carrier": leg.carrier, "fltno": leg.fltno,
                    "booking_class": bucket.booking_class,
                    "alloc": bucket.alloc, "sold": bucket.sold,
                    "fcst_mean": bucket.fcst_mean, "fcst_std_dev": bucket.fcst_std_dev,
                }),
            ));
        }
    }
    for fare in engine.fares() {
        rows.push((
            table("fare"),
            json!({
                "trial": trial, "sample": sample, "dcp": dcp,
                "carrier": fare.carrier, "orig": fare.orig, "dest": fare.dest,
                "booking_class": fare.booking_class, "price": fare.price,
                "sold": fare.sold, "sold_business": fare.sold_business,
            }),
        ));
    }
    rows
}

// ============================================================================
// JSON-lines sink
// ============================================================================

/// Writes one JSON object per row to a flat file.
pub struct JsonlSink {
    writer: BufWriter<File>,
    write_items: BTreeSet<String>,
    commit_count_delay: Option<u32>,
    writes_since_commit: u32,
}

impl JsonlSink {
    pub fn create(path: &Path, settings: &SinkSettings) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            write_items: settings.write_items.clone(),
            commit_count_delay: settings.commit_count_delay,
            writes_since_commit: 0,
        })
    }

    fn write_rows(&mut self, rows: Vec<(String, serde_json::Value)>) {
        for (table, mut row) in rows {
            if !self.write_items.contains(&table) {
                continue;
            }
            row["table"] = json!(table);
            // Lenient by design: log and move on.
            if let Err(err) = writeln!(self.writer, "{}", row) {
                log::warn!("sink write failed for table {}: {}", table, err);
                continue;
            }
            self.writes_since_commit += 1;
            if let Some(delay) = self.commit_count_delay {
                if self.writes_since_commit >= delay {
                    self.commit();
                }
            }
        }
    }
}

impl DetailSink for JsonlSink {
    fn save_details(&mut self, engine: &SimulationEngine, dcp: u32) {
        self.write_rows(detail_rows(engine, dcp, ""));
    }

    fn save_final(&mut self, engine: &SimulationEngine) {
        self.write_rows(detail_rows(engine, engine.last_dcp, "_final"));
    }

    fn commit(&mut self) {
        if let Err(err) = self.writer.flush() {
            log::warn!("sink commit failed: {}", err);
        }
        self.writes_since_commit = 0;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// In-memory sink (test support)
// ============================================================================

/// Keeps every accepted row in memory. Used by tests to observe exactly
/// what the control loop persists.
#[derive(Default)]
pub struct MemorySink {
    pub write_items: BTreeSet<String>,
    pub rows: Vec<(String, serde_json::Value)>,
    pub commits: usize,
}

impl MemorySink {
    pub fn new(settings: &SinkSettings) -> Self {
        Self {
            write_items: settings.write_items.clone(),
            rows: Vec::new(),
            commits: 0,
        }
    }

    pub fn rows_for(&self, table: &str) -> usize {
        self.rows.iter().filter(|(t, _)| t == table).count()
    }
}

impl DetailSink for MemorySink {
    fn save_details(&mut self, engine: &SimulationEngine, dcp: u32) {
        for (table, row) in detail_rows(engine, dcp, "") {
            if self.write_items.contains(&table) {
                self.rows.push((table, row));
            }
        }
    }

    fn save_final(&mut self, engine: &SimulationEngine) {
        for (table, row) in detail_rows(engine, engine.last_dcp, "_final") {
            if self.write_items.contains(&table) {
                self.rows.push((table, row));
            }
        }
    }

    fn commit(&mut self) {
        self.commits += 1;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Run metadata
// ============================================================================

/// Identifies what was run: scenario name plus a digest of the validated
/// configuration, for reproducibility bookkeeping alongside results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunMetadata {
    pub scenario: String,
    pub config_digest: String,
}

impl RunMetadata {
    pub fn for_config(config: &crate::config::ScenarioConfig) -> Self {
        let canonical =
            serde_json::to_string(config).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Self {
            scenario: config.scenario.clone(),
            config_digest: format!("{:x}", hasher.finalize()),
        }
    }
}
