//! PyO3 wrapper for Simulation
//!
//! Minimal Python surface: construct from a JSON scenario, run, get the
//! summary tables back as JSON. The heavy lifting stays on the Rust side.
//!
//! # Example (from Python)
//!
//! ```python
//! from rm_simulator_core_rs import Simulation
//!
//! sim = Simulation.from_json(open("scenario.json").read())
//! summary = json.loads(sim.run())
//! print(summary["carriers"])
//! ```

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::orchestrator::Simulation as RustSimulation;
use crate::store::NullSink;

/// Python wrapper for the Rust simulation
#[pyclass(name = "Simulation")]
pub struct PySimulation {
    inner: RustSimulation,
}

#[pymethods]
impl PySimulation {
    /// Build a simulation from a JSON scenario string.
    ///
    /// Raises ValueError on parse or validation failure.
    #[staticmethod]
    fn from_json(text: &str) -> PyResult<Self> {
        let config = crate::config::ScenarioConfig::from_json(text)
            .map_err(|e| PyValueError::new_err(format!("invalid scenario JSON: {}", e)))?;
        let inner = RustSimulation::new(config, Box::new(NullSink))
            .map_err(|e| PyValueError::new_err(format!("invalid scenario: {}", e)))?;
        Ok(Self { inner })
    }

    /// Run every configured trial; returns the summary tables as a JSON
    /// string.
    fn run(&mut self) -> PyResult<String> {
        let summary = self
            .inner
            .run()
            .map_err(|e| PyRuntimeError::new_err(format!("simulation failed: {}", e)))?;
        summary
            .to_json_pretty()
            .map_err(|e| PyRuntimeError::new_err(format!("summary serialization failed: {}", e)))
    }

    /// Scenario name plus config digest, for bookkeeping.
    fn metadata(&self) -> PyResult<String> {
        serde_json::to_string(self.inner.metadata())
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }
}
