//! RM system assembly and dependency validation

use crate::config::RmSystemConfig;
use crate::engine::SimulationEngine;
use crate::error::{ConfigError, StepFailure};
use crate::rm::{tags, RmStep, StepRegistry};
use std::collections::{BTreeMap, HashSet};

/// Process name every non-empty RM system must provide.
pub const DCP_PROCESS: &str = "dcp";

/// Process name for daily (non-DCP) reoptimization, optional.
pub const DAILY_PROCESS: &str = "daily";

/// A named, assembled RM system: process name → ordered steps.
///
/// Built once from configuration; building runs the full
/// requires/produces dependency walk, so an `RmSystem` value is proof the
/// pipeline is sound.
#[derive(Debug)]
pub struct RmSystem {
    name: String,
    processes: BTreeMap<String, Vec<Box<dyn RmStep>>>,
}

impl RmSystem {
    /// Assemble and validate a system from configuration.
    pub fn build(
        name: &str,
        config: &RmSystemConfig,
        registry: &StepRegistry,
    ) -> Result<Self, ConfigError> {
        let mut processes = BTreeMap::new();
        let mut total_steps = 0;
        for (process_name, specs) in &config.processes {
            let mut steps: Vec<Box<dyn RmStep>> = Vec::with_capacity(specs.len());
            for spec in specs {
                steps.push(registry.build(spec)?);
            }
            validate_process(name, process_name, &steps)?;
            total_steps += steps.len();
            processes.insert(process_name.clone(), steps);
        }

        if total_steps > 0 && !processes.contains_key(DCP_PROCESS) {
            return Err(ConfigError::MissingDcpProcess {
                system: name.to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            processes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_process(&self, process: &str) -> bool {
        self.processes.contains_key(process)
    }

    /// Run one process's steps in declared order for one airline.
    ///
    /// A step error is returned immediately; no later step runs.
    pub fn run_process(
        &mut self,
        process: &str,
        engine: &mut SimulationEngine,
        airline: &str,
        dcp_index: usize,
        dcp: u32,
    ) -> Result<(), StepFailure> {
        if let Some(steps) = self.processes.get_mut(process) {
            for step in steps {
                step.run(engine, airline, dcp_index, dcp)?;
            }
        }
        Ok(())
    }
}

/// Walk a step list in order, proving every `requires` tag was produced by
/// an earlier step or is baseline. Reports the first offender.
fn validate_process(
    system: &str,
    process: &str,
    steps: &[Box<dyn RmStep>],
) -> Result<(), ConfigError> {
    let mut available: HashSet<String> =
        tags::BASELINE.iter().map(|t| t.to_string()).collect();

    for step in steps {
        for tag in step.requires() {
            if !available.contains(&tag) {
                let step_label = if step.name().is_empty() {
                    step.step_type().to_string()
                } else {
                    step.name().to_string()
                };
                return Err(ConfigError::MissingStepDependency {
                    system: system.to_string(),
                    process: process.to_string(),
                    step: step_label,
                    tag,
                });
            }
        }
        available.extend(step.produces());
    }
    Ok(())
}
