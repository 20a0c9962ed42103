//! End-of-run report builders
//!
//! Aggregates the engine's grand-total counters into the summary tables.
//! Averages divide by the number of counted samples (everything outside
//! the burn period, across trials).

use crate::orchestrator::Simulation;
use crate::summary::{
    CarrierSummaryRow, DemandSummaryRow, FareSummaryRow, LegSummaryRow, PathSummaryRow,
    SummaryTables, TimeframeSummaryRow,
};
use std::collections::BTreeMap;

impl Simulation {
    /// Build all summary tables over `num_samples_eff` counted samples.
    pub fn compute_reports(&self, num_samples_eff: u64) -> SummaryTables {
        let n = num_samples_eff.max(1) as f64;
        SummaryTables {
            metadata: self.metadata().clone(),
            demands: self.demand_report(),
            fares: self.fare_report(n),
            legs: self.leg_report(n),
            paths: self.path_report(n),
            carriers: self.carrier_report(n),
            bookings_by_timeframe: self.timeframe_report(),
        }
    }

    fn demand_report(&self) -> Vec<DemandSummaryRow> {
        self.engine()
            .demands()
            .iter()
            .map(|m| DemandSummaryRow {
                orig: m.orig.clone(),
                dest: m.dest.clone(),
                segment: m.segment.clone(),
                sold: m.sold,
                revenue: m.revenue,
                avg_fare: if m.sold > 0 {
                    m.revenue / m.sold as f64
                } else {
                    0.0
                },
                gt_demand: m.gt_demand,
                gt_sold: m.gt_sold,
                gt_revenue: m.gt_revenue,
            })
            .collect()
    }

    fn fare_report(&self, n: f64) -> Vec<FareSummaryRow> {
        self.engine()
            .fares()
            .iter()
            .map(|f| FareSummaryRow {
                carrier: f.carrier.clone(),
                orig: f.orig.clone(),
                dest: f.dest.clone(),
                booking_class: f.booking_class.clone(),
                price: f.price,
                avg_sold: f.gt_sold as f64 / n,
                avg_rev: f.gt_revenue / n,
            })
            .collect()
    }

    fn leg_report(&self, n: f64) -> Vec<LegSummaryRow> {
        self.engine()
            .legs()
            .iter()
            .map(|leg| LegSummaryRow {
                carrier: leg.carrier.clone(),
                flt_no: leg.fltno,
                orig: leg.orig.clone(),
                dest: leg.dest.clone(),
                avg_sold: leg.gt_sold as f64 / n,
                avg_rev: leg.gt_revenue / n,
                lf: if leg.capacity > 0.0 {
                    100.0 * leg.gt_sold as f64 / (leg.capacity * n)
                } else {
                    0.0
                },
            })
            .collect()
    }

    fn path_report(&self, n: f64) -> Vec<PathSummaryRow> {
        let engine = self.engine();
        engine
            .paths()
            .iter()
            .map(|path| {
                let leg1 = &engine.legs()[path.leg_indices[0]];
                let second = path.leg_indices.get(1).map(|&i| &engine.legs()[i]);
                PathSummaryRow {
                    orig: path.orig.clone(),
                    dest: path.dest.clone(),
                    carrier1: leg1.carrier.clone(),
                    flt_no1: leg1.fltno,
                    carrier2: second.map(|l| l.carrier.clone()),
                    flt_no2: second.map(|l| l.fltno),
                    avg_sold: path.gt_sold as f64 / n,
                    avg_rev: path.gt_revenue / n,
                }
            })
            .collect()
    }

    fn carrier_report(&self, n: f64) -> Vec<CarrierSummaryRow> {
        let engine = self.engine();

        let mut asm: BTreeMap<&str, f64> = BTreeMap::new();
        let mut rpm: BTreeMap<&str, f64> = BTreeMap::new();
        let mut leg_lf: BTreeMap<&str, f64> = BTreeMap::new();
        let mut leg_count: BTreeMap<&str, f64> = BTreeMap::new();
        for leg in engine.legs() {
            let carrier = leg.carrier.as_str();
            *asm.entry(carrier).or_insert(0.0) += leg.distance * leg.capacity * n;
            *rpm.entry(carrier).or_insert(0.0) += leg.distance * leg.gt_sold as f64;
            if leg.capacity > 0.0 {
                *leg_lf.entry(carrier).or_insert(0.0) += leg.gt_sold as f64 / (leg.capacity * n);
            }
            *leg_count.entry(carrier).or_insert(0.0) += 1.0;
        }

        engine
            .airlines()
            .iter()
            .map(|cxr| {
                let name = cxr.name.as_str();
                let avg_sold = cxr.gt_sold as f64 / n;
                let avg_rev = cxr.gt_revenue / n;
                let total_asm = asm.get(name).copied().unwrap_or(0.0);
                let total_rpm = rpm.get(name).copied().unwrap_or(0.0);
                let sys_lf = if total_asm > 0.0 {
                    100.0 * total_rpm / total_asm
                } else {
                    0.0
                };
                let legs = leg_count.get(name).copied().unwrap_or(0.0);
                let avg_leg_lf = if legs > 0.0 {
                    100.0 * leg_lf.get(name).copied().unwrap_or(0.0) / legs
                } else {
                    0.0
                };
                let rpm_per_sample = total_rpm / n;
                CarrierSummaryRow {
                    carrier: cxr.name.clone(),
                    avg_sold,
                    sys_lf,
                    avg_leg_lf,
                    avg_rev,
                    avg_price: if avg_sold > 0.0 { avg_rev / avg_sold } else { 0.0 },
                    asm: total_asm / n,
                    rpm: rpm_per_sample,
                    yield_: if rpm_per_sample > 0.0 {
                        Some(avg_rev / rpm_per_sample)
                    } else {
                        None
                    },
                }
            })
            .collect()
    }

    fn timeframe_report(&self) -> Vec<TimeframeSummaryRow> {
        let accum = self.accumulators();
        self.engine()
            .dcps()
            .iter()
            .filter(|&&dcp| dcp != 0)
            .map(|&dcp| TimeframeSummaryRow {
                dcp,
                business: accum
                    .fare_sales_by_dcp
                    .get(&("business".to_string(), dcp))
                    .copied()
                    .unwrap_or(0),
                leisure: accum
                    .fare_sales_by_dcp
                    .get(&("leisure".to_string(), dcp))
                    .copied()
                    .unwrap_or(0),
            })
            .collect()
    }
}
