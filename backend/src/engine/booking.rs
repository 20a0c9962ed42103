//! Passenger booking
//!
//! What happens when an arrival event is consumed: the passenger scans the
//! fares linked to their market from cheapest up, taking the first fare
//! that is still purchasable (advance-purchase window) and has an open
//! bucket on a feasible path of the fare's carrier. Buckets that turn the
//! passenger away while the leg still has seats are flagged closed for the
//! timeframe, which feeds untruncation.
//!
//! Revenue is prorated evenly across a path's legs.

use crate::core::time::SECONDS_PER_DAY;
use crate::engine::SimulationEngine;

impl SimulationEngine {
    /// Book one arriving passenger of `demand_idx` during `tf_index`.
    /// A passenger who finds no open fare spills (no counters move).
    pub(crate) fn book_passenger(&mut self, demand_idx: usize, tf_index: usize, time: i64) {
        let days_prior = ((self.base_time - time).max(0) / SECONDS_PER_DAY) as u32;

        // Scan phase: find (fare, path) without touching any counters.
        let mut chosen: Option<(usize, usize)> = None;
        let mut closed_buckets: Vec<(usize, usize)> = Vec::new();

        {
            let dmd = &self.demands[demand_idx];
            let market = (dmd.orig.clone(), dmd.dest.clone());
            let path_indices = self.path_index.get(&market).cloned().unwrap_or_default();

            'fares: for &fare_idx in &dmd.fare_indices {
                let fare = &self.fares[fare_idx];
                if !fare.purchasable(days_prior) {
                    continue;
                }
                for &path_idx in &path_indices {
                    let path = &self.paths[path_idx];
                    let mut feasible = true;
                    let mut bucket_closed_here = Vec::new();
                    for &leg_idx in &path.leg_indices {
                        let leg = &self.legs[leg_idx];
                        if leg.carrier != fare.carrier || leg.seats_available() < 1.0 {
                            feasible = false;
                            break;
                        }
                        match leg
                            .buckets
                            .iter()
                            .position(|b| b.booking_class == fare.booking_class)
                        {
                            Some(pos) if leg.buckets[pos].available() >= 1.0 => {}
                            Some(pos) => {
                                // Leg has room but this class is shut.
                                bucket_closed_here.push((leg_idx, pos));
                                feasible = false;
                            }
                            None => {
                                feasible = false;
                            }
                        }
                        if !feasible {
                            break;
                        }
                    }
                    if feasible {
                        chosen = Some((fare_idx, path_idx));
                        break 'fares;
                    }
                    closed_buckets.extend(bucket_closed_here);
                }
            }
        }

        for (leg_idx, bucket_pos) in closed_buckets {
            self.legs[leg_idx].buckets[bucket_pos].record_closure(tf_index);
        }

        let Some((fare_idx, path_idx)) = chosen else {
            return; // spill
        };

        let past_burn = self.past_burn();
        let price = self.fares[fare_idx].price;
        let booking_class = self.fares[fare_idx].booking_class.clone();
        let carrier = self.fares[fare_idx].carrier.clone();
        let leg_indices = self.paths[path_idx].leg_indices.clone();
        let leg_share = price / leg_indices.len() as f64;

        for &leg_idx in &leg_indices {
            let leg = &mut self.legs[leg_idx];
            leg.sold += 1;
            leg.revenue += leg_share;
            if past_burn {
                leg.gt_sold += 1;
                leg.gt_revenue += leg_share;
            }
            if let Some(bucket) = leg.bucket_mut(&booking_class) {
                bucket.record_sale(leg_share, tf_index);
            }
        }

        let path = &mut self.paths[path_idx];
        path.sold += 1;
        path.revenue += price;
        if past_burn {
            path.gt_sold += 1;
            path.gt_revenue += price;
        }

        let is_business = self.demands[demand_idx].business;
        let fare = &mut self.fares[fare_idx];
        fare.sold += 1;
        if is_business {
            fare.sold_business += 1;
        }
        fare.revenue += price;
        if past_burn {
            fare.gt_sold += 1;
            fare.gt_revenue += price;
        }

        let dmd = &mut self.demands[demand_idx];
        dmd.sold += 1;
        dmd.revenue += price;
        if past_burn {
            dmd.gt_sold += 1;
            dmd.gt_revenue += price;
        }

        if let Some(&airline_idx) = self.airline_index.get(&carrier) {
            let airline = &mut self.airlines[airline_idx];
            airline.sold += 1;
            airline.revenue += price;
            if past_burn {
                airline.gt_sold += 1;
                airline.gt_revenue += price;
            }
        }
    }
}
