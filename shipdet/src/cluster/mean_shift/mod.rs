//! Flat-kernel mean shift over mask pixel coordinates.
//!
//! Every point starts at its own position and repeatedly takes a damped step
//! towards the mean of the original points strictly inside the bandwidth.
//! Points stop moving once a step is shorter than [`CONVERGENCE_EPSILON`]
//! (squared). Converged estimates are then merged greedily in input order.


use glam::DVec2;
use rayon::prelude::*;

use super::Centroid;
use super::kdtree::KdTree;
use crate::error::ConfigError;

/// Squared step length below which a point counts as converged.
pub const CONVERGENCE_EPSILON: f64 = 1e-4;

/// Validated mean shift parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanShiftConfig {
    bandwidth: f64,
    rate: f64,
    max_iterations: u32,
}

impl Default for MeanShiftConfig {
    fn default() -> Self {
        Self {
            bandwidth: 10.0,
            rate: 0.5,
            max_iterations: 1000,
        }
    }
}

impl MeanShiftConfig {
    pub fn new(bandwidth: f64, rate: f64, max_iterations: u32) -> Result<Self, ConfigError> {
        if !(bandwidth.is_finite() && bandwidth > 0.0) {
            return Err(ConfigError::NotPositive {
                name: "bandwidth",
                value: bandwidth,
            });
        }
        if !(rate > 0.0 && rate <= 1.0) {
            return Err(ConfigError::RateOutOfRange(rate));
        }
        if max_iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        Ok(Self {
            bandwidth,
            rate,
            max_iterations,
        })
    }

    #[inline]
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    #[inline]
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// One centroid per merged mode, in the order the seeding points appear.
    pub fn detect(&self, points: &[DVec2]) -> Vec<Centroid> {
        let Some(tree) = KdTree::build(points) else {
            return Vec::new();
        };
        let (estimates, iterations) = self.shift(&tree, points);
        let clusters = self.merge(&estimates);
        tracing::debug!(
            points = points.len(),
            iterations,
            clusters = clusters.len(),
            "Mean shift finished"
        );
        clusters
    }

    /// Runs the damped updates until every point converges or the iteration
    /// cap is hit. Returns the final estimates and the iterations used.
    fn shift(&self, tree: &KdTree, points: &[DVec2]) -> (Vec<DVec2>, u32) {
        let bandwidth_sq = self.bandwidth * self.bandwidth;
        let rate = self.rate;
        let mut estimates = points.to_vec();
        let mut active = vec![true; points.len()];

        let mut iterations = 0;
        while iterations < self.max_iterations && active.contains(&true) {
            iterations += 1;
            estimates
                .par_iter_mut()
                .zip(active.par_iter_mut())
                .filter(|(_, active)| **active)
                .for_each(|(estimate, active)| {
                    let current = *estimate;
                    let next = match tree.mean_within(current, bandwidth_sq) {
                        Some((mean, _)) => current * (1.0 - rate) + mean * rate,
                        None => current,
                    };
                    if next.distance_squared(current) <= CONVERGENCE_EPSILON {
                        *active = false;
                    }
                    *estimate = next;
                });
        }
        (estimates, iterations)
    }

    /// Each estimate joins the first cluster whose seed lies strictly within
    /// the bandwidth, or seeds a new one. The seed is the representative.
    fn merge(&self, estimates: &[DVec2]) -> Vec<Centroid> {
        let bandwidth_sq = self.bandwidth * self.bandwidth;
        let mut clusters: Vec<(DVec2, usize)> = Vec::new();
        for &estimate in estimates {
            match clusters
                .iter_mut()
                .find(|(seed, _)| seed.distance_squared(estimate) < bandwidth_sq)
            {
                Some((_, members)) => *members += 1,
                None => clusters.push((estimate, 1)),
            }
        }
        clusters
            .into_iter()
            .map(|(seed, members)| Centroid::from_mean(seed, members))
            .collect()
    }
}
