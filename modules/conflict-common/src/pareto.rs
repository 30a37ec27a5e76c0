//! Power-law severity fit and the empirical CCDF it is compared against.
//!
//! The fit parameters come from the offline modelling run; nothing here refits.

use serde::Serialize;

use crate::types::EventRecord;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerLawFit {
    pub alpha: f64,
    /// Smallest fatality count the power-law tail covers.
    pub xmin: u32,
    /// Log-likelihood ratio, power law vs lognormal. Negative favours lognormal.
    pub r_lognormal: f64,
    pub p_lognormal: &'static str,
    /// Log-likelihood ratio, power law vs exponential. Positive favours power law.
    pub r_exponential: f64,
    pub p_exponential: &'static str,
}

pub const FITTED_POWER_LAW: PowerLawFit = PowerLawFit {
    alpha: 2.55,
    xmin: 11,
    r_lognormal: -168.5,
    p_lognormal: "< 0.001",
    r_exponential: 3739.7,
    p_exponential: "< 0.001",
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CcdfPoint {
    pub x: u32,
    /// P(X >= x)
    pub p: f64,
}

/// Empirical CCDF over events with at least one fatality, one point per
/// distinct fatality count, ascending.
pub fn empirical_ccdf(rows: &[&EventRecord]) -> Vec<CcdfPoint> {
    let mut sample: Vec<u32> = rows
        .iter()
        .map(|e| e.fatalities)
        .filter(|&f| f > 0)
        .collect();
    if sample.is_empty() {
        return Vec::new();
    }
    sample.sort_unstable();

    let n = sample.len() as f64;
    let mut points = Vec::new();
    let mut i = 0;
    while i < sample.len() {
        let x = sample[i];
        points.push(CcdfPoint {
            x,
            p: (sample.len() - i) as f64 / n,
        });
        while i < sample.len() && sample[i] == x {
            i += 1;
        }
    }
    points
}

impl PowerLawFit {
    /// The fitted tail evaluated at each empirical point with `x >= xmin`,
    /// anchored to the empirical CCDF at the first such point.
    pub fn tail_curve(&self, ccdf: &[CcdfPoint]) -> Vec<CcdfPoint> {
        let Some(anchor) = ccdf.iter().find(|pt| pt.x >= self.xmin) else {
            return Vec::new();
        };
        let x0 = f64::from(anchor.x);
        ccdf.iter()
            .filter(|pt| pt.x >= anchor.x)
            .map(|pt| CcdfPoint {
                x: pt.x,
                p: anchor.p * (f64::from(pt.x) / x0).powf(1.0 - self.alpha),
            })
            .collect()
    }

    /// Share of the sample the tail model covers.
    pub fn tail_share(&self, ccdf: &[CcdfPoint]) -> Option<f64> {
        if ccdf.is_empty() {
            return None;
        }
        Some(
            ccdf.iter()
                .find(|pt| pt.x >= self.xmin)
                .map(|pt| pt.p)
                .unwrap_or(0.0),
        )
    }
}
