//! Benjamini-Hochberg false-discovery-rate control.
//!
//! Step-up procedure: with p-values sorted ascending as p_(1) ≤ … ≤ p_(m),
//! find the largest rank k* with p_(k*) ≤ k*/m · α and reject every hypothesis
//! at rank ≤ k*. Adjusted p-values are the monotone BH estimator
//! `min_{j ≥ k} p_(j) · m / j`, capped at 1.

use crate::error::{check_open_unit, Result, StatsError};
use crate::types::PValueRecord;

/// Apply Benjamini-Hochberg at false discovery rate `alpha`.
///
/// The output has one record per input p-value, in input order
/// (`output[i].original_index == i`). Equal p-values are ranked by input
/// position, so the result is deterministic.
///
/// # Errors
///
/// [`StatsError::InvalidParameter`] if `alpha` is outside (0, 1) or any
/// p-value is outside [0, 1] or NaN.
pub fn benjamini_hochberg(pvalues: &[f64], alpha: f64) -> Result<Vec<PValueRecord>> {
    check_open_unit("alpha", alpha)?;
    if let Some((i, p)) = pvalues
        .iter()
        .enumerate()
        .find(|(_, p)| !(0.0..=1.0).contains(*p))
    {
        return Err(StatsError::InvalidParameter(format!(
            "p-value at index {} must be in [0, 1], got {}",
            i, p
        )));
    }

    let m = pvalues.len();
    if m == 0 {
        return Ok(Vec::new());
    }
    let mf = m as f64;

    // Stable sort keeps input order among ties.
    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| pvalues[a].total_cmp(&pvalues[b]));

    // Largest rank satisfying p_(k) · m ≤ k · α. Comparing the cross-multiplied
    // form avoids the rounding in k/m · α at exact boundaries.
    let cutoff = order
        .iter()
        .enumerate()
        .rev()
        .find(|&(pos, &idx)| pvalues[idx] * mf <= (pos + 1) as f64 * alpha)
        .map(|(pos, _)| pos + 1)
        .unwrap_or(0);

    let mut records = vec![
        PValueRecord {
            original_index: 0,
            rank: 0,
            raw_p: 0.0,
            adjusted_p: 0.0,
            reject_null: false,
        };
        m
    ];

    let mut running_min = 1.0_f64;
    for (pos, &idx) in order.iter().enumerate().rev() {
        let rank = pos + 1;
        let raw_p = pvalues[idx];
        running_min = running_min.min(raw_p * mf / rank as f64);
        records[idx] = PValueRecord {
            original_index: idx,
            rank,
            raw_p,
            adjusted_p: running_min,
            reject_null: rank <= cutoff,
        };
    }

    tracing::debug!("[BH] m={} alpha={} rejected={}", m, alpha, cutoff);
    Ok(records)
}
