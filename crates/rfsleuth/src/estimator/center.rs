//! Decision threshold estimation

#[cfg(not(test))]
use log::debug;
#[cfg(test)]
use std::println as debug;

use crate::config::AnalysisConfig;
use crate::dsp;
use crate::estimator::segment::Plateau;

/// Estimate the binary decision threshold of the demodulation stream
///
/// Two-means clustering over the in-burst samples; the threshold is
/// the midpoint of the two centroids. Fails when either cluster holds
/// less than the configured fraction of the samples, which means the
/// stream does not actually carry two levels.
pub(crate) fn estimate_center(
    stream: &[f32],
    plateaus: &[Plateau],
    cfg: &AnalysisConfig,
) -> Option<f32> {
    let mut values = Vec::new();
    for p in plateaus {
        let end = p.end.min(stream.len());
        values.extend_from_slice(&stream[p.start..end]);
    }

    let tm = dsp::two_means(&values, cfg.centroid_epsilon)?;
    if tm.minor_fraction() < cfg.cluster_min_fraction {
        debug!(
            "center: degenerate clusters ({}/{} samples)",
            tm.n_lo.min(tm.n_hi),
            values.len()
        );
        return None;
    }

    debug!("center: clusters {:.4} / {:.4}", tm.lo, tm.hi);
    Some(0.5 * (tm.lo + tm.hi))
}
