use rayon::prelude::*;

use crate::features::{Descriptor, DescriptorMatch};

/// Stands in for the batch minimum when every match distance is zero, so
/// the multiple-of-minimum rule does not degenerate to `distance < 0`.
const ZERO_MIN_EPS: f32 = 1e-3;

/// Finds the nearest target descriptor for every query descriptor.
///
/// Produces exactly one match per query descriptor when the target set is
/// non-empty, and an empty list when either side is empty. Ties are broken
/// by the lowest target index.
pub fn match_descriptors(query: &[Descriptor], target: &[Descriptor]) -> Vec<DescriptorMatch> {
    if query.is_empty() || target.is_empty() {
        return Vec::new();
    }
    query
        .par_iter()
        .enumerate()
        .map(|(query_idx, q)| {
            let mut best_idx = 0usize;
            let mut best_dist = q.hamming_distance(&target[0]);
            for (target_idx, t) in target.iter().enumerate().skip(1) {
                let dist = q.hamming_distance(t);
                if dist < best_dist {
                    best_dist = dist;
                    best_idx = target_idx;
                }
            }
            DescriptorMatch::new(query_idx, best_idx, best_dist as f32)
        })
        .collect()
}

/// Keeps only matches whose distance is below `distance_multiple` times
/// the smallest distance in the batch.
///
/// The threshold adapts to the per-frame distance distribution instead of
/// using a fixed global cutoff. A zero batch minimum is replaced by a
/// small epsilon so exact-duplicate matches survive.
pub fn filter_matches(matches: &[DescriptorMatch], distance_multiple: f32) -> Vec<DescriptorMatch> {
    if matches.is_empty() {
        return Vec::new();
    }

    let mut min_dist = f32::MAX;
    let mut max_dist = 0.0f32;
    for m in matches {
        min_dist = min_dist.min(m.distance);
        max_dist = max_dist.max(m.distance);
    }
    log::debug!("match distances: min {min_dist:.1}, max {max_dist:.1}");

    let floor = if min_dist > 0.0 { min_dist } else { ZERO_MIN_EPS };
    matches
        .iter()
        .filter(|m| m.distance < distance_multiple * floor)
        .copied()
        .collect()
}
