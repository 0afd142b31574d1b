use glam::Vec2;
use log::debug;
use nalgebra as na;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::config::{RansacConfig, MIN_CORRESPONDENCES};

/// Why no homography could be produced for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimationError {
    /// Fewer than [`MIN_CORRESPONDENCES`] point pairs were supplied.
    NotEnoughCorrespondences { got: usize },
    /// The correspondences are collinear or coincident; no unique
    /// invertible transform exists.
    DegenerateGeometry,
}

impl std::fmt::Display for EstimationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EstimationError::NotEnoughCorrespondences { got } => {
                write!(f, "need at least {MIN_CORRESPONDENCES} correspondences, got {got}")
            }
            EstimationError::DegenerateGeometry => {
                write!(f, "correspondences are degenerate, no unique homography")
            }
        }
    }
}

impl std::error::Error for EstimationError {}

/// A fitted homography with its consensus bookkeeping.
#[derive(Debug, Clone)]
pub struct HomographyEstimate {
    /// Maps reference-image pixels to stream-image pixels.
    pub h: na::Matrix3<f64>,
    pub inlier_mask: Vec<bool>,
    pub n_inliers: usize,
    pub mean_err_px: f64,
}

/// Fits a homography to `(reference, stream)` pixel pairs with RANSAC.
///
/// Repeatedly samples minimal 4-point subsets, solves a normalized DLT,
/// scores inliers by reprojection distance, keeps the best consensus, and
/// refits on all inliers of the winner. Sampling is driven by a ChaCha8
/// RNG seeded from the config, so identical inputs give identical results.
pub fn estimate_homography(
    pairs: &[(Vec2, Vec2)],
    config: &RansacConfig,
) -> Result<HomographyEstimate, EstimationError> {
    let n = pairs.len();
    if n < MIN_CORRESPONDENCES {
        return Err(EstimationError::NotEnoughCorrespondences { got: n });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut indices: Vec<usize> = (0..n).collect();

    let mut best_h: Option<na::Matrix3<f64>> = None;
    let mut best_n_inliers = 0usize;
    let mut best_mean_err = f64::INFINITY;

    for _ in 0..config.max_iters {
        indices.shuffle(&mut rng);
        let sample: Vec<(Vec2, Vec2)> = indices[..MIN_CORRESPONDENCES]
            .iter()
            .map(|&i| pairs[i])
            .collect();
        if sample_is_degenerate(&sample) {
            continue;
        }
        let Some(h) = dlt_homography(&sample) else {
            continue;
        };

        let (n_inliers, mean_err) = score_inliers(&h, pairs, config.inlier_threshold);
        if n_inliers > best_n_inliers || (n_inliers == best_n_inliers && mean_err < best_mean_err) {
            best_n_inliers = n_inliers;
            best_mean_err = mean_err;
            best_h = Some(h);
            if n_inliers == n {
                break;
            }
        }
    }

    let Some(mut h) = best_h else {
        debug!("no RANSAC sample produced a homography hypothesis");
        return Err(EstimationError::DegenerateGeometry);
    };
    if best_n_inliers < MIN_CORRESPONDENCES {
        return Err(EstimationError::DegenerateGeometry);
    }

    // Refit on every inlier of the winning hypothesis.
    let inlier_pairs: Vec<(Vec2, Vec2)> = pairs
        .iter()
        .filter(|pair| reprojection_error(&h, pair) < config.inlier_threshold)
        .copied()
        .collect();
    if inlier_pairs.len() >= MIN_CORRESPONDENCES {
        if let Some(refit) = dlt_homography(&inlier_pairs) {
            let (refit_inliers, _) = score_inliers(&refit, pairs, config.inlier_threshold);
            if refit_inliers >= best_n_inliers {
                h = refit;
            }
        }
    }

    if !h.iter().all(|v| v.is_finite()) || h.determinant().abs() < 1e-12 {
        return Err(EstimationError::DegenerateGeometry);
    }

    let mut inlier_mask = vec![false; n];
    let mut n_inliers = 0usize;
    let mut err_sum = 0.0f64;
    for (i, pair) in pairs.iter().enumerate() {
        let err = reprojection_error(&h, pair);
        if err < config.inlier_threshold {
            inlier_mask[i] = true;
            n_inliers += 1;
            err_sum += err;
        }
    }
    let mean_err_px = if n_inliers > 0 {
        err_sum / n_inliers as f64
    } else {
        f64::INFINITY
    };
    debug!("homography consensus: {n_inliers}/{n} inliers, mean err {mean_err_px:.3} px");

    Ok(HomographyEstimate {
        h,
        inlier_mask,
        n_inliers,
        mean_err_px,
    })
}

/// Maps one point through the full projective transform, including the
/// perspective division. `None` when the point lands at infinity.
pub fn project_point(h: &na::Matrix3<f64>, p: Vec2) -> Option<Vec2> {
    let q = h * na::Vector3::new(p.x as f64, p.y as f64, 1.0);
    if q[2].abs() <= 1e-10 {
        return None;
    }
    Some(Vec2::new((q[0] / q[2]) as f32, (q[1] / q[2]) as f32))
}

/// Projects the 4 reference corners (top-left, top-right, bottom-right,
/// bottom-left) into stream coordinates.
pub fn project_corners(h: &na::Matrix3<f64>, corners: &[Vec2; 4]) -> Option<[Vec2; 4]> {
    Some([
        project_point(h, corners[0])?,
        project_point(h, corners[1])?,
        project_point(h, corners[2])?,
        project_point(h, corners[3])?,
    ])
}

fn score_inliers(h: &na::Matrix3<f64>, pairs: &[(Vec2, Vec2)], threshold: f64) -> (usize, f64) {
    let mut n_inliers = 0usize;
    let mut err_sum = 0.0f64;
    for pair in pairs {
        let err = reprojection_error(h, pair);
        if err < threshold {
            n_inliers += 1;
            err_sum += err;
        }
    }
    let mean = if n_inliers > 0 {
        err_sum / n_inliers as f64
    } else {
        f64::INFINITY
    };
    (n_inliers, mean)
}

fn reprojection_error(h: &na::Matrix3<f64>, pair: &(Vec2, Vec2)) -> f64 {
    match project_point(h, pair.0) {
        Some(p) => {
            let dx = (p.x - pair.1.x) as f64;
            let dy = (p.y - pair.1.y) as f64;
            (dx * dx + dy * dy).sqrt()
        }
        None => f64::INFINITY,
    }
}

fn collinear(a: Vec2, b: Vec2, c: Vec2) -> bool {
    let v1 = b - a;
    let v2 = c - a;
    let cross = (v1.x as f64) * (v2.y as f64) - (v1.y as f64) * (v2.x as f64);
    let scale = (v1.length() as f64) * (v2.length() as f64);
    cross.abs() <= 1e-6 * scale.max(1e-12)
}

/// A minimal sample is unusable when any three points on either side are
/// collinear (coincident points degenerate to the same check).
fn sample_is_degenerate(sample: &[(Vec2, Vec2)]) -> bool {
    for i in 0..sample.len() {
        for j in (i + 1)..sample.len() {
            for k in (j + 1)..sample.len() {
                if collinear(sample[i].0, sample[j].0, sample[k].0)
                    || collinear(sample[i].1, sample[j].1, sample[k].1)
                {
                    return true;
                }
            }
        }
    }
    false
}

/// Similarity transform taking the points to centroid zero and mean
/// distance sqrt(2). `None` when the points are (near) coincident.
fn normalizing_transform(points: &[Vec2]) -> Option<na::Matrix3<f64>> {
    let n = points.len() as f64;
    let mut cx = 0.0f64;
    let mut cy = 0.0f64;
    for p in points {
        cx += p.x as f64;
        cy += p.y as f64;
    }
    cx /= n;
    cy /= n;

    let mut mean_dist = 0.0f64;
    for p in points {
        let dx = p.x as f64 - cx;
        let dy = p.y as f64 - cy;
        mean_dist += (dx * dx + dy * dy).sqrt();
    }
    mean_dist /= n;
    if mean_dist < 1e-9 {
        return None;
    }

    let s = std::f64::consts::SQRT_2 / mean_dist;
    Some(na::Matrix3::new(
        s, 0.0, -s * cx, //
        0.0, s, -s * cy, //
        0.0, 0.0, 1.0,
    ))
}

/// Direct linear transform over normalized coordinates.
///
/// Builds the 2n x 9 constraint matrix, takes the SVD nullspace vector,
/// and denormalizes. Works for the minimal 4-point sample and for the
/// overdetermined inlier refit alike.
fn dlt_homography(pairs: &[(Vec2, Vec2)]) -> Option<na::Matrix3<f64>> {
    let n = pairs.len();
    if n < MIN_CORRESPONDENCES {
        return None;
    }

    let src: Vec<Vec2> = pairs.iter().map(|p| p.0).collect();
    let dst: Vec<Vec2> = pairs.iter().map(|p| p.1).collect();
    let t_src = normalizing_transform(&src)?;
    let t_dst = normalizing_transform(&dst)?;

    let norm = |t: &na::Matrix3<f64>, p: Vec2| -> (f64, f64) {
        let q = t * na::Vector3::new(p.x as f64, p.y as f64, 1.0);
        (q[0], q[1])
    };

    // Two constraint rows per correspondence; pad with zero rows so the
    // SVD always yields 9 right-singular vectors.
    let rows = (2 * n).max(9);
    let mut a = na::DMatrix::<f64>::zeros(rows, 9);
    for (i, pair) in pairs.iter().enumerate() {
        let (x, y) = norm(&t_src, pair.0);
        let (xp, yp) = norm(&t_dst, pair.1);
        let r1 = 2 * i;
        let r2 = 2 * i + 1;
        a[(r1, 0)] = -x;
        a[(r1, 1)] = -y;
        a[(r1, 2)] = -1.0;
        a[(r1, 6)] = xp * x;
        a[(r1, 7)] = xp * y;
        a[(r1, 8)] = xp;
        a[(r2, 3)] = -x;
        a[(r2, 4)] = -y;
        a[(r2, 5)] = -1.0;
        a[(r2, 6)] = yp * x;
        a[(r2, 7)] = yp * y;
        a[(r2, 8)] = yp;
    }

    let svd = a.svd(false, true);
    let v_t = svd.v_t?;
    let hv = v_t.row(8);
    let h_norm = na::Matrix3::new(
        hv[0], hv[1], hv[2], //
        hv[3], hv[4], hv[5], //
        hv[6], hv[7], hv[8],
    );

    let t_dst_inv = t_dst.try_inverse()?;
    let h = t_dst_inv * h_norm * t_src;
    if h.iter().all(|v| v.is_finite()) {
        Some(h)
    } else {
        None
    }
}
